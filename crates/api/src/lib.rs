//! HTTP API: configuration, server wiring, sign-in, routing and error mapping.

pub mod app;
pub mod authz;
pub mod config;
pub mod context;
pub mod middleware;
pub mod session;

pub use app::build_app;
pub use config::ApiConfig;
