//! HTTP API application wiring (axum router + service wiring).
//!
//! - `services.rs`: store backend, notification bus and services
//! - `routes/`: handlers, one file per resource
//! - `dto.rs`: query/body DTOs and mapping onto service types
//! - `errors.rs`: JSON error responses

use std::sync::Arc;

use axum::{Extension, Router, http::HeaderValue, routing::{get, post}};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use wholesale_auth::Hs256Jwt;

use crate::config::ApiConfig;
use crate::middleware;
use crate::session::SessionIssuer;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use errors::ApiError;
use services::AppServices;

/// Build the full HTTP router (used by `main.rs` and the black-box tests).
pub fn build_app(config: &ApiConfig, services: Arc<AppServices>) -> Router {
    let jwt = Arc::new(Hs256Jwt::new(config.jwt_secret.as_bytes()));
    let sessions = SessionIssuer::new(Arc::clone(&jwt), config.jwt_ttl);
    let auth_state = middleware::AuthState { jwt };

    let protected = routes::router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    let api = Router::new()
        .route("/health", get(routes::system::health))
        .route("/auth/login", post(routes::auth::login))
        .merge(protected);

    Router::new()
        .nest("/api", api)
        .fallback(|| async { ApiError::not_found("route not found") })
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors(config.cors_origin.as_deref()))
                .layer(Extension(services))
                .layer(Extension(sessions)),
        )
}

fn cors(origin: Option<&str>) -> CorsLayer {
    match origin {
        Some(raw) => match HeaderValue::from_str(raw) {
            Ok(origin) => CorsLayer::new().allow_origin(origin).allow_methods(Any).allow_headers(Any),
            Err(_) => {
                tracing::warn!(origin = raw, "ignoring unparseable CORS_ORIGIN");
                CorsLayer::permissive()
            }
        },
        None => CorsLayer::permissive(),
    }
}
