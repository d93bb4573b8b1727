use axum::{Router, routing::get};

pub mod auth;
pub mod batches;
pub mod customers;
pub mod orders;
pub mod products;
pub mod reports;
pub mod suppliers;
pub mod system;
pub mod users;

/// Router for all authenticated endpoints (mounted under `/api`).
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/events", get(system::events))
        .route("/auth/me", get(auth::me))
        .nest("/products", products::router())
        .nest("/batches", batches::router())
        .nest("/customers", customers::router())
        .nest("/suppliers", suppliers::router())
        .nest("/orders", orders::router())
        .nest("/reports", reports::router())
        .nest("/users", users::router())
}
