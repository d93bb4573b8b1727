use std::sync::Arc;

use axum::{Json, extract::Extension, response::IntoResponse};
use serde_json::json;

use crate::app::services::{self, AppServices};
use crate::context::PrincipalContext;

pub async fn health(Extension(services): Extension<Arc<AppServices>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "store": services.backend(),
    }))
}

pub async fn whoami(Extension(principal): Extension<PrincipalContext>) -> impl IntoResponse {
    let p = principal.principal();
    Json(json!({
        "userId": p.user_id.to_string(),
        "name": p.name,
        "role": p.role.as_str(),
        "permissions": p.permissions().iter().map(|perm| perm.as_str().to_string()).collect::<Vec<_>>(),
    }))
}

/// GET /api/events
///
/// Server-sent notifications, filtered to what the caller's role may see.
pub async fn events(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> impl IntoResponse {
    services::notification_stream(&services, principal.role())
}
