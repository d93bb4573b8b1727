use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    response::IntoResponse,
};
use chrono::Utc;

use wholesale_core::DomainError;

use crate::app::dto::{self, LoginRequest};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;
use crate::session::SessionIssuer;

/// POST /api/auth/login (public)
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(sessions): Extension<SessionIssuer>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let request = dto::body(payload)?;
    let user = match services.users.authenticate(&request.email, &request.password).await {
        Ok(user) => user,
        Err(e) if matches!(e.domain(), Some(DomainError::Unauthorized)) => {
            return Err(ApiError::unauthorized("invalid email or password"));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user_id = %user.principal().user_id, role = %user.role(), "signed in");
    Ok(Json(sessions.issue(&user, Utc::now())?))
}

/// GET /api/auth/me
pub async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<impl IntoResponse, ApiError> {
    let user = services.users.get(principal.user_id()).await?;
    Ok(Json(user.profile()))
}
