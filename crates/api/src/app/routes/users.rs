//! Staff account administration (admin only).

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, rejection::{JsonRejection, QueryRejection}},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use wholesale_auth::{NewUser, Permission, User, UserPatch};
use wholesale_core::UserId;

use crate::app::dto::{self, UserListParams};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    params: Result<Query<UserListParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require(&principal, &[Permission::USERS_MANAGE])?;
    let page = services.users.list(dto::query(params)?.into()).await?;
    Ok(Json(page.map(|u| u.profile())))
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require(&principal, &[Permission::USERS_MANAGE])?;
    let user = services.users.create(dto::body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(user.profile())))
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require(&principal, &[Permission::USERS_MANAGE])?;
    let user: User = services.users.get(dto::parse_id::<UserId>(&id)?).await?;
    Ok(Json(user.profile()))
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    payload: Result<Json<UserPatch>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require(&principal, &[Permission::USERS_MANAGE])?;
    let id = dto::parse_id::<UserId>(&id)?;
    let user = services.users.update(id, dto::body(payload)?).await?;
    Ok(Json(user.profile()))
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    authz::require(&principal, &[Permission::USERS_MANAGE])?;
    let id = dto::parse_id::<UserId>(&id)?;
    services.users.delete(id, principal.user_id()).await?;
    Ok(StatusCode::NO_CONTENT)
}
