use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use wholesale_auth::Permission;
use wholesale_core::BatchId;
use wholesale_inventory::{BatchPatch, NewBatch};

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_batch))
        .route("/:id", get(get_batch).put(update_batch).delete(delete_batch))
}

/// Stock of the owning product is recalculated after the batch is saved.
pub async fn create_batch(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    payload: Result<Json<NewBatch>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require(&principal, &[Permission::BATCHES_WRITE])?;
    let batch = services.catalog.create_batch(dto::body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(batch)))
}

pub async fn get_batch(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require(&principal, &[Permission::BATCHES_READ])?;
    let batch = services.catalog.get_batch(dto::parse_id::<BatchId>(&id)?).await?;
    Ok(Json(batch))
}

pub async fn update_batch(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    payload: Result<Json<BatchPatch>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require(&principal, &[Permission::BATCHES_WRITE])?;
    let id = dto::parse_id::<BatchId>(&id)?;
    let batch = services.catalog.update_batch(id, dto::body(payload)?).await?;
    Ok(Json(batch))
}

pub async fn delete_batch(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    authz::require(&principal, &[Permission::BATCHES_DELETE])?;
    services.catalog.delete_batch(dto::parse_id::<BatchId>(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
