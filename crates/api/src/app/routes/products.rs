use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, rejection::{JsonRejection, QueryRejection}},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};

use wholesale_auth::Permission;
use wholesale_core::ProductId;
use wholesale_products::{NewProduct, ProductPatch};

use crate::app::dto::{self, BatchListParams, ProductListParams, SetStockRequest};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/:id", get(get_product).put(update_product).delete(delete_product))
        .route("/:id/stock", put(set_stock))
        .route("/:id/recalculate", post(recalculate_stock))
        .route("/:id/batches", get(list_batches))
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    params: Result<Query<ProductListParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require(&principal, &[Permission::PRODUCTS_READ])?;
    let page = services.catalog.list_products(dto::query(params)?.into()).await?;
    Ok(Json(page))
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    payload: Result<Json<NewProduct>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require(&principal, &[Permission::PRODUCTS_WRITE])?;
    let product = services.catalog.create_product(dto::body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require(&principal, &[Permission::PRODUCTS_READ])?;
    let view = services.catalog.get_product(dto::parse_id::<ProductId>(&id)?).await?;
    Ok(Json(view))
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    payload: Result<Json<ProductPatch>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require(&principal, &[Permission::PRODUCTS_WRITE])?;
    let id = dto::parse_id::<ProductId>(&id)?;
    let product = services.catalog.update_product(id, dto::body(payload)?).await?;
    Ok(Json(product))
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    authz::require(&principal, &[Permission::PRODUCTS_DELETE])?;
    services.catalog.delete_product(dto::parse_id::<ProductId>(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    payload: Result<Json<SetStockRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require(&principal, &[Permission::PRODUCTS_WRITE])?;
    let id = dto::parse_id::<ProductId>(&id)?;
    let SetStockRequest { current_stock } = dto::body(payload)?;
    let product = services.catalog.set_stock(id, current_stock).await?;
    Ok(Json(product))
}

pub async fn recalculate_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require(&principal, &[Permission::PRODUCTS_WRITE])?;
    let product = services.catalog.recalculate_stock(dto::parse_id::<ProductId>(&id)?).await?;
    Ok(Json(product))
}

/// FEFO order; expired batches only with `includeExpired=true`.
pub async fn list_batches(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    params: Result<Query<BatchListParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require(&principal, &[Permission::BATCHES_READ])?;
    let id = dto::parse_id::<ProductId>(&id)?;
    let batches = services.catalog.list_batches(id, dto::query(params)?.into()).await?;
    Ok(Json(batches))
}
