use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, rejection::{JsonRejection, QueryRejection}},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};

use wholesale_auth::Permission;
use wholesale_core::OrderId;
use wholesale_sales::{CreateOrderRequest, UpdateOrderRequest, UpdateStatusRequest};

use crate::app::dto::{self, OrderListParams};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/:id", get(get_order).put(update_order).delete(delete_order))
        .route("/:id/status", patch(update_status))
        .route("/:id/invoice", get(invoice))
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    params: Result<Query<OrderListParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require(&principal, &[Permission::ORDERS_READ])?;
    let page = services.orders.list(dto::query(params)?.try_into()?).await?;
    Ok(Json(page))
}

/// Reserves stock for every line and allocates the next order number for today.
pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require(&principal, &[Permission::ORDERS_CREATE])?;
    let order = services.orders.create(dto::body(payload)?, principal.user_id()).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require(&principal, &[Permission::ORDERS_READ])?;
    let order = services.orders.get(dto::parse_id::<OrderId>(&id)?).await?;
    Ok(Json(order))
}

/// Only pending orders can be edited.
pub async fn update_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateOrderRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require(&principal, &[Permission::ORDERS_UPDATE])?;
    let id = dto::parse_id::<OrderId>(&id)?;
    let order = services.orders.update(id, dto::body(payload)?).await?;
    Ok(Json(order))
}

pub async fn delete_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    authz::require(&principal, &[Permission::ORDERS_DELETE])?;
    services.orders.delete(dto::parse_id::<OrderId>(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require(&principal, &[Permission::ORDERS_UPDATE])?;
    let id = dto::parse_id::<OrderId>(&id)?;
    let UpdateStatusRequest { status } = dto::body(payload)?;
    let order = services.orders.update_status(id, status).await?;
    Ok(Json(order))
}

pub async fn invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require(&principal, &[Permission::ORDERS_READ])?;
    let invoice = services.orders.invoice(dto::parse_id::<OrderId>(&id)?).await?;
    Ok(Json(invoice))
}
