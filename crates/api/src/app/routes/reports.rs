use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query, rejection::QueryRejection},
    response::IntoResponse,
    routing::get,
};

use wholesale_auth::Permission;

use crate::app::dto::{self, LowStockParams, NearExpiryParams, SalesParams};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/inventory", get(inventory_summary))
        .route("/low-stock", get(low_stock))
        .route("/near-expiry", get(near_expiry))
        .route("/expired", get(expired))
        .route("/sales", get(sales))
        .route("/top-products", get(top_products))
}

pub async fn inventory_summary(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require(&principal, &[Permission::REPORTS_READ])?;
    Ok(Json(services.reports.inventory_summary().await?))
}

pub async fn low_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    params: Result<Query<LowStockParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require(&principal, &[Permission::REPORTS_READ])?;
    let params = dto::query(params)?;
    let report = services
        .reports
        .low_stock(params.threshold, params.sort_by.unwrap_or_default())
        .await?;
    Ok(Json(report))
}

pub async fn near_expiry(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    params: Result<Query<NearExpiryParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require(&principal, &[Permission::REPORTS_READ])?;
    let params = dto::query(params)?;
    let report = services
        .reports
        .near_expiry(params.days, params.sort_by.unwrap_or_default())
        .await?;
    Ok(Json(report))
}

pub async fn expired(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require(&principal, &[Permission::REPORTS_READ])?;
    Ok(Json(services.reports.expired().await?))
}

pub async fn sales(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    params: Result<Query<SalesParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require(&principal, &[Permission::REPORTS_SALES])?;
    let params = dto::query(params)?;
    let report = services
        .reports
        .sales(params.range()?, params.group_by.unwrap_or_default())
        .await?;
    Ok(Json(report))
}

pub async fn top_products(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    params: Result<Query<SalesParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require(&principal, &[Permission::REPORTS_SALES])?;
    let params = dto::query(params)?;
    let report = services.reports.top_products(params.range()?, params.limit).await?;
    Ok(Json(report))
}
