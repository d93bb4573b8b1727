use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, rejection::{JsonRejection, QueryRejection}},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use wholesale_auth::Permission;
use wholesale_core::SupplierId;
use wholesale_parties::{NewSupplier, SupplierPatch};

use crate::app::dto::{self, PartyListParams};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_suppliers).post(create_supplier))
        .route("/:id", get(get_supplier).put(update_supplier).delete(delete_supplier))
}

pub async fn list_suppliers(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    params: Result<Query<PartyListParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require(&principal, &[Permission::PARTIES_READ])?;
    let page = services.parties.list_suppliers(dto::query(params)?.into()).await?;
    Ok(Json(page))
}

pub async fn create_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    payload: Result<Json<NewSupplier>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require(&principal, &[Permission::PARTIES_WRITE])?;
    let supplier = services.parties.create_supplier(dto::body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

pub async fn get_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require(&principal, &[Permission::PARTIES_READ])?;
    let supplier = services.parties.get_supplier(dto::parse_id::<SupplierId>(&id)?).await?;
    Ok(Json(supplier))
}

pub async fn update_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    payload: Result<Json<SupplierPatch>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require(&principal, &[Permission::PARTIES_WRITE])?;
    let id = dto::parse_id::<SupplierId>(&id)?;
    let supplier = services.parties.update_supplier(id, dto::body(payload)?).await?;
    Ok(Json(supplier))
}

pub async fn delete_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    authz::require(&principal, &[Permission::PARTIES_DELETE])?;
    services.parties.delete_supplier(dto::parse_id::<SupplierId>(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
