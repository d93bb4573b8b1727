use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query, rejection::{JsonRejection, QueryRejection}},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};

use wholesale_auth::Permission;
use wholesale_core::CustomerId;
use wholesale_parties::{CustomerPatch, NewCustomer};

use crate::app::dto::{self, PartyListParams};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route("/:id", get(get_customer).put(update_customer).delete(delete_customer))
}

pub async fn list_customers(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    params: Result<Query<PartyListParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require(&principal, &[Permission::PARTIES_READ])?;
    let page = services.parties.list_customers(dto::query(params)?.into()).await?;
    Ok(Json(page))
}

pub async fn create_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    payload: Result<Json<NewCustomer>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require(&principal, &[Permission::CUSTOMERS_CREATE])?;
    let customer = services.parties.create_customer(dto::body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn get_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require(&principal, &[Permission::PARTIES_READ])?;
    let customer = services.parties.get_customer(dto::parse_id::<CustomerId>(&id)?).await?;
    Ok(Json(customer))
}

pub async fn update_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    payload: Result<Json<CustomerPatch>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    authz::require(&principal, &[Permission::PARTIES_WRITE])?;
    let id = dto::parse_id::<CustomerId>(&id)?;
    let customer = services.parties.update_customer(id, dto::body(payload)?).await?;
    Ok(Json(customer))
}

pub async fn delete_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    authz::require(&principal, &[Permission::PARTIES_DELETE])?;
    services.parties.delete_customer(dto::parse_id::<CustomerId>(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
