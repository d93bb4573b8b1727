//! Request DTOs (query strings and small bodies) and their mapping onto
//! service-level types.

use std::str::FromStr;

use axum::Json;
use axum::extract::Query;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;

use wholesale_auth::Role;
use wholesale_core::{CustomerId, DomainError};
use wholesale_infra::catalog::{BatchQuery, ProductQuery, ProductSort};
use wholesale_infra::orders::OrderQuery;
use wholesale_infra::parties::PartyQuery;
use wholesale_infra::query::{DEFAULT_PAGE_SIZE, PageRequest};
use wholesale_infra::reports::{DateRange, ExpirySort, LowStockSort, SalesGrouping};
use wholesale_infra::users::UserQuery;
use wholesale_sales::OrderStatus;

use crate::app::errors::ApiError;

/// Unwrap a JSON body, reporting malformed input as a 400.
pub fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(v)| v).map_err(|e| ApiError::bad_request(e.body_text()))
}

/// Unwrap a query string, reporting malformed input as a 400.
pub fn query<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    params.map(|Query(v)| v).map_err(|e| ApiError::bad_request(e.body_text()))
}

pub fn parse_id<T: FromStr<Err = DomainError>>(raw: &str) -> Result<T, ApiError> {
    Ok(raw.parse::<T>()?)
}

/// `YYYY-MM-DD` (midnight UTC) or RFC 3339.
fn parse_date(field: &str, raw: Option<&str>) -> Result<Option<DateTime<Utc>>, ApiError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(Some(date.and_time(NaiveTime::MIN).and_utc()));
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|d| Some(d.with_timezone(&Utc)))
        .map_err(|_| DomainError::validation(field, format!("invalid date '{raw}'")).into())
}

fn page(page: Option<u32>, limit: Option<u32>) -> PageRequest {
    PageRequest {
        page: page.unwrap_or(1),
        limit: limit.unwrap_or(DEFAULT_PAGE_SIZE),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListParams {
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<ProductSort>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl From<ProductListParams> for ProductQuery {
    fn from(p: ProductListParams) -> Self {
        Self {
            category: p.category,
            search: p.search,
            sort_by: p.sort_by.unwrap_or_default(),
            page: page(p.page, p.limit),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchListParams {
    pub include_expired: Option<bool>,
    pub near_expiry: Option<i64>,
}

impl From<BatchListParams> for BatchQuery {
    fn from(p: BatchListParams) -> Self {
        Self {
            include_expired: p.include_expired.unwrap_or(false),
            near_expiry_days: p.near_expiry,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyListParams {
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl From<PartyListParams> for PartyQuery {
    fn from(p: PartyListParams) -> Self {
        Self {
            search: p.search,
            page: page(p.page, p.limit),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListParams {
    pub role: Option<Role>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl From<UserListParams> for UserQuery {
    fn from(p: UserListParams) -> Self {
        Self {
            role: p.role,
            search: p.search,
            page: page(p.page, p.limit),
        }
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderListParams {
    pub status: Option<OrderStatus>,
    pub customer_id: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl TryFrom<OrderListParams> for OrderQuery {
    type Error = ApiError;

    fn try_from(p: OrderListParams) -> Result<Self, Self::Error> {
        Ok(Self {
            status: p.status,
            customer_id: p.customer_id.as_deref().map(parse_id::<CustomerId>).transpose()?,
            search: p.search,
            page: page(p.page, p.limit),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetStockRequest {
    pub current_stock: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LowStockParams {
    pub threshold: Option<u64>,
    pub sort_by: Option<LowStockSort>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearExpiryParams {
    pub days: Option<i64>,
    pub sort_by: Option<ExpirySort>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub group_by: Option<SalesGrouping>,
    pub limit: Option<usize>,
}

impl SalesParams {
    pub fn range(&self) -> Result<DateRange, ApiError> {
        Ok(DateRange {
            start: parse_date("startDate", self.start_date.as_deref())?,
            end: parse_date("endDate", self.end_date.as_deref())?,
        })
    }
}
