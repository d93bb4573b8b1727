//! Consistent JSON error responses: `{"error": <code>, "message": <text>, ...}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Map, Value, json};

use wholesale_auth::{AuthzError, JwtError};
use wholesale_core::DomainError;
use wholesale_infra::{ServiceError, StoreError};

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    details: Map<String, Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            details: Map::new(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = self.details;
        body.insert("error".into(), json!(self.code));
        body.insert("message".into(), json!(self.message));
        (self.status, axum::Json(Value::Object(body))).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let message = err.to_string();
        let code = err.code();
        match err {
            DomainError::NotFound { entity, id } => {
                Self::new(StatusCode::NOT_FOUND, code, message).with("entity", entity).with("id", id)
            }
            DomainError::Validation { field, .. } => {
                Self::new(StatusCode::BAD_REQUEST, code, message).with("field", field)
            }
            DomainError::DuplicateKey { field, value } => {
                Self::new(StatusCode::CONFLICT, code, message).with("field", field).with("value", value)
            }
            DomainError::InsufficientStock {
                product,
                available,
                requested,
            } => Self::new(StatusCode::CONFLICT, code, message)
                .with("product", product)
                .with("available", available)
                .with("requested", requested),
            DomainError::InvalidState(_) | DomainError::Conflict(_) => Self::new(StatusCode::CONFLICT, code, message),
            DomainError::InvalidTransition { from, to } => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, code, message).with("from", from).with("to", to)
            }
            DomainError::Unauthorized => Self::new(StatusCode::UNAUTHORIZED, code, message),
            DomainError::Forbidden(_) => Self::new(StatusCode::FORBIDDEN, code, message),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Domain(e) => e.into(),
            ServiceError::Store(StoreError::Unavailable(msg)) => {
                tracing::error!(error = %msg, "store unavailable");
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", "store unavailable")
            }
            ServiceError::Store(e) => {
                tracing::error!(error = %e, "store failure");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error")
            }
        }
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        tracing::error!(error = %err, "token issuing failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error")
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        Self::new(StatusCode::FORBIDDEN, "forbidden", err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let cases = [
            (DomainError::not_found("product", "x"), StatusCode::NOT_FOUND),
            (DomainError::validation("price", "bad"), StatusCode::BAD_REQUEST),
            (DomainError::duplicate("sku", "RICE"), StatusCode::CONFLICT),
            (DomainError::insufficient_stock("Rice", 1, 2), StatusCode::CONFLICT),
            (DomainError::invalid_state("locked"), StatusCode::CONFLICT),
            (DomainError::invalid_transition("Delivered", "Pending"), StatusCode::UNPROCESSABLE_ENTITY),
            (DomainError::conflict("retry"), StatusCode::CONFLICT),
            (DomainError::Unauthorized, StatusCode::UNAUTHORIZED),
            (DomainError::Forbidden("no".into()), StatusCode::FORBIDDEN),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn insufficient_stock_carries_quantities() {
        let err = ApiError::from(DomainError::insufficient_stock("Rice", 3, 5));
        assert_eq!(err.code, "insufficient_stock");
        assert_eq!(err.details["available"], 3);
        assert_eq!(err.details["requested"], 5);
    }

    #[test]
    fn unavailable_store_is_503() {
        let err = ApiError::from(ServiceError::from(StoreError::Unavailable("pool timed out".into())));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
