//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants, conflicts). Infrastructure concerns belong elsewhere.
///
/// Every variant carries enough context to be rendered to a user directly:
/// the offending field, the available vs. requested quantities, or the
/// current vs. requested status.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Malformed or out-of-range input.
    #[error("validation failed on {field}: {message}")]
    Validation { field: String, message: String },

    /// A unique constraint would be violated (SKU, batch number, email, ...).
    #[error("{field} '{value}' already exists")]
    DuplicateKey { field: String, value: String },

    /// Requested quantity exceeds what is available.
    #[error("insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: u64,
        requested: u64,
    },

    /// Operation not allowed in the entity's current state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Illegal lifecycle status change.
    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// A concurrent writer won (e.g. serialization failure in the store).
    #[error("conflict: {0}")]
    Conflict(String),

    /// No authenticated principal.
    #[error("unauthorized")]
    Unauthorized,

    /// Authenticated, but not allowed to perform the operation.
    #[error("forbidden: {0}")]
    Forbidden(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::DuplicateKey {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn insufficient_stock(product: impl Into<String>, available: u64, requested: u64) -> Self {
        Self::InsufficientStock {
            product: product.into(),
            available,
            requested,
        }
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn invalid_transition(from: impl ToString, to: impl ToString) -> Self {
        Self::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Stable machine-readable code, used by the HTTP layer.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Validation { .. } => "validation_failed",
            Self::DuplicateKey { .. } => "duplicate_key",
            Self::InsufficientStock { .. } => "insufficient_stock",
            Self::InvalidState(_) => "invalid_state",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::Conflict(_) => "conflict",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden(_) => "forbidden",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_stock_message_carries_both_quantities() {
        let err = DomainError::insufficient_stock("Basmati Rice", 4, 7);
        assert_eq!(
            err.to_string(),
            "insufficient stock for Basmati Rice: available 4, requested 7"
        );
    }

    #[test]
    fn invalid_transition_message_names_both_states() {
        let err = DomainError::invalid_transition("Delivered", "Confirmed");
        assert_eq!(
            err.to_string(),
            "invalid status transition from Delivered to Confirmed"
        );
        assert_eq!(err.code(), "invalid_transition");
    }
}
