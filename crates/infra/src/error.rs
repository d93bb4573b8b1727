//! Service-layer error: domain failures plus store failures.

use thiserror::Error;

use wholesale_core::DomainError;

use crate::store::StoreError;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Infrastructure failure with no domain meaning (serialization, pool, backend).
    #[error(transparent)]
    Store(StoreError),
}

impl ServiceError {
    pub fn domain(&self) -> Option<&DomainError> {
        match self {
            ServiceError::Domain(e) => Some(e),
            ServiceError::Store(_) => None,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateKey { field, value, .. } => DomainError::duplicate(field, value).into(),
            StoreError::Conflict(msg) => DomainError::conflict(msg).into(),
            StoreError::NotFound { collection, id } => DomainError::not_found(entity_name(collection), id).into(),
            other => ServiceError::Store(other),
        }
    }
}

fn entity_name(collection: &'static str) -> &'static str {
    match collection {
        "products" => "product",
        "batches" => "batch",
        "customers" => "customer",
        "suppliers" => "supplier",
        "orders" => "order",
        other => other,
    }
}
