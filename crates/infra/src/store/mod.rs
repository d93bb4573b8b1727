//! Transactional document store.
//!
//! Every entity is persisted as a JSON document in a named collection, keyed by
//! its id. A document may declare unique keys (SKU, email, order number, ...)
//! which the store enforces on insert/update. All reads and writes go through a
//! [`Transaction`]; a transaction that is dropped without `commit` is rolled
//! back.
//!
//! Implementations:
//! - [`InMemoryStore`]: one exclusive lock per transaction (serializable)
//! - `PostgresStore` (feature `postgres`): `SERIALIZABLE` isolation

mod any;
mod documents;
mod in_memory;
#[cfg(feature = "postgres")]
mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use wholesale_core::Entity;

pub use any::{AnyStore, AnyTransaction};
pub use in_memory::{InMemoryStore, InMemoryTransaction};
#[cfg(feature = "postgres")]
pub use postgres::{PostgresStore, PostgresTransaction};

/// A persistable entity.
pub trait Document:
    Entity<Id: Send + Sync> + Clone + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Collection name.
    const COLLECTION: &'static str;

    /// `(field, value)` pairs that must be unique within the collection.
    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{field} '{value}' already exists in {collection}")]
    DuplicateKey {
        collection: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("{collection} document not found: {id}")]
    NotFound { collection: &'static str, id: String },

    /// Concurrent transactions could not be serialized.
    #[error("write conflict: {0}")]
    Conflict(String),

    #[error("document serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store error: {0}")]
    Backend(String),
}

/// A unit of work over the store.
///
/// `find_by` matches documents whose top-level JSON field `field` is the
/// string `value` (e.g. `("productId", "<uuid>")`).
#[async_trait]
pub trait Transaction: Send {
    async fn get<D: Document>(&mut self, id: D::Id) -> Result<Option<D>, StoreError>;

    /// All documents of a collection, ordered by id.
    async fn list<D: Document>(&mut self) -> Result<Vec<D>, StoreError>;

    async fn find_by<D: Document>(&mut self, field: &str, value: &str) -> Result<Vec<D>, StoreError>;

    async fn insert<D: Document>(&mut self, doc: &D) -> Result<(), StoreError>;

    /// Replace an existing document. Fails with `NotFound` if absent.
    async fn update<D: Document>(&mut self, doc: &D) -> Result<(), StoreError>;

    /// Returns whether a document was removed.
    async fn delete<D: Document>(&mut self, id: D::Id) -> Result<bool, StoreError>;

    /// Increment and return the named counter (first value is 1).
    async fn next_sequence(&mut self, key: &str) -> Result<u32, StoreError>;

    async fn commit(self) -> Result<(), StoreError>;

    async fn rollback(self) -> Result<(), StoreError>;
}

#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    type Tx: Transaction + 'static;

    async fn begin(&self) -> Result<Self::Tx, StoreError>;
}

#[async_trait]
impl<S> DocumentStore for Arc<S>
where
    S: DocumentStore + ?Sized,
{
    type Tx = S::Tx;

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        (**self).begin().await
    }
}

/// Fetch a document or fail with `NotFound`.
pub async fn require<D: Document, T: Transaction>(tx: &mut T, id: D::Id) -> Result<D, StoreError> {
    tx.get::<D>(id).await?.ok_or_else(|| StoreError::NotFound {
        collection: D::COLLECTION,
        id: id.to_string(),
    })
}
