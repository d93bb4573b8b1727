//! Runtime-selected store backend.

use async_trait::async_trait;

use super::in_memory::{InMemoryStore, InMemoryTransaction};
#[cfg(feature = "postgres")]
use super::postgres::{PostgresStore, PostgresTransaction};
use super::{Document, DocumentStore, StoreError, Transaction};

/// Either backend, chosen at startup from configuration.
#[derive(Debug, Clone)]
pub enum AnyStore {
    Memory(InMemoryStore),
    #[cfg(feature = "postgres")]
    Postgres(PostgresStore),
}

impl AnyStore {
    pub fn backend(&self) -> &'static str {
        match self {
            AnyStore::Memory(_) => "memory",
            #[cfg(feature = "postgres")]
            AnyStore::Postgres(_) => "postgres",
        }
    }
}

impl From<InMemoryStore> for AnyStore {
    fn from(store: InMemoryStore) -> Self {
        AnyStore::Memory(store)
    }
}

#[cfg(feature = "postgres")]
impl From<PostgresStore> for AnyStore {
    fn from(store: PostgresStore) -> Self {
        AnyStore::Postgres(store)
    }
}

#[derive(Debug)]
pub enum AnyTransaction {
    Memory(InMemoryTransaction),
    #[cfg(feature = "postgres")]
    Postgres(PostgresTransaction),
}

#[async_trait]
impl DocumentStore for AnyStore {
    type Tx = AnyTransaction;

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        match self {
            AnyStore::Memory(s) => Ok(AnyTransaction::Memory(s.begin().await?)),
            #[cfg(feature = "postgres")]
            AnyStore::Postgres(s) => Ok(AnyTransaction::Postgres(s.begin().await?)),
        }
    }
}

macro_rules! delegate {
    ($self:ident, $tx:ident => $call:expr) => {
        match $self {
            AnyTransaction::Memory($tx) => $call,
            #[cfg(feature = "postgres")]
            AnyTransaction::Postgres($tx) => $call,
        }
    };
}

#[async_trait]
impl Transaction for AnyTransaction {
    async fn get<D: Document>(&mut self, id: D::Id) -> Result<Option<D>, StoreError> {
        delegate!(self, tx => tx.get::<D>(id).await)
    }

    async fn list<D: Document>(&mut self) -> Result<Vec<D>, StoreError> {
        delegate!(self, tx => tx.list::<D>().await)
    }

    async fn find_by<D: Document>(&mut self, field: &str, value: &str) -> Result<Vec<D>, StoreError> {
        delegate!(self, tx => tx.find_by::<D>(field, value).await)
    }

    async fn insert<D: Document>(&mut self, doc: &D) -> Result<(), StoreError> {
        delegate!(self, tx => tx.insert(doc).await)
    }

    async fn update<D: Document>(&mut self, doc: &D) -> Result<(), StoreError> {
        delegate!(self, tx => tx.update(doc).await)
    }

    async fn delete<D: Document>(&mut self, id: D::Id) -> Result<bool, StoreError> {
        delegate!(self, tx => tx.delete::<D>(id).await)
    }

    async fn next_sequence(&mut self, key: &str) -> Result<u32, StoreError> {
        delegate!(self, tx => tx.next_sequence(key).await)
    }

    async fn commit(self) -> Result<(), StoreError> {
        delegate!(self, tx => tx.commit().await)
    }

    async fn rollback(self) -> Result<(), StoreError> {
        delegate!(self, tx => tx.rollback().await)
    }
}
