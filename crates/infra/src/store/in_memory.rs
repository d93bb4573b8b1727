use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{Document, DocumentStore, StoreError, Transaction};

type UniqueKey = (&'static str, &'static str, String);

#[derive(Debug, Clone)]
struct Stored {
    body: Value,
    keys: Vec<(&'static str, String)>,
}

#[derive(Debug, Default)]
struct State {
    collections: HashMap<&'static str, BTreeMap<String, Stored>>,
    unique: HashMap<UniqueKey, String>,
    sequences: HashMap<String, u32>,
}

impl State {
    fn ensure_unique(&self, collection: &'static str, id: &str, keys: &[(&'static str, String)]) -> Result<(), StoreError> {
        for (field, value) in keys {
            match self.unique.get(&(collection, *field, value.clone())) {
                Some(owner) if owner != id => {
                    return Err(StoreError::DuplicateKey {
                        collection,
                        field: *field,
                        value: value.clone(),
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Replace (or remove) a document and keep the unique index in step.
    /// Returns the previous document.
    fn put(&mut self, collection: &'static str, id: &str, doc: Option<Stored>) -> Option<Stored> {
        let docs = self.collections.entry(collection).or_default();
        let previous = match &doc {
            Some(doc) => docs.insert(id.to_string(), doc.clone()),
            None => docs.remove(id),
        };

        if let Some(prev) = &previous {
            for (field, value) in &prev.keys {
                self.unique.remove(&(collection, *field, value.clone()));
            }
        }
        if let Some(doc) = &doc {
            for (field, value) in &doc.keys {
                self.unique.insert((collection, *field, value.clone()), id.to_string());
            }
        }
        previous
    }

    fn docs(&self, collection: &'static str) -> impl Iterator<Item = &Stored> {
        self.collections.get(collection).into_iter().flat_map(|docs| docs.values())
    }
}

#[derive(Debug)]
enum Undo {
    Put {
        collection: &'static str,
        id: String,
        previous: Option<Stored>,
    },
    Seq {
        key: String,
        previous: Option<u32>,
    },
}

/// In-memory document store.
///
/// A transaction holds the whole store exclusively until it commits or is
/// dropped, so transactions are trivially serializable. Writes are applied in
/// place and undone from a log on rollback.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    type Tx = InMemoryTransaction;

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        Ok(InMemoryTransaction {
            guard,
            undo: Vec::new(),
            committed: false,
        })
    }
}

pub struct InMemoryTransaction {
    guard: OwnedMutexGuard<State>,
    undo: Vec<Undo>,
    committed: bool,
}

impl std::fmt::Debug for InMemoryTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryTransaction")
            .field("pending_writes", &self.undo.len())
            .field("committed", &self.committed)
            .finish()
    }
}

impl InMemoryTransaction {
    fn write<D: Document>(&mut self, doc: &D, must_exist: bool) -> Result<(), StoreError> {
        let id = doc.id().to_string();
        let exists = self
            .guard
            .collections
            .get(D::COLLECTION)
            .is_some_and(|docs| docs.contains_key(&id));
        match (must_exist, exists) {
            (true, false) => {
                return Err(StoreError::NotFound {
                    collection: D::COLLECTION,
                    id,
                });
            }
            (false, true) => {
                return Err(StoreError::Conflict(format!("{} {id} already exists", D::COLLECTION)));
            }
            _ => {}
        }

        let keys = doc.unique_keys();
        self.guard.ensure_unique(D::COLLECTION, &id, &keys)?;
        let stored = Stored {
            body: serde_json::to_value(doc)?,
            keys,
        };
        let previous = self.guard.put(D::COLLECTION, &id, Some(stored));
        self.undo.push(Undo::Put {
            collection: D::COLLECTION,
            id,
            previous,
        });
        Ok(())
    }

    fn undo_all(&mut self) {
        while let Some(entry) = self.undo.pop() {
            match entry {
                Undo::Put {
                    collection,
                    id,
                    previous,
                } => {
                    self.guard.put(collection, &id, previous);
                }
                Undo::Seq { key, previous } => match previous {
                    Some(value) => {
                        self.guard.sequences.insert(key, value);
                    }
                    None => {
                        self.guard.sequences.remove(&key);
                    }
                },
            }
        }
    }
}

fn decode<D: Document>(stored: &Stored) -> Result<D, StoreError> {
    Ok(serde_json::from_value(stored.body.clone())?)
}

#[async_trait]
impl Transaction for InMemoryTransaction {
    async fn get<D: Document>(&mut self, id: D::Id) -> Result<Option<D>, StoreError> {
        self.guard
            .collections
            .get(D::COLLECTION)
            .and_then(|docs| docs.get(&id.to_string()))
            .map(decode::<D>)
            .transpose()
    }

    async fn list<D: Document>(&mut self) -> Result<Vec<D>, StoreError> {
        self.guard.docs(D::COLLECTION).map(decode::<D>).collect()
    }

    async fn find_by<D: Document>(&mut self, field: &str, value: &str) -> Result<Vec<D>, StoreError> {
        self.guard
            .docs(D::COLLECTION)
            .filter(|s| s.body.get(field).and_then(Value::as_str) == Some(value))
            .map(decode::<D>)
            .collect()
    }

    async fn insert<D: Document>(&mut self, doc: &D) -> Result<(), StoreError> {
        self.write(doc, false)
    }

    async fn update<D: Document>(&mut self, doc: &D) -> Result<(), StoreError> {
        self.write(doc, true)
    }

    async fn delete<D: Document>(&mut self, id: D::Id) -> Result<bool, StoreError> {
        let id = id.to_string();
        let previous = self.guard.put(D::COLLECTION, &id, None);
        let removed = previous.is_some();
        if removed {
            self.undo.push(Undo::Put {
                collection: D::COLLECTION,
                id,
                previous,
            });
        }
        Ok(removed)
    }

    async fn next_sequence(&mut self, key: &str) -> Result<u32, StoreError> {
        let previous = self.guard.sequences.get(key).copied();
        let next = previous
            .unwrap_or(0)
            .checked_add(1)
            .ok_or_else(|| StoreError::Backend(format!("sequence {key} exhausted")))?;
        self.guard.sequences.insert(key.to_string(), next);
        self.undo.push(Undo::Seq {
            key: key.to_string(),
            previous,
        });
        Ok(next)
    }

    async fn commit(mut self) -> Result<(), StoreError> {
        self.committed = true;
        self.undo.clear();
        Ok(())
    }

    async fn rollback(mut self) -> Result<(), StoreError> {
        self.undo_all();
        self.committed = true;
        Ok(())
    }
}

impl Drop for InMemoryTransaction {
    fn drop(&mut self) {
        if !self.committed && !self.undo.is_empty() {
            tracing::debug!(writes = self.undo.len(), "rolling back uncommitted transaction");
            self.undo_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use wholesale_core::{Entity, ProductId};

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    struct Tag {
        id: ProductId,
        code: String,
        owner: String,
    }

    impl Entity for Tag {
        type Id = ProductId;

        fn id(&self) -> ProductId {
            self.id
        }
    }

    impl Document for Tag {
        const COLLECTION: &'static str = "tags";

        fn unique_keys(&self) -> Vec<(&'static str, String)> {
            vec![("code", self.code.clone())]
        }
    }

    fn tag(code: &str, owner: &str) -> Tag {
        Tag {
            id: ProductId::new(),
            code: code.into(),
            owner: owner.into(),
        }
    }

    #[tokio::test]
    async fn committed_writes_are_visible() {
        let store = InMemoryStore::new();
        let t = tag("A", "x");

        let mut tx = store.begin().await.unwrap();
        tx.insert(&t).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.get::<Tag>(t.id).await.unwrap(), Some(t));
        assert_eq!(tx.list::<Tag>().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn dropped_transaction_rolls_back() {
        let store = InMemoryStore::new();
        let t = tag("A", "x");

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert(&t).await.unwrap();
            assert_eq!(tx.next_sequence("s").await.unwrap(), 1);
        }

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.get::<Tag>(t.id).await.unwrap(), None);
        assert_eq!(tx.next_sequence("s").await.unwrap(), 1);
        // The unique key was released as well.
        tx.insert(&tag("A", "y")).await.unwrap();
    }

    #[tokio::test]
    async fn rollback_restores_previous_versions() {
        let store = InMemoryStore::new();
        let mut t = tag("A", "x");

        let mut tx = store.begin().await.unwrap();
        tx.insert(&t).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        t.owner = "changed".into();
        tx.update(&t).await.unwrap();
        assert!(tx.delete::<Tag>(t.id).await.unwrap());
        tx.rollback().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.get::<Tag>(t.id).await.unwrap().unwrap().owner, "x");
    }

    #[tokio::test]
    async fn unique_keys_are_enforced() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert(&tag("A", "x")).await.unwrap();

        let err = tx.insert(&tag("A", "y")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { field: "code", .. }));

        // Re-saving a document with its own key is fine; changing the key frees the old one.
        let mut b = tag("B", "y");
        tx.insert(&b).await.unwrap();
        tx.update(&b).await.unwrap();
        b.code = "C".into();
        tx.update(&b).await.unwrap();
        tx.insert(&tag("B", "z")).await.unwrap();
    }

    #[tokio::test]
    async fn update_of_missing_document_is_not_found() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let err = tx.update(&tag("A", "x")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { collection: "tags", .. }));
        assert!(!tx.delete::<Tag>(ProductId::new()).await.unwrap());
    }

    #[tokio::test]
    async fn find_by_matches_top_level_string_fields() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert(&tag("A", "x")).await.unwrap();
        tx.insert(&tag("B", "y")).await.unwrap();
        tx.insert(&tag("C", "x")).await.unwrap();

        let found = tx.find_by::<Tag>("owner", "x").await.unwrap();
        assert_eq!(found.len(), 2);
        assert!(tx.find_by::<Tag>("missing", "x").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sequences_are_per_key() {
        let store = InMemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.next_sequence("a").await.unwrap(), 1);
        assert_eq!(tx.next_sequence("a").await.unwrap(), 2);
        assert_eq!(tx.next_sequence("b").await.unwrap(), 1);
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.next_sequence("a").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn concurrent_transactions_are_serialized() {
        let store = InMemoryStore::new();
        let mut handles = Vec::new();
        for _ in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let mut tx = store.begin().await.unwrap();
                let n = tx.next_sequence("k").await.unwrap();
                tokio::task::yield_now().await;
                tx.commit().await.unwrap();
                n
            }));
        }

        let mut seen = Vec::new();
        for h in handles {
            seen.push(h.await.unwrap());
        }
        seen.sort_unstable();
        assert_eq!(seen, (1..=20).collect::<Vec<_>>());
    }
}
