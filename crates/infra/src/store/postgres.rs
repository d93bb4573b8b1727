//! Postgres-backed document store.
//!
//! Documents are stored as `jsonb` rows keyed by `(collection, id)`. Unique
//! keys live in a side table whose primary key is `(collection, field, value)`,
//! so a duplicate SKU or order number surfaces as a unique violation. Every
//! transaction runs at `SERIALIZABLE`.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (serialization failure / deadlock) | `40001` / `40P01` | `Conflict` |
//! | Database (unique violation on `document_keys`) | `23505` | `DuplicateKey` |
//! | Database (unique violation on `documents`) | `23505` | `Conflict` |
//! | PoolClosed / PoolTimedOut / Io | N/A | `Unavailable` |
//! | Other | Any other | `Backend` |

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Row};
use tracing::instrument;

use super::{Document, DocumentStore, StoreError, Transaction};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS documents (
        collection TEXT NOT NULL,
        id TEXT NOT NULL,
        body JSONB NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        PRIMARY KEY (collection, id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS document_keys (
        collection TEXT NOT NULL,
        field TEXT NOT NULL,
        value TEXT NOT NULL,
        id TEXT NOT NULL,
        PRIMARY KEY (collection, field, value)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS document_keys_owner ON document_keys (collection, id)",
    r#"
    CREATE TABLE IF NOT EXISTS sequences (
        key TEXT PRIMARY KEY,
        value INTEGER NOT NULL
    )
    "#,
];

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the tables if they do not exist.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PostgresStore {
    type Tx = PostgresTransaction;

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        let mut tx = self.pool.begin().await.map_err(|e| map_sqlx_error("begin", e))?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("begin", e))?;
        Ok(PostgresTransaction { tx })
    }
}

/// Rolled back by sqlx when dropped without `commit`.
#[derive(Debug)]
pub struct PostgresTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

impl PostgresTransaction {
    async fn insert_keys<D: Document>(&mut self, id: &str, doc: &D) -> Result<(), StoreError> {
        for (field, value) in doc.unique_keys() {
            sqlx::query("INSERT INTO document_keys (collection, field, value, id) VALUES ($1, $2, $3, $4)")
                .bind(D::COLLECTION)
                .bind(field)
                .bind(&value)
                .bind(id)
                .execute(&mut *self.tx)
                .await
                .map_err(|e| {
                    if is_unique_violation(&e) {
                        StoreError::DuplicateKey {
                            collection: D::COLLECTION,
                            field,
                            value: value.clone(),
                        }
                    } else {
                        map_sqlx_error("insert_keys", e)
                    }
                })?;
        }
        Ok(())
    }

    async fn drop_keys(&mut self, collection: &'static str, id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM document_keys WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("drop_keys", e))?;
        Ok(())
    }
}

fn decode_rows<D: Document>(rows: Vec<sqlx::postgres::PgRow>) -> Result<Vec<D>, StoreError> {
    rows.into_iter()
        .map(|row| {
            let body: Value = row.try_get("body").map_err(|e| map_sqlx_error("decode", e))?;
            Ok(serde_json::from_value(body)?)
        })
        .collect()
}

#[async_trait]
impl Transaction for PostgresTransaction {
    async fn get<D: Document>(&mut self, id: D::Id) -> Result<Option<D>, StoreError> {
        let row = sqlx::query("SELECT body FROM documents WHERE collection = $1 AND id = $2 FOR UPDATE")
            .bind(D::COLLECTION)
            .bind(id.to_string())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("get", e))?;
        Ok(decode_rows(row.into_iter().collect())?.pop())
    }

    async fn list<D: Document>(&mut self) -> Result<Vec<D>, StoreError> {
        let rows = sqlx::query("SELECT body FROM documents WHERE collection = $1 ORDER BY id")
            .bind(D::COLLECTION)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("list", e))?;
        decode_rows(rows)
    }

    async fn find_by<D: Document>(&mut self, field: &str, value: &str) -> Result<Vec<D>, StoreError> {
        let rows = sqlx::query("SELECT body FROM documents WHERE collection = $1 AND body->>$2 = $3 ORDER BY id")
            .bind(D::COLLECTION)
            .bind(field)
            .bind(value)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("find_by", e))?;
        decode_rows(rows)
    }

    async fn insert<D: Document>(&mut self, doc: &D) -> Result<(), StoreError> {
        let id = doc.id().to_string();
        sqlx::query("INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3)")
            .bind(D::COLLECTION)
            .bind(&id)
            .bind(serde_json::to_value(doc)?)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("insert", e))?;
        self.insert_keys(&id, doc).await
    }

    async fn update<D: Document>(&mut self, doc: &D) -> Result<(), StoreError> {
        let id = doc.id().to_string();
        let result = sqlx::query(
            "UPDATE documents SET body = $3, updated_at = now() WHERE collection = $1 AND id = $2",
        )
        .bind(D::COLLECTION)
        .bind(&id)
        .bind(serde_json::to_value(doc)?)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("update", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                collection: D::COLLECTION,
                id,
            });
        }
        self.drop_keys(D::COLLECTION, &id).await?;
        self.insert_keys(&id, doc).await
    }

    async fn delete<D: Document>(&mut self, id: D::Id) -> Result<bool, StoreError> {
        let id = id.to_string();
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(D::COLLECTION)
            .bind(&id)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;
        self.drop_keys(D::COLLECTION, &id).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn next_sequence(&mut self, key: &str) -> Result<u32, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO sequences (key, value) VALUES ($1, 1)
            ON CONFLICT (key) DO UPDATE SET value = sequences.value + 1
            RETURNING value
            "#,
        )
        .bind(key)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("next_sequence", e))?;
        let value: i32 = row.try_get("value").map_err(|e| map_sqlx_error("next_sequence", e))?;
        u32::try_from(value).map_err(|_| StoreError::Backend(format!("sequence {key} is negative")))
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await.map_err(|e| map_sqlx_error("commit", e))
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.tx.rollback().await.map_err(|e| map_sqlx_error("rollback", e))
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {operation}: {}", db_err.message());
            match db_err.code().as_deref() {
                Some("40001") | Some("40P01") => StoreError::Conflict(msg),
                // A second document with the same id.
                Some("23505") => StoreError::Conflict(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("connection pool unavailable in {operation}"))
        }
        sqlx::Error::Io(e) => StoreError::Unavailable(format!("io error in {operation}: {e}")),
        _ => StoreError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        return db_err.code().as_deref() == Some("23505");
    }
    false
}
