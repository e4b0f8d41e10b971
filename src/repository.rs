use crate::models::{Document, Fields};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{FromRow, PgPool, query_builder::QueryBuilder, types::Json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use uuid::Uuid;

/// StoreError
///
/// Failures of the document store itself. Callers never see the detail; the API layer
/// maps every variant to a generic internal error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document store query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("document store unavailable: {0}")]
    Unavailable(String),
}

/// FieldFilter
///
/// A single equality predicate on one string field. Matching is exact and
/// case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    pub field: String,
    pub value: String,
}

impl FieldFilter {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    fn matches(&self, fields: &Fields) -> bool {
        matches!(fields.get(&self.field), Some(Value::String(v)) if *v == self.value)
    }
}

/// DocumentStore Trait
///
/// Per-document CRUD over named, schema-loose collections. Each call is atomic for the
/// one document it touches; nothing spans documents.
///
/// **Send + Sync + async_trait** keep `Arc<dyn DocumentStore>` usable across Axum's
/// task boundaries.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents in `collection`, newest `created_at` first. Documents sharing a
    /// timestamp come back most-recently-inserted first.
    async fn list(
        &self,
        collection: &str,
        filter: Option<&FieldFilter>,
    ) -> Result<Vec<Document>, StoreError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Inserts a new document under a store-assigned id.
    async fn insert(
        &self,
        collection: &str,
        fields: Fields,
        created_at: DateTime<Utc>,
    ) -> Result<Document, StoreError>;

    /// Shallow-merges `fields` into an existing document. Returns `None`, writing
    /// nothing, when the id does not exist.
    async fn merge(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<Option<Document>, StoreError>;

    /// Hard delete. Returns whether a document was removed.
    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError>;
}

/// DocumentStoreState
///
/// The concrete type used to share the persistence layer across the application state.
pub type DocumentStoreState = Arc<dyn DocumentStore>;

fn new_document_id() -> String {
    Uuid::new_v4().simple().to_string()
}

// --- Postgres ---

/// PostgresDocumentStore
///
/// Keeps every collection in one `documents` table with the body in a JSONB column.
/// `seq` breaks ties between documents created in the same instant.
pub struct PostgresDocumentStore {
    pool: PgPool,
}

#[derive(FromRow)]
struct DocumentRow {
    id: String,
    data: Json<Fields>,
    created_at: DateTime<Utc>,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Document {
            id: row.id,
            created_at: row.created_at,
            fields: row.data.0,
        }
    }
}

impl PostgresDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// ensure_schema
    ///
    /// Creates the `documents` table and its listing index if they are missing.
    /// Safe to call on every startup.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                seq         BIGSERIAL,
                collection  TEXT        NOT NULL,
                id          TEXT        NOT NULL,
                data        JSONB       NOT NULL DEFAULT '{}'::jsonb,
                created_at  TIMESTAMPTZ NOT NULL,
                PRIMARY KEY (collection, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS documents_listing_idx
                ON documents (collection, created_at DESC, seq DESC)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn list(
        &self,
        collection: &str,
        filter: Option<&FieldFilter>,
    ) -> Result<Vec<Document>, StoreError> {
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new("SELECT id, data, created_at FROM documents WHERE collection = ");
        builder.push_bind(collection);

        if let Some(filter) = filter {
            // Compare as JSON so a numeric 5 never matches the string "5".
            builder.push(" AND data -> ");
            builder.push_bind(filter.field.as_str());
            builder.push(" = to_jsonb(");
            builder.push_bind(filter.value.as_str());
            builder.push("::text)");
        }

        builder.push(" ORDER BY created_at DESC, seq DESC");

        let rows = builder
            .build_query_as::<DocumentRow>()
            .fetch_all(&self.pool)
            .await
            .inspect_err(|e| tracing::error!(collection, "list error: {:?}", e))?;

        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            "SELECT id, data, created_at FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| tracing::error!(collection, id, "get error: {:?}", e))?;

        Ok(row.map(Document::from))
    }

    async fn insert(
        &self,
        collection: &str,
        fields: Fields,
        created_at: DateTime<Utc>,
    ) -> Result<Document, StoreError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            INSERT INTO documents (collection, id, data, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, data, created_at
            "#,
        )
        .bind(collection)
        .bind(new_document_id())
        .bind(Json(fields))
        .bind(created_at)
        .fetch_one(&self.pool)
        .await
        .inspect_err(|e| tracing::error!(collection, "insert error: {:?}", e))?;

        Ok(row.into())
    }

    /// merge
    ///
    /// Uses the JSONB `||` operator, so keys absent from `fields` keep their values.
    async fn merge(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r#"
            UPDATE documents
            SET data = data || $3
            WHERE collection = $1 AND id = $2
            RETURNING id, data, created_at
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(Json(fields))
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| tracing::error!(collection, id, "merge error: {:?}", e))?;

        Ok(row.map(Document::from))
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await
            .inspect_err(|e| tracing::error!(collection, id, "delete error: {:?}", e))?;

        Ok(result.rows_affected() > 0)
    }
}

// --- In-Memory ---

#[derive(Default)]
struct Collections {
    next_seq: u64,
    // collection -> (id -> (seq, document))
    docs: HashMap<String, HashMap<String, (u64, Document)>>,
}

/// InMemoryDocumentStore
///
/// A process-local `DocumentStore` used by the test suite and by local runs without
/// `DATABASE_URL`. Ordering and merge semantics match `PostgresDocumentStore`.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    inner: Mutex<Collections>,
    /// When true, every operation fails with `StoreError::Unavailable`.
    pub should_fail: bool,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Total documents held in `collection`.
    pub fn count(&self, collection: &str) -> usize {
        self.inner
            .lock()
            .map(|c| c.docs.get(collection).map_or(0, HashMap::len))
            .unwrap_or(0)
    }

    fn with_collections<T>(
        &self,
        f: impl FnOnce(&mut Collections) -> T,
    ) -> Result<T, StoreError> {
        if self.should_fail {
            return Err(StoreError::Unavailable(
                "simulated outage: connection refused".to_string(),
            ));
        }
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".to_string()))?;
        Ok(f(&mut guard))
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn list(
        &self,
        collection: &str,
        filter: Option<&FieldFilter>,
    ) -> Result<Vec<Document>, StoreError> {
        self.with_collections(|c| {
            let mut hits: Vec<&(u64, Document)> = c
                .docs
                .get(collection)
                .map(|docs| {
                    docs.values()
                        .filter(|(_, doc)| filter.is_none_or(|f| f.matches(&doc.fields)))
                        .collect()
                })
                .unwrap_or_default();

            hits.sort_by(|(seq_a, a), (seq_b, b)| {
                b.created_at.cmp(&a.created_at).then(seq_b.cmp(seq_a))
            });

            hits.into_iter().map(|(_, doc)| doc.clone()).collect()
        })
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.with_collections(|c| {
            c.docs
                .get(collection)
                .and_then(|docs| docs.get(id))
                .map(|(_, doc)| doc.clone())
        })
    }

    async fn insert(
        &self,
        collection: &str,
        fields: Fields,
        created_at: DateTime<Utc>,
    ) -> Result<Document, StoreError> {
        self.with_collections(|c| {
            c.next_seq += 1;
            let seq = c.next_seq;
            let doc = Document {
                id: new_document_id(),
                created_at,
                fields,
            };
            c.docs
                .entry(collection.to_string())
                .or_default()
                .insert(doc.id.clone(), (seq, doc.clone()));
            doc
        })
    }

    async fn merge(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<Option<Document>, StoreError> {
        self.with_collections(|c| {
            let (_, doc) = c.docs.get_mut(collection)?.get_mut(id)?;
            doc.fields.extend(fields);
            Some(doc.clone())
        })
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        self.with_collections(|c| {
            c.docs
                .get_mut(collection)
                .is_some_and(|docs| docs.remove(id).is_some())
        })
    }
}
