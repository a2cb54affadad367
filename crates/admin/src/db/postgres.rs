//! `PostgreSQL` document store.
//!
//! All collections share the `admin.documents` table, keyed by
//! `(collection, id)` with the document body in a JSONB `data` column.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use super::{Collection, Document, DocumentStore, Fields, Query, StoreError, Transaction};

#[derive(Debug, sqlx::FromRow)]
struct DocumentRow {
    id: String,
    data: Value,
}

impl TryFrom<DocumentRow> for Document {
    type Error = StoreError;

    fn try_from(row: DocumentRow) -> Result<Self, Self::Error> {
        match row.data {
            Value::Object(fields) => Ok(Self { id: row.id, fields }),
            other => Err(StoreError::DataCorruption(format!(
                "document {} is not an object: {other}",
                row.id
            ))),
        }
    }
}

fn into_documents(rows: Vec<DocumentRow>) -> Result<Vec<Document>, StoreError> {
    rows.into_iter().map(Document::try_from).collect()
}

fn limit_param(query: &Query) -> Option<i64> {
    query.limit.map(|l| i64::try_from(l).unwrap_or(i64::MAX))
}

fn count_from(count: i64) -> u64 {
    u64::try_from(count).unwrap_or_default()
}

const QUERY_SQL: &str = r"
    SELECT id, data FROM admin.documents
    WHERE collection = $1 AND data @> $2
    ORDER BY (data->>$3)::timestamptz DESC NULLS LAST, id
    LIMIT $4
";

const COUNT_SQL: &str = r"
    SELECT COUNT(*) FROM admin.documents
    WHERE collection = $1 AND data @> $2
";

/// Document store backed by a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn begin(&self) -> Result<Box<dyn Transaction>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTransaction { tx }))
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r"
            SELECT id, data FROM admin.documents
            WHERE collection = $1 AND id = $2
            ",
        )
        .bind(collection.name())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Document::try_from).transpose()
    }

    async fn query(
        &self,
        collection: Collection,
        query: &Query,
    ) -> Result<Vec<Document>, StoreError> {
        let rows = sqlx::query_as::<_, DocumentRow>(QUERY_SQL)
            .bind(collection.name())
            .bind(query.filter_object())
            .bind(query.newest_first.as_deref())
            .bind(limit_param(query))
            .fetch_all(&self.pool)
            .await?;

        into_documents(rows)
    }

    async fn count(&self, collection: Collection, query: &Query) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar(COUNT_SQL)
            .bind(collection.name())
            .bind(query.filter_object())
            .fetch_one(&self.pool)
            .await?;

        Ok(count_from(count))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Transaction over a [`PgDocumentStore`].
///
/// Dropping it without commit rolls back.
pub struct PgTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

#[async_trait]
impl Transaction for PgTransaction {
    async fn get(
        &mut self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query_as::<_, DocumentRow>(
            r"
            SELECT id, data FROM admin.documents
            WHERE collection = $1 AND id = $2
            FOR UPDATE
            ",
        )
        .bind(collection.name())
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(Document::try_from).transpose()
    }

    async fn query(
        &mut self,
        collection: Collection,
        query: &Query,
    ) -> Result<Vec<Document>, StoreError> {
        let rows = sqlx::query_as::<_, DocumentRow>(QUERY_SQL)
            .bind(collection.name())
            .bind(query.filter_object())
            .bind(query.newest_first.as_deref())
            .bind(limit_param(query))
            .fetch_all(&mut *self.tx)
            .await?;

        into_documents(rows)
    }

    async fn count(&mut self, collection: Collection, query: &Query) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar(COUNT_SQL)
            .bind(collection.name())
            .bind(query.filter_object())
            .fetch_one(&mut *self.tx)
            .await?;

        Ok(count_from(count))
    }

    async fn insert(
        &mut self,
        collection: Collection,
        fields: Fields,
    ) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            r"
            INSERT INTO admin.documents (collection, id, data)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(collection.name())
        .bind(&id)
        .bind(Value::Object(fields))
        .execute(&mut *self.tx)
        .await?;

        Ok(id)
    }

    async fn set(
        &mut self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO admin.documents (collection, id, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id) DO UPDATE SET data = EXCLUDED.data, updated_at = NOW()
            ",
        )
        .bind(collection.name())
        .bind(id)
        .bind(Value::Object(fields))
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn merge(
        &mut self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r"
            UPDATE admin.documents
            SET data = data || $3, updated_at = NOW()
            WHERE collection = $1 AND id = $2
            ",
        )
        .bind(collection.name())
        .bind(id)
        .bind(Value::Object(fields))
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                collection: collection.name(),
                id: id.to_owned(),
            });
        }
        Ok(())
    }

    async fn delete(&mut self, collection: Collection, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM admin.documents WHERE collection = $1 AND id = $2")
            .bind(collection.name())
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                collection: collection.name(),
                id: id.to_owned(),
            });
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}
