//! Document store access for the approval workflow.
//!
//! The workflow talks to its persistence through the [`DocumentStore`] and
//! [`Transaction`] traits: collections of JSON documents addressed by
//! `(collection, id)`, with get/query/count reads and insert/set/merge/delete
//! writes. Every workflow operation runs inside one [`Transaction`]; dropping
//! a transaction without calling [`Transaction::commit`] discards its writes.
//!
//! # Implementations
//!
//! - [`postgres::PgDocumentStore`] - `PostgreSQL` `documents` table (JSONB)
//! - [`memory::MemoryStore`] - in-process store for local runs and tests
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p karat-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use memory::MemoryStore;
pub use postgres::PgDocumentStore;

/// Field map of a stored document.
pub type Fields = serde_json::Map<String, Value>;

/// Errors that can occur during document store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the store is corrupted or does not match the expected shape.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// A write targeted a document that does not exist.
    #[error("document not found: {collection}/{id}")]
    NotFound {
        collection: &'static str,
        id: String,
    },
}

/// Named document collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Approvals,
    Products,
    MetalRates,
    PriceHistory,
    Banners,
    AdminUsers,
}

impl Collection {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Approvals => "approvals",
            Self::Products => "products",
            Self::MetalRates => "metal_rates",
            Self::PriceHistory => "price_history",
            Self::Banners => "banners",
            Self::AdminUsers => "admin_users",
        }
    }
}

/// A stored document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    /// Decode the document into a typed model.
    ///
    /// The document id is exposed to the model as an `id` field.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DataCorruption` if the fields do not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        let mut fields = self.fields.clone();
        fields.insert("id".to_owned(), Value::String(self.id.clone()));
        serde_json::from_value(Value::Object(fields)).map_err(|e| {
            StoreError::DataCorruption(format!("document {} does not decode: {e}", self.id))
        })
    }
}

/// Encode a typed model into document fields.
///
/// A top-level `id` field is dropped; the id lives in the document key.
///
/// # Errors
///
/// Returns `StoreError::DataCorruption` if the value does not serialize to a
/// JSON object.
pub fn to_fields<T: Serialize>(value: &T) -> Result<Fields, StoreError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(mut fields)) => {
            fields.remove("id");
            Ok(fields)
        }
        Ok(other) => Err(StoreError::DataCorruption(format!(
            "expected an object, got {other}"
        ))),
        Err(e) => Err(StoreError::DataCorruption(e.to_string())),
    }
}

/// A read query over one collection.
///
/// Filters are top-level field equality matches. Ordering fields must hold
/// RFC 3339 timestamps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<(String, Value)>,
    pub newest_first: Option<String>,
    pub limit: Option<usize>,
}

impl Query {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only match documents whose `field` equals `value`.
    #[must_use]
    pub fn filter(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push((field.to_owned(), value.into()));
        self
    }

    /// Order by the timestamp in `field`, most recent first.
    #[must_use]
    pub fn newest_first(mut self, field: &str) -> Self {
        self.newest_first = Some(field.to_owned());
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// The equality filters as a JSON object (for containment matching).
    #[must_use]
    pub fn filter_object(&self) -> Value {
        Value::Object(self.filters.iter().cloned().collect())
    }

    /// Whether a document's fields satisfy every filter.
    #[must_use]
    pub fn matches(&self, fields: &Fields) -> bool {
        self.filters
            .iter()
            .all(|(field, value)| fields.get(field) == Some(value))
    }
}

/// Parse an RFC 3339 timestamp stored in a document field.
#[must_use]
pub fn timestamp_field(fields: &Fields, field: &str) -> Option<DateTime<Utc>> {
    fields
        .get(field)
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// Client for a document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Start a transaction.
    async fn begin(&self) -> Result<Box<dyn Transaction>, StoreError>;

    /// Read one document outside a transaction.
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError>;

    /// Run a query outside a transaction.
    async fn query(&self, collection: Collection, query: &Query)
    -> Result<Vec<Document>, StoreError>;

    /// Count the documents matching a query's filters.
    async fn count(&self, collection: Collection, query: &Query) -> Result<u64, StoreError>;

    /// Check that the store is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// An atomic unit of reads and writes.
///
/// Reads inside a transaction see the transaction's own writes. Documents
/// read through [`Transaction::get`] are locked against concurrent writers
/// until the transaction ends.
#[async_trait]
pub trait Transaction: Send {
    async fn get(&mut self, collection: Collection, id: &str)
    -> Result<Option<Document>, StoreError>;

    async fn query(
        &mut self,
        collection: Collection,
        query: &Query,
    ) -> Result<Vec<Document>, StoreError>;

    async fn count(&mut self, collection: Collection, query: &Query) -> Result<u64, StoreError>;

    /// Insert a new document under a generated id and return the id.
    async fn insert(&mut self, collection: Collection, fields: Fields)
    -> Result<String, StoreError>;

    /// Create or fully replace a document.
    async fn set(&mut self, collection: Collection, id: &str, fields: Fields)
    -> Result<(), StoreError>;

    /// Shallow-merge `fields` into an existing document.
    ///
    /// Fails with `StoreError::NotFound` if the document does not exist.
    async fn merge(
        &mut self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError>;

    /// Delete an existing document.
    ///
    /// Fails with `StoreError::NotFound` if the document does not exist.
    async fn delete(&mut self, collection: Collection, id: &str) -> Result<(), StoreError>;

    /// Make every write of this transaction visible atomically.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        id: String,
        name: String,
    }

    #[test]
    fn test_decode_exposes_id() {
        let doc = Document {
            id: "doc-1".to_owned(),
            fields: json!({"name": "Temple necklace"})
                .as_object()
                .cloned()
                .unwrap(),
        };
        let sample: Sample = doc.decode().unwrap();
        assert_eq!(sample.id, "doc-1");
        assert_eq!(sample.name, "Temple necklace");
    }

    #[test]
    fn test_to_fields_drops_id() {
        let fields = to_fields(&Sample {
            id: "doc-1".to_owned(),
            name: "Jhumka".to_owned(),
        })
        .unwrap();
        assert!(!fields.contains_key("id"));
        assert_eq!(fields.get("name"), Some(&json!("Jhumka")));
    }

    #[test]
    fn test_to_fields_rejects_non_objects() {
        assert!(matches!(
            to_fields(&42),
            Err(StoreError::DataCorruption(_))
        ));
    }

    #[test]
    fn test_query_matches() {
        let query = Query::new()
            .filter("status", "pending")
            .filter("entityType", "banner");
        let hit = json!({"status": "pending", "entityType": "banner", "x": 1});
        let miss = json!({"status": "approved", "entityType": "banner"});

        assert!(query.matches(hit.as_object().unwrap()));
        assert!(!query.matches(miss.as_object().unwrap()));
        assert_eq!(
            query.filter_object(),
            json!({"status": "pending", "entityType": "banner"})
        );
    }
}
