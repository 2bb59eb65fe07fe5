//! Document store boundary. Documents are flat JSON objects addressed by
//! `(collection, id)`; timestamps come from the store's clock.

pub mod document_store;
pub mod models;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::error::Result;

pub use document_store::SqliteDocumentStore;

pub type Document = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub data: Document,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredDocument {
    /// Body plus `id`, `createdAt`, `updatedAt`, ready to deserialize into a typed record.
    pub fn into_value(self) -> Value {
        let mut data = self.data;
        data.insert("id".to_string(), Value::String(self.id));
        data.insert("createdAt".to_string(), Value::String(self.created_at.to_rfc3339()));
        data.insert("updatedAt".to_string(), Value::String(self.updated_at.to_rfc3339()));
        Value::Object(data)
    }
}

/// Equality filter on top-level fields. An empty filter matches everything.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.conditions
            .iter()
            .all(|(field, expected)| doc.get(field) == Some(expected))
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert under a freshly generated id.
    async fn create(&self, collection: &str, doc: Document) -> Result<StoredDocument>;

    /// Insert or fully replace the document at `id`. A replaced document keeps its `created_at`.
    async fn set(&self, collection: &str, id: &str, doc: Document) -> Result<StoredDocument>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<StoredDocument>>;

    /// No ordering guarantee.
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<StoredDocument>>;

    /// Shallow merge of `patch` into an existing document. Fails with `NotFound` when absent.
    async fn update(&self, collection: &str, id: &str, patch: Document) -> Result<StoredDocument>;

    /// Returns true if the document existed.
    async fn delete(&self, collection: &str, id: &str) -> Result<bool>;
}

pub fn new_document_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Write timestamp for a document whose previous `updated_at` was `previous`.
/// Never goes backwards even if the clock does.
pub fn next_timestamp(previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now();
    match previous {
        Some(prev) if prev > now => prev,
        _ => now,
    }
}

/// Serialize a typed value into a document body.
pub fn to_document<T: serde::Serialize>(value: &T) -> Result<Document> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(crate::error::AppError::Store(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}
