use async_trait::async_trait;
use dashmap::DashMap;

use crate::db::{new_document_id, next_timestamp, Document, DocumentStore, Filter, StoredDocument};
use crate::error::{AppError, Result};

// ---------------------------------------------------------------------------
// InMemoryDocumentStore
// ---------------------------------------------------------------------------

/// Process-local document store. Nothing survives a restart.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    /// collection → (id → document)
    collections: DashMap<String, DashMap<String, StoredDocument>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn put(&self, collection: &str, doc: StoredDocument) {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(doc.id.clone(), doc);
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn create(&self, collection: &str, doc: Document) -> Result<StoredDocument> {
        let now = next_timestamp(None);
        let stored = StoredDocument {
            id: new_document_id(),
            data: doc,
            created_at: now,
            updated_at: now,
        };
        self.put(collection, stored.clone());
        Ok(stored)
    }

    async fn set(&self, collection: &str, id: &str, doc: Document) -> Result<StoredDocument> {
        let docs = self.collections.entry(collection.to_string()).or_default();
        let stored = match docs.get(id) {
            Some(existing) => StoredDocument {
                id: id.to_string(),
                data: doc,
                created_at: existing.created_at,
                updated_at: next_timestamp(Some(existing.updated_at)),
            },
            None => {
                let now = next_timestamp(None);
                StoredDocument { id: id.to_string(), data: doc, created_at: now, updated_at: now }
            }
        };
        docs.insert(id.to_string(), stored.clone());
        Ok(stored)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<StoredDocument>> {
        let Some(docs) = self.collections.get(collection) else {
            return Ok(None);
        };
        Ok(docs.get(id).map(|d| d.clone()))
    }

    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<StoredDocument>> {
        let Some(docs) = self.collections.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(docs
            .iter()
            .filter(|entry| filter.matches(&entry.value().data))
            .map(|entry| entry.value().clone())
            .collect())
    }

    async fn update(&self, collection: &str, id: &str, patch: Document) -> Result<StoredDocument> {
        let not_found = || AppError::NotFound { id: id.to_string() };
        let docs = self.collections.get(collection).ok_or_else(not_found)?;
        let mut doc = docs.get_mut(id).ok_or_else(not_found)?;
        for (key, value) in patch {
            doc.data.insert(key, value);
        }
        doc.updated_at = next_timestamp(Some(doc.updated_at));
        Ok(doc.clone())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        let Some(docs) = self.collections.get(collection) else {
            return Ok(false);
        };
        Ok(docs.remove(id).is_some())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
