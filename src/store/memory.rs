//! # In-Memory Document Store

use std::collections::HashMap;
use std::sync::RwLock;

use indexmap::IndexMap;
use serde_json::Value;

use super::backend::{values_at, DocumentStore};
use super::errors::{StoreError, StoreResult};
use crate::schema::Document;

/// Collections of documents keyed by `_id`, in insertion order
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, IndexMap<String, Document>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryStore {
    fn exists_with(&self, collection: &str, path: &str, value: &Value) -> StoreResult<bool> {
        let collections = self.collections.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(collections
            .get(collection)
            .map_or(false, |docs| holds_value(docs, path, value)))
    }

    fn contains_id(&self, collection: &str, id: &str) -> StoreResult<bool> {
        let collections = self.collections.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(collections
            .get(collection)
            .map_or(false, |docs| docs.contains_key(id)))
    }

    fn insert_unique(
        &self,
        collection: &str,
        document: Document,
        unique_paths: &[String],
    ) -> StoreResult<()> {
        let id = document
            .get("_id")
            .and_then(Value::as_str)
            .ok_or(StoreError::MissingId)?
            .to_string();

        // Check and insert under one write guard
        let mut collections = self.collections.write().map_err(|_| StoreError::LockPoisoned)?;
        let docs = collections.entry(collection.to_string()).or_default();
        if docs.contains_key(&id) {
            return Err(StoreError::DuplicateId {
                collection: collection.to_string(),
                id,
            });
        }

        for path in unique_paths {
            if let Some(value) = values_at(&document, path)
                .into_iter()
                .find(|value| holds_value(docs, path, value))
            {
                return Err(StoreError::UniqueViolation {
                    collection: collection.to_string(),
                    path: path.clone(),
                    value: value.to_string(),
                });
            }
        }

        docs.insert(id, document);
        Ok(())
    }

    fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let collections = self.collections.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    fn count(&self, collection: &str) -> StoreResult<usize> {
        let collections = self.collections.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(collections.get(collection).map_or(0, IndexMap::len))
    }
}

fn holds_value(docs: &IndexMap<String, Document>, path: &str, value: &Value) -> bool {
    docs.values()
        .any(|doc| values_at(doc, path).into_iter().any(|v| v == value))
}
