//! # Document Store Trait
//!
//! The storage-facing seam. Uniqueness and reference existence need existing
//! records, so they are answered here and never by the validator.

use serde_json::Value;

use super::errors::StoreResult;
use crate::schema::Document;

/// Storage collaborator for validated documents
pub trait DocumentStore: Send + Sync + std::fmt::Debug {
    /// Whether any document in `collection` holds `value` at dotted `path`
    fn exists_with(&self, collection: &str, path: &str, value: &Value) -> StoreResult<bool>;

    /// Whether a document with this `_id` exists in `collection`
    fn contains_id(&self, collection: &str, id: &str) -> StoreResult<bool>;

    /// Store a document that must carry a string `_id`.
    ///
    /// Every value at each of `unique_paths` is checked against the
    /// collection and the document inserted as one atomic step; a taken value
    /// fails with `StoreError::UniqueViolation`.
    fn insert_unique(
        &self,
        collection: &str,
        document: Document,
        unique_paths: &[String],
    ) -> StoreResult<()>;

    /// Fetch a document by `_id`
    fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Number of documents in `collection`
    fn count(&self, collection: &str) -> StoreResult<usize>;
}

/// Values found at a dotted path.
///
/// Arrays met along the way are descended element-wise, and an array at the
/// end of the path contributes its elements.
pub fn values_at<'a>(doc: &'a Document, path: &str) -> Vec<&'a Value> {
    let mut segments = path.split('.');
    let mut current: Vec<&Value> = match segments.next().and_then(|first| doc.get(first)) {
        Some(v) => vec![v],
        None => return Vec::new(),
    };

    for segment in segments {
        current = current.into_iter().flat_map(|v| step(v, segment)).collect();
    }

    current
        .into_iter()
        .flat_map(|v| match v {
            Value::Array(items) => items.iter().collect::<Vec<_>>(),
            other => vec![other],
        })
        .collect()
}

fn step<'a>(value: &'a Value, segment: &str) -> Vec<&'a Value> {
    match value {
        Value::Object(obj) => obj.get(segment).into_iter().collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_object()?.get(segment))
            .collect(),
        _ => Vec::new(),
    }
}
