//! # Repository
//!
//! Runs the write path for one record:
//! 1. Validate against the model's schema
//! 2. Check unique fields against existing documents
//! 3. Check that referenced documents exist
//! 4. Assign `_id` if absent and insert, re-checking unique fields atomically

use serde_json::Value;
use uuid::Uuid;

use super::backend::{values_at, DocumentStore};
use super::errors::{PersistError, PersistResult, StoreError};
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::schema::{Document, Schema, SchemaError, SchemaRegistry, ValidationResult};

/// Validating front door to a document store
#[derive(Debug)]
pub struct Repository<'a, S: DocumentStore> {
    registry: &'a SchemaRegistry,
    store: &'a S,
    metrics: &'a MetricsRegistry,
}

impl<'a, S: DocumentStore> Repository<'a, S> {
    pub fn new(registry: &'a SchemaRegistry, store: &'a S, metrics: &'a MetricsRegistry) -> Self {
        Self {
            registry,
            store,
            metrics,
        }
    }

    fn schema(&self, model: &str) -> PersistResult<&'a Schema> {
        self.registry
            .get(model)
            .ok_or_else(|| SchemaError::unknown_model(model).into())
    }

    /// Validates and stores a record, returning the stored document.
    pub fn create(&self, model: &str, record: &Value) -> PersistResult<Document> {
        let schema = self.schema(model)?;

        let mut doc = match schema.validate(record) {
            ValidationResult::Accepted(doc) => {
                self.metrics.increment_accepted();
                log_event_with_fields(Event::ValidationAccepted, &[("model", model)]);
                doc
            }
            ValidationResult::Rejected(violations) => {
                self.metrics.record_rejection(violations.len());
                log_event_with_fields(
                    Event::ValidationRejected,
                    &[("model", model), ("violations", &violations.len().to_string())],
                );
                return Err(PersistError::Invalid(violations));
            }
        };

        self.check_unique(schema, &doc)?;
        self.check_references(schema, &doc)?;

        let id = match doc.get("_id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => {
                let id = Uuid::new_v4().to_string();
                doc.insert("_id".into(), Value::String(id.clone()));
                id
            }
        };

        let unique_paths = schema.unique_paths();
        match self
            .store
            .insert_unique(schema.collection(), doc.clone(), &unique_paths)
        {
            Ok(()) => {}
            Err(StoreError::UniqueViolation {
                collection,
                path,
                value,
            }) => return Err(self.unique_conflict(collection, path, value)),
            Err(e) => {
                self.metrics.increment_store_failures();
                log_event_with_fields(
                    Event::StoreFailed,
                    &[("collection", schema.collection()), ("error", &e.to_string())],
                );
                return Err(e.into());
            }
        }

        self.metrics.increment_documents_created();
        log_event_with_fields(
            Event::DocumentCreated,
            &[("collection", schema.collection()), ("id", &id), ("model", model)],
        );
        Ok(doc)
    }

    /// Fetches a stored document of `model` by `_id`.
    pub fn find(&self, model: &str, id: &str) -> PersistResult<Option<Document>> {
        let schema = self.schema(model)?;
        Ok(self.store.get(schema.collection(), id)?)
    }

    /// Early uniqueness check; the store repeats it atomically on insert.
    fn check_unique(&self, schema: &Schema, doc: &Document) -> PersistResult<()> {
        for path in schema.unique_paths() {
            for value in values_at(doc, &path) {
                if self.store.exists_with(schema.collection(), &path, value)? {
                    let collection = schema.collection().to_string();
                    return Err(self.unique_conflict(collection, path, value.to_string()));
                }
            }
        }
        Ok(())
    }

    fn unique_conflict(&self, collection: String, path: String, value: String) -> PersistError {
        self.metrics.increment_unique_conflicts();
        log_event_with_fields(
            Event::UniqueConflict,
            &[("collection", &collection), ("path", &path), ("value", &value)],
        );
        PersistError::Duplicate {
            collection,
            path,
            value,
        }
    }

    fn check_references(&self, schema: &Schema, doc: &Document) -> PersistResult<()> {
        for (path, target) in schema.references() {
            let target_schema = self
                .registry
                .get(target)
                .ok_or_else(|| SchemaError::unresolved_reference(schema.name(), &path, target))?;

            for value in values_at(doc, &path) {
                let Some(id) = value.as_str() else {
                    continue;
                };
                if !self.store.contains_id(target_schema.collection(), id)? {
                    self.metrics.increment_dangling_references();
                    log_event_with_fields(
                        Event::DanglingReference,
                        &[("id", id), ("model", target), ("path", &path)],
                    );
                    return Err(PersistError::DanglingReference {
                        path,
                        model: target.to_string(),
                        id: id.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSpec, Fields, TextRules};
    use crate::store::{MemoryStore, StoreResult};
    use serde_json::json;
    use std::sync::Barrier;
    use std::thread;

    /// Holds every caller after its uniqueness lookup until all have looked.
    #[derive(Debug)]
    struct GatedStore {
        inner: MemoryStore,
        gate: Barrier,
    }

    impl DocumentStore for GatedStore {
        fn exists_with(&self, collection: &str, path: &str, value: &Value) -> StoreResult<bool> {
            let taken = self.inner.exists_with(collection, path, value)?;
            self.gate.wait();
            Ok(taken)
        }

        fn contains_id(&self, collection: &str, id: &str) -> StoreResult<bool> {
            self.inner.contains_id(collection, id)
        }

        fn insert_unique(
            &self,
            collection: &str,
            document: Document,
            unique_paths: &[String],
        ) -> StoreResult<()> {
            self.inner.insert_unique(collection, document, unique_paths)
        }

        fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
            self.inner.get(collection, id)
        }

        fn count(&self, collection: &str) -> StoreResult<usize> {
            self.inner.count(collection)
        }
    }

    fn registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        registry
            .register(
                Schema::builder("User")
                    .field(
                        "username",
                        FieldSpec::text(TextRules::new().lowercase()).required().unique(),
                    )
                    .field(
                        "aliases",
                        FieldSpec::list(FieldSpec::text(TextRules::new().lowercase())).unique(),
                    )
                    .field(
                        "social",
                        FieldSpec::object(
                            Fields::build([("handle", FieldSpec::text(TextRules::new()).unique())])
                                .unwrap(),
                        ),
                    )
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry
            .register(
                Schema::builder("Post")
                    .field("title", FieldSpec::text(TextRules::new()).required())
                    .field("author", FieldSpec::reference("User").required())
                    .build()
                    .unwrap(),
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_create_assigns_id() {
        let registry = registry();
        let store = MemoryStore::new();
        let metrics = MetricsRegistry::new();
        let repo = Repository::new(&registry, &store, &metrics);

        let doc = repo.create("User", &json!({"username": "Alice"})).unwrap();
        let id = doc["_id"].as_str().unwrap();
        assert!(Uuid::parse_str(id).is_ok());
        assert_eq!(repo.find("User", id).unwrap().unwrap()["username"], "alice");
        assert_eq!(metrics.snapshot().documents_created, 1);
    }

    #[test]
    fn test_create_keeps_supplied_id() {
        let registry = registry();
        let store = MemoryStore::new();
        let metrics = MetricsRegistry::new();
        let repo = Repository::new(&registry, &store, &metrics);

        let doc = repo
            .create("User", &json!({"_id": "507f1f77bcf86cd799439011", "username": "bob"}))
            .unwrap();
        assert_eq!(doc["_id"], "507f1f77bcf86cd799439011");
    }

    #[test]
    fn test_unique_conflict_after_normalization() {
        let registry = registry();
        let store = MemoryStore::new();
        let metrics = MetricsRegistry::new();
        let repo = Repository::new(&registry, &store, &metrics);

        repo.create("User", &json!({"username": "alice"})).unwrap();
        let err = repo.create("User", &json!({"username": "ALICE"})).unwrap_err();
        match err {
            PersistError::Duplicate { collection, path, .. } => {
                assert_eq!(collection, "users");
                assert_eq!(path, "username");
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(metrics.snapshot().unique_conflicts, 1);
        assert_eq!(store.count("users").unwrap(), 1);
    }

    #[test]
    fn test_nested_unique_conflict() {
        let registry = registry();
        let store = MemoryStore::new();
        let metrics = MetricsRegistry::new();
        let repo = Repository::new(&registry, &store, &metrics);

        repo.create("User", &json!({"username": "a", "social": {"handle": "h"}}))
            .unwrap();
        let err = repo
            .create("User", &json!({"username": "b", "social": {"handle": "h"}}))
            .unwrap_err();
        assert_eq!(err.code(), "DOCSCHEMA_DUPLICATE_KEY");
    }

    #[test]
    fn test_every_list_element_is_unique_checked() {
        let registry = registry();
        let store = MemoryStore::new();
        let metrics = MetricsRegistry::new();
        let repo = Repository::new(&registry, &store, &metrics);

        repo.create("User", &json!({"username": "a", "aliases": ["x", "y"]}))
            .unwrap();
        let err = repo
            .create("User", &json!({"username": "b", "aliases": ["z", "Y"]}))
            .unwrap_err();
        match err {
            PersistError::Duplicate { path, value, .. } => {
                assert_eq!(path, "aliases");
                assert_eq!(value, "\"y\"");
            }
            other => panic!("unexpected error {:?}", other),
        }
        repo.create("User", &json!({"username": "c", "aliases": ["z"]}))
            .unwrap();
    }

    #[test]
    fn test_concurrent_creates_store_one_unique_value() {
        let registry = registry();
        let store = GatedStore {
            inner: MemoryStore::new(),
            gate: Barrier::new(2),
        };
        let metrics = MetricsRegistry::new();
        let repo = Repository::new(&registry, &store, &metrics);

        let results: Vec<PersistResult<Document>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..2)
                .map(|_| scope.spawn(|| repo.create("User", &json!({"username": "alice"}))))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(PersistError::Duplicate { .. }))));
        assert_eq!(store.count("users").unwrap(), 1);
        assert_eq!(metrics.snapshot().unique_conflicts, 1);
    }

    #[test]
    fn test_dangling_reference() {
        let registry = registry();
        let store = MemoryStore::new();
        let metrics = MetricsRegistry::new();
        let repo = Repository::new(&registry, &store, &metrics);

        let err = repo
            .create(
                "Post",
                &json!({"title": "t", "author": "507f1f77bcf86cd799439011"}),
            )
            .unwrap_err();
        assert!(matches!(err, PersistError::DanglingReference { .. }));
        assert_eq!(metrics.snapshot().dangling_references, 1);
    }

    #[test]
    fn test_reference_resolves_after_target_created() {
        let registry = registry();
        let store = MemoryStore::new();
        let metrics = MetricsRegistry::new();
        let repo = Repository::new(&registry, &store, &metrics);

        let user = repo.create("User", &json!({"username": "alice"})).unwrap();
        let post = repo
            .create("Post", &json!({"title": "hello", "author": user["_id"].clone()}))
            .unwrap();
        assert_eq!(post["author"], user["_id"]);
    }

    #[test]
    fn test_invalid_record_is_not_stored() {
        let registry = registry();
        let store = MemoryStore::new();
        let metrics = MetricsRegistry::new();
        let repo = Repository::new(&registry, &store, &metrics);

        let err = repo.create("User", &json!({})).unwrap_err();
        assert_eq!(err.violations().len(), 1);
        assert_eq!(store.count("users").unwrap(), 0);
        let snap = metrics.snapshot();
        assert_eq!(snap.validations_rejected, 1);
        assert_eq!(snap.violations_reported, 1);
    }

    #[test]
    fn test_unknown_model() {
        let registry = registry();
        let store = MemoryStore::new();
        let metrics = MetricsRegistry::new();
        let repo = Repository::new(&registry, &store, &metrics);

        let err = repo.create("Ghost", &json!({})).unwrap_err();
        assert_eq!(err.code(), "DOCSCHEMA_UNKNOWN_MODEL");
    }
}
