//! Schema registry and definition-file loader
//!
//! - One schema per `*.json` file, keyed by model name
//! - Files are loaded in sorted filename order
//! - Registered schemas are immutable; registering a name twice fails
//! - Reference targets must resolve to registered models

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;

use super::errors::{SchemaError, SchemaResult};
use super::types::{Schema, UnknownFields};

/// In-memory registry of model schemas.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    /// Registered schemas indexed by model name, in registration order
    schemas: IndexMap<String, Arc<Schema>>,
    /// Policy forced onto every schema loaded from disk
    policy_override: Option<UnknownFields>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forces an unknown-field policy onto schemas loaded after this call.
    pub fn with_policy_override(mut self, policy: Option<UnknownFields>) -> Self {
        self.policy_override = policy;
        self
    }

    /// Loads every schema file in `dir`, then checks reference targets.
    ///
    /// Returns the number of schemas loaded.
    pub fn load_dir(&mut self, dir: &Path) -> SchemaResult<usize> {
        let entries = fs::read_dir(dir).map_err(|e| {
            SchemaError::malformed_schema(
                dir.display().to_string(),
                format!("Failed to read schema directory: {}", e),
            )
        })?;

        let mut paths: Vec<PathBuf> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                SchemaError::malformed_schema(
                    dir.display().to_string(),
                    format!("Failed to read directory entry: {}", e),
                )
            })?;
            let path = entry.path();

            // Skip non-JSON files
            if path.extension().map_or(true, |ext| ext != "json") {
                continue;
            }
            paths.push(path);
        }
        paths.sort();

        for path in &paths {
            self.load_file(path)?;
        }

        self.resolve_references()?;
        Ok(paths.len())
    }

    /// Loads and registers a single schema file.
    pub fn load_file(&mut self, path: &Path) -> SchemaResult<&Schema> {
        let content = fs::read_to_string(path).map_err(|e| {
            SchemaError::malformed_schema(
                path.display().to_string(),
                format!("Failed to read file: {}", e),
            )
        })?;

        let schema: Schema = serde_json::from_str(&content).map_err(|e| {
            SchemaError::malformed_schema(path.display().to_string(), e.to_string())
        })?;

        let schema = match self.policy_override {
            Some(policy) => schema.with_unknown_fields(policy),
            None => schema,
        };

        self.register(schema)
    }

    /// Registers a schema directly (for programmatic creation).
    pub fn register(&mut self, schema: Schema) -> SchemaResult<&Schema> {
        let name = schema.name().to_string();

        // Check for immutability violation
        if self.schemas.contains_key(&name) {
            return Err(SchemaError::duplicate_model(name));
        }

        let entry = self.schemas.entry(name).or_insert(Arc::new(schema));
        Ok(&**entry)
    }

    /// Checks that every reference field targets a registered model.
    pub fn resolve_references(&self) -> SchemaResult<()> {
        for schema in self.schemas.values() {
            for (path, target) in schema.references() {
                if !self.schemas.contains_key(target) {
                    return Err(SchemaError::unresolved_reference(schema.name(), path, target));
                }
            }
        }
        Ok(())
    }

    /// Gets a schema by model name.
    pub fn get(&self, model: &str) -> Option<&Schema> {
        self.schemas.get(model).map(Arc::as_ref)
    }

    /// Gets a shared handle to a schema.
    pub fn get_shared(&self, model: &str) -> Option<Arc<Schema>> {
        self.schemas.get(model).cloned()
    }

    pub fn exists(&self, model: &str) -> bool {
        self.schemas.contains_key(model)
    }

    /// Model names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn all_schemas(&self) -> impl Iterator<Item = &Schema> {
        self.schemas.values().map(Arc::as_ref)
    }

    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }
}
