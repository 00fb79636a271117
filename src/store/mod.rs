//! # Storage Seam
//!
//! Uniqueness and reference integrity need a view of existing documents, so
//! they live behind `DocumentStore` and are only consulted after a record has
//! been accepted by its schema.

mod backend;
mod errors;
mod memory;
mod repository;

pub use backend::{values_at, DocumentStore};
pub use errors::{PersistError, PersistResult, StoreError, StoreResult};
pub use memory::MemoryStore;
pub use repository::Repository;
