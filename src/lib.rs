//! docschema - Declarative document schemas for JSON records
//!
//! A `Schema` declares the fields of one model. Validating a record coerces
//! and normalizes its values, fills defaults, and checks constraints, producing
//! either a clean document or every violation found.

pub mod cli;
pub mod observability;
pub mod schema;
pub mod store;
