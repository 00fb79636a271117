//! Document schema subsystem
//!
//! Schemas are declarative, built once and immutable. Validation of a record
//! against a schema is a pure function returning either an accepted,
//! normalized document or the complete list of violations.
//!
//! # Design Principles
//!
//! - Defaults substituted at validation time, never at definition time
//! - Coercion to the declared type, then normalization, then checks
//! - All violations collected, across every field
//! - Uniqueness and reference existence belong to the storage layer

mod errors;
mod loader;
mod types;
mod validator;

pub use errors::{SchemaError, SchemaErrorCode, SchemaResult, Violation, ViolationKind};
pub use loader::SchemaRegistry;
pub use types::{
    AllowedValues, Constraint, DefaultValue, FieldSpec, FieldType, Fields, NumberRules, Pattern,
    Required, Schema, SchemaBuilder, TextRules, UnknownFields,
};
pub use validator::{Document, SchemaValidator, ValidationResult, ROOT_PATH};
