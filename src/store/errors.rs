//! # Storage and Persistence Errors

use thiserror::Error;

use crate::schema::{SchemaError, Violation};

/// Result type for storage collaborator operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for repository operations
pub type PersistResult<T> = Result<T, PersistError>;

/// Storage collaborator errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Document '{id}' already exists in '{collection}'")]
    DuplicateId { collection: String, id: String },

    #[error("Duplicate value {value} for unique field '{path}' in '{collection}'")]
    UniqueViolation {
        collection: String,
        path: String,
        value: String,
    },

    #[error("Document has no string _id")]
    MissingId,

    #[error("Lock poisoned")]
    LockPoisoned,

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Errors from validating and persisting one record
#[derive(Debug, Clone, Error)]
pub enum PersistError {
    /// Validation rejected the record
    #[error("Validation failed with {} violation(s)", .0.len())]
    Invalid(Vec<Violation>),

    /// A unique field's value is already taken
    #[error("Duplicate value {value} for unique field '{path}' in '{collection}'")]
    Duplicate {
        collection: String,
        path: String,
        value: String,
    },

    /// A referenced document does not exist
    #[error("Field '{path}' references missing {model} '{id}'")]
    DanglingReference {
        path: String,
        model: String,
        id: String,
    },

    #[error("{0}")]
    Schema(#[from] SchemaError),

    #[error("{0}")]
    Store(#[from] StoreError),
}

impl PersistError {
    /// Stable code for rendered output
    pub fn code(&self) -> &'static str {
        match self {
            PersistError::Invalid(_) => "DOCSCHEMA_VALIDATION_FAILED",
            PersistError::Duplicate { .. } => "DOCSCHEMA_DUPLICATE_KEY",
            PersistError::DanglingReference { .. } => "DOCSCHEMA_DANGLING_REFERENCE",
            PersistError::Schema(e) => e.code().code(),
            PersistError::Store(_) => "DOCSCHEMA_STORE_FAILED",
        }
    }

    /// Violations, when validation was the cause
    pub fn violations(&self) -> &[Violation] {
        match self {
            PersistError::Invalid(violations) => violations,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ViolationKind;

    #[test]
    fn test_invalid_display_counts_violations() {
        let err = PersistError::Invalid(vec![
            Violation::new("a", ViolationKind::MissingRequiredField, "m"),
            Violation::new("b", ViolationKind::OutOfBounds, "m"),
        ]);
        assert_eq!(err.to_string(), "Validation failed with 2 violation(s)");
        assert_eq!(err.violations().len(), 2);
        assert_eq!(err.code(), "DOCSCHEMA_VALIDATION_FAILED");
    }

    #[test]
    fn test_schema_error_keeps_its_code() {
        let err: PersistError = SchemaError::unknown_model("Ghost").into();
        assert_eq!(err.code(), "DOCSCHEMA_UNKNOWN_MODEL");
        assert!(err.violations().is_empty());
    }

    #[test]
    fn test_store_error_converts() {
        let err: PersistError = StoreError::LockPoisoned.into();
        assert_eq!(err.code(), "DOCSCHEMA_STORE_FAILED");
        assert_eq!(err.to_string(), "Lock poisoned");
    }
}
