//! Observable events
//!
//! Every log line the crate emits is named by one of these events, so the
//! set of things that can appear in logs is explicit and typed.

use std::fmt;

use tracing::Level;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration loaded
    ConfigLoaded,
    /// Schema directory loaded and cross-checked
    SchemasLoaded,
    /// Schema loading failed
    SchemasFailed,

    // Validation
    /// Record accepted by its schema
    ValidationAccepted,
    /// Record rejected with violations
    ValidationRejected,

    // Persistence
    /// Document stored
    DocumentCreated,
    /// Unique field already taken
    UniqueConflict,
    /// Referenced document does not exist
    DanglingReference,
    /// Storage collaborator failed
    StoreFailed,

    // Ingest sessions
    /// Ingest of an NDJSON stream begins
    IngestStart,
    /// Ingest finished
    IngestComplete,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::SchemasLoaded => "SCHEMAS_LOADED",
            Event::SchemasFailed => "SCHEMAS_FAILED",

            Event::ValidationAccepted => "VALIDATION_ACCEPTED",
            Event::ValidationRejected => "VALIDATION_REJECTED",

            Event::DocumentCreated => "DOCUMENT_CREATED",
            Event::UniqueConflict => "UNIQUE_CONFLICT",
            Event::DanglingReference => "DANGLING_REFERENCE",
            Event::StoreFailed => "STORE_FAILED",

            Event::IngestStart => "INGEST_BEGIN",
            Event::IngestComplete => "INGEST_COMPLETE",
        }
    }

    /// Level the event is logged at
    pub fn level(&self) -> Level {
        match self {
            Event::SchemasFailed | Event::StoreFailed => Level::ERROR,
            Event::ValidationRejected | Event::UniqueConflict | Event::DanglingReference => {
                Level::WARN
            }
            Event::ValidationAccepted => Level::DEBUG,
            _ => Level::INFO,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
