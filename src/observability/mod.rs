//! Observability subsystem
//!
//! Provides:
//! - Structured logging through `tracing`, one typed `Event` per line
//! - Outcome counters for validation and persistence
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on validation results
//! 3. The validator itself never logs; its callers do
//!
//! # Usage
//!
//! ```ignore
//! use docschema::observability::{self, Event, MetricsRegistry};
//!
//! observability::init(&LogConfig::default())?;
//! observability::log_event_with_fields(Event::SchemasLoaded, &[("count", "3")]);
//!
//! let metrics = MetricsRegistry::new();
//! metrics.increment_accepted();
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{init, LogConfig, LogFormat, LOG_ENV};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

use std::fmt;

/// Observability error code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservabilityErrorCode {
    /// Observability setup failed
    ObservabilityFailed,
}

impl ObservabilityErrorCode {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ObservabilityErrorCode::ObservabilityFailed => "DOCSCHEMA_OBSERVABILITY_FAILED",
        }
    }
}

impl fmt::Display for ObservabilityErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Observability error
///
/// Only raised while installing the subscriber; emitting events never fails.
#[derive(Debug)]
pub struct ObservabilityError {
    code: ObservabilityErrorCode,
    message: String,
}

impl ObservabilityError {
    /// Create a new observability error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: ObservabilityErrorCode::ObservabilityFailed,
            message: message.into(),
        }
    }

    /// Get the error code
    pub fn code(&self) -> ObservabilityErrorCode {
        self.code
    }

    /// Get the message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ObservabilityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ObservabilityError {}

/// Result type for observability operations
pub type ObservabilityResult<T> = Result<T, ObservabilityError>;

/// Log a lifecycle event
pub fn log_event(event: Event) {
    logger::log(event, &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    logger::log(event, fields);
}
