//! Metrics registry
//!
//! - Counters only
//! - Monotonic increase
//! - Reset only on process start

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters for validation and persistence outcomes
///
/// All counters use atomic operations with Relaxed ordering; a registry can
/// be shared by reference across threads.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Records accepted by validation
    validations_accepted: AtomicU64,
    /// Records rejected by validation
    validations_rejected: AtomicU64,
    /// Individual violations reported
    violations_reported: AtomicU64,
    /// Documents stored
    documents_created: AtomicU64,
    /// Writes refused for a taken unique value
    unique_conflicts: AtomicU64,
    /// Writes refused for a missing referenced document
    dangling_references: AtomicU64,
    /// Storage collaborator failures
    store_failures: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_accepted(&self) {
        self.validations_accepted.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts one rejected record and its violations
    pub fn record_rejection(&self, violations: usize) {
        self.validations_rejected.fetch_add(1, Ordering::Relaxed);
        self.violations_reported
            .fetch_add(violations as u64, Ordering::Relaxed);
    }

    pub fn increment_documents_created(&self) {
        self.documents_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_unique_conflicts(&self) {
        self.unique_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_dangling_references(&self) {
        self.dangling_references.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_store_failures(&self) {
        self.store_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            validations_accepted: self.validations_accepted.load(Ordering::Relaxed),
            validations_rejected: self.validations_rejected.load(Ordering::Relaxed),
            violations_reported: self.violations_reported.load(Ordering::Relaxed),
            documents_created: self.documents_created.load(Ordering::Relaxed),
            unique_conflicts: self.unique_conflicts.load(Ordering::Relaxed),
            dangling_references: self.dangling_references.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub validations_accepted: u64,
    pub validations_rejected: u64,
    pub violations_reported: u64,
    pub documents_created: u64,
    pub unique_conflicts: u64,
    pub dangling_references: u64,
    pub store_failures: u64,
}
