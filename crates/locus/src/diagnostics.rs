//! Structured diagnostics for external logging and reporting.
//!
//! Configuration problems never abort a resolution; they are reported here
//! and resolution carries on so that the terminal failure, if any, arrives
//! with full context.

use serde::Serialize;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use crate::result::FailureReport;

/// A diagnostic event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// No usable template for the requested field type
    PatternNotConfigured {
        /// Pattern code in effect
        pattern_code: String,
        /// Page of the request
        page: String,
        /// Field type of the request
        field_type: String,
        /// Field name of the request
        field_name: String,
        /// Key the empty record was stored under
        key: String,
    },
    /// A persisted generated entry could not be parsed
    InvalidCachedRecord {
        /// Key of the unreadable entry
        key: String,
        /// Parser message
        reason: String,
    },
    /// Fallback matching exhausted every candidate
    NoElementMatched(FailureReport),
}

impl Diagnostic {
    /// Short name of the event kind
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::PatternNotConfigured { .. } => "pattern_not_configured",
            Self::InvalidCachedRecord { .. } => "invalid_cached_record",
            Self::NoElementMatched(_) => "no_element_matched",
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PatternNotConfigured {
                pattern_code,
                page,
                field_type,
                field_name,
                key,
            } => write!(
                f,
                "no pattern configured for {pattern_code}.pattern.{field_type} \
                 ({field_type} '{field_name}' on {page}, key {key})"
            ),
            Self::InvalidCachedRecord { key, reason } => {
                write!(f, "cached record {key} is unreadable: {reason}")
            }
            Self::NoElementMatched(report) => write!(f, "no element matched for {report}"),
        }
    }
}

/// Receiver of diagnostics
pub trait DiagnosticsSink: fmt::Debug + Send + Sync {
    /// Handle one event
    fn emit(&self, diagnostic: &Diagnostic);
}

/// Sink that forwards events to `tracing` at warn level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn emit(&self, diagnostic: &Diagnostic) {
        match diagnostic {
            Diagnostic::PatternNotConfigured {
                pattern_code,
                page,
                field_type,
                field_name,
                key,
            } => tracing::warn!(
                pattern_code = %pattern_code,
                page = %page,
                field_type = %field_type,
                field_name = %field_name,
                key = %key,
                "pattern not configured"
            ),
            Diagnostic::InvalidCachedRecord { key, reason } => {
                tracing::warn!(key = %key, reason = %reason, "invalid cached record");
            }
            Diagnostic::NoElementMatched(report) => tracing::warn!(
                page = %report.page,
                field_type = %report.field_type,
                field_name = %report.field_name,
                key = %report.key,
                attempted = ?report.attempted,
                "no element matched"
            ),
        }
    }
}

/// Sink that keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Diagnostic>>,
}

impl RecordingSink {
    /// Create an empty recording sink
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded events
    #[must_use]
    pub fn events(&self) -> Vec<Diagnostic> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of recorded events of the given kind
    #[must_use]
    pub fn count(&self, kind: &str) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|d| d.kind() == kind)
            .count()
    }

    /// Remove and return all recorded events
    pub fn drain(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl DiagnosticsSink for RecordingSink {
    fn emit(&self, diagnostic: &Diagnostic) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(diagnostic.clone());
    }
}

/// Sink that drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticsSink for NullSink {
    fn emit(&self, _diagnostic: &Diagnostic) {}
}
