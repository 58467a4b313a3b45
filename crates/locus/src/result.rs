//! Result and error types for locus.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Result type for locus operations
pub type LocatorResult<T> = Result<T, LocatorError>;

/// Everything known about a failed resolution, accumulated across layers.
///
/// The matcher contributes the attempted candidates, the resolver contributes
/// the key, and the step layer contributes the original request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureReport {
    /// Page the field lives on
    pub page: String,
    /// Field type identifier (e.g. `button`)
    pub field_type: String,
    /// Field name as authored, bracket notation included
    pub field_name: String,
    /// Resolved cache key, rendered with its namespace
    pub key: String,
    /// Record description
    pub description: String,
    /// Every candidate tried, in the order tried
    pub attempted: Vec<String>,
    /// Driver message, or how long a wait ran before giving up
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} '{}' on page '{}' (key {}): ",
            self.field_type, self.field_name, self.page, self.key
        )?;
        if self.attempted.is_empty() {
            write!(f, "no candidates to try")?;
        } else {
            write!(f, "tried [{}]", self.attempted.join(", "))?;
        }
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}

/// Errors that can occur in locus
#[derive(Debug, Error)]
pub enum LocatorError {
    /// Field type identifier not in the supported set
    #[error("Unsupported field type '{field_type}'")]
    UnsupportedFieldType {
        /// The identifier the caller passed
        field_type: String,
    },

    /// No candidate matched the live document
    #[error("No element matched for {0}")]
    NoElementMatched(Box<FailureReport>),

    /// The document driver failed while a candidate was being checked
    #[error("Document driver failed for {0}")]
    Driver(Box<FailureReport>),

    /// Matching did not finish within the allotted time
    #[error("Timed out after {ms}ms waiting for {report}")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
        /// Candidates tried before the deadline
        report: Box<FailureReport>,
    },

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LocatorError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an unsupported field type error
    #[must_use]
    pub fn unsupported_field_type(field_type: impl Into<String>) -> Self {
        Self::UnsupportedFieldType {
            field_type: field_type.into(),
        }
    }

    /// The accumulated failure context, for errors that carry one
    #[must_use]
    pub fn report(&self) -> Option<&FailureReport> {
        match self {
            Self::NoElementMatched(report) | Self::Driver(report) => Some(report),
            Self::Timeout { report, .. } => Some(report),
            _ => None,
        }
    }
}
