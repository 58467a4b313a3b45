//! Locator records: ordered candidate selectors for one field.

use serde::{Deserialize, Serialize};

use crate::key::CacheKey;

/// Ordered candidate selectors plus a description.
///
/// Candidate order is priority order; the matcher tries them first to last.
/// Records are shared as `Arc<LocatorRecord>` once stored and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocatorRecord {
    /// Selectors to try, most specific first
    pub candidates: Vec<String>,
    /// Human-readable description of the field
    #[serde(default)]
    pub description: String,
}

impl LocatorRecord {
    /// Create a record
    #[must_use]
    pub fn new(candidates: Vec<String>, description: impl Into<String>) -> Self {
        Self {
            candidates,
            description: description.into(),
        }
    }

    /// A record with no candidates (pattern not configured)
    #[must_use]
    pub fn empty(description: impl Into<String>) -> Self {
        Self::new(Vec::new(), description)
    }

    /// Whether the record has no candidates
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Whether the record carries nothing a matcher could use.
    ///
    /// A record is degenerate when it has no non-blank candidate, or when its
    /// only candidate is the key itself (an echo store).
    #[must_use]
    pub fn is_degenerate(&self, key: &CacheKey) -> bool {
        let mut usable = self.candidates.iter().filter(|c| !c.trim().is_empty());
        match (usable.next(), usable.next()) {
            (None, _) => true,
            (Some(only), None) => only.trim() == key.as_str(),
            _ => false,
        }
    }
}
