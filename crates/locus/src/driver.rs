//! Document driver boundary.
//!
//! Selectors are opaque strings: the driver decides what `xpath=` or `css=`
//! means. The matcher only ever asks how many elements a selector matches
//! and for the first of them.
//!
//! # Implementations
//!
//! - [`StaticDocument`] - in-memory document for unit tests and dry runs
//! - anything wrapping a real automation engine, outside this crate

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

use crate::result::LocatorResult;

/// Handle to a matched element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementHandle {
    /// Unique identifier for the element
    pub id: String,
    /// Element tag name
    #[serde(default)]
    pub tag_name: String,
    /// Element text content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    /// Selector that produced this handle
    #[serde(default)]
    pub selector: String,
}

impl ElementHandle {
    /// Create a new element handle
    #[must_use]
    pub fn new(id: impl Into<String>, tag_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag_name: tag_name.into(),
            text_content: None,
            selector: String::new(),
        }
    }

    /// Set text content
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }
}

/// Failure reported by a driver for a single query
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The driver rejected the selector as malformed
    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector {
        /// The rejected selector
        selector: String,
        /// Driver message
        message: String,
    },

    /// The driver lost its connection to the document
    #[error("Driver disconnected: {message}")]
    Disconnected {
        /// Driver message
        message: String,
    },

    /// Any other driver failure
    #[error("Driver error: {message}")]
    Driver {
        /// Driver message
        message: String,
    },
}

impl QueryError {
    /// Whether the error only concerns the selector, not the driver
    #[must_use]
    pub const fn is_invalid_selector(&self) -> bool {
        matches!(self, Self::InvalidSelector { .. })
    }
}

/// Read access to a live document
#[async_trait]
pub trait DocumentQuery: Send + Sync {
    /// Number of elements matching `selector`
    async fn match_count(&self, selector: &str) -> Result<usize, QueryError>;

    /// First element matching `selector`, if any
    async fn first_match(&self, selector: &str) -> Result<Option<ElementHandle>, QueryError>;
}

/// Interaction with a matched element
#[async_trait]
pub trait ElementInteraction: Send + Sync {
    /// Click the element
    async fn click(&self, element: &ElementHandle) -> Result<(), QueryError>;

    /// Replace the element's value with `text`
    async fn fill(&self, element: &ElementHandle, text: &str) -> Result<(), QueryError>;
}

/// In-memory document: each selector maps to the elements it matches.
///
/// Every query is recorded so tests can assert which candidates were tried.
/// All state sits behind mutexes, so the document can be changed while a
/// matcher is polling it.
#[derive(Debug, Default)]
pub struct StaticDocument {
    elements: Mutex<BTreeMap<String, Vec<ElementHandle>>>,
    rejected: Mutex<BTreeSet<String>>,
    failure: Mutex<Option<String>>,
    values: Mutex<HashMap<String, String>>,
    call_history: Mutex<Vec<String>>,
}

impl StaticDocument {
    /// Create an empty document
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a document from YAML: a map from selector to matched elements.
    ///
    /// ```yaml
    /// "css=#proceed":
    ///   - id: proceed
    ///     tag_name: button
    ///     text_content: PROCEED
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is not such a map.
    pub fn from_yaml(yaml: &str) -> LocatorResult<Self> {
        let document = Self::new();
        if yaml.trim().is_empty() {
            return Ok(document);
        }
        let parsed: BTreeMap<String, Vec<ElementHandle>> = serde_yaml_ng::from_str(yaml)?;
        for (selector, elements) in parsed {
            document.insert(selector, elements);
        }
        Ok(document)
    }

    /// Add an element matched by `selector`
    #[must_use]
    pub fn with_element(self, selector: impl Into<String>, element: ElementHandle) -> Self {
        self.insert(selector, vec![element]);
        self
    }

    /// Mark `selector` as malformed
    #[must_use]
    pub fn with_rejected(self, selector: impl Into<String>) -> Self {
        let _ = lock(&self.rejected).insert(selector.into());
        self
    }

    /// Append elements matched by `selector`
    pub fn insert(&self, selector: impl Into<String>, elements: Vec<ElementHandle>) {
        let selector = selector.into();
        let mut map = lock(&self.elements);
        let entry = map.entry(selector.clone()).or_default();
        entry.extend(elements.into_iter().map(|mut element| {
            element.selector.clone_from(&selector);
            element
        }));
    }

    /// Remove every element matched by `selector`
    pub fn remove(&self, selector: &str) {
        let _ = lock(&self.elements).remove(selector);
    }

    /// Make every following call fail as if the connection dropped
    pub fn disconnect(&self, message: impl Into<String>) {
        *lock(&self.failure) = Some(message.into());
    }

    /// Value last filled into the element with `id`
    #[must_use]
    pub fn value_of(&self, id: &str) -> Option<String> {
        lock(&self.values).get(id).cloned()
    }

    /// Selectors known to the document
    #[must_use]
    pub fn selectors(&self) -> Vec<String> {
        lock(&self.elements).keys().cloned().collect()
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        lock(&self.call_history).clone()
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        lock(&self.call_history).iter().any(|c| c.starts_with(method))
    }

    /// Check if `selector` was queried at all
    #[must_use]
    pub fn was_queried(&self, selector: &str) -> bool {
        lock(&self.call_history)
            .iter()
            .any(|c| c.split_once(':').is_some_and(|(_, s)| s == selector))
    }

    fn record(&self, call: String) {
        lock(&self.call_history).push(call);
    }

    fn check(&self, selector: &str) -> Result<(), QueryError> {
        if let Some(message) = lock(&self.failure).clone() {
            return Err(QueryError::Disconnected { message });
        }
        if lock(&self.rejected).contains(selector) {
            return Err(QueryError::InvalidSelector {
                selector: selector.to_string(),
                message: "rejected by document".to_string(),
            });
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl DocumentQuery for StaticDocument {
    async fn match_count(&self, selector: &str) -> Result<usize, QueryError> {
        self.record(format!("match_count:{selector}"));
        self.check(selector)?;
        Ok(lock(&self.elements).get(selector).map_or(0, Vec::len))
    }

    async fn first_match(&self, selector: &str) -> Result<Option<ElementHandle>, QueryError> {
        self.record(format!("first_match:{selector}"));
        self.check(selector)?;
        Ok(lock(&self.elements)
            .get(selector)
            .and_then(|elements| elements.first().cloned()))
    }
}

#[async_trait]
impl ElementInteraction for StaticDocument {
    async fn click(&self, element: &ElementHandle) -> Result<(), QueryError> {
        self.record(format!("click:{}", element.selector));
        self.check(&element.selector)?;
        Ok(())
    }

    async fn fill(&self, element: &ElementHandle, text: &str) -> Result<(), QueryError> {
        self.record(format!("fill:{}", element.selector));
        self.check(&element.selector)?;
        let _ = lock(&self.values).insert(element.id.clone(), text.to_string());
        Ok(())
    }
}
