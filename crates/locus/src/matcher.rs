//! Ordered fallback matching of a locator record against a document.
//!
//! Candidates are tried strictly in order; the first one matching at least
//! one element wins and nothing after it is queried. A selector the driver
//! rejects as malformed counts as "no match" for that candidate only. Any
//! other driver failure ends the pass.

use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

use crate::driver::{DocumentQuery, ElementHandle, QueryError};
use crate::field::FieldRequest;
use crate::key::ResolvedKey;
use crate::record::LocatorRecord;
use crate::result::{FailureReport, LocatorError};

/// Default timeout for waiting matches (5 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Options for waiting until a record matches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Why a match failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchFailureKind {
    /// Every candidate was tried and none matched
    NoMatch,
    /// The driver failed for a reason other than a malformed selector
    Driver(String),
    /// The deadline cut a single pass short
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
    },
}

/// A failed match, with every candidate tried in order
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{description}: tried {attempted:?}")]
pub struct MatchFailure {
    /// Why matching stopped
    pub kind: MatchFailureKind,
    /// Candidates tried, in order
    pub attempted: Vec<String>,
    /// Description of the record
    pub description: String,
    /// How long passes were repeated before giving up, when waiting
    pub waited_ms: Option<u64>,
}

impl MatchFailure {
    fn new(kind: MatchFailureKind, attempted: Vec<String>, record: &LocatorRecord) -> Self {
        Self {
            kind,
            attempted,
            description: record.description.clone(),
            waited_ms: None,
        }
    }

    /// Whether matching simply found nothing
    #[must_use]
    pub fn is_no_match(&self) -> bool {
        self.kind == MatchFailureKind::NoMatch
    }

    /// Attach the request and key the record was resolved for
    #[must_use]
    pub fn into_error(self, request: &FieldRequest, key: &ResolvedKey) -> LocatorError {
        let detail = match (&self.kind, self.waited_ms) {
            (MatchFailureKind::Driver(message), _) => Some(message.clone()),
            (MatchFailureKind::NoMatch, Some(ms)) => Some(format!("no candidate matched within {ms}ms")),
            (MatchFailureKind::NoMatch | MatchFailureKind::Timeout { .. }, _) => None,
        };
        let report = Box::new(FailureReport {
            page: request.page.clone(),
            field_type: request.field_type.to_string(),
            field_name: request.field_name.clone(),
            key: key.to_string(),
            description: self.description,
            attempted: self.attempted,
            detail,
        });
        match self.kind {
            MatchFailureKind::NoMatch => LocatorError::NoElementMatched(report),
            MatchFailureKind::Driver(_) => LocatorError::Driver(report),
            MatchFailureKind::Timeout { ms } => LocatorError::Timeout { ms, report },
        }
    }
}

/// Tries a record's candidates against a document
#[derive(Debug)]
pub struct FallbackMatcher<'a, D: DocumentQuery + ?Sized> {
    document: &'a D,
}

impl<'a, D: DocumentQuery + ?Sized> FallbackMatcher<'a, D> {
    /// Create a matcher over `document`
    #[must_use]
    pub const fn new(document: &'a D) -> Self {
        Self { document }
    }

    /// One pass over the candidates.
    ///
    /// # Errors
    ///
    /// `NoMatch` when no candidate matched (immediately, without driver
    /// calls, for an empty record); `Driver` when the driver failed.
    pub async fn resolve_element(&self, record: &LocatorRecord) -> Result<ElementHandle, MatchFailure> {
        let mut attempted = Vec::with_capacity(record.candidates.len());
        let outcome = self.pass(record, &mut attempted).await;
        Self::finish(outcome, attempted, record)
    }

    /// One pass over the candidates, bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// As [`Self::resolve_element`], plus `Timeout` carrying the candidates
    /// tried before the deadline.
    pub async fn resolve_element_within(
        &self,
        record: &LocatorRecord,
        timeout: Duration,
    ) -> Result<ElementHandle, MatchFailure> {
        let mut attempted = Vec::with_capacity(record.candidates.len());
        let outcome = tokio::time::timeout(timeout, self.pass(record, &mut attempted)).await;
        match outcome {
            Ok(outcome) => Self::finish(outcome, attempted, record),
            Err(_) => Err(MatchFailure::new(
                MatchFailureKind::Timeout {
                    ms: duration_ms(timeout),
                },
                attempted,
                record,
            )),
        }
    }

    /// Repeat full passes until a candidate matches or the timeout passes.
    ///
    /// An empty record and driver failures are not retried.
    ///
    /// # Errors
    ///
    /// `NoMatch` with the trail of the last pass and `waited_ms` set once the
    /// timeout passes, or the first non-retryable failure.
    pub async fn wait_for_element(
        &self,
        record: &LocatorRecord,
        options: &WaitOptions,
    ) -> Result<ElementHandle, MatchFailure> {
        let deadline = Instant::now() + options.timeout();
        let mut passes = 0_u32;
        loop {
            passes += 1;
            let failure = match self.resolve_element(record).await {
                Ok(element) => return Ok(element),
                Err(failure) => failure,
            };
            if !failure.is_no_match() || record.candidates.is_empty() {
                return Err(failure);
            }

            let now = Instant::now();
            if now >= deadline {
                tracing::debug!(
                    description = %record.description,
                    passes,
                    timeout_ms = options.timeout_ms,
                    "gave up waiting for element"
                );
                return Err(MatchFailure {
                    waited_ms: Some(options.timeout_ms),
                    ..failure
                });
            }
            tokio::time::sleep(options.poll_interval().min(deadline - now)).await;
        }
    }

    async fn pass(
        &self,
        record: &LocatorRecord,
        attempted: &mut Vec<String>,
    ) -> Result<Option<ElementHandle>, QueryError> {
        for candidate in &record.candidates {
            attempted.push(candidate.clone());
            match self.try_candidate(candidate).await {
                Ok(Some(element)) => {
                    tracing::debug!(
                        candidate = %candidate,
                        position = attempted.len(),
                        element = %element.id,
                        "candidate matched"
                    );
                    return Ok(Some(element));
                }
                Ok(None) => {}
                Err(err) if err.is_invalid_selector() => {
                    tracing::debug!(candidate = %candidate, error = %err, "skipping rejected selector");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(None)
    }

    async fn try_candidate(&self, candidate: &str) -> Result<Option<ElementHandle>, QueryError> {
        if self.document.match_count(candidate).await? == 0 {
            return Ok(None);
        }
        self.document.first_match(candidate).await
    }

    fn finish(
        outcome: Result<Option<ElementHandle>, QueryError>,
        attempted: Vec<String>,
        record: &LocatorRecord,
    ) -> Result<ElementHandle, MatchFailure> {
        match outcome {
            Ok(Some(element)) => Ok(element),
            Ok(None) => Err(MatchFailure::new(MatchFailureKind::NoMatch, attempted, record)),
            Err(err) => Err(MatchFailure::new(
                MatchFailureKind::Driver(err.to_string()),
                attempted,
                record,
            )),
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
