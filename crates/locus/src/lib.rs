//! Locus: pattern-driven element locators with ordered fallback matching
//!
//! UI tests name fields in business vocabulary ("the PROCEED button on the
//! SearchPage"). Locus turns such a request into ordered candidate
//! selectors, memoizes the result, and tries the candidates against a live
//! document until one matches.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    LOCUS Architecture                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Field      │    │ Pattern    │    │ Fallback   │            │
//! │   │ Request    │───►│ Resolver   │───►│ Matcher    │───► driver │
//! │   │            │    │  + cache   │    │            │            │
//! │   └────────────┘    └────────────┘    └────────────┘            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use locus::prelude::*;
//! use std::sync::Arc;
//!
//! let config = LocatorConfig::from_yaml(r#"
//! pattern_code: shop
//! patterns:
//!   shop:
//!     button: ["xpath=//button[text()='${fieldName}']"]
//! "#).unwrap();
//! let config = Arc::new(config);
//! let cache = Arc::new(LocatorCache::from_config(&config));
//! let mut resolver = PatternResolver::new(config, cache);
//!
//! let resolution = resolver.resolve(&FieldRequest::new("SearchPage", FieldType::Button, "PROCEED"));
//! assert_eq!(resolution.key.to_string(), "auto.loc.shop.searchPage.button.proceed");
//! assert_eq!(resolution.record.candidates, vec!["xpath=//button[text()='PROCEED']"]);
//! ```

#![warn(missing_docs)]

mod cache;
mod config;
mod diagnostics;
mod driver;
mod field;
mod key;
mod matcher;
mod pattern;
mod placeholder;
mod record;
mod resolver;
mod result;
mod steps;

pub use cache::{CacheLookup, LocatorCache};
pub use config::{LocatorConfig, DEFAULT_PATTERN_CODE};
pub use diagnostics::{Diagnostic, DiagnosticsSink, NullSink, RecordingSink, TracingSink};
pub use driver::{DocumentQuery, ElementHandle, ElementInteraction, QueryError, StaticDocument};
pub use field::{FieldRequest, FieldType};
pub use key::{normalize_segment, CacheKey, KeyOrigin, ResolvedKey, GENERATED_PREFIX, KEY_ROOT};
pub use matcher::{
    FallbackMatcher, MatchFailure, MatchFailureKind, WaitOptions, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_TIMEOUT_MS,
};
pub use pattern::{entry_name, PatternTable, PATTERN_INFIX};
pub use placeholder::{split_instance, PlaceholderContext, DEFAULT_INSTANCE};
pub use record::LocatorRecord;
pub use resolver::{PatternResolver, Resolution, ResolutionState, ResolverStats};
pub use result::{FailureReport, LocatorError, LocatorResult};
pub use steps::FieldLocators;

/// Prelude for convenient imports
pub mod prelude {
    pub use super::cache::*;
    pub use super::config::*;
    pub use super::diagnostics::*;
    pub use super::driver::*;
    pub use super::field::*;
    pub use super::key::*;
    pub use super::matcher::*;
    pub use super::pattern::*;
    pub use super::placeholder::*;
    pub use super::record::*;
    pub use super::resolver::*;
    pub use super::result::*;
    pub use super::steps::*;
}
