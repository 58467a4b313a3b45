//! Pattern resolver: request → cache key → locator record.
//!
//! ```text
//!   CHECK_STATIC ──hit──────────────────────────────► RESOLVED (static key)
//!        │ miss
//!        ▼
//!   CHECK_CACHE ───hit──────────────────────────────► RESOLVED (generated key)
//!        │ miss / invalid
//!        ▼
//!   GENERATE ──► STORE ─────────────────────────────► RESOLVED (generated key)
//! ```
//!
//! A static entry always wins. A generated entry is never regenerated while
//! it is usable; only an empty record (pattern not configured) or an
//! unreadable persisted one is produced again.

use std::fmt;
use std::sync::Arc;

use crate::cache::{CacheLookup, LocatorCache};
use crate::config::LocatorConfig;
use crate::diagnostics::{Diagnostic, DiagnosticsSink, TracingSink};
use crate::field::FieldRequest;
use crate::key::{CacheKey, ResolvedKey};
use crate::placeholder::PlaceholderContext;
use crate::record::LocatorRecord;

/// Resolver state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    /// Looking for a human-authored entry
    CheckStatic,
    /// Looking for a previously generated entry
    CheckCache,
    /// Substituting pattern templates
    Generate,
    /// Writing the generated record
    Store,
    /// Done
    Resolved,
}

impl fmt::Display for ResolutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CheckStatic => "CHECK_STATIC",
            Self::CheckCache => "CHECK_CACHE",
            Self::Generate => "GENERATE",
            Self::Store => "STORE",
            Self::Resolved => "RESOLVED",
        };
        f.write_str(name)
    }
}

/// Result of resolving one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Key to pass forward to later lookups
    pub key: ResolvedKey,
    /// The record found or generated
    pub record: Arc<LocatorRecord>,
    /// The request that was resolved
    pub request: FieldRequest,
}

/// Counters for what each resolution did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverStats {
    /// Resolutions answered by a static entry
    pub static_hits: u64,
    /// Resolutions answered by a generated entry
    pub cache_hits: u64,
    /// Resolutions that generated and stored a record
    pub generated: u64,
    /// Generations with no usable pattern
    pub unconfigured: u64,
    /// Persisted entries discarded as unreadable
    pub invalid_cached: u64,
}

/// Resolves field requests for one test context.
///
/// Each resolver owns its placeholder context, so resolvers must not be
/// shared between concurrently running contexts; the cache may be.
#[derive(Debug)]
pub struct PatternResolver {
    config: Arc<LocatorConfig>,
    cache: Arc<LocatorCache>,
    sink: Arc<dyn DiagnosticsSink>,
    pattern_code: String,
    placeholders: PlaceholderContext,
    stats: ResolverStats,
}

impl PatternResolver {
    /// Create a resolver using the configuration's pattern code and a
    /// `tracing` diagnostics sink
    #[must_use]
    pub fn new(config: Arc<LocatorConfig>, cache: Arc<LocatorCache>) -> Self {
        let pattern_code = config.pattern_code().to_string();
        Self {
            config,
            cache,
            sink: Arc::new(TracingSink),
            pattern_code,
            placeholders: PlaceholderContext::new(),
            stats: ResolverStats::default(),
        }
    }

    /// Use a different diagnostics sink
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Use a different pattern code
    #[must_use]
    pub fn with_pattern_code(mut self, pattern_code: impl Into<String>) -> Self {
        self.pattern_code = pattern_code.into();
        self
    }

    /// Pattern code in effect
    #[must_use]
    pub fn pattern_code(&self) -> &str {
        &self.pattern_code
    }

    /// Shared cache
    #[must_use]
    pub const fn cache(&self) -> &Arc<LocatorCache> {
        &self.cache
    }

    /// Diagnostics sink
    #[must_use]
    pub const fn sink(&self) -> &Arc<dyn DiagnosticsSink> {
        &self.sink
    }

    /// Counters so far
    #[must_use]
    pub const fn stats(&self) -> ResolverStats {
        self.stats
    }

    /// Unprefixed key for a request
    #[must_use]
    pub fn key_for(&self, request: &FieldRequest) -> CacheKey {
        CacheKey::for_request(&self.pattern_code, request)
    }

    /// Resolve a request to a locator record.
    ///
    /// Never fails: a missing pattern yields an empty record and a
    /// `PatternNotConfigured` diagnostic, leaving the failure to matching.
    pub fn resolve(&mut self, request: &FieldRequest) -> Resolution {
        let key = self.key_for(request);

        trace_state(ResolutionState::CheckStatic, &key);
        if let Some(record) = self.cache.get_static(&key) {
            self.stats.static_hits += 1;
            trace_state(ResolutionState::Resolved, &key);
            return Resolution {
                key: ResolvedKey::static_key(key),
                record,
                request: request.clone(),
            };
        }

        let resolved = ResolvedKey::generated(key);
        trace_state(ResolutionState::CheckCache, &resolved.key);
        match self.cache.get_generated(&resolved.key) {
            CacheLookup::Hit(record) => {
                self.stats.cache_hits += 1;
                trace_state(ResolutionState::Resolved, &resolved.key);
                return Resolution {
                    key: resolved,
                    record,
                    request: request.clone(),
                };
            }
            CacheLookup::Invalid { reason } => {
                self.stats.invalid_cached += 1;
                self.sink.emit(&Diagnostic::InvalidCachedRecord {
                    key: resolved.to_string(),
                    reason,
                });
            }
            CacheLookup::Miss => {}
        }

        trace_state(ResolutionState::Generate, &resolved.key);
        let record = self.generate(&resolved, request);

        trace_state(ResolutionState::Store, &resolved.key);
        let record = self.cache.store_generated(resolved.key.clone(), record);
        self.stats.generated += 1;

        trace_state(ResolutionState::Resolved, &resolved.key);
        Resolution {
            key: resolved,
            record,
            request: request.clone(),
        }
    }

    fn generate(&mut self, resolved: &ResolvedKey, request: &FieldRequest) -> LocatorRecord {
        self.placeholders.reset();
        self.placeholders.populate(request);

        let candidates = match self
            .config
            .patterns()
            .templates(&self.pattern_code, request.field_type)
        {
            Some(templates) => self.placeholders.substitute_all(templates),
            None => {
                self.stats.unconfigured += 1;
                self.sink.emit(&Diagnostic::PatternNotConfigured {
                    pattern_code: self.pattern_code.clone(),
                    page: request.page.clone(),
                    field_type: request.field_type.to_string(),
                    field_name: request.field_name.clone(),
                    key: resolved.to_string(),
                });
                Vec::new()
            }
        };

        self.placeholders.reset();
        LocatorRecord::new(candidates, request.describe())
    }
}

fn trace_state(state: ResolutionState, key: &CacheKey) {
    tracing::trace!(state = %state, key = %key, "resolver transition");
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::diagnostics::RecordingSink;
    use crate::field::FieldType;
    use crate::key::KeyOrigin;
    use crate::pattern::PatternTable;

    fn config() -> LocatorConfig {
        LocatorConfig::new(
            PatternTable::new()
                .with_templates(
                    "shop",
                    FieldType::Button,
                    ["xpath=//button[text()='${fieldName}']", "xpath=//span[text()='${fieldName}']"],
                )
                .with_templates(
                    "shop",
                    FieldType::Radio,
                    ["xpath=//input[@name='${fieldName}'][@value='${fieldValue}']"],
                )
                .with_templates(
                    "shop",
                    FieldType::Input,
                    ["xpath=(//input[@name='${fieldName}'])[${fieldInstance}]"],
                ),
        )
        .with_pattern_code("shop")
    }

    fn resolver_with(config: LocatorConfig) -> (PatternResolver, Arc<RecordingSink>) {
        let cache = Arc::new(LocatorCache::from_config(&config));
        let sink = Arc::new(RecordingSink::new());
        let resolver = PatternResolver::new(Arc::new(config), cache).with_sink(sink.clone());
        (resolver, sink)
    }

    mod generation_tests {
        use super::*;

        #[test]
        fn test_search_page_proceed() {
            let (mut resolver, _) = resolver_with(config());
            let resolution =
                resolver.resolve(&FieldRequest::new("SearchPage", FieldType::Button, "PROCEED"));

            assert_eq!(resolution.key.key.as_str(), "loc.shop.searchPage.button.proceed");
            assert_eq!(resolution.key.origin, KeyOrigin::Generated);
            assert_eq!(
                resolution.record.candidates,
                vec![
                    "xpath=//button[text()='PROCEED']",
                    "xpath=//span[text()='PROCEED']",
                ]
            );
            assert_eq!(resolution.record.description, "button 'PROCEED' on SearchPage");
        }

        #[test]
        fn test_instance_substitution() {
            let (mut resolver, _) = resolver_with(config());
            let resolution =
                resolver.resolve(&FieldRequest::new("Checkout", FieldType::Input, "Address[2]"));
            assert_eq!(
                resolution.record.candidates,
                vec!["xpath=(//input[@name='Address'])[2]"]
            );
        }

        #[test]
        fn test_radio_values_resolve_separately() {
            let (mut resolver, _) = resolver_with(config());
            let male = resolver.resolve(
                &FieldRequest::new("Signup", FieldType::Radio, "Gender").with_value("Male"),
            );
            let female = resolver.resolve(
                &FieldRequest::new("Signup", FieldType::Radio, "Gender").with_value("Female"),
            );
            assert_ne!(male.key, female.key);
            assert!(female.record.candidates[0].contains("@value='Female'"));
            assert_eq!(resolver.stats().generated, 2);
        }

        #[test]
        fn test_placeholder_state_does_not_leak() {
            let (mut resolver, _) = resolver_with(config());
            let _ = resolver.resolve(
                &FieldRequest::new("Signup", FieldType::Radio, "Gender[3]").with_value("Male"),
            );
            let next = resolver.resolve(&FieldRequest::new("Checkout", FieldType::Input, "Zip"));
            assert_eq!(next.record.candidates, vec!["xpath=(//input[@name='Zip'])[1]"]);
        }
    }

    mod precedence_tests {
        use super::*;

        #[test]
        fn test_static_wins_without_pattern() {
            let config = config().with_static(
                "loc.shop.home.image.logo",
                LocatorRecord::new(vec!["css=img.logo".to_string()], "logo"),
            );
            let (mut resolver, sink) = resolver_with(config);
            let resolution = resolver.resolve(&FieldRequest::new("Home", FieldType::Image, "Logo"));

            assert_eq!(resolution.key.origin, KeyOrigin::Static);
            assert_eq!(resolution.key.to_string(), "loc.shop.home.image.logo");
            assert_eq!(resolution.record.candidates, vec!["css=img.logo"]);
            assert!(sink.events().is_empty());
            assert_eq!(resolver.stats().static_hits, 1);
        }

        #[test]
        fn test_static_key_with_mixed_case_field_type_wins() {
            let config = config().with_static(
                "loc.shop.Home.CheckBox.Remember",
                LocatorRecord::new(vec!["css=#remember".to_string()], "remember me"),
            );
            let (mut resolver, _) = resolver_with(config);
            let resolution =
                resolver.resolve(&FieldRequest::new("Home", FieldType::Checkbox, "Remember"));

            assert_eq!(resolution.key.origin, KeyOrigin::Static);
            assert_eq!(resolution.key.to_string(), "loc.shop.home.checkbox.remember");
            assert_eq!(resolution.record.candidates, vec!["css=#remember"]);
        }

        #[test]
        fn test_static_wins_over_pattern_and_is_never_overwritten() {
            let config = config().with_static(
                "loc.shop.searchPage.button.proceed",
                LocatorRecord::new(vec!["css=#proceed".to_string()], "proceed"),
            );
            let (mut resolver, _) = resolver_with(config);
            let request = FieldRequest::new("SearchPage", FieldType::Button, "PROCEED");
            for _ in 0..3 {
                let resolution = resolver.resolve(&request);
                assert_eq!(resolution.record.candidates, vec!["css=#proceed"]);
            }
            assert_eq!(resolver.stats().generated, 0);
            assert_eq!(resolver.cache().generated_len(), 0);
        }
    }

    mod memoization_tests {
        use super::*;

        #[test]
        fn test_second_resolution_hits_cache() {
            let (mut resolver, _) = resolver_with(config());
            let request = FieldRequest::new("SearchPage", FieldType::Button, "PROCEED");
            let first = resolver.resolve(&request);
            let second = resolver.resolve(&request);

            assert!(Arc::ptr_eq(&first.record, &second.record));
            assert_eq!(first.key, second.key);
            assert_eq!(resolver.stats().generated, 1);
            assert_eq!(resolver.stats().cache_hits, 1);
        }

        #[test]
        fn test_equivalent_spellings_share_entry() {
            let (mut resolver, _) = resolver_with(config());
            let _ = resolver.resolve(&FieldRequest::new("Search Page", FieldType::Button, "proceed"));
            let _ = resolver.resolve(&FieldRequest::new("search-page", FieldType::Button, "PROCEED"));
            assert_eq!(resolver.stats().generated, 1);
        }

        #[test]
        fn test_shared_cache_across_resolvers() {
            let config = Arc::new(config());
            let cache = Arc::new(LocatorCache::from_config(&config));
            let mut first = PatternResolver::new(Arc::clone(&config), Arc::clone(&cache));
            let mut second = PatternResolver::new(Arc::clone(&config), Arc::clone(&cache));

            let request = FieldRequest::new("Home", FieldType::Button, "Go");
            let _ = first.resolve(&request);
            let _ = second.resolve(&request);

            assert_eq!(first.stats().generated, 1);
            assert_eq!(second.stats().cache_hits, 1);
        }

        #[test]
        fn test_pattern_codes_do_not_collide() {
            let config = Arc::new(
                LocatorConfig::new(
                    PatternTable::new()
                        .with_templates("web", FieldType::Button, ["css=button.${fieldName}"])
                        .with_templates("mobile", FieldType::Button, ["id=${fieldName}"]),
                ),
            );
            let cache = Arc::new(LocatorCache::new());
            let mut web =
                PatternResolver::new(Arc::clone(&config), Arc::clone(&cache)).with_pattern_code("web");
            let mut mobile =
                PatternResolver::new(Arc::clone(&config), Arc::clone(&cache)).with_pattern_code("mobile");

            let request = FieldRequest::new("Home", FieldType::Button, "Go");
            assert_eq!(web.resolve(&request).record.candidates, vec!["css=button.Go"]);
            assert_eq!(mobile.resolve(&request).record.candidates, vec!["id=Go"]);
            assert_eq!(cache.generated_len(), 2);
        }
    }

    mod unconfigured_tests {
        use super::*;

        #[test]
        fn test_missing_pattern_reports_and_yields_empty_record() {
            let (mut resolver, sink) = resolver_with(config());
            let resolution = resolver.resolve(&FieldRequest::new("Home", FieldType::Image, "Logo"));

            assert!(resolution.record.is_empty());
            assert_eq!(resolution.key.origin, KeyOrigin::Generated);
            let events = sink.events();
            assert_eq!(events.len(), 1);
            assert!(matches!(
                &events[0],
                Diagnostic::PatternNotConfigured { field_type, key, .. }
                    if field_type == "image" && key == "auto.loc.shop.home.image.logo"
            ));
        }

        #[test]
        fn test_empty_record_is_regenerated() {
            let (mut resolver, sink) = resolver_with(config());
            let request = FieldRequest::new("Home", FieldType::Image, "Logo");
            let _ = resolver.resolve(&request);
            let _ = resolver.resolve(&request);
            assert_eq!(resolver.stats().unconfigured, 2);
            assert_eq!(sink.count("pattern_not_configured"), 2);
        }
    }

    mod invalid_cache_tests {
        use super::*;

        #[test]
        fn test_unreadable_persisted_entry_is_regenerated() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("generated.json");
            std::fs::write(
                &path,
                r#"{"auto.loc.shop.searchPage.button.proceed": 42}"#,
            )
            .unwrap();

            let (mut resolver, sink) = resolver_with(config());
            let _ = resolver.cache().load_generated(&path).unwrap();

            let resolution =
                resolver.resolve(&FieldRequest::new("SearchPage", FieldType::Button, "PROCEED"));
            assert_eq!(resolution.record.candidates.len(), 2);
            assert_eq!(sink.count("invalid_cached_record"), 1);
            assert_eq!(resolver.stats().invalid_cached, 1);
            assert_eq!(resolver.stats().generated, 1);
        }
    }
}
