//! Configuration loading: pattern table and static locators.
//!
//! # Example
//!
//! ```yaml
//! pattern_code: shop
//! patterns:
//!   shop:
//!     button:
//!       - "xpath=//button[text()='${fieldName}']"
//!       - "xpath=//span[text()='${fieldName}']"
//!     radio: "xpath=//input[@name='${fieldName}'][@value='${fieldValue}']"
//!   admin.pattern.link:
//!     - "css=a[title='${fieldName}']"
//! locators:
//!   loc.shop.searchPage.button.proceed:
//!     candidates: ["css=#proceed"]
//!     description: "proceed button"
//!   loc.shop.home.link.help: "css=a.help"
//! ```
//!
//! Patterns may be nested by pattern code or written as flat
//! `{code}.pattern.{fieldType}` entries. Static locator keys are
//! re-normalized segment by segment, so hand-written casing does not matter.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::field::FieldType;
use crate::key::CacheKey;
use crate::pattern::PatternTable;
use crate::record::LocatorRecord;
use crate::result::{LocatorError, LocatorResult};

/// Pattern code used when configuration does not name one
pub const DEFAULT_PATTERN_CODE: &str = "default";

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTemplates {
    One(String),
    Many(Vec<String>),
}

impl RawTemplates {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(template) => vec![template],
            Self::Many(templates) => templates,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPatternEntry {
    Flat(RawTemplates),
    ByCode(BTreeMap<String, RawTemplates>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawLocator {
    One(String),
    Many(Vec<String>),
    Record(LocatorRecord),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    pattern_code: Option<String>,
    #[serde(default)]
    patterns: BTreeMap<String, RawPatternEntry>,
    #[serde(default)]
    locators: BTreeMap<String, RawLocator>,
}

/// Immutable configuration view: pattern table plus static locators.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocatorConfig {
    pattern_code: Option<String>,
    patterns: PatternTable,
    static_locators: BTreeMap<CacheKey, LocatorRecord>,
}

impl LocatorConfig {
    /// Create a configuration from a pattern table
    #[must_use]
    pub fn new(patterns: PatternTable) -> Self {
        Self {
            pattern_code: None,
            patterns,
            static_locators: BTreeMap::new(),
        }
    }

    /// Set the default pattern code
    #[must_use]
    pub fn with_pattern_code(mut self, pattern_code: impl Into<String>) -> Self {
        self.pattern_code = Some(pattern_code.into());
        self
    }

    /// Add a static locator. Degenerate records and malformed keys are
    /// dropped with a warning.
    #[must_use]
    pub fn with_static(mut self, key: &str, record: LocatorRecord) -> Self {
        self.add_static(key, record);
        self
    }

    fn add_static(&mut self, raw: &str, mut record: LocatorRecord) {
        let key = match CacheKey::from_authored(raw) {
            Ok(key) => key,
            Err(err) => {
                tracing::warn!(key = raw, error = %err, "ignoring static locator with malformed key");
                return;
            }
        };
        if record.is_degenerate(&key) {
            tracing::warn!(key = %key, "ignoring static locator without usable candidates");
            return;
        }
        if record.description.is_empty() {
            record.description = format!("static locator {key}");
        }
        let _ = self.static_locators.insert(key, record);
    }

    /// Parse YAML configuration
    ///
    /// # Errors
    ///
    /// Returns an error for invalid YAML, malformed pattern entries or
    /// unsupported field types.
    pub fn from_yaml(yaml: &str) -> LocatorResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: RawConfig = serde_yaml_ng::from_str(yaml)?;
        Self::from_raw(raw)
    }

    /// Parse JSON configuration (same schema as YAML)
    ///
    /// # Errors
    ///
    /// Returns an error for invalid JSON, malformed pattern entries or
    /// unsupported field types.
    pub fn from_json(json: &str) -> LocatorResult<Self> {
        let raw: RawConfig = serde_json::from_str(json)?;
        Self::from_raw(raw)
    }

    /// Load configuration from a file; `.json` files are parsed as JSON,
    /// everything else as YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> LocatorResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config = if is_json {
            Self::from_json(&content)?
        } else {
            Self::from_yaml(&content)?
        };
        tracing::debug!(
            path = %path.display(),
            patterns = config.patterns.len(),
            static_locators = config.static_locators.len(),
            "loaded locator configuration"
        );
        Ok(config)
    }

    fn from_raw(raw: RawConfig) -> LocatorResult<Self> {
        let mut patterns = PatternTable::new();
        for (name, entry) in raw.patterns {
            match entry {
                RawPatternEntry::Flat(templates) => {
                    patterns.insert_flat(&name, templates.into_vec())?;
                }
                RawPatternEntry::ByCode(by_type) => {
                    for (field_type, templates) in by_type {
                        let field_type: FieldType = field_type.parse().map_err(|_| {
                            LocatorError::config(format!(
                                "pattern code '{name}' names unsupported field type '{field_type}'"
                            ))
                        })?;
                        patterns.insert(&name, field_type, templates.into_vec());
                    }
                }
            }
        }

        let mut config = Self {
            pattern_code: raw.pattern_code.filter(|code| !code.trim().is_empty()),
            patterns,
            static_locators: BTreeMap::new(),
        };
        for (key, locator) in raw.locators {
            let record = match locator {
                RawLocator::One(candidate) => LocatorRecord::new(vec![candidate], ""),
                RawLocator::Many(candidates) => LocatorRecord::new(candidates, ""),
                RawLocator::Record(record) => record,
            };
            config.add_static(&key, record);
        }
        Ok(config)
    }

    /// Default pattern code, falling back to [`DEFAULT_PATTERN_CODE`]
    #[must_use]
    pub fn pattern_code(&self) -> &str {
        self.pattern_code.as_deref().unwrap_or(DEFAULT_PATTERN_CODE)
    }

    /// The pattern table
    #[must_use]
    pub const fn patterns(&self) -> &PatternTable {
        &self.patterns
    }

    /// Static locators keyed by unprefixed key
    #[must_use]
    pub const fn static_locators(&self) -> &BTreeMap<CacheKey, LocatorRecord> {
        &self.static_locators
    }
}
