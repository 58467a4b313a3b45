//! Pattern table: (pattern code, field type) → ordered templates.
//!
//! Read-only once loaded. Entries are addressed the way they are written in
//! flat configuration files, `{patternCode}.pattern.{fieldType}`.

use std::collections::BTreeMap;

use crate::field::FieldType;
use crate::key::normalize_segment;
use crate::result::{LocatorError, LocatorResult};

/// Infix separating pattern code and field type in flat entry names
pub const PATTERN_INFIX: &str = "pattern";

/// Immutable mapping from pattern code and field type to templates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternTable {
    entries: BTreeMap<(String, FieldType), Vec<String>>,
}

impl PatternTable {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the templates for a pattern code and field type
    #[must_use]
    pub fn with_templates<I, S>(mut self, pattern_code: &str, field_type: FieldType, templates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(pattern_code, field_type, templates.into_iter().map(Into::into).collect());
        self
    }

    /// Add (or replace) the templates for a pattern code and field type
    pub fn insert(&mut self, pattern_code: &str, field_type: FieldType, templates: Vec<String>) {
        let _ = self
            .entries
            .insert((normalize_segment(pattern_code), field_type), templates);
    }

    /// Add an entry by its flat name, `{patternCode}.pattern.{fieldType}`
    ///
    /// # Errors
    ///
    /// Returns a config error for a malformed name and
    /// `UnsupportedFieldType` for an unknown field type.
    pub fn insert_flat(&mut self, entry_name: &str, templates: Vec<String>) -> LocatorResult<()> {
        let (pattern_code, field_type) = parse_entry_name(entry_name)?;
        self.insert(pattern_code, field_type, templates);
        Ok(())
    }

    /// Templates for a pattern code and field type.
    ///
    /// Returns `None` when the entry is missing or degenerate (no non-blank
    /// template).
    #[must_use]
    pub fn templates(&self, pattern_code: &str, field_type: FieldType) -> Option<&[String]> {
        self.entries
            .get(&(normalize_segment(pattern_code), field_type))
            .filter(|templates| templates.iter().any(|t| !t.trim().is_empty()))
            .map(Vec::as_slice)
    }

    /// Pattern codes with at least one entry
    #[must_use]
    pub fn pattern_codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.entries.keys().map(|(code, _)| code.as_str()).collect();
        codes.dedup();
        codes
    }

    /// Field types with a usable entry under `pattern_code`
    #[must_use]
    pub fn configured_types(&self, pattern_code: &str) -> Vec<FieldType> {
        FieldType::ALL
            .into_iter()
            .filter(|t| self.templates(pattern_code, *t).is_some())
            .collect()
    }

    /// Field types with no usable entry under `pattern_code`
    #[must_use]
    pub fn missing_types(&self, pattern_code: &str) -> Vec<FieldType> {
        FieldType::ALL
            .into_iter()
            .filter(|t| self.templates(pattern_code, *t).is_none())
            .collect()
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Flat entry name for a pattern code and field type
#[must_use]
pub fn entry_name(pattern_code: &str, field_type: FieldType) -> String {
    format!(
        "{}.{PATTERN_INFIX}.{}",
        normalize_segment(pattern_code),
        field_type.as_str()
    )
}

fn parse_entry_name(entry_name: &str) -> LocatorResult<(&str, FieldType)> {
    let mut parts = entry_name.trim().split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(code), Some(PATTERN_INFIX), Some(field_type), None) if !code.is_empty() => {
            Ok((code, field_type.parse()?))
        }
        _ => Err(LocatorError::config(format!(
            "pattern entry '{entry_name}' is not of the form <code>.{PATTERN_INFIX}.<fieldType>"
        ))),
    }
}
