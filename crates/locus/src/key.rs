//! Cache key derivation.
//!
//! A key has the shape `loc.{patternCode}.{page}.{fieldType}.{fieldName}`,
//! with every variable segment normalized to camelCase. For value-bearing
//! field types a sixth segment holds the normalized value, so that two radio
//! options of the same group never share a record.
//!
//! # Normalization
//!
//! 1. Runs of non-alphanumeric characters separate words.
//! 2. A word with no lowercase letters (`PROCEED`, `FIRST`) is lowercased.
//! 3. The first word starts lowercase, every later word starts uppercase,
//!    and the words are joined without separators.
//! 4. A result with no lowercase letters at all (`2X`) is lowercased.
//!
//! Normalization is idempotent: the output contains no separators, never
//! starts with an uppercase letter and is never all-caps, so a second pass
//! changes nothing.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::field::{FieldRequest, FieldType};
use crate::result::{LocatorError, LocatorResult};

/// Leading segment of every locator key
pub const KEY_ROOT: &str = "loc";

/// Rendering prefix for keys in the generated namespace
pub const GENERATED_PREFIX: &str = "auto.";

/// Normalize one key segment to camelCase.
#[must_use]
pub fn normalize_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let words = raw
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty());

    for (index, word) in words.enumerate() {
        let word = if has_lowercase(word) {
            word.to_string()
        } else {
            word.to_lowercase()
        };
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            if index == 0 {
                out.extend(first.to_lowercase());
            } else {
                out.extend(first.to_uppercase());
            }
            out.push_str(chars.as_str());
        }
    }

    out.retain(char::is_alphanumeric);
    if has_lowercase(&out) {
        out
    } else {
        out.to_lowercase()
    }
}

fn has_lowercase(s: &str) -> bool {
    s.chars().any(char::is_lowercase)
}

/// Canonical key identifying one resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Build a key from raw, unnormalized parts.
    #[must_use]
    pub fn build(pattern_code: &str, page: &str, field_type: FieldType, field_name: &str) -> Self {
        Self(format!(
            "{KEY_ROOT}.{}.{}.{}.{}",
            normalize_segment(pattern_code),
            normalize_segment(page),
            field_type.as_str(),
            normalize_segment(field_name)
        ))
    }

    /// Build the key for a request, including the value segment when the
    /// field type is value-bearing and a value was given.
    #[must_use]
    pub fn for_request(pattern_code: &str, request: &FieldRequest) -> Self {
        let key = Self::build(
            pattern_code,
            &request.page,
            request.field_type,
            &request.field_name,
        );
        match request.field_value.as_deref() {
            Some(value) if request.field_type.is_value_bearing() => {
                let value = normalize_segment(value);
                if value.is_empty() {
                    key
                } else {
                    Self(format!("{}.{value}", key.0))
                }
            }
            _ => key,
        }
    }

    /// Re-normalize a key written by hand (static locator files) into the
    /// form [`Self::build`] produces. The field type segment is matched
    /// case-insensitively (`CheckBox` is `checkbox`). Already-canonical keys
    /// come back unchanged.
    ///
    /// # Errors
    ///
    /// `Config` when the key is not `loc.{code}.{page}.{type}.{name}`, with an
    /// optional value segment for value-bearing types, or has an empty
    /// segment. `UnsupportedFieldType` for an unknown type segment.
    pub fn from_authored(raw: &str) -> LocatorResult<Self> {
        let raw = raw.trim();
        let parts: Vec<&str> = raw.split('.').collect();
        let malformed = |reason: &str| LocatorError::config(format!("locator key '{raw}' {reason}"));

        let [root, code, page, field_type, name, rest @ ..] = parts.as_slice() else {
            return Err(malformed("needs at least 5 segments"));
        };
        if *root != KEY_ROOT {
            return Err(malformed("does not start with 'loc'"));
        }
        let field_type: FieldType = field_type.parse()?;
        let value = match rest {
            [] => None,
            [value] if field_type.is_value_bearing() => Some(*value),
            [_] => return Err(malformed("has a value segment for a field type without values")),
            _ => return Err(malformed("has too many segments")),
        };

        let mut segments = vec![KEY_ROOT.to_string()];
        segments.push(normalize_segment(code));
        segments.push(normalize_segment(page));
        segments.push(field_type.as_str().to_string());
        segments.push(normalize_segment(name));
        segments.extend(value.map(normalize_segment));
        if segments.iter().any(String::is_empty) {
            return Err(malformed("has an empty segment"));
        }
        Ok(Self(segments.join(".")))
    }

    /// The key text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which namespace a resolved key came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyOrigin {
    /// Human-authored static locator
    Static,
    /// Produced from pattern templates at runtime
    Generated,
}

/// A key tagged with its namespace.
///
/// This is what composite callers pass forward so later lookups hit the same
/// entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedKey {
    /// The unprefixed key
    pub key: CacheKey,
    /// Namespace the record was found or stored in
    pub origin: KeyOrigin,
}

impl ResolvedKey {
    /// Key in the static namespace
    #[must_use]
    pub const fn static_key(key: CacheKey) -> Self {
        Self {
            key,
            origin: KeyOrigin::Static,
        }
    }

    /// Key in the generated namespace
    #[must_use]
    pub const fn generated(key: CacheKey) -> Self {
        Self {
            key,
            origin: KeyOrigin::Generated,
        }
    }

    /// Whether this key names a generated entry
    #[must_use]
    pub const fn is_generated(&self) -> bool {
        matches!(self.origin, KeyOrigin::Generated)
    }
}

impl fmt::Display for ResolvedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.origin {
            KeyOrigin::Static => write!(f, "{}", self.key),
            KeyOrigin::Generated => write!(f, "{GENERATED_PREFIX}{}", self.key),
        }
    }
}
