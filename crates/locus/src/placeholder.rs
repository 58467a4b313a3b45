//! Placeholder context and template substitution.
//!
//! Templates reference the context through `${token}` placeholders:
//!
//! | Token              | Value                                          |
//! |--------------------|------------------------------------------------|
//! | `${fieldName}`     | field name with any `[n]` suffix removed       |
//! | `${fieldInstance}` | the `n` from `Name[n]`, `1` when absent        |
//! | `${fieldValue}`    | value of a value-bearing field, else empty     |
//! | `${pageName}`      | page name as authored                          |
//!
//! Substitution is purely textual. Unset values become the empty string and
//! unrecognized tokens are left in place.

use regex::{Captures, Regex};
use std::sync::OnceLock;

use crate::field::FieldRequest;

/// Instance number used when a field name carries no `[n]` suffix
pub const DEFAULT_INSTANCE: &str = "1";

#[allow(clippy::expect_used)]
fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern is valid")
    })
}

/// Split `Address[2]` into `("Address", Some("2"))`.
///
/// Only a trailing, non-empty bracket group counts; anything else is returned
/// as the whole name.
#[must_use]
pub fn split_instance(raw: &str) -> (&str, Option<&str>) {
    let trimmed = raw.trim();
    if let Some(body) = trimmed.strip_suffix(']') {
        if let Some(open) = body.rfind('[') {
            let name = body[..open].trim();
            let instance = body[open + 1..].trim();
            if !name.is_empty() && !instance.is_empty() {
                return (name, Some(instance));
            }
        }
    }
    (trimmed, None)
}

/// Per-resolution values substituted into templates.
///
/// Owned by a single resolver; reset at the start of every resolution so
/// nothing carries over between unrelated requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderContext {
    field_name: String,
    field_instance: String,
    field_value: String,
    page_name: String,
}

impl Default for PlaceholderContext {
    fn default() -> Self {
        Self {
            field_name: String::new(),
            field_instance: DEFAULT_INSTANCE.to_string(),
            field_value: String::new(),
            page_name: String::new(),
        }
    }
}

impl PlaceholderContext {
    /// Create an empty context
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear every value back to its default
    pub fn reset(&mut self) {
        self.field_name.clear();
        self.field_instance.clear();
        self.field_instance.push_str(DEFAULT_INSTANCE);
        self.field_value.clear();
        self.page_name.clear();
    }

    /// Fill the context from a request. Call [`reset`](Self::reset) first.
    pub fn populate(&mut self, request: &FieldRequest) {
        let (name, instance) = split_instance(&request.field_name);
        self.field_name.push_str(name);
        if let Some(instance) = instance {
            self.field_instance.clear();
            self.field_instance.push_str(instance);
        }
        if request.field_type.is_value_bearing() {
            if let Some(value) = &request.field_value {
                self.field_value.push_str(value);
            }
        }
        self.page_name.push_str(&request.page);
    }

    /// Field name without instance suffix
    #[must_use]
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Field instance, `1` unless overridden
    #[must_use]
    pub fn field_instance(&self) -> &str {
        &self.field_instance
    }

    /// Field value, empty unless the field type is value-bearing
    #[must_use]
    pub fn field_value(&self) -> &str {
        &self.field_value
    }

    /// Page name
    #[must_use]
    pub fn page_name(&self) -> &str {
        &self.page_name
    }

    /// Value for a placeholder token, `None` if the token is not recognized
    #[must_use]
    pub fn lookup(&self, token: &str) -> Option<&str> {
        match token {
            "fieldName" => Some(&self.field_name),
            "fieldInstance" => Some(&self.field_instance),
            "fieldValue" => Some(&self.field_value),
            "pageName" => Some(&self.page_name),
            _ => None,
        }
    }

    /// Substitute every recognized placeholder in `template`
    #[must_use]
    pub fn substitute(&self, template: &str) -> String {
        placeholder_regex()
            .replace_all(template, |caps: &Captures<'_>| {
                self.lookup(&caps[1])
                    .map_or_else(|| caps[0].to_string(), str::to_string)
            })
            .into_owned()
    }

    /// Substitute every template, keeping order
    #[must_use]
    pub fn substitute_all(&self, templates: &[String]) -> Vec<String> {
        templates.iter().map(|t| self.substitute(t)).collect()
    }
}
