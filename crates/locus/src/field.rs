//! Field types and resolution requests.
//!
//! A field type selects which pattern templates apply. The set is closed:
//! supporting a new kind of field means adding a variant here, a pattern
//! entry in configuration, and (optionally) a convenience method on
//! [`FieldLocators`](crate::steps::FieldLocators).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::result::LocatorError;

/// Supported field types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Clickable button
    Button,
    /// Single-line text input
    Input,
    /// Drop-down select
    Select,
    /// Checkbox
    Checkbox,
    /// Radio group; carries a value selecting the option
    Radio,
    /// Static text
    Text,
    /// Hyperlink
    Link,
    /// Multi-line text area
    Textarea,
    /// Form label
    Label,
    /// Image
    Image,
}

impl FieldType {
    /// Every supported field type, in declaration order
    pub const ALL: [Self; 10] = [
        Self::Button,
        Self::Input,
        Self::Select,
        Self::Checkbox,
        Self::Radio,
        Self::Text,
        Self::Link,
        Self::Textarea,
        Self::Label,
        Self::Image,
    ];

    /// Identifier used in keys and configuration
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Button => "button",
            Self::Input => "input",
            Self::Select => "select",
            Self::Checkbox => "checkbox",
            Self::Radio => "radio",
            Self::Text => "text",
            Self::Link => "link",
            Self::Textarea => "textarea",
            Self::Label => "label",
            Self::Image => "image",
        }
    }

    /// Whether resolution depends on a field value as well as a name
    #[must_use]
    pub const fn is_value_bearing(&self) -> bool {
        matches!(self, Self::Radio)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| LocatorError::unsupported_field_type(s))
    }
}

/// A request to resolve one field on one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRequest {
    /// Page name as authored (e.g. `SearchPage`)
    pub page: String,
    /// Field type
    pub field_type: FieldType,
    /// Field name as authored, may carry `[n]` instance notation
    pub field_name: String,
    /// Value for value-bearing field types
    pub field_value: Option<String>,
}

impl FieldRequest {
    /// Create a request without a value
    #[must_use]
    pub fn new(page: impl Into<String>, field_type: FieldType, field_name: impl Into<String>) -> Self {
        Self {
            page: page.into(),
            field_type,
            field_name: field_name.into(),
            field_value: None,
        }
    }

    /// Attach a field value
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.field_value = Some(value.into());
        self
    }

    /// Human-readable description used in records and failures
    #[must_use]
    pub fn describe(&self) -> String {
        match self.field_value.as_deref() {
            Some(value) if self.field_type.is_value_bearing() => format!(
                "{} '{}' = '{}' on {}",
                self.field_type, self.field_name, value, self.page
            ),
            _ => format!("{} '{}' on {}", self.field_type, self.field_name, self.page),
        }
    }
}
