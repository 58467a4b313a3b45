//! Validate command handler

use locus::{FieldType, LocatorConfig};
use serde::Serialize;

use crate::commands::{OutputFormatArg, ValidateArgs};
use crate::error::{CliError, CliResult};
use crate::output::Reporter;

/// Pattern coverage for one pattern code
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeCoverage {
    /// Pattern code
    pub pattern_code: String,
    /// Field types with a usable pattern
    pub configured: Vec<FieldType>,
    /// Field types without one
    pub missing: Vec<FieldType>,
}

/// Summary of a configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Pattern code used when none is given
    pub default_pattern_code: String,
    /// Coverage per pattern code, default code included
    pub pattern_codes: Vec<CodeCoverage>,
    /// Number of static locators
    pub static_locators: usize,
}

impl ValidationReport {
    /// Whether every pattern code covers every field type
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.pattern_codes.iter().all(|c| c.missing.is_empty())
    }

    /// Total number of missing (code, field type) pairs
    #[must_use]
    pub fn missing_count(&self) -> usize {
        self.pattern_codes.iter().map(|c| c.missing.len()).sum()
    }
}

/// Summarize pattern coverage of `config`
#[must_use]
pub fn validate_config(config: &LocatorConfig) -> ValidationReport {
    let patterns = config.patterns();
    let default_code = locus::normalize_segment(config.pattern_code());

    let mut codes: Vec<String> = patterns
        .pattern_codes()
        .into_iter()
        .map(str::to_string)
        .collect();
    if !codes.contains(&default_code) {
        codes.insert(0, default_code.clone());
    }

    let pattern_codes = codes
        .into_iter()
        .map(|code| CodeCoverage {
            configured: patterns.configured_types(&code),
            missing: patterns.missing_types(&code),
            pattern_code: code,
        })
        .collect();

    ValidationReport {
        default_pattern_code: default_code,
        pattern_codes,
        static_locators: config.static_locators().len(),
    }
}

/// Execute the validate command
pub fn execute_validate(reporter: &Reporter, args: &ValidateArgs) -> CliResult<()> {
    let config = LocatorConfig::from_path(&args.config)?;
    let report = validate_config(&config);

    match args.format {
        OutputFormatArg::Json => reporter.line(&serde_json::to_string_pretty(&report)?),
        OutputFormatArg::Text => print_text(reporter, &report),
    }

    if report.is_complete() {
        reporter.success(&format!("{} is valid", args.config.display()));
        return Ok(());
    }
    let message = format!(
        "{} field type(s) without a pattern in {}",
        report.missing_count(),
        args.config.display()
    );
    if args.strict {
        return Err(CliError::config(message));
    }
    reporter.warning(&message);
    Ok(())
}

fn print_text(reporter: &Reporter, report: &ValidationReport) {
    reporter.header("Locator configuration");
    reporter.line(&format!("default pattern code: {}", report.default_pattern_code));
    reporter.line(&format!("static locators:      {}", report.static_locators));
    for coverage in &report.pattern_codes {
        reporter.line(&format!("pattern code {}:", coverage.pattern_code));
        reporter.line(&format!("  configured: {}", join(&coverage.configured)));
        reporter.line(&format!("  missing:    {}", join(&coverage.missing)));
    }
}

fn join(types: &[FieldType]) -> String {
    if types.is_empty() {
        return "-".to_string();
    }
    types
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_coverage_per_code() {
        let config = LocatorConfig::from_yaml(
            "pattern_code: shop\npatterns:\n  shop:\n    button: \"css=#${fieldName}\"\n  admin.pattern.link: \"css=a\"\nlocators:\n  loc.shop.home.link.help: \"css=a.help\"\n",
        )
        .unwrap();
        let report = validate_config(&config);

        assert_eq!(report.default_pattern_code, "shop");
        assert_eq!(report.static_locators, 1);
        let shop = report
            .pattern_codes
            .iter()
            .find(|c| c.pattern_code == "shop")
            .unwrap();
        assert_eq!(shop.configured, vec![FieldType::Button]);
        assert_eq!(shop.missing.len(), 9);
        assert!(!report.is_complete());
        assert_eq!(report.missing_count(), 18);
    }

    #[test]
    fn test_default_code_listed_even_without_patterns() {
        let report = validate_config(&LocatorConfig::default());
        assert_eq!(report.pattern_codes.len(), 1);
        assert_eq!(report.pattern_codes[0].pattern_code, locus::DEFAULT_PATTERN_CODE);
        assert_eq!(report.pattern_codes[0].missing.len(), FieldType::ALL.len());
    }

    #[test]
    fn test_complete_configuration() {
        let mut yaml = String::from("patterns:\n  default:\n");
        for field_type in FieldType::ALL {
            yaml.push_str(&format!("    {field_type}: \"css=[data-{field_type}]\"\n"));
        }
        let report = validate_config(&LocatorConfig::from_yaml(&yaml).unwrap());
        assert!(report.is_complete());
        assert_eq!(report.missing_count(), 0);
    }

    #[test]
    fn test_join() {
        assert_eq!(join(&[]), "-");
        assert_eq!(join(&[FieldType::Button, FieldType::Link]), "button, link");
    }
}
