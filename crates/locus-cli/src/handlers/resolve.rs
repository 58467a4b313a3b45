//! Resolve command handler

use locus::{
    Diagnostic, DiagnosticsSink, ElementHandle, FailureReport, FallbackMatcher, KeyOrigin,
    LocatorCache, LocatorConfig, LocatorError, PatternResolver, RecordingSink, StaticDocument,
};
use serde::Serialize;
use std::sync::Arc;

use super::field_request;
use crate::commands::{OutputFormatArg, ResolveArgs};
use crate::error::CliResult;
use crate::output::Reporter;

/// Outcome of resolving one field
#[derive(Debug, Serialize)]
pub struct ResolveReport {
    /// Key, rendered with its namespace
    pub key: String,
    /// Namespace the record came from
    pub origin: KeyOrigin,
    /// Record description
    pub description: String,
    /// Candidates in priority order
    pub candidates: Vec<String>,
    /// Diagnostics raised while resolving
    pub diagnostics: Vec<Diagnostic>,
    /// Element matched in the document, if one was given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched: Option<ElementHandle>,
    /// Matching failure, with every candidate tried, if a document was
    /// given and nothing matched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureReport>,
    /// Error the command exits with
    #[serde(skip)]
    pub error: Option<LocatorError>,
}

/// Resolve the field named by `args`, persisting generated entries to the
/// cache file when one is given
pub fn resolve_field(args: &ResolveArgs) -> CliResult<ResolveReport> {
    let request = field_request(&args.field)?;
    let config = LocatorConfig::from_path(&args.config)?;
    let cache = Arc::new(LocatorCache::from_config(&config));
    if let Some(path) = &args.cache {
        let loaded = cache.load_generated(path)?;
        tracing::debug!(path = %path.display(), loaded, "loaded generated entries");
    }

    let sink = Arc::new(RecordingSink::new());
    let mut resolver =
        PatternResolver::new(Arc::new(config), Arc::clone(&cache)).with_sink(sink.clone());
    if let Some(code) = &args.code {
        resolver = resolver.with_pattern_code(code.as_str());
    }

    let resolution = resolver.resolve(&request);
    if let Some(path) = &args.cache {
        let saved = cache.save_generated(path)?;
        tracing::debug!(path = %path.display(), saved, "saved generated entries");
    }

    let mut matched = None;
    let mut error = None;
    if let Some(path) = &args.document {
        let document = StaticDocument::from_yaml(&std::fs::read_to_string(path)?)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;
        let matcher = FallbackMatcher::new(&document);
        match runtime.block_on(matcher.resolve_element(&resolution.record)) {
            Ok(element) => matched = Some(element),
            Err(failure) => {
                let err = failure.into_error(&request, &resolution.key);
                if let LocatorError::NoElementMatched(report) = &err {
                    sink.emit(&Diagnostic::NoElementMatched(report.as_ref().clone()));
                }
                error = Some(err);
            }
        }
    }

    Ok(ResolveReport {
        key: resolution.key.to_string(),
        origin: resolution.key.origin,
        description: resolution.record.description.clone(),
        candidates: resolution.record.candidates.clone(),
        diagnostics: sink.drain(),
        matched,
        failure: error.as_ref().and_then(LocatorError::report).cloned(),
        error,
    })
}

/// Execute the resolve command
pub fn execute_resolve(reporter: &Reporter, args: &ResolveArgs) -> CliResult<()> {
    let mut report = resolve_field(args)?;

    // A failed match is reported once, as the command error
    for diagnostic in report
        .diagnostics
        .iter()
        .filter(|d| !matches!(d, Diagnostic::NoElementMatched(_)))
    {
        reporter.warning(&diagnostic.to_string());
    }

    match args.format {
        OutputFormatArg::Json => reporter.line(&serde_json::to_string_pretty(&report)?),
        OutputFormatArg::Text => print_text(reporter, &report),
    }

    match report.error.take() {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

fn print_text(reporter: &Reporter, report: &ResolveReport) {
    let origin = match report.origin {
        KeyOrigin::Static => "static",
        KeyOrigin::Generated => "generated",
    };
    reporter.line(&format!("key:         {}", report.key));
    reporter.line(&format!("origin:      {origin}"));
    reporter.line(&format!("description: {}", report.description));
    if report.candidates.is_empty() {
        reporter.line("candidates:  (none)");
    } else {
        reporter.line("candidates:");
        for (i, candidate) in report.candidates.iter().enumerate() {
            reporter.line(&format!("  {}. {candidate}", i + 1));
        }
    }
    if let Some(element) = &report.matched {
        reporter.line(&format!(
            "matched:     {} <{}> via {}",
            element.id, element.tag_name, element.selector
        ));
    }
}
