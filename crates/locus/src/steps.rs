//! Step-level facade: one method per field type plus composite actions.
//!
//! ```no_run
//! use locus::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn demo() -> LocatorResult<()> {
//! let config = Arc::new(LocatorConfig::from_path("locators.yaml")?);
//! let cache = Arc::new(LocatorCache::from_config(&config));
//! let document = Arc::new(StaticDocument::new());
//! let mut fields = FieldLocators::new(PatternResolver::new(config, cache), document);
//!
//! let proceed = fields.button("SearchPage", "PROCEED");
//! println!("{}", proceed.key);
//! fields.click(&FieldRequest::new("SearchPage", FieldType::Button, "PROCEED")).await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use crate::diagnostics::Diagnostic;
use crate::driver::{DocumentQuery, ElementHandle, ElementInteraction, QueryError};
use crate::field::{FieldRequest, FieldType};
use crate::key::ResolvedKey;
use crate::matcher::{FallbackMatcher, WaitOptions};
use crate::resolver::{PatternResolver, Resolution};
use crate::result::{FailureReport, LocatorError, LocatorResult};

/// Resolves fields by type and drives the matcher against a document
#[derive(Debug)]
pub struct FieldLocators<D> {
    resolver: PatternResolver,
    document: Arc<D>,
    wait: Option<WaitOptions>,
}

impl<D> FieldLocators<D>
where
    D: DocumentQuery + ElementInteraction,
{
    /// Create a facade over `resolver` and `document`
    #[must_use]
    pub fn new(resolver: PatternResolver, document: Arc<D>) -> Self {
        Self {
            resolver,
            document,
            wait: None,
        }
    }

    /// Poll for elements with `options` instead of making a single pass
    #[must_use]
    pub fn with_wait(mut self, options: WaitOptions) -> Self {
        self.wait = Some(options);
        self
    }

    /// The underlying resolver
    #[must_use]
    pub const fn resolver(&self) -> &PatternResolver {
        &self.resolver
    }

    /// The document being matched against
    #[must_use]
    pub const fn document(&self) -> &Arc<D> {
        &self.document
    }

    /// Resolve a field by type
    pub fn resolve(
        &mut self,
        field_type: FieldType,
        page: &str,
        field_name: &str,
        field_value: Option<&str>,
    ) -> Resolution {
        let mut request = FieldRequest::new(page, field_type, field_name);
        if let Some(value) = field_value {
            request = request.with_value(value);
        }
        self.resolver.resolve(&request)
    }

    /// Resolve a field by type identifier, e.g. `"button"`
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedFieldType` for an unknown identifier; nothing is
    /// resolved in that case.
    pub fn resolve_named(
        &mut self,
        field_type: &str,
        page: &str,
        field_name: &str,
        field_value: Option<&str>,
    ) -> LocatorResult<Resolution> {
        let field_type: FieldType = field_type.parse()?;
        Ok(self.resolve(field_type, page, field_name, field_value))
    }

    /// Resolve a button
    pub fn button(&mut self, page: &str, name: &str) -> Resolution {
        self.resolve(FieldType::Button, page, name, None)
    }

    /// Resolve a text input
    pub fn input(&mut self, page: &str, name: &str) -> Resolution {
        self.resolve(FieldType::Input, page, name, None)
    }

    /// Resolve a select box
    pub fn select(&mut self, page: &str, name: &str) -> Resolution {
        self.resolve(FieldType::Select, page, name, None)
    }

    /// Resolve a checkbox
    pub fn checkbox(&mut self, page: &str, name: &str) -> Resolution {
        self.resolve(FieldType::Checkbox, page, name, None)
    }

    /// Resolve a radio button, optionally for one value of the group
    pub fn radio(&mut self, page: &str, name: &str, value: Option<&str>) -> Resolution {
        self.resolve(FieldType::Radio, page, name, value)
    }

    /// Resolve a piece of static text
    pub fn text(&mut self, page: &str, name: &str) -> Resolution {
        self.resolve(FieldType::Text, page, name, None)
    }

    /// Resolve a link
    pub fn link(&mut self, page: &str, name: &str) -> Resolution {
        self.resolve(FieldType::Link, page, name, None)
    }

    /// Resolve a textarea
    pub fn textarea(&mut self, page: &str, name: &str) -> Resolution {
        self.resolve(FieldType::Textarea, page, name, None)
    }

    /// Resolve a label
    pub fn label(&mut self, page: &str, name: &str) -> Resolution {
        self.resolve(FieldType::Label, page, name, None)
    }

    /// Resolve an image
    pub fn image(&mut self, page: &str, name: &str) -> Resolution {
        self.resolve(FieldType::Image, page, name, None)
    }

    /// Resolve `request` and match it against the document.
    ///
    /// # Errors
    ///
    /// `NoElementMatched` (also emitted as a diagnostic, including when a
    /// configured wait runs out), or `Driver`, each with the request, the
    /// key and every candidate tried.
    pub async fn find(&mut self, request: &FieldRequest) -> LocatorResult<ElementHandle> {
        self.locate(request).await.map(|(_, element)| element)
    }

    async fn locate(&mut self, request: &FieldRequest) -> LocatorResult<(ResolvedKey, ElementHandle)> {
        let resolution = self.resolver.resolve(request);
        let matcher = FallbackMatcher::new(self.document.as_ref());
        let outcome = match &self.wait {
            Some(options) => matcher.wait_for_element(&resolution.record, options).await,
            None => matcher.resolve_element(&resolution.record).await,
        };

        match outcome {
            Ok(element) => Ok((resolution.key, element)),
            Err(failure) => {
                let err = failure.into_error(request, &resolution.key);
                if let LocatorError::NoElementMatched(report) = &err {
                    self.resolver
                        .sink()
                        .emit(&Diagnostic::NoElementMatched(report.as_ref().clone()));
                }
                Err(err)
            }
        }
    }

    /// Find `request` and click it
    ///
    /// # Errors
    ///
    /// As [`Self::find`], plus `Driver` if the click fails.
    pub async fn click(&mut self, request: &FieldRequest) -> LocatorResult<ElementHandle> {
        let (key, element) = self.locate(request).await?;
        self.document
            .click(&element)
            .await
            .map_err(|e| interaction_error(request, &key, &element, &e))?;
        Ok(element)
    }

    /// Find `request` and fill it with `text`
    ///
    /// # Errors
    ///
    /// As [`Self::find`], plus `Driver` if filling fails.
    pub async fn fill(&mut self, request: &FieldRequest, text: &str) -> LocatorResult<ElementHandle> {
        let (key, element) = self.locate(request).await?;
        self.document
            .fill(&element, text)
            .await
            .map_err(|e| interaction_error(request, &key, &element, &e))?;
        Ok(element)
    }
}

fn interaction_error(
    request: &FieldRequest,
    key: &ResolvedKey,
    element: &ElementHandle,
    err: &QueryError,
) -> LocatorError {
    LocatorError::Driver(Box::new(FailureReport {
        page: request.page.clone(),
        field_type: request.field_type.to_string(),
        field_name: request.field_name.clone(),
        key: key.to_string(),
        description: request.describe(),
        attempted: vec![element.selector.clone()],
        detail: Some(err.to_string()),
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::cache::LocatorCache;
    use crate::config::LocatorConfig;
    use crate::diagnostics::RecordingSink;
    use crate::driver::StaticDocument;
    use crate::key::KeyOrigin;
    use crate::pattern::PatternTable;

    fn fields(document: StaticDocument) -> (FieldLocators<StaticDocument>, Arc<RecordingSink>) {
        let mut patterns = PatternTable::new();
        for field_type in FieldType::ALL {
            if field_type != FieldType::Image {
                patterns.insert(
                    "shop",
                    field_type,
                    vec![
                        format!("css=[data-{}='${{fieldName}}']", field_type),
                        "xpath=//*[text()='${fieldName}']".to_string(),
                    ],
                );
            }
        }
        let config = Arc::new(LocatorConfig::new(patterns).with_pattern_code("shop"));
        let cache = Arc::new(LocatorCache::from_config(&config));
        let sink = Arc::new(RecordingSink::new());
        let resolver = PatternResolver::new(config, cache).with_sink(sink.clone());
        (FieldLocators::new(resolver, Arc::new(document)), sink)
    }

    mod facade_tests {
        use super::*;

        #[test]
        fn test_each_method_uses_its_field_type() {
            let (mut fields, _) = fields(StaticDocument::new());
            let cases = [
                (fields.button("P", "N"), FieldType::Button),
                (fields.input("P", "N"), FieldType::Input),
                (fields.select("P", "N"), FieldType::Select),
                (fields.checkbox("P", "N"), FieldType::Checkbox),
                (fields.radio("P", "N", Some("v")), FieldType::Radio),
                (fields.text("P", "N"), FieldType::Text),
                (fields.link("P", "N"), FieldType::Link),
                (fields.textarea("P", "N"), FieldType::Textarea),
                (fields.label("P", "N"), FieldType::Label),
                (fields.image("P", "N"), FieldType::Image),
            ];
            for (resolution, field_type) in cases {
                assert_eq!(resolution.request.field_type, field_type);
                assert!(resolution
                    .key
                    .key
                    .as_str()
                    .contains(&format!(".{}.", field_type.as_str())));
            }
        }

        #[test]
        fn test_resolve_named_dispatches() {
            let (mut fields, _) = fields(StaticDocument::new());
            let resolution = fields
                .resolve_named("Button", "SearchPage", "PROCEED", None)
                .unwrap();
            assert_eq!(resolution.key.to_string(), "auto.loc.shop.searchPage.button.proceed");
            assert_eq!(resolution.key.origin, KeyOrigin::Generated);
        }

        #[test]
        fn test_resolve_named_rejects_unknown_type() {
            let (mut fields, _) = fields(StaticDocument::new());
            let err = fields.resolve_named("slider", "P", "N", None).unwrap_err();
            assert!(matches!(err, LocatorError::UnsupportedFieldType { ref field_type } if field_type == "slider"));
            assert_eq!(fields.resolver().stats().generated, 0);
        }
    }

    mod action_tests {
        use super::*;

        #[tokio::test]
        async fn test_click_uses_fallback_candidate() {
            let document = StaticDocument::new().with_element(
                "xpath=//*[text()='PROCEED']",
                ElementHandle::new("proceed", "button"),
            );
            let (mut fields, _) = fields(document);

            let request = FieldRequest::new("SearchPage", FieldType::Button, "PROCEED");
            let element = fields.click(&request).await.unwrap();

            assert_eq!(element.id, "proceed");
            assert!(fields.document().was_queried("css=[data-button='PROCEED']"));
            assert!(fields.document().was_called("click"));
        }

        #[tokio::test]
        async fn test_fill_sets_value() {
            let document = StaticDocument::new()
                .with_element("css=[data-input='Email']", ElementHandle::new("email", "input"));
            let (mut fields, _) = fields(document);

            let request = FieldRequest::new("Login", FieldType::Input, "Email");
            let _ = fields.fill(&request, "a@b.c").await.unwrap();
            assert_eq!(fields.document().value_of("email").as_deref(), Some("a@b.c"));
        }

        #[tokio::test]
        async fn test_no_match_is_enriched_and_reported() {
            let (mut fields, sink) = fields(StaticDocument::new());
            let request = FieldRequest::new("SearchPage", FieldType::Button, "PROCEED");

            let err = fields.find(&request).await.unwrap_err();
            let LocatorError::NoElementMatched(report) = err else {
                panic!("expected NoElementMatched");
            };
            assert_eq!(report.page, "SearchPage");
            assert_eq!(report.key, "auto.loc.shop.searchPage.button.proceed");
            assert_eq!(report.attempted.len(), 2);
            assert_eq!(sink.count("no_element_matched"), 1);
        }

        #[tokio::test]
        async fn test_unconfigured_type_fails_with_empty_trail() {
            let (mut fields, sink) = fields(StaticDocument::new());
            let request = FieldRequest::new("Home", FieldType::Image, "Logo");

            let err = fields.find(&request).await.unwrap_err();
            let LocatorError::NoElementMatched(report) = err else {
                panic!("expected NoElementMatched");
            };
            assert!(report.attempted.is_empty());
            assert_eq!(sink.count("pattern_not_configured"), 1);
            assert_eq!(sink.count("no_element_matched"), 1);
            assert!(fields.document().history().is_empty());
        }

        #[tokio::test]
        async fn test_exhausted_wait_is_no_element_matched() {
            let (fields, sink) = fields(StaticDocument::new());
            let mut fields =
                fields.with_wait(WaitOptions::new().with_timeout(30).with_poll_interval(5));
            let request = FieldRequest::new("Home", FieldType::Link, "Help");

            let err = fields.find(&request).await.unwrap_err();
            let LocatorError::NoElementMatched(report) = err else {
                panic!("expected NoElementMatched");
            };
            assert_eq!(
                report.attempted,
                vec!["css=[data-link='Help']", "xpath=//*[text()='Help']"]
            );
            assert_eq!(report.detail.as_deref(), Some("no candidate matched within 30ms"));
            assert_eq!(sink.count("no_element_matched"), 1);
        }

        #[tokio::test]
        async fn test_disconnected_document_is_driver_error() {
            let document = StaticDocument::new()
                .with_element("css=[data-link='Help']", ElementHandle::new("help", "a"));
            let (mut fields, _) = fields(document);
            let request = FieldRequest::new("Home", FieldType::Link, "Help");
            let element = fields.find(&request).await.unwrap();

            fields.document().disconnect("tab closed");
            let err = fields.click(&request).await.unwrap_err();
            assert!(matches!(err, LocatorError::Driver(_)));
            assert_eq!(element.id, "help");
        }
    }
}
