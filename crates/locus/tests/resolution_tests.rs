//! End-to-end resolution: configuration file → resolver → matcher → document.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use locus::prelude::*;
use std::sync::Arc;

const CONFIG: &str = r#"
pattern_code: shop
patterns:
  shop:
    button:
      - "css=button[data-test='${fieldName}']"
      - "xpath=//button[normalize-space()='${fieldName}']"
      - "xpath=//input[@type='submit'][@value='${fieldName}']"
    input: "xpath=(//input[@name='${fieldName}'])[${fieldInstance}]"
    radio: "xpath=//input[@type='radio'][@name='${fieldName}'][@value='${fieldValue}']"
locators:
  loc.shop.SearchPage.link.Help: "css=a.help"
"#;

const DOCUMENT: &str = r#"
"xpath=//button[normalize-space()='PROCEED']":
  - id: proceed
    tag_name: button
    text_content: PROCEED
"xpath=(//input[@name='Address'])[2]":
  - id: address-2
    tag_name: input
"xpath=//input[@type='radio'][@name='Gender'][@value='Female']":
  - id: gender-female
    tag_name: input
"css=a.help":
  - id: help
    tag_name: a
"#;

fn setup(
    cache: Arc<LocatorCache>,
) -> (FieldLocators<StaticDocument>, Arc<RecordingSink>) {
    let config = Arc::new(LocatorConfig::from_yaml(CONFIG).unwrap());
    let sink = Arc::new(RecordingSink::new());
    let resolver = PatternResolver::new(config, cache).with_sink(sink.clone());
    let document = Arc::new(StaticDocument::from_yaml(DOCUMENT).unwrap());
    (FieldLocators::new(resolver, document), sink)
}

fn fresh() -> (FieldLocators<StaticDocument>, Arc<RecordingSink>) {
    let config = LocatorConfig::from_yaml(CONFIG).unwrap();
    setup(Arc::new(LocatorCache::from_config(&config)))
}

#[tokio::test]
async fn test_search_page_proceed_button() {
    let (mut fields, sink) = fresh();
    let request = FieldRequest::new("SearchPage", FieldType::Button, "PROCEED");

    let resolution = fields.button("SearchPage", "PROCEED");
    assert_eq!(
        resolution.key.to_string(),
        "auto.loc.shop.searchPage.button.proceed"
    );
    assert_eq!(resolution.record.candidates.len(), 3);

    let element = fields.click(&request).await.unwrap();
    assert_eq!(element.id, "proceed");

    let document = fields.document();
    assert!(document.was_queried("css=button[data-test='PROCEED']"));
    assert!(!document.was_queried("xpath=//input[@type='submit'][@value='PROCEED']"));
    assert!(sink.events().is_empty());
    assert_eq!(fields.resolver().stats().generated, 1);
    assert_eq!(fields.resolver().stats().cache_hits, 1);
}

#[tokio::test]
async fn test_instance_and_radio_value() {
    let (mut fields, _) = fresh();

    let address = fields
        .fill(&FieldRequest::new("Checkout", FieldType::Input, "Address[2]"), "Main St 1")
        .await
        .unwrap();
    assert_eq!(address.id, "address-2");
    assert_eq!(fields.document().value_of("address-2").as_deref(), Some("Main St 1"));

    let female = fields
        .click(&FieldRequest::new("Signup", FieldType::Radio, "Gender").with_value("Female"))
        .await
        .unwrap();
    assert_eq!(female.id, "gender-female");
}

#[tokio::test]
async fn test_static_locator_without_pattern() {
    let (mut fields, sink) = fresh();
    let resolution = fields.link("Search Page", "help");
    assert_eq!(resolution.key.origin, KeyOrigin::Static);

    let element = fields
        .find(&FieldRequest::new("SearchPage", FieldType::Link, "Help"))
        .await
        .unwrap();
    assert_eq!(element.id, "help");
    assert_eq!(sink.count("pattern_not_configured"), 0);
}

#[tokio::test]
async fn test_unconfigured_field_type_fails_with_empty_trail() {
    let (mut fields, sink) = fresh();
    let err = fields
        .find(&FieldRequest::new("SearchPage", FieldType::Checkbox, "Remember Me"))
        .await
        .unwrap_err();

    let LocatorError::NoElementMatched(report) = err else {
        panic!("expected NoElementMatched");
    };
    assert!(report.attempted.is_empty());
    assert_eq!(report.key, "auto.loc.shop.searchPage.checkbox.rememberMe");
    assert_eq!(sink.count("pattern_not_configured"), 1);
    assert_eq!(sink.count("no_element_matched"), 1);
}

#[tokio::test]
async fn test_generated_entries_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("generated.json");

    let config = LocatorConfig::from_yaml(CONFIG).unwrap();
    let first_cache = Arc::new(LocatorCache::from_config(&config));
    {
        let (mut fields, _) = setup(Arc::clone(&first_cache));
        let _ = fields.button("SearchPage", "PROCEED");
        let _ = fields.input("Checkout", "Address[2]");
    }
    assert_eq!(first_cache.save_generated(&path).unwrap(), 2);

    let second_cache = Arc::new(LocatorCache::from_config(&config));
    assert_eq!(second_cache.load_generated(&path).unwrap(), 2);
    let (mut fields, _) = setup(second_cache);
    let _ = fields.button("SearchPage", "PROCEED");
    let stats = fields.resolver().stats();
    assert_eq!(stats.cache_hits, 1);
    assert_eq!(stats.generated, 0);
}

#[test]
fn test_unsupported_field_type_fails_fast() {
    let (mut fields, _) = fresh();
    let err = fields
        .resolve_named("carousel", "Home", "Slides", None)
        .unwrap_err();
    assert_eq!(err.to_string(), "Unsupported field type 'carousel'");
}
