use preview_core::ValidateOptions;
use preview_overlay::{
    CollectingFaultSink, OverlayFilter, PreviewConfig, PreviewRegistry, PreviewSession,
    RestResourceSetting,
};
use preview_test_utils::{
    foreign_resource, widget_dispatcher, widget_resource, widget_route_table_with_calls,
    widget_setting_id, BASE_URL,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn registry_with_widget(id: u32, payload: &str) -> PreviewRegistry {
    let mut setting = RestResourceSetting::new(&widget_setting_id(id)).unwrap();
    setting.validate(payload, &widget_dispatcher()).unwrap();

    let mut registry = PreviewRegistry::new();
    registry.mark_for_preview(setting.pending().unwrap().clone());
    registry
}

#[test]
fn test_registered_resource_replaced() {
    let registry = registry_with_widget(5, r#"{"title":"Hi"}"#);
    let filter = OverlayFilter::new(BASE_URL);

    let body = json!({
        "_links": {"self": [{"href": format!("{BASE_URL}/widgets/5")}]},
        "title": "Old"
    });
    assert_eq!(filter.overlay(body, &registry), json!({"title": "Hi"}));
}

#[test]
fn test_collection_elements_isolated() {
    let registry = registry_with_widget(1, r#"{"title":"New one"}"#);
    let sink = Arc::new(CollectingFaultSink::new());
    let filter = OverlayFilter::new(BASE_URL).with_sink(sink.clone());

    let body = json!([widget_resource(1, "Old one"), foreign_resource(2), widget_resource(3, "Three")]);
    let result = filter.overlay(body, &registry);

    assert_eq!(result[0], json!({"title": "New one"}));
    assert_eq!(result[1], foreign_resource(2));
    assert_eq!(result[2], widget_resource(3, "Three"));
    assert_eq!(sink.len(), 1);
    assert!(sink.faults()[0].contains("elsewhere.test"));
}

#[test]
fn test_nested_collections_recurse() {
    let registry = registry_with_widget(4, r#"{"title":"Four"}"#);
    let filter = OverlayFilter::new(BASE_URL);

    let body = json!([[widget_resource(4, "old")], widget_resource(5, "five")]);
    let result = filter.overlay(body, &registry);
    assert_eq!(result[0][0], json!({"title": "Four"}));
    assert_eq!(result[1]["title"], "five");
}

#[test]
fn test_session_end_to_end() {
    let (table, calls) = widget_route_table_with_calls();
    let sink = Arc::new(CollectingFaultSink::new());
    let mut session = PreviewSession::new(PreviewConfig::new(BASE_URL), Arc::new(table))
        .with_fault_sink(sink.clone());

    let mut setting = RestResourceSetting::new(&widget_setting_id(5)).unwrap();
    let outcome = session
        .stage(&mut setting, r#"{"title":"  Hi  ","count":"12"}"#, ValidateOptions::strict())
        .unwrap();
    assert!(outcome.is_valid());

    let listing = json!([widget_resource(5, "Old"), widget_resource(6, "Six"), foreign_resource(7)]);
    let emitted = session.emit(listing);

    assert_eq!(emitted[0], json!({"title": "Hi", "count": 12}));
    assert_eq!(emitted[1]["title"], "Six");
    assert_eq!(emitted[2], foreign_resource(7));
    assert_eq!(sink.len(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_rejected_re_edit_restores_stored_data() {
    let (table, _) = widget_route_table_with_calls();
    let mut session = PreviewSession::new(PreviewConfig::new(BASE_URL), Arc::new(table));

    let mut setting = RestResourceSetting::new(&widget_setting_id(5)).unwrap();
    session
        .stage(&mut setting, r#"{"title":"Hi"}"#, ValidateOptions::strict())
        .unwrap();
    assert_eq!(session.emit(widget_resource(5, "Stored")), json!({"title": "Hi"}));

    let outcome = session
        .stage(&mut setting, r#"{"title":""}"#, ValidateOptions::strict())
        .unwrap();
    assert!(outcome.errors().unwrap().contains("empty_title"));
    assert!(setting.value().is_none());

    // The errored edit is not overlaid; the stored resource shows through
    let edit = session.registry().lookup("widgets/5").unwrap();
    assert!(edit.usable_value().is_none());
    assert_eq!(session.emit(widget_resource(5, "Stored")), widget_resource(5, "Stored"));

    assert!(session.mark_for_preview(&setting).is_err());

    // A later valid edit is previewed again
    session
        .stage(&mut setting, r#"{"title":"Back"}"#, ValidateOptions::strict())
        .unwrap();
    assert_eq!(session.emit(widget_resource(5, "Stored")), json!({"title": "Back"}));
}

#[test]
fn test_unknown_route_propagates() {
    let (table, _) = widget_route_table_with_calls();
    let mut session = PreviewSession::new(PreviewConfig::new(BASE_URL), Arc::new(table));

    let mut setting = RestResourceSetting::new("rest_resource[gadgets/1]").unwrap();
    let err = session
        .stage(&mut setting, "{}", ValidateOptions::strict())
        .unwrap_err();
    assert!(matches!(err, preview_overlay::PreviewError::Dispatch(_)));
    assert!(session.registry().is_empty());
}

proptest! {
    #[test]
    fn prop_unregistered_routes_untouched(id in 6u32..10_000, title in "[a-zA-Z ]{0,16}") {
        let registry = registry_with_widget(5, r#"{"title":"Hi"}"#);
        let filter = OverlayFilter::new(BASE_URL);

        let resource = widget_resource(id, &title);
        prop_assert_eq!(filter.overlay(resource.clone(), &registry), resource);
    }

    #[test]
    fn prop_registered_route_always_substituted(title in "[a-zA-Z ]{0,16}") {
        let registry = registry_with_widget(5, r#"{"title":"Hi"}"#);
        let filter = OverlayFilter::new(BASE_URL);

        prop_assert_eq!(filter.overlay(widget_resource(5, &title), &registry), json!({"title": "Hi"}));
    }
}
