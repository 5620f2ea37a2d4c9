//! Testing utilities for the preview workspace
//!
//! Shared fixtures built around a `widgets/<id>` route.

#![allow(missing_docs)]

use preview_core::{
    FieldDescriptor, FieldSchema, RouteIdentity, RouteTable, Sanitizer, ValidatingDispatcher,
    Validator,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const BASE_URL: &str = "https://example.test/wp-json";

pub const WIDGET_PATTERN: &str = "widgets/(?P<id>\\d+)";

pub fn widget_schema() -> FieldSchema {
    FieldSchema::new()
        .field(
            FieldDescriptor::new("title")
                .sanitize(Sanitizer::Trim)
                .validate(Validator::non_empty("empty_title", "Title cannot be empty"))
                .required(),
        )
        .field(
            FieldDescriptor::new("count")
                .sanitize(Sanitizer::Integer)
                .validate(Validator::Range { min: 0.0, max: 100.0 }),
        )
        .field(
            FieldDescriptor::new("status")
                .validate(Validator::OneOf(vec![json!("draft"), json!("publish")])),
        )
}

/// Route table whose handler counts how often it ran
pub fn widget_route_table_with_calls() -> (RouteTable, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let mut table = RouteTable::new();
    table
        .register(WIDGET_PATTERN, widget_schema())
        .unwrap()
        .handler(move |request| {
            seen.fetch_add(1, Ordering::SeqCst);
            request.json_body().map_err(|e| e.to_string())
        });
    (table, calls)
}

pub fn widget_route_table() -> RouteTable {
    widget_route_table_with_calls().0
}

pub fn widget_dispatcher() -> ValidatingDispatcher {
    ValidatingDispatcher::new(Arc::new(widget_route_table()))
}

pub fn widget_route(id: u32) -> RouteIdentity {
    RouteIdentity::from_route(&format!("widgets/{id}"))
}

pub fn widget_setting_id(id: u32) -> String {
    format!("rest_resource[widgets/{id}]")
}

/// Widget body as the API would return it, with a self link
pub fn widget_resource(id: u32, title: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "_links": {
            "self": [{ "href": format!("{BASE_URL}/widgets/{id}") }]
        }
    })
}

/// Resource whose self link points at a different host
pub fn foreign_resource(id: u32) -> Value {
    json!({
        "id": id,
        "_links": {
            "self": [{ "href": format!("https://elsewhere.test/api/widgets/{id}") }]
        }
    })
}
