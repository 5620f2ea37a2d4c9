//! Field-level validation errors
//!
//! Provides [`FieldError`] (one named failure) and [`ValidationErrorCollection`]
//! (failures aggregated across all fields of one validation pass).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A single named failure produced by a sanitizer or validator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    /// Machine-readable code, e.g. `empty_title`
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Optional structured payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl FieldError {
    /// Create error without data
    #[inline]
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            data: None,
        }
    }

    /// Attach structured data
    #[inline]
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Accumulated failures for one error code
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorEntry {
    /// Messages in the order they were added
    pub messages: Vec<String>,
    /// Fields that reported this code
    pub fields: Vec<String>,
    /// Latest structured data for this code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Error code → (messages, data), ordered by first occurrence
///
/// Non-empty means the validation pass failed. Entries accumulate across
/// fields; nothing short-circuits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrorCollection {
    entries: IndexMap<String, ErrorEntry>,
}

impl ValidationErrorCollection {
    /// Create empty collection
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a field's failure into the collection
    ///
    /// Repeated codes append their message; data is replaced when present.
    pub fn add(&mut self, field: &str, error: FieldError) {
        let entry = self.entries.entry(error.code).or_default();
        entry.messages.push(error.message);
        if !entry.fields.iter().any(|f| f == field) {
            entry.fields.push(field.to_string());
        }
        if error.data.is_some() {
            entry.data = error.data;
        }
    }

    /// Merge another collection, preserving its order after ours
    pub fn merge(&mut self, other: Self) {
        for (code, incoming) in other.entries {
            let entry = self.entries.entry(code).or_default();
            entry.messages.extend(incoming.messages);
            for field in incoming.fields {
                if !entry.fields.contains(&field) {
                    entry.fields.push(field);
                }
            }
            if incoming.data.is_some() {
                entry.data = incoming.data;
            }
        }
    }

    /// Check if no failures were recorded
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct error codes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if a code was recorded
    #[inline]
    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.entries.contains_key(code)
    }

    /// Entry for a code
    #[inline]
    #[must_use]
    pub fn get(&self, code: &str) -> Option<&ErrorEntry> {
        self.entries.get(code)
    }

    /// Codes in first-occurrence order
    #[inline]
    #[must_use]
    pub fn codes(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// First message recorded for a code
    #[inline]
    #[must_use]
    pub fn message(&self, code: &str) -> Option<&str> {
        self.entries
            .get(code)
            .and_then(|e| e.messages.first())
            .map(String::as_str)
    }

    /// Iterate `(code, entry)` pairs in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ErrorEntry)> {
        self.entries.iter().map(|(code, entry)| (code.as_str(), entry))
    }

    /// Render as a REST error body
    ///
    /// The first code becomes the top-level error, the rest go under
    /// `additional_errors`. Returns `None` when empty.
    #[must_use]
    pub fn to_rest_error(&self) -> Option<Value> {
        let mut flattened = self.entries.iter().flat_map(|(code, entry)| {
            entry.messages.iter().map(move |message| {
                json!({
                    "code": code,
                    "message": message,
                    "data": entry.data.clone().unwrap_or(Value::Null),
                })
            })
        });

        let mut first = flattened.next()?;
        let additional: Vec<Value> = flattened.collect();
        if !additional.is_empty() {
            first["additional_errors"] = Value::Array(additional);
        }
        Some(first)
    }
}

impl FromIterator<(String, FieldError)> for ValidationErrorCollection {
    fn from_iter<I: IntoIterator<Item = (String, FieldError)>>(iter: I) -> Self {
        let mut collection = Self::new();
        for (field, error) in iter {
            collection.add(&field, error);
        }
        collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn add_accumulates_in_order() {
        let mut errors = ValidationErrorCollection::new();
        errors.add("title", FieldError::new("empty_title", "Title is empty"));
        errors.add("count", FieldError::new("out_of_range", "Count too large"));

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.codes(), vec!["empty_title", "out_of_range"]);
        assert_eq!(errors.message("empty_title"), Some("Title is empty"));
    }

    #[test]
    fn repeated_code_appends_message() {
        let mut errors = ValidationErrorCollection::new();
        errors.add("a", FieldError::new("required", "a missing"));
        errors.add("b", FieldError::new("required", "b missing").with_data(json!({"status": 400})));

        let entry = errors.get("required").unwrap();
        assert_eq!(entry.messages, vec!["a missing", "b missing"]);
        assert_eq!(entry.fields, vec!["a", "b"]);
        assert_eq!(entry.data, Some(json!({"status": 400})));
    }

    #[test]
    fn merge_keeps_order() {
        let mut left: ValidationErrorCollection =
            [("a".to_string(), FieldError::new("x", "first"))].into_iter().collect();
        let right: ValidationErrorCollection = [
            ("b".to_string(), FieldError::new("y", "second")),
            ("c".to_string(), FieldError::new("x", "third")),
        ]
        .into_iter()
        .collect();

        left.merge(right);
        assert_eq!(left.codes(), vec!["x", "y"]);
        assert_eq!(left.get("x").unwrap().messages, vec!["first", "third"]);
    }

    #[test]
    fn rest_error_shape() {
        let mut errors = ValidationErrorCollection::new();
        assert!(errors.to_rest_error().is_none());

        errors.add("title", FieldError::new("empty_title", "Title is empty"));
        errors.add("count", FieldError::new("out_of_range", "Too large").with_data(json!({"max": 10})));

        let body = errors.to_rest_error().unwrap();
        assert_eq!(body["code"], "empty_title");
        assert_eq!(body["data"], Value::Null);
        assert_eq!(body["additional_errors"][0]["code"], "out_of_range");
        assert_eq!(body["additional_errors"][0]["data"]["max"], 10);
    }
}
