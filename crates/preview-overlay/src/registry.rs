//! Preview registry
//!
//! Provides [`PendingEdit`], the pending state of one route, and
//! [`PreviewRegistry`], the session-scoped map from normalized route to the
//! edit that should be shown instead of stored data.

use preview_core::{CanonicalValue, RouteIdentity, ValidationErrorCollection, ValidationOutcome};
use std::collections::HashMap;

/// Pending (unsaved) edit for one route
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEdit {
    route: RouteIdentity,
    raw_value: String,
    canonical_value: Option<CanonicalValue>,
    errors: ValidationErrorCollection,
}

impl PendingEdit {
    /// Create edit that has not been validated yet
    #[inline]
    #[must_use]
    pub fn new(route: RouteIdentity, raw_value: impl Into<String>) -> Self {
        Self {
            route,
            raw_value: raw_value.into(),
            canonical_value: None,
            errors: ValidationErrorCollection::new(),
        }
    }

    /// Replace the raw payload ahead of re-validation
    #[inline]
    pub fn set_raw_value(&mut self, raw_value: impl Into<String>) {
        self.raw_value = raw_value.into();
    }

    /// Record the outcome of a validation pass
    ///
    /// A failed pass keeps the last canonical value but makes it unusable
    /// until the next successful pass.
    pub fn record(&mut self, outcome: ValidationOutcome) {
        match outcome {
            ValidationOutcome::Canonical(value) => {
                self.canonical_value = Some(value);
                self.errors = ValidationErrorCollection::new();
            }
            ValidationOutcome::Invalid(errors) => self.errors = errors,
        }
    }

    #[inline]
    #[must_use]
    pub fn route(&self) -> &RouteIdentity {
        &self.route
    }

    #[inline]
    #[must_use]
    pub fn raw_value(&self) -> &str {
        &self.raw_value
    }

    /// Last successfully validated value, even if a later pass failed
    #[inline]
    #[must_use]
    pub fn canonical_value(&self) -> Option<&CanonicalValue> {
        self.canonical_value.as_ref()
    }

    /// Errors of the most recent pass
    #[inline]
    #[must_use]
    pub fn errors(&self) -> &ValidationErrorCollection {
        &self.errors
    }

    /// Value to overlay: present only after a successful latest pass
    #[inline]
    #[must_use]
    pub fn usable_value(&self) -> Option<&CanonicalValue> {
        if self.errors.is_empty() {
            self.canonical_value.as_ref()
        } else {
            None
        }
    }

    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.usable_value().is_some()
    }
}

/// Normalized route → pending edit, for one preview session
///
/// Marking a route again replaces its record. Records are only dropped when
/// the whole session is reset.
#[derive(Debug, Clone, Default)]
pub struct PreviewRegistry {
    entries: HashMap<String, PendingEdit>,
}

impl PreviewRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `edit` under its route, returning the record it replaced
    pub fn mark_for_preview(&mut self, edit: PendingEdit) -> Option<PendingEdit> {
        let key = edit.route().normalized().to_string();
        let previous = self.entries.insert(key, edit);
        if previous.is_some() {
            tracing::debug!(registered = self.entries.len(), "Replaced pending edit");
        }
        previous
    }

    /// Pending edit for `route`, normalizing it first
    #[inline]
    #[must_use]
    pub fn lookup(&self, route: &str) -> Option<&PendingEdit> {
        self.entries.get(route.trim_matches('/'))
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, route: &str) -> bool {
        self.lookup(route).is_some()
    }

    /// Registered routes, in no particular order
    #[must_use]
    pub fn routes(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every record at session end
    #[inline]
    pub fn reset(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use preview_core::FieldError;
    use serde_json::json;

    fn valid_edit(route: &str, value: serde_json::Value) -> PendingEdit {
        let mut edit = PendingEdit::new(RouteIdentity::from_route(route), value.to_string());
        edit.record(ValidationOutcome::Canonical(CanonicalValue::from_value(&value)));
        edit
    }

    #[test]
    fn new_edit_has_no_value() {
        let edit = PendingEdit::new(RouteIdentity::from_route("widgets/5"), "{}");
        assert!(edit.canonical_value().is_none());
        assert!(!edit.is_valid());
    }

    #[test]
    fn failed_pass_hides_previous_value() {
        let mut edit = valid_edit("widgets/5", json!({"title": "Hi"}));
        assert!(edit.is_valid());

        let errors = [("title".to_string(), FieldError::new("empty_title", "empty"))]
            .into_iter()
            .collect();
        edit.set_raw_value(r#"{"title":""}"#);
        edit.record(ValidationOutcome::Invalid(errors));

        assert!(edit.canonical_value().is_some());
        assert!(edit.usable_value().is_none());
        assert_eq!(edit.raw_value(), r#"{"title":""}"#);
    }

    #[test]
    fn lookup_normalizes_route() {
        let mut registry = PreviewRegistry::new();
        registry.mark_for_preview(valid_edit("/widgets/5/", json!({"title": "Hi"})));

        assert!(registry.contains("widgets/5"));
        assert!(registry.lookup("/widgets/5").is_some());
        assert!(registry.lookup("widgets/6").is_none());
    }

    #[test]
    fn remarking_replaces_record() {
        let mut registry = PreviewRegistry::new();
        assert!(registry
            .mark_for_preview(valid_edit("widgets/5", json!({"title": "A"})))
            .is_none());
        let previous = registry.mark_for_preview(valid_edit("widgets/5", json!({"title": "B"})));

        assert_eq!(registry.len(), 1);
        assert_eq!(
            previous.unwrap().canonical_value().unwrap().as_str(),
            r#"{"title":"A"}"#
        );
        assert_eq!(
            registry.lookup("widgets/5").unwrap().canonical_value().unwrap().as_str(),
            r#"{"title":"B"}"#
        );
    }

    #[test]
    fn reset_clears_session() {
        let mut registry = PreviewRegistry::new();
        registry.mark_for_preview(valid_edit("widgets/1", json!({})));
        registry.mark_for_preview(valid_edit("widgets/2", json!({})));
        assert_eq!(registry.routes().len(), 2);

        registry.reset();
        assert!(registry.is_empty());
    }
}
