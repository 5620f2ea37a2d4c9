//! Response emission stages
//!
//! Outgoing API bodies pass through an ordered list of [`ResponseStage`]s.
//! Stages are installed by id, at most once per emitter.

use crate::overlay::OverlayFilter;
use crate::registry::PreviewRegistry;
use serde_json::Value;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// Stage id of the overlay filter
pub const OVERLAY_STAGE_ID: &str = "preview_overlay";

/// One transformation applied to every outgoing body
pub trait ResponseStage: Send + Sync {
    /// Unique id; installing a second stage with the same id is a no-op
    fn id(&self) -> &str;

    /// Transform a body
    fn apply(&self, body: Value, registry: &PreviewRegistry) -> Value;
}

impl ResponseStage for OverlayFilter {
    fn id(&self) -> &str {
        OVERLAY_STAGE_ID
    }

    fn apply(&self, body: Value, registry: &PreviewRegistry) -> Value {
        self.overlay(body, registry)
    }
}

/// Ordered set of response stages
#[derive(Clone, Default)]
pub struct ResponseEmitter {
    stages: Vec<Arc<dyn ResponseStage>>,
}

impl ResponseEmitter {
    /// Create emitter without stages
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a stage unless one with the same id is present
    ///
    /// Returns `true` if the stage was added.
    pub fn install(&mut self, stage: Arc<dyn ResponseStage>) -> bool {
        if self.is_installed(stage.id()) {
            return false;
        }
        tracing::debug!(stage = stage.id(), "Installed response stage");
        self.stages.push(stage);
        true
    }

    #[inline]
    #[must_use]
    pub fn is_installed(&self, id: &str) -> bool {
        self.stages.iter().any(|stage| stage.id() == id)
    }

    /// Run every stage in install order
    #[must_use]
    pub fn emit(&self, body: Value, registry: &PreviewRegistry) -> Value {
        self.stages
            .iter()
            .fold(body, |body, stage| stage.apply(body, registry))
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Remove all stages
    #[inline]
    pub fn clear(&mut self) {
        self.stages.clear();
    }
}

impl Debug for ResponseEmitter {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.stages.iter().map(|stage| stage.id()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Stamp(&'static str);

    impl ResponseStage for Stamp {
        fn id(&self) -> &str {
            self.0
        }

        fn apply(&self, mut body: Value, _registry: &PreviewRegistry) -> Value {
            if let Value::Array(items) = &mut body {
                items.push(json!(self.0));
            }
            body
        }
    }

    #[test]
    fn install_is_idempotent_by_id() {
        let mut emitter = ResponseEmitter::new();
        assert!(emitter.install(Arc::new(Stamp("a"))));
        assert!(!emitter.install(Arc::new(Stamp("a"))));
        assert!(emitter.install(Arc::new(Stamp("b"))));
        assert_eq!(emitter.len(), 2);
    }

    #[test]
    fn emit_runs_in_install_order() {
        let mut emitter = ResponseEmitter::new();
        emitter.install(Arc::new(Stamp("first")));
        emitter.install(Arc::new(Stamp("second")));

        let body = emitter.emit(json!([]), &PreviewRegistry::new());
        assert_eq!(body, json!(["first", "second"]));
    }

    #[test]
    fn empty_emitter_passes_through() {
        let emitter = ResponseEmitter::new();
        assert!(emitter.is_empty());
        assert_eq!(emitter.emit(json!({"a": 1}), &PreviewRegistry::new()), json!({"a": 1}));
    }

    #[test]
    fn overlay_filter_has_fixed_id() {
        let filter = OverlayFilter::new("https://example.test/wp-json");
        assert_eq!(ResponseStage::id(&filter), OVERLAY_STAGE_ID);
    }
}
