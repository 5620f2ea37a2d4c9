//! Preview sessions
//!
//! A [`PreviewSession`] is the context object for one edit/preview cycle
//! (typically one request). It owns the validating dispatcher, the preview
//! registry and the response emitter; nothing is shared between sessions.

use crate::config::PreviewConfig;
use crate::emission::{ResponseEmitter, ResponseStage, OVERLAY_STAGE_ID};
use crate::error::{PreviewError, SessionError};
use crate::overlay::{FaultSink, OverlayFilter, TracingFaultSink};
use crate::registry::{PendingEdit, PreviewRegistry};
use crate::setting::RestResourceSetting;
use preview_core::{
    DispatchPipeline, SchemaProvider, ValidateOptions, ValidatingDispatcher, ValidationOutcome,
};
use serde_json::Value;
use std::sync::Arc;

/// One edit/preview session
#[derive(Debug)]
pub struct PreviewSession {
    config: PreviewConfig,
    dispatcher: ValidatingDispatcher,
    registry: PreviewRegistry,
    emitter: ResponseEmitter,
    sink: Arc<dyn FaultSink>,
}

impl PreviewSession {
    /// Create session over a host that dispatches and resolves schemas
    #[must_use]
    pub fn new<H>(config: PreviewConfig, host: Arc<H>) -> Self
    where
        H: DispatchPipeline + SchemaProvider + 'static,
    {
        let dispatcher = ValidatingDispatcher::with_config(host, config.dispatcher_config());
        Self::with_dispatcher(config, dispatcher)
    }

    /// Create session around an existing dispatcher
    #[must_use]
    pub fn with_dispatcher(config: PreviewConfig, dispatcher: ValidatingDispatcher) -> Self {
        Self {
            config,
            dispatcher,
            registry: PreviewRegistry::new(),
            emitter: ResponseEmitter::new(),
            sink: Arc::new(TracingFaultSink),
        }
    }

    /// With fault sink for the overlay stage
    ///
    /// Applies to the overlay installed by the next [`Self::mark_for_preview`].
    #[inline]
    #[must_use]
    pub fn with_fault_sink(mut self, sink: Arc<dyn FaultSink>) -> Self {
        self.sink = sink;
        self
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn dispatcher(&self) -> &ValidatingDispatcher {
        &self.dispatcher
    }

    #[inline]
    #[must_use]
    pub fn registry(&self) -> &PreviewRegistry {
        &self.registry
    }

    /// Check if the overlay stage is installed
    #[inline]
    #[must_use]
    pub fn is_overlay_installed(&self) -> bool {
        self.emitter.is_installed(OVERLAY_STAGE_ID)
    }

    /// Register a validated setting for preview
    ///
    /// Installs the overlay stage on first use; later calls only update the
    /// registry record.
    ///
    /// # Errors
    /// Returns [`SessionError::NotPreviewable`] if the setting's latest
    /// submission did not validate.
    pub fn mark_for_preview(&mut self, setting: &RestResourceSetting) -> Result<(), SessionError> {
        let edit = setting
            .pending()
            .filter(|edit| edit.is_valid())
            .cloned()
            .ok_or_else(|| SessionError::NotPreviewable {
                route: setting.route().normalized().to_string(),
            })?;

        self.mark_edit(edit);
        Ok(())
    }

    /// Validate a payload for `setting` and preview it if it is valid
    ///
    /// A rejected payload for a route that is already previewed replaces the
    /// registry record too, so the overlay stops showing the earlier value.
    ///
    /// # Errors
    /// Returns [`PreviewError::Dispatch`] if the route cannot be resolved.
    pub fn stage(
        &mut self,
        setting: &mut RestResourceSetting,
        raw_value: &str,
        options: ValidateOptions,
    ) -> Result<ValidationOutcome, PreviewError> {
        let outcome = setting.submit(raw_value, &self.dispatcher, options)?;
        if outcome.is_valid() {
            self.mark_for_preview(setting)?;
        } else {
            if let Some(edit) = setting.pending() {
                if self.registry.contains(edit.route().normalized()) {
                    self.registry.mark_for_preview(edit.clone());
                }
            }
            tracing::info!(
                setting = %setting.id(),
                codes = ?outcome.errors().map(|e| e.codes()),
                "Edit rejected, not previewed"
            );
        }
        Ok(outcome)
    }

    /// Install an additional response stage
    ///
    /// Returns `false` if a stage with the same id is already installed.
    pub fn install_stage(&mut self, stage: Arc<dyn ResponseStage>) -> bool {
        self.emitter.install(stage)
    }

    /// Pass an outgoing body through the installed stages
    #[must_use]
    pub fn emit(&self, body: Value) -> Value {
        self.emitter.emit(body, &self.registry)
    }

    /// End the session: drop every pending edit and stage
    pub fn reset(&mut self) {
        tracing::debug!(routes = self.registry.len(), "Resetting preview session");
        self.registry.reset();
        self.emitter.clear();
    }

    fn mark_edit(&mut self, edit: PendingEdit) {
        let route = edit.route().normalized().to_string();
        self.registry.mark_for_preview(edit);

        if !self.is_overlay_installed() {
            let overlay = OverlayFilter::new(self.config.base_url.clone())
                .with_sink(Arc::clone(&self.sink))
                .with_descend_embedded(self.config.descend_embedded);
            self.emitter.install(Arc::new(overlay));
        }
        tracing::info!(route = %route, "Marked route for preview");
    }
}
