//! REST resource settings
//!
//! A [`RestResourceSetting`] is the host-facing handle for one previewable
//! resource: it owns the identifier, the last submitted payload and the
//! outcome of validating it.

use crate::registry::PendingEdit;
use preview_core::{
    CanonicalValue, DispatchError, RouteError, RouteIdentity, ValidateOptions,
    ValidatingDispatcher, ValidationOutcome,
};

/// Setting kind used in identifiers, `rest_resource[<route>]`
pub const SETTING_KIND: &str = "rest_resource";

/// Pending value holder for one REST resource
#[derive(Debug, Clone, PartialEq)]
pub struct RestResourceSetting {
    route: RouteIdentity,
    pending: Option<PendingEdit>,
}

impl RestResourceSetting {
    /// Create setting from a `<kind>[<route>]` identifier
    ///
    /// # Errors
    /// Returns [`RouteError::MalformedIdentifier`] for identifiers that do
    /// not match the pattern.
    pub fn new(id: &str) -> Result<Self, RouteError> {
        let route = RouteIdentity::parse(id)?;
        Ok(Self {
            route,
            pending: None,
        })
    }

    /// Create setting for a bare route
    #[must_use]
    pub fn for_route(route: &str) -> Self {
        let route = RouteIdentity::from_route(route);
        Self {
            route: RouteIdentity::parse(&format!("{SETTING_KIND}[{}]", route.normalized()))
                .unwrap_or(route),
            pending: None,
        }
    }

    /// Canonical identifier
    #[inline]
    #[must_use]
    pub fn id(&self) -> String {
        self.route.setting_id()
    }

    #[inline]
    #[must_use]
    pub fn route(&self) -> &RouteIdentity {
        &self.route
    }

    /// Submit a raw payload and record its validation outcome
    ///
    /// The raw value is kept even if dispatch fails.
    ///
    /// # Errors
    /// Returns [`DispatchError`] if the route cannot be resolved.
    pub fn submit(
        &mut self,
        raw_value: &str,
        dispatcher: &ValidatingDispatcher,
        options: ValidateOptions,
    ) -> Result<ValidationOutcome, DispatchError> {
        let route = self.route.clone();
        let pending = self
            .pending
            .get_or_insert_with(|| PendingEdit::new(route, raw_value));
        pending.set_raw_value(raw_value);

        let outcome = dispatcher.validate(&self.route, raw_value, options)?;
        pending.record(outcome.clone());
        Ok(outcome)
    }

    /// Submit in sanitize-only mode
    ///
    /// # Errors
    /// Returns [`DispatchError`] if the route cannot be resolved.
    #[inline]
    pub fn sanitize(
        &mut self,
        raw_value: &str,
        dispatcher: &ValidatingDispatcher,
    ) -> Result<ValidationOutcome, DispatchError> {
        self.submit(raw_value, dispatcher, ValidateOptions::sanitize_only())
    }

    /// Submit in strict mode
    ///
    /// # Errors
    /// Returns [`DispatchError`] if the route cannot be resolved.
    #[inline]
    pub fn validate(
        &mut self,
        raw_value: &str,
        dispatcher: &ValidatingDispatcher,
    ) -> Result<ValidationOutcome, DispatchError> {
        self.submit(raw_value, dispatcher, ValidateOptions::strict())
    }

    /// Pending value, if the latest submission validated
    #[inline]
    #[must_use]
    pub fn value(&self) -> Option<&CanonicalValue> {
        self.pending.as_ref().and_then(PendingEdit::usable_value)
    }

    #[inline]
    #[must_use]
    pub fn pending(&self) -> Option<&PendingEdit> {
        self.pending.as_ref()
    }

    /// Check if the setting can be marked for preview
    #[inline]
    #[must_use]
    pub fn is_previewable(&self) -> bool {
        self.value().is_some()
    }
}
