//! Validating dispatcher
//!
//! Drives a raw edit payload through a route's field schema without running
//! the route's handler, producing either a [`CanonicalValue`] or a
//! [`ValidationErrorCollection`].
//!
//! # Workflow
//! 1. Dispatch a synthetic write request in [`DispatchMode::ResolveOnly`]
//! 2. Resolve the route's field schema through the [`SchemaProvider`]
//! 3. Decode the payload as a JSON object
//! 4. Sanitize (and in strict mode validate) each schema field present
//! 5. Aggregate every failure; re-encode the mapping when there are none

use crate::error::DispatchError;
use crate::pipeline::{DispatchMode, DispatchPipeline, DispatchResponse, Method, SyntheticRequest};
use crate::provider::SchemaProvider;
use crate::route::RouteIdentity;
use crate::schema::Sanitized;
use crate::validity::{FieldError, ValidationErrorCollection};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::Arc;

/// Error code reported when a payload is rejected for not being an object
pub const INVALID_PAYLOAD_CODE: &str = "invalid_payload";

/// Field name used for payload-level errors
pub const PAYLOAD_FIELD: &str = "body";

/// What to do with a payload that does not decode to a JSON object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UndecodablePolicy {
    /// Return the re-encoded original as the canonical value, with a warning
    #[default]
    PassThrough,
    /// Fail validation with [`INVALID_PAYLOAD_CODE`]
    Reject,
}

/// Dispatcher configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Method of the synthetic write request
    pub edit_method: Method,
    /// Handling of payloads that are not JSON objects
    pub undecodable_payload: UndecodablePolicy,
}

impl DispatcherConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With edit method
    #[inline]
    #[must_use]
    pub fn with_edit_method(mut self, method: Method) -> Self {
        self.edit_method = method;
        self
    }

    /// With undecodable payload policy
    #[inline]
    #[must_use]
    pub fn with_undecodable_payload(mut self, policy: UndecodablePolicy) -> Self {
        self.undecodable_payload = policy;
        self
    }
}

/// Per-call validation options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidateOptions {
    /// Run validators, not just sanitizers
    pub strict: bool,
    /// Caller is validating all settings at once; forces strict
    pub validating_all_settings: bool,
}

impl ValidateOptions {
    /// Sanitize only
    #[inline]
    #[must_use]
    pub fn sanitize_only() -> Self {
        Self::default()
    }

    /// Sanitize and validate
    #[inline]
    #[must_use]
    pub fn strict() -> Self {
        Self {
            strict: true,
            validating_all_settings: false,
        }
    }

    /// Mark that a validate-all pass is in progress
    #[inline]
    #[must_use]
    pub fn during_validate_all(mut self) -> Self {
        self.validating_all_settings = true;
        self
    }

    /// Strictness after escalation
    #[inline]
    #[must_use]
    pub fn effective_strict(self) -> bool {
        self.strict || self.validating_all_settings
    }
}

/// Serialized, validated representation of an edit
///
/// Encoding is deterministic (object keys sorted), so two canonical values
/// compare equal iff they encode the same data.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalValue(String);

impl CanonicalValue {
    /// Encode a JSON value
    #[inline]
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        Self(value.to_string())
    }

    /// Decode back into a structured value
    ///
    /// # Errors
    /// Returns the decoder error if the stored encoding is not valid JSON.
    pub fn decode(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.0)
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl Debug for CanonicalValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "CanonicalValue({})", self.0)
    }
}

impl Display for CanonicalValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of one validation pass
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    /// Payload accepted
    Canonical(CanonicalValue),
    /// One or more fields failed
    Invalid(ValidationErrorCollection),
}

impl ValidationOutcome {
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Canonical(_))
    }

    #[inline]
    #[must_use]
    pub fn canonical(&self) -> Option<&CanonicalValue> {
        match self {
            Self::Canonical(value) => Some(value),
            Self::Invalid(_) => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn errors(&self) -> Option<&ValidationErrorCollection> {
        match self {
            Self::Canonical(_) => None,
            Self::Invalid(errors) => Some(errors),
        }
    }

    /// Convert into a `Result`
    ///
    /// # Errors
    /// Returns the error collection for an invalid outcome.
    pub fn into_result(self) -> Result<CanonicalValue, ValidationErrorCollection> {
        match self {
            Self::Canonical(value) => Ok(value),
            Self::Invalid(errors) => Err(errors),
        }
    }
}

/// Validates edits against a route's schema without executing them
#[derive(Clone)]
pub struct ValidatingDispatcher {
    pipeline: Arc<dyn DispatchPipeline>,
    schemas: Arc<dyn SchemaProvider>,
    config: DispatcherConfig,
}

impl ValidatingDispatcher {
    /// Create dispatcher over a host that both dispatches and resolves schemas
    #[inline]
    #[must_use]
    pub fn new<H>(host: Arc<H>) -> Self
    where
        H: DispatchPipeline + SchemaProvider + 'static,
    {
        Self::with_config(host, DispatcherConfig::default())
    }

    /// Create dispatcher over a host with explicit configuration
    #[inline]
    #[must_use]
    pub fn with_config<H>(host: Arc<H>, config: DispatcherConfig) -> Self
    where
        H: DispatchPipeline + SchemaProvider + 'static,
    {
        let schemas: Arc<dyn SchemaProvider> = host.clone();
        Self::from_parts(host, schemas, config)
    }

    /// Create dispatcher from a separate pipeline and schema provider
    #[inline]
    #[must_use]
    pub fn from_parts(
        pipeline: Arc<dyn DispatchPipeline>,
        schemas: Arc<dyn SchemaProvider>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            pipeline,
            schemas,
            config,
        }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Canonicalize and validate `raw_value` for `route`
    ///
    /// Field failures are returned as [`ValidationOutcome::Invalid`];
    /// all fields are attempted before returning.
    ///
    /// # Errors
    /// Returns [`DispatchError`] if the route cannot be resolved or the
    /// pipeline does not honor resolve-only dispatch.
    pub fn validate(
        &self,
        route: &RouteIdentity,
        raw_value: &str,
        options: ValidateOptions,
    ) -> Result<ValidationOutcome, DispatchError> {
        let strict = options.effective_strict();
        let request = SyntheticRequest::new(self.config.edit_method, route.clone(), raw_value);

        match self.pipeline.dispatch(&request, DispatchMode::ResolveOnly)? {
            DispatchResponse::Resolved(resolved) => {
                tracing::trace!(route = %route, pattern = %resolved.pattern, "Route resolved");
            }
            DispatchResponse::Executed { status, .. } => {
                tracing::error!(route = %route, status, "Pipeline executed handler during validation");
                return Err(DispatchError::ModeNotHonored {
                    route: route.normalized().to_string(),
                });
            }
        }
        let schema = self.schemas.resolve_schema(route)?;

        let mut data: Map<String, Value> = match request.json_body() {
            Ok(Value::Object(map)) => map,
            decoded => return Ok(self.undecodable(route, raw_value, decoded.ok())),
        };

        let mut errors = ValidationErrorCollection::new();
        for field in schema.iter() {
            let Some(value) = data.get(field.name()) else {
                continue;
            };
            if value.is_null() {
                continue;
            }

            let sanitized = match field.sanitizer().apply(value) {
                Sanitized::Value(sanitized) => sanitized,
                Sanitized::Rejected(error) => {
                    errors.add(field.name(), error);
                    continue;
                }
            };

            if strict {
                if let Some(validator) = field.validator() {
                    if let Err(error) = validator.check(&sanitized) {
                        errors.add(field.name(), error);
                    }
                }
            }

            data.insert(field.name().to_string(), sanitized);
        }

        if errors.is_empty() {
            let canonical = CanonicalValue::from_value(&Value::Object(data));
            tracing::debug!(route = %route, strict, "Edit validated");
            Ok(ValidationOutcome::Canonical(canonical))
        } else {
            tracing::debug!(route = %route, strict, codes = ?errors.codes(), "Edit failed validation");
            Ok(ValidationOutcome::Invalid(errors))
        }
    }

    fn undecodable(
        &self,
        route: &RouteIdentity,
        raw_value: &str,
        decoded: Option<Value>,
    ) -> ValidationOutcome {
        match self.config.undecodable_payload {
            UndecodablePolicy::PassThrough => {
                tracing::warn!(
                    route = %route,
                    "Payload is not a JSON object; passing it through unvalidated"
                );
                let original = decoded.unwrap_or_else(|| Value::String(raw_value.to_string()));
                ValidationOutcome::Canonical(CanonicalValue::from_value(&original))
            }
            UndecodablePolicy::Reject => {
                let mut errors = ValidationErrorCollection::new();
                errors.add(
                    PAYLOAD_FIELD,
                    FieldError::new(INVALID_PAYLOAD_CODE, "payload must be a JSON object"),
                );
                ValidationOutcome::Invalid(errors)
            }
        }
    }
}

impl Debug for ValidatingDispatcher {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatingDispatcher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
