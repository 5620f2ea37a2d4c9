//! Error types for preview core
//!
//! Structural faults (malformed identifiers, unknown routes, pipeline
//! misbehaviour) are returned as errors. Field-level validation failures are
//! data, see [`crate::ValidationErrorCollection`].

use crate::pipeline::Method;

/// Route identifier errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    /// Identifier does not match `<kind>[<route>]`
    #[error("malformed setting identifier: {identifier}")]
    MalformedIdentifier { identifier: String },
}

/// Schema resolution errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// No registered route matches
    #[error("no route matches {route}")]
    RouteNotFound { route: String },

    /// Route pattern failed to compile
    #[error("invalid route pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// Dispatch pipeline errors
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Route could not be resolved to a schema
    #[error("schema resolution failed: {0}")]
    Schema(#[from] SchemaError),

    /// Route exists but does not accept the method
    #[error("method {method} not allowed for {route}")]
    MethodNotAllowed { method: Method, route: String },

    /// Pipeline executed the handler although resolve-only was requested
    #[error("pipeline ignored resolve-only mode for {route}")]
    ModeNotHonored { route: String },

    /// Handler failed while executing
    #[error("handler failed for {route}: {message}")]
    Handler { route: String, message: String },
}

impl DispatchError {
    /// Check if the route itself is unknown
    #[inline]
    #[must_use]
    pub fn is_route_not_found(&self) -> bool {
        matches!(self, Self::Schema(SchemaError::RouteNotFound { .. }))
    }
}
