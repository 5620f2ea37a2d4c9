//! Error types for the preview overlay
//!
//! - [`OverlayError`]: per-resource faults while rewriting a response
//! - [`SessionError`]: misuse of a preview session
//! - [`ConfigError`]: configuration loading
//! - [`PreviewError`]: umbrella for session-level operations

use preview_core::{DispatchError, Method, RouteError};

/// Faults while overlaying a single resource
#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    /// Self link is not under the configured API base URL
    #[error("self link '{href}' is not under API base '{base_url}'")]
    RouteResolution { href: String, base_url: String },

    /// Pending canonical value could not be decoded
    #[error("pending value for {route} is not valid JSON: {source}")]
    Decode {
        route: String,
        #[source]
        source: serde_json::Error,
    },
}

impl OverlayError {
    /// Check if the fault signals an environment mismatch
    #[inline]
    #[must_use]
    pub fn is_route_resolution(&self) -> bool {
        matches!(self, Self::RouteResolution { .. })
    }
}

/// Preview session errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Setting has no successfully validated value
    #[error("setting for {route} has no validated value to preview")]
    NotPreviewable { route: String },
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML could not be parsed
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Base URL is empty
    #[error("base_url must not be empty")]
    EmptyBaseUrl,

    /// Edit method does not carry a payload
    #[error("edit_method {method} cannot carry an edit payload")]
    ReadOnlyEditMethod { method: Method },
}

/// Main preview error type
#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    /// Setting identifier was malformed
    #[error("route error: {0}")]
    Route(#[from] RouteError),

    /// Validation dispatch failed
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// Session misuse
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
