//! Preview configuration
//!
//! Loaded from TOML or built in code:
//!
//! ```toml
//! base_url = "https://example.com/wp-json"
//! edit_method = "PUT"
//! undecodable_payload = "reject"
//! descend_embedded = true
//! ```

use crate::error::ConfigError;
use preview_core::{DispatcherConfig, Method, UndecodablePolicy};
use serde::{Deserialize, Serialize};

/// Session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// API base URL that self links are resolved against
    pub base_url: String,
    /// Method of the synthetic validation request
    pub edit_method: Method,
    /// Handling of payloads that are not JSON objects
    pub undecodable_payload: UndecodablePolicy,
    /// Overlay resources under `_embedded`
    pub descend_embedded: bool,
}

impl PreviewConfig {
    /// Create configuration for an API base URL
    #[inline]
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Parse from TOML
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the document is invalid or `base_url` is
    /// empty.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants
    ///
    /// # Errors
    /// Returns [`ConfigError::EmptyBaseUrl`] if no base URL is set, or
    /// [`ConfigError::ReadOnlyEditMethod`] for a GET or DELETE edit method.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }
        if !self.edit_method.is_write() {
            return Err(ConfigError::ReadOnlyEditMethod {
                method: self.edit_method,
            });
        }
        Ok(())
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

    /// With embedded descent
    #[inline]
    #[must_use]
    pub fn with_descend_embedded(mut self, descend: bool) -> Self {
        self.descend_embedded = descend;
        self
    }

    /// Dispatcher half of the configuration
    #[inline]
    #[must_use]
    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig::new()
            .with_edit_method(self.edit_method)
            .with_undecodable_payload(self.undecodable_payload)
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost/wp-json".to_string(),
            edit_method: Method::Put,
            undecodable_payload: UndecodablePolicy::PassThrough,
            descend_embedded: true,
        }
    }
}
