//! Response overlay filter
//!
//! Rewrites outgoing API bodies so that any resource whose self link names a
//! previewed route shows the pending value instead of stored data.
//!
//! Matching keys off the response's own `_links.self` href, so the filter
//! works for single resources, collections and embedded resources alike.
//! Faults are isolated per resource: the affected resource is left as-is and
//! the fault goes to a [`FaultSink`].

use crate::error::OverlayError;
use crate::registry::PreviewRegistry;
use parking_lot::Mutex;
use preview_core::RouteIdentity;
use serde_json::Value;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

const LINKS_KEY: &str = "_links";
const SELF_KEY: &str = "self";
const HREF_KEY: &str = "href";
const EMBEDDED_KEY: &str = "_embedded";

/// Supplies the API base URL self links are resolved against
pub trait BaseUrlProvider: Send + Sync {
    /// Canonical prefix, e.g. `https://example.com/wp-json`
    fn base_url(&self) -> &str;
}

impl BaseUrlProvider for String {
    fn base_url(&self) -> &str {
        self
    }
}

impl BaseUrlProvider for &'static str {
    fn base_url(&self) -> &str {
        self
    }
}

/// Receives per-resource overlay faults
pub trait FaultSink: Send + Sync + Debug {
    /// Report a fault; the resource has already been left unchanged
    fn report(&self, fault: &OverlayError);
}

/// Logs faults with `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingFaultSink;

impl FaultSink for TracingFaultSink {
    fn report(&self, fault: &OverlayError) {
        tracing::warn!(error = %fault, "Skipped overlay for resource");
    }
}

/// Records faults in memory
#[derive(Debug, Default)]
pub struct CollectingFaultSink {
    faults: Mutex<Vec<String>>,
}

impl CollectingFaultSink {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rendered faults in report order
    #[must_use]
    pub fn faults(&self) -> Vec<String> {
        self.faults.lock().clone()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.faults.lock().len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faults.lock().is_empty()
    }
}

impl FaultSink for CollectingFaultSink {
    fn report(&self, fault: &OverlayError) {
        self.faults.lock().push(fault.to_string());
    }
}

/// Substitutes pending values into API response bodies
#[derive(Clone)]
pub struct OverlayFilter {
    base_url: Arc<dyn BaseUrlProvider>,
    sink: Arc<dyn FaultSink>,
    descend_embedded: bool,
}

impl OverlayFilter {
    /// Create filter reporting faults through `tracing`
    #[must_use]
    pub fn new(base_url: impl BaseUrlProvider + 'static) -> Self {
        Self {
            base_url: Arc::new(base_url),
            sink: Arc::new(TracingFaultSink),
            descend_embedded: true,
        }
    }

    /// With fault sink
    #[inline]
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn FaultSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Whether `_embedded` resources are overlaid too
    #[inline]
    #[must_use]
    pub fn with_descend_embedded(mut self, descend: bool) -> Self {
        self.descend_embedded = descend;
        self
    }

    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url.base_url()
    }

    /// Overlay a response body
    ///
    /// A body carrying `_links` is one resource; an array is a collection
    /// whose elements are overlaid independently, in order. Anything else is
    /// returned unchanged. Never fails: faults are reported and the affected
    /// resource is kept as-is.
    #[must_use]
    pub fn overlay(&self, body: Value, registry: &PreviewRegistry) -> Value {
        match body {
            Value::Object(_) if is_resource(&body) => self.overlay_isolated(body, registry),
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|item| self.overlay(item, registry))
                    .collect(),
            ),
            other => other,
        }
    }

    /// Overlay one resource
    ///
    /// # Errors
    /// Returns [`OverlayError::RouteResolution`] if the self link is not
    /// under the base URL, or [`OverlayError::Decode`] if the pending value
    /// cannot be decoded.
    pub fn overlay_single(
        &self,
        resource: Value,
        registry: &PreviewRegistry,
    ) -> Result<Value, OverlayError> {
        match self.replacement(&resource, registry)? {
            Some(replacement) => Ok(replacement),
            None => Ok(self.overlay_embedded(resource, registry)),
        }
    }

    /// Route a self link addresses, relative to the base URL
    ///
    /// # Errors
    /// Returns [`OverlayError::RouteResolution`] if `href` is not under the
    /// base URL.
    pub fn route_for(&self, href: &str) -> Result<String, OverlayError> {
        let base = self.base_url().trim_end_matches('/');
        let path = href.split(['?', '#']).next().unwrap_or(href);

        match path.strip_prefix(base) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => {
                Ok(RouteIdentity::normalize(rest))
            }
            _ => Err(OverlayError::RouteResolution {
                href: href.to_string(),
                base_url: self.base_url().to_string(),
            }),
        }
    }

    /// Href of a resource's self link
    ///
    /// Accepts `_links.self` as a list of link objects, a single link object
    /// or a bare string.
    #[must_use]
    pub fn self_link(resource: &Value) -> Option<&str> {
        let link = resource.get(LINKS_KEY)?.get(SELF_KEY)?;
        let link = match link {
            Value::Array(links) => links.first()?,
            other => other,
        };
        match link {
            Value::String(href) => Some(href.as_str()),
            other => other.get(HREF_KEY)?.as_str(),
        }
    }

    fn replacement(
        &self,
        resource: &Value,
        registry: &PreviewRegistry,
    ) -> Result<Option<Value>, OverlayError> {
        let Some(href) = Self::self_link(resource) else {
            return Ok(None);
        };
        let route = self.route_for(href)?;

        let Some(edit) = registry.lookup(&route) else {
            return Ok(None);
        };
        let Some(value) = edit.usable_value() else {
            tracing::debug!(route = %route, "Pending edit has no validated value");
            return Ok(None);
        };

        let decoded = value.decode().map_err(|source| OverlayError::Decode {
            route: route.clone(),
            source,
        })?;
        tracing::debug!(route = %route, "Overlaid pending value");
        Ok(Some(decoded))
    }

    fn overlay_isolated(&self, resource: Value, registry: &PreviewRegistry) -> Value {
        match self.replacement(&resource, registry) {
            Ok(Some(replacement)) => replacement,
            Ok(None) => self.overlay_embedded(resource, registry),
            Err(fault) => {
                self.sink.report(&fault);
                resource
            }
        }
    }

    fn overlay_embedded(&self, mut resource: Value, registry: &PreviewRegistry) -> Value {
        if !self.descend_embedded {
            return resource;
        }
        if let Some(Value::Object(embedded)) = resource.get_mut(EMBEDDED_KEY) {
            for value in embedded.values_mut() {
                let original = std::mem::take(value);
                *value = self.overlay(original, registry);
            }
        }
        resource
    }
}

impl Debug for OverlayFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayFilter")
            .field("base_url", &self.base_url())
            .field("descend_embedded", &self.descend_embedded)
            .finish_non_exhaustive()
    }
}

fn is_resource(body: &Value) -> bool {
    body.get(LINKS_KEY).is_some()
}
