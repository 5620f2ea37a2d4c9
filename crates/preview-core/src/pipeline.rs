//! Route dispatch pipeline
//!
//! Provides the [`DispatchPipeline`] seam, the synthetic request/response
//! types the validating dispatcher uses, and [`RouteTable`], an in-memory
//! pipeline that maps route patterns to field schemas and handlers.
//!
//! Side effects are gated by an explicit [`DispatchMode`]: in
//! [`DispatchMode::ResolveOnly`] a pipeline resolves the route and returns
//! without running the handler.

use crate::error::{DispatchError, SchemaError};
use crate::provider::SchemaProvider;
use crate::route::RouteIdentity;
use crate::schema::FieldSchema;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::Arc;

/// HTTP method of a synthetic request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    #[default]
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Methods that carry an edit payload
    #[inline]
    #[must_use]
    pub fn is_write(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }

    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the handler's side-effecting phase may run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    /// Resolve the route, never run the handler
    ResolveOnly,
    /// Normal dispatch
    #[default]
    Execute,
}

/// Request built by the dispatcher, never sent over the wire
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticRequest {
    /// Request method
    pub method: Method,
    /// Target route
    pub route: RouteIdentity,
    /// Raw body as submitted
    pub body: String,
}

impl SyntheticRequest {
    /// Create request for `route` carrying `body`
    #[inline]
    #[must_use]
    pub fn new(method: Method, route: RouteIdentity, body: impl Into<String>) -> Self {
        Self {
            method,
            route,
            body: body.into(),
        }
    }

    /// Decode the body as JSON
    ///
    /// # Errors
    /// Returns the decoder error if the body is not valid JSON.
    pub fn json_body(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// Route matched during resolve-only dispatch
#[derive(Debug, Clone)]
pub struct ResolvedRoute {
    /// Route as requested
    pub route: RouteIdentity,
    /// Pattern of the matching registration
    pub pattern: String,
}

/// Outcome of a dispatch
#[derive(Debug, Clone)]
pub enum DispatchResponse {
    /// Route resolved, handler skipped
    Resolved(ResolvedRoute),
    /// Handler ran
    Executed { status: u16, body: Value },
}

/// Resolves and (optionally) executes synthetic requests
pub trait DispatchPipeline: Send + Sync {
    /// Dispatch `request`
    ///
    /// Under [`DispatchMode::ResolveOnly`] implementations must return
    /// [`DispatchResponse::Resolved`] without running any handler.
    ///
    /// # Errors
    /// Returns [`DispatchError`] if the route cannot be resolved or the
    /// handler fails.
    fn dispatch(
        &self,
        request: &SyntheticRequest,
        mode: DispatchMode,
    ) -> Result<DispatchResponse, DispatchError>;
}

impl<P: DispatchPipeline + ?Sized> DispatchPipeline for Arc<P> {
    fn dispatch(
        &self,
        request: &SyntheticRequest,
        mode: DispatchMode,
    ) -> Result<DispatchResponse, DispatchError> {
        (**self).dispatch(request, mode)
    }
}

/// Route handler invoked in [`DispatchMode::Execute`]
pub type Handler = Arc<dyn Fn(&SyntheticRequest) -> Result<Value, String> + Send + Sync>;

/// One registered route
#[derive(Clone)]
pub struct RouteEntry {
    pattern: String,
    matcher: Regex,
    methods: Vec<Method>,
    schema: Arc<FieldSchema>,
    handler: Option<Handler>,
}

impl RouteEntry {
    /// Restrict accepted methods
    pub fn methods(&mut self, methods: &[Method]) -> &mut Self {
        self.methods = methods.to_vec();
        self
    }

    /// Attach the side-effecting handler
    pub fn handler(
        &mut self,
        f: impl Fn(&SyntheticRequest) -> Result<Value, String> + Send + Sync + 'static,
    ) -> &mut Self {
        self.handler = Some(Arc::new(f));
        self
    }

    #[inline]
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    #[inline]
    #[must_use]
    pub fn accepts(&self, method: Method) -> bool {
        self.methods.contains(&method)
    }
}

impl Debug for RouteEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("pattern", &self.pattern)
            .field("methods", &self.methods)
            .field("fields", &self.schema.names())
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

/// In-memory route registrations
///
/// Patterns are regular expressions over the `/`-prefixed route, anchored at
/// both ends. Registration order decides precedence.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<RouteEntry>,
}

impl RouteTable {
    /// Create empty table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `pattern` with its field schema
    ///
    /// Accepts GET, POST, PUT and PATCH until restricted with
    /// [`RouteEntry::methods`].
    ///
    /// # Errors
    /// Returns [`SchemaError::InvalidPattern`] if the pattern does not compile.
    pub fn register(
        &mut self,
        pattern: &str,
        schema: FieldSchema,
    ) -> Result<&mut RouteEntry, SchemaError> {
        let anchored = format!("^/{}$", pattern.trim_matches('/'));
        let matcher = Regex::new(&anchored).map_err(|e| SchemaError::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;

        self.routes.push(RouteEntry {
            pattern: pattern.to_string(),
            matcher,
            methods: vec![Method::Get, Method::Post, Method::Put, Method::Patch],
            schema: Arc::new(schema),
            handler: None,
        });
        let last = self.routes.len() - 1;
        Ok(&mut self.routes[last])
    }

    /// Number of registered routes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    fn find(&self, route: &RouteIdentity) -> impl Iterator<Item = &RouteEntry> {
        let path = route.path();
        self.routes
            .iter()
            .filter(move |entry| entry.matcher.is_match(&path))
    }
}

impl SchemaProvider for RouteTable {
    fn resolve_schema(&self, route: &RouteIdentity) -> Result<Arc<FieldSchema>, SchemaError> {
        self.find(route)
            .next()
            .map(|entry| Arc::clone(&entry.schema))
            .ok_or_else(|| SchemaError::RouteNotFound {
                route: route.normalized().to_string(),
            })
    }
}

impl DispatchPipeline for RouteTable {
    fn dispatch(
        &self,
        request: &SyntheticRequest,
        mode: DispatchMode,
    ) -> Result<DispatchResponse, DispatchError> {
        let mut candidates = self.find(&request.route).peekable();
        if candidates.peek().is_none() {
            return Err(SchemaError::RouteNotFound {
                route: request.route.normalized().to_string(),
            }
            .into());
        }

        let entry = candidates
            .find(|entry| entry.accepts(request.method))
            .ok_or_else(|| DispatchError::MethodNotAllowed {
                method: request.method,
                route: request.route.normalized().to_string(),
            })?;

        match mode {
            DispatchMode::ResolveOnly => {
                tracing::debug!(
                    route = %request.route,
                    pattern = %entry.pattern,
                    "Resolved route without executing handler"
                );
                Ok(DispatchResponse::Resolved(ResolvedRoute {
                    route: request.route.clone(),
                    pattern: entry.pattern.clone(),
                }))
            }
            DispatchMode::Execute => {
                let handler = entry.handler.as_ref().ok_or_else(|| DispatchError::Handler {
                    route: request.route.normalized().to_string(),
                    message: "no handler registered".to_string(),
                })?;
                let body = handler(request).map_err(|message| DispatchError::Handler {
                    route: request.route.normalized().to_string(),
                    message,
                })?;
                Ok(DispatchResponse::Executed { status: 200, body })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldDescriptor;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn table_with_counter() -> (RouteTable, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let mut table = RouteTable::new();
        table
            .register(
                "/widgets/(?P<id>\\d+)",
                FieldSchema::new().field(FieldDescriptor::new("title")),
            )
            .unwrap()
            .handler(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(json!({"saved": true}))
            });
        (table, calls)
    }

    #[test]
    fn resolve_only_skips_handler() {
        let (table, calls) = table_with_counter();
        let request = SyntheticRequest::new(Method::Put, RouteIdentity::from_route("widgets/5"), "{}");

        let response = table.dispatch(&request, DispatchMode::ResolveOnly).unwrap();
        assert!(matches!(
            response,
            DispatchResponse::Resolved(ref r) if r.pattern == "/widgets/(?P<id>\\d+)"
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn execute_runs_handler() {
        let (table, calls) = table_with_counter();
        let request = SyntheticRequest::new(Method::Put, RouteIdentity::from_route("/widgets/5/"), "{}");

        let response = table.dispatch(&request, DispatchMode::Execute).unwrap();
        assert!(matches!(response, DispatchResponse::Executed { status: 200, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unknown_route_not_found() {
        let (table, _) = table_with_counter();
        let request = SyntheticRequest::new(Method::Put, RouteIdentity::from_route("widgets/abc"), "{}");
        let err = table.dispatch(&request, DispatchMode::ResolveOnly).unwrap_err();
        assert!(err.is_route_not_found());
    }

    #[test]
    fn method_not_allowed() {
        let (mut table, _) = table_with_counter();
        table
            .register("gadgets/\\d+", FieldSchema::new())
            .unwrap()
            .methods(&[Method::Get]);

        let request = SyntheticRequest::new(Method::Put, RouteIdentity::from_route("gadgets/1"), "{}");
        let err = table.dispatch(&request, DispatchMode::ResolveOnly).unwrap_err();
        assert!(matches!(err, DispatchError::MethodNotAllowed { method: Method::Put, .. }));
    }

    #[test]
    fn invalid_pattern_rejected() {
        let mut table = RouteTable::new();
        let err = table.register("widgets/(", FieldSchema::new()).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidPattern { .. }));
    }

    #[test]
    fn schema_provider_resolves_first_match() {
        let (table, _) = table_with_counter();
        let schema = table.resolve_schema(&RouteIdentity::from_route("widgets/9")).unwrap();
        assert_eq!(schema.names(), vec!["title"]);
    }
}
