//! Schema resolution seam
//!
//! Hosts expose their route → field schema mapping through [`SchemaProvider`].

use crate::error::SchemaError;
use crate::route::RouteIdentity;
use crate::schema::FieldSchema;
use std::sync::Arc;

/// Resolves a route to its ordered field schema
///
/// Implementations must not cause externally visible side effects.
pub trait SchemaProvider: Send + Sync {
    /// Resolve the schema for `route`
    ///
    /// # Errors
    /// Returns [`SchemaError::RouteNotFound`] when no route matches.
    fn resolve_schema(&self, route: &RouteIdentity) -> Result<Arc<FieldSchema>, SchemaError>;
}

impl<P: SchemaProvider + ?Sized> SchemaProvider for Arc<P> {
    fn resolve_schema(&self, route: &RouteIdentity) -> Result<Arc<FieldSchema>, SchemaError> {
        (**self).resolve_schema(route)
    }
}
