//! Preview Core
//!
//! Route-scoped validation of pending REST edits, without executing them.
//!
//! # Core Concepts
//!
//! - [`RouteIdentity`]: normalized route parsed from a `<kind>[<route>]` identifier
//! - [`FieldSchema`]: ordered table of sanitizer/validator pairs for a route
//! - [`DispatchPipeline`]: resolves synthetic requests, with a resolve-only mode
//! - [`ValidatingDispatcher`]: turns a raw payload into a [`CanonicalValue`]
//!   or a [`ValidationErrorCollection`]
//!
//! # Example
//!
//! ```rust,ignore
//! use preview_core::{RouteIdentity, ValidateOptions, ValidatingDispatcher};
//!
//! let dispatcher = ValidatingDispatcher::new(Arc::new(route_table));
//! let route = RouteIdentity::parse("rest_resource[widgets/5]")?;
//!
//! match dispatcher.validate(&route, r#"{"title":"  Hi  "}"#, ValidateOptions::strict())? {
//!     ValidationOutcome::Canonical(value) => println!("pending: {value}"),
//!     ValidationOutcome::Invalid(errors) => println!("errors: {:?}", errors.codes()),
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod dispatcher;
mod error;
mod pipeline;
mod provider;
mod route;
mod schema;
mod validity;

pub use dispatcher::{
    CanonicalValue, DispatcherConfig, UndecodablePolicy, ValidateOptions, ValidatingDispatcher,
    ValidationOutcome, INVALID_PAYLOAD_CODE, PAYLOAD_FIELD,
};
pub use error::{DispatchError, RouteError, SchemaError};
pub use pipeline::{
    DispatchMode, DispatchPipeline, DispatchResponse, Handler, Method, ResolvedRoute, RouteEntry,
    RouteTable, SyntheticRequest,
};
pub use provider::SchemaProvider;
pub use route::RouteIdentity;
pub use schema::{
    FieldDescriptor, FieldSchema, SanitizeFn, Sanitized, Sanitizer, ValidateFn, Validator,
};
pub use validity::{ErrorEntry, FieldError, ValidationErrorCollection};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
