//! Preview Overlay
//!
//! Shows pending (unsaved) REST edits in API responses.
//!
//! # Core Concepts
//!
//! - [`RestResourceSetting`]: pending value holder for one `rest_resource[<route>]`
//! - [`PreviewRegistry`]: normalized route → [`PendingEdit`] for one session
//! - [`OverlayFilter`]: swaps pending values into response bodies by self link
//! - [`ResponseEmitter`]: ordered response stages, installed once by id
//! - [`PreviewSession`]: the context object tying them together
//!
//! # Example
//!
//! ```rust,ignore
//! use preview_overlay::{PreviewConfig, PreviewSession, RestResourceSetting};
//!
//! let mut session = PreviewSession::new(PreviewConfig::new(base_url), Arc::new(route_table));
//! let mut setting = RestResourceSetting::new("rest_resource[widgets/5]")?;
//!
//! session.stage(&mut setting, r#"{"title":"Hi"}"#, ValidateOptions::strict())?;
//!
//! // Every outgoing body now shows the pending title for widgets/5
//! let body = session.emit(api_response);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod emission;
pub mod error;
pub mod logging;
pub mod overlay;
pub mod registry;
pub mod session;
pub mod setting;

pub use config::PreviewConfig;
pub use emission::{ResponseEmitter, ResponseStage, OVERLAY_STAGE_ID};
pub use error::{ConfigError, OverlayError, PreviewError, SessionError};
pub use logging::{init_tracing, LogFormat};
pub use overlay::{BaseUrlProvider, CollectingFaultSink, FaultSink, OverlayFilter, TracingFaultSink};
pub use registry::{PendingEdit, PreviewRegistry};
pub use session::PreviewSession;
pub use setting::{RestResourceSetting, SETTING_KIND};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for hosts wiring a preview session
    pub use crate::{
        OverlayFilter, PreviewConfig, PreviewRegistry, PreviewSession, RestResourceSetting,
    };
    pub use preview_core::{RouteIdentity, ValidateOptions, ValidationOutcome};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
