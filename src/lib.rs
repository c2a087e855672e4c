//! # Retouch - Batch Image Enhancement Workflow
//!
//! Retouch lets a client upload a batch of images, try named enhancement
//! filters (or an ordered pipeline of them) on one image at a time, preview
//! the result, confirm it, and export everything confirmed.
//!
//! ## Features
//!
//! - **Filter Registry**: Named, schema-described transforms; unknown names
//!   resolve to the identity so one bad step never aborts a pipeline
//! - **Pipeline Composer**: Ordered chains with lenient parameter coercion
//! - **Workflow State Machine**: Untouched, previewed, confirmed per image,
//!   with a saturating cursor over the batch
//! - **Sessions**: Independent, lock-protected sessions addressed by id
//! - **Pluggable Storage**: Filesystem or in-memory image stores
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use retouch::prelude::*;
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryImageStore::new());
//! let coordinator = SessionCoordinator::with_builtins(store);
//! let session = coordinator.open_session();
//!
//! coordinator.upload(session, &[UploadPayload::new("scan.png", bytes)])?;
//! coordinator.preview_single(session, &FilterSpec::new("CLAHE").with_param("clipLimit", 3.0))?;
//! coordinator.confirm(session)?;
//! let report = coordinator.export(session)?;
//! assert!(report.is_complete());
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: Identifiers, parameter schemas, the `Transform` trait, errors, config
//! - [`filters`]: Filter registry and built-in filters
//! - [`pipeline`]: Parameter coercion and pipeline composition
//! - [`workflow`]: Per-image records and the batch state machine
//! - [`session`]: Session coordinator, tagged responses, image stores
//!
//! ## Creating Custom Filters
//!
//! Implement [`Transform`](core::transform::Transform) and register it:
//!
//! ```rust,ignore
//! use retouch::prelude::*;
//! use image::DynamicImage;
//!
//! struct Invert;
//!
//! impl Transform for Invert {
//!     fn metadata(&self) -> FilterMetadata {
//!         FilterMetadata::builder("Invert")
//!             .description("Negate every channel")
//!             .category(Category::Adjust)
//!             .build()
//!     }
//!
//!     fn apply(&self, image: &DynamicImage, _params: &ParamMap) -> DynamicImage {
//!         let mut out = image.clone();
//!         out.invert();
//!         out
//!     }
//! }
//!
//! let mut registry = FilterRegistry::with_builtins();
//! registry.register(Invert);
//! ```

#![warn(clippy::all)]

pub mod core;
pub mod filters;
pub mod pipeline;
pub mod session;
pub mod workflow;

/// Prelude module for convenient imports.
///
/// Import everything commonly needed with:
/// ```rust,ignore
/// use retouch::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use crate::core::types::{
        AppliedSpec, FilterSpec, ImageFormat, ImageId, PipelineSpec, RawParams, RawValue, SessionId,
    };

    // Parameters and transforms
    pub use crate::core::param::{ParamKind, ParamMap, ParamValue, ParameterDefinition};
    pub use crate::core::transform::{Category, FilterMetadata, Identity, Transform};

    // Errors and config
    pub use crate::core::config::Config;
    pub use crate::core::error::{ErrorKind, SessionError, SessionResult, StoreError, StoreResult};

    // Filters and pipelines
    pub use crate::filters::registry::{FilterRegistry, RegistryEntry};
    pub use crate::pipeline::composer::{ComposedTransform, PipelineComposer, Step};

    // Workflow
    pub use crate::workflow::record::{ImageRecord, ImageStatus, RecordSummary, StagedArtifact};
    pub use crate::workflow::state::WorkflowState;

    // Sessions
    pub use crate::session::coordinator::{CurrentImage, ExportFailure, ExportReport, SessionCoordinator};
    pub use crate::session::response::ApiResponse;
    pub use crate::session::store::{FsImageStore, ImageStore, MemoryImageStore, UploadPayload};
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
