//! Core types and traits for the Retouch image workflow.
//!
//! This module contains the foundational pieces shared by everything else:
//! - Identifiers and request specs (`ImageId`, `FilterSpec`, `PipelineSpec`)
//! - Parameter schemas and typed parameter maps
//! - The `Transform` trait and filter metadata
//! - Error types
//! - Runtime configuration

pub mod config;
pub mod error;
pub mod param;
pub mod transform;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{ErrorKind, SessionError, SessionResult, StoreError, StoreResult};
pub use param::{ParamKind, ParamMap, ParamValue, ParameterDefinition};
pub use transform::{Category, FilterMetadata, Identity, Transform};
pub use types::{AppliedSpec, FilterSpec, ImageFormat, ImageId, PipelineSpec, RawParams, RawValue, SessionId};
