//! Pipeline module.
//!
//! Turns filter specs into composite transforms.

pub mod coercion;
pub mod composer;

pub use coercion::resolve_params;
pub use composer::{ComposedTransform, PipelineComposer, Step};
