//! Per-image workflow: untouched, previewed, confirmed.

pub mod record;
pub mod state;

pub use record::{ImageRecord, ImageStatus, RecordSummary, StagedArtifact};
pub use state::WorkflowState;
