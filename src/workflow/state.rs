//! The workflow state machine: ordered batch, cursor, and per-image records.
//!
//! Transitions per image:
//!
//! ```text
//! Untouched --preview--> Previewed --confirm--> Confirmed
//!                        Previewed --preview--> Previewed
//!                        Confirmed --preview--> Previewed   (final image kept)
//! ```
//!
//! There is no way back to `Untouched` except a full [`WorkflowState::reset`].
//! I/O is injected as closures so the state machine itself stays pure.

use crate::core::error::{SessionError, SessionResult, StoreError};
use crate::core::types::{AppliedSpec, ImageId};
use crate::workflow::record::{ImageRecord, RecordSummary, StagedArtifact};
use image::DynamicImage;
use log::debug;
use std::collections::HashMap;

/// Batch of images with a cursor.
///
/// Invariant: `cursor < order.len()` whenever `order` is non-empty, and
/// `records` has exactly one entry per id in `order`.
#[derive(Debug, Default)]
pub struct WorkflowState {
    order: Vec<ImageId>,
    cursor: usize,
    records: HashMap<ImageId, ImageRecord>,
}

impl WorkflowState {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the batch. The cursor returns to 0 and every record starts
    /// untouched; nothing carries over from the previous batch.
    pub fn reset(&mut self, ids: Vec<ImageId>) {
        self.records = ids.iter().map(|id| (id.clone(), ImageRecord::new(id.clone()))).collect();
        self.order = ids;
        self.cursor = 0;
    }

    /// Number of images in the batch.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no images are loaded.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Current cursor position.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Image ids in upload order.
    pub fn ids(&self) -> &[ImageId] {
        &self.order
    }

    /// Id at the cursor.
    pub fn current_id(&self) -> SessionResult<&ImageId> {
        self.order.get(self.cursor).ok_or(SessionError::EmptySession)
    }

    /// Record at the cursor.
    pub fn current(&self) -> SessionResult<&ImageRecord> {
        let id = self.current_id()?;
        self.record(id)
    }

    /// Record for an id.
    pub fn record(&self, id: &ImageId) -> SessionResult<&ImageRecord> {
        self.records.get(id).ok_or_else(|| SessionError::NoSuchImage(id.clone()))
    }

    fn record_mut(&mut self, id: &ImageId) -> SessionResult<&mut ImageRecord> {
        self.records.get_mut(id).ok_or_else(|| SessionError::NoSuchImage(id.clone()))
    }

    /// Records in upload order.
    pub fn records(&self) -> impl Iterator<Item = &ImageRecord> {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    /// Summaries in upload order.
    pub fn summaries(&self) -> Vec<RecordSummary> {
        self.records().map(RecordSummary::from).collect()
    }

    /// Move the cursor by `delta`, saturating at both ends.
    pub fn navigate(&mut self, delta: isize) -> SessionResult<usize> {
        if self.order.is_empty() {
            return Err(SessionError::EmptySession);
        }
        let last = self.order.len() - 1;
        let target = (self.cursor as isize).saturating_add(delta).clamp(0, last as isize);
        self.cursor = target as usize;
        debug!("Cursor moved by {} to {}/{}", delta, self.cursor, self.order.len());
        Ok(self.cursor)
    }

    /// Stage a preview for `id`.
    ///
    /// `render` must load the untouched original, transform it, and store
    /// the result; the record is only updated if it succeeds.
    pub fn preview<F>(&mut self, id: &ImageId, spec: AppliedSpec, render: F) -> SessionResult<StagedArtifact>
    where
        F: FnOnce(&ImageId) -> SessionResult<StagedArtifact>,
    {
        self.record(id)?;
        let artifact = render(id)?;
        self.record_mut(id)?.stage(spec, artifact.clone());
        Ok(artifact)
    }

    /// Promote the staged preview for `id` into its final slot.
    ///
    /// Fails with `NoPendingPreview` if nothing is staged or the staged
    /// artifact can no longer be read.
    pub fn confirm<F>(&mut self, id: &ImageId, load: F) -> SessionResult<()>
    where
        F: FnOnce(&StagedArtifact) -> Result<DynamicImage, StoreError>,
    {
        let record = self.record(id)?;
        let artifact = record.pending().ok_or(SessionError::NoPendingPreview)?;
        let image = load(artifact).map_err(|e| {
            debug!("Staged artifact {} unreadable: {}", artifact, e);
            SessionError::NoPendingPreview
        })?;
        self.record_mut(id)?.promote(image);
        Ok(())
    }

    /// Confirmed images in upload order.
    pub fn finals(&self) -> impl Iterator<Item = (&ImageId, &DynamicImage)> {
        self.records().filter_map(|r| r.final_image().map(|img| (r.id(), img)))
    }

    /// Number of images holding a confirmed result.
    pub fn confirmed_count(&self) -> usize {
        self.records().filter(|r| r.has_final()).count()
    }
}
