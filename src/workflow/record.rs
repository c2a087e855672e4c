//! Per-image workflow records.

use crate::core::types::{AppliedSpec, ImageId};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an image is in the preview/confirm cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ImageStatus {
    /// Nothing previewed since upload.
    #[default]
    Untouched,
    /// A preview is staged.
    Previewed,
    /// The staged preview was promoted to the final slot.
    Confirmed,
}

impl fmt::Display for ImageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageStatus::Untouched => write!(f, "untouched"),
            ImageStatus::Previewed => write!(f, "previewed"),
            ImageStatus::Confirmed => write!(f, "confirmed"),
        }
    }
}

/// Handle to a preview result held by the image store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StagedArtifact(pub String);

impl StagedArtifact {
    /// Store key for an image's staged preview.
    pub fn for_image(id: &ImageId) -> Self {
        Self(format!("temp_{}", id))
    }

    /// The store key.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StagedArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// State of one uploaded image.
///
/// The record exclusively owns its staged handle and final image.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    id: ImageId,
    status: ImageStatus,
    applied: AppliedSpec,
    pending: Option<StagedArtifact>,
    final_image: Option<DynamicImage>,
}

impl ImageRecord {
    /// A fresh, untouched record.
    pub fn new(id: ImageId) -> Self {
        Self {
            id,
            status: ImageStatus::Untouched,
            applied: AppliedSpec::None,
            pending: None,
            final_image: None,
        }
    }

    /// The image this record tracks.
    pub fn id(&self) -> &ImageId {
        &self.id
    }

    /// Current status.
    pub fn status(&self) -> ImageStatus {
        self.status
    }

    /// The spec last previewed.
    pub fn applied(&self) -> &AppliedSpec {
        &self.applied
    }

    /// The staged preview, if any.
    pub fn pending(&self) -> Option<&StagedArtifact> {
        self.pending.as_ref()
    }

    /// The confirmed image, if any.
    pub fn final_image(&self) -> Option<&DynamicImage> {
        self.final_image.as_ref()
    }

    /// Whether a confirmed image is held (eligible for export).
    pub fn has_final(&self) -> bool {
        self.final_image.is_some()
    }

    /// Stage a new preview. Any earlier preview and spec are replaced; the
    /// final image is kept until the next confirm.
    pub(crate) fn stage(&mut self, spec: AppliedSpec, artifact: StagedArtifact) {
        self.applied = spec;
        self.pending = Some(artifact);
        self.status = ImageStatus::Previewed;
    }

    /// Promote a loaded preview to the final slot.
    pub(crate) fn promote(&mut self, image: DynamicImage) {
        self.final_image = Some(image);
        self.status = ImageStatus::Confirmed;
    }
}

/// Read-only summary of a record, for callers outside the session lock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSummary {
    pub id: ImageId,
    pub status: ImageStatus,
    pub filter_name: String,
    pub has_pending: bool,
    pub has_final: bool,
}

impl From<&ImageRecord> for RecordSummary {
    fn from(record: &ImageRecord) -> Self {
        Self {
            id: record.id.clone(),
            status: record.status,
            filter_name: record.applied.name().to_string(),
            has_pending: record.pending.is_some(),
            has_final: record.final_image.is_some(),
        }
    }
}
