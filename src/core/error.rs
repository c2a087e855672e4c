//! Error types for Retouch.
//!
//! Uses thiserror for structured errors. Every session error is recoverable
//! and maps onto a serialisable [`ErrorKind`] so callers can tell "empty
//! session" apart from "no pending preview" without parsing messages.
//! Parameter problems and unknown filter names are deliberately absent:
//! those degrade to defaults and identity instead of failing.

use crate::core::types::{ImageId, SessionId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the I/O boundary.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Image error on '{name}': {source}")]
    Image {
        name: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Unsupported file type: {0}")]
    Rejected(String),

    #[error("Nothing stored under '{0}'")]
    NotFound(String),
}

/// Errors surfaced by the session coordinator and workflow.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No images available.")]
    EmptySession,

    #[error("Image {0} is not part of this session")]
    NoSuchImage(ImageId),

    #[error("Could not load image {id}: {reason}")]
    ImageLoadFailure { id: ImageId, reason: String },

    #[error("Invalid pipeline data: {0}")]
    InvalidPipeline(String),

    #[error("No preview image to confirm.")]
    NoPendingPreview,

    #[error("No images have been confirmed yet.")]
    NoConfirmedImages,

    #[error("Rejected upload '{0}': unsupported file type")]
    Rejected(String),

    #[error("No valid images in upload.")]
    NoValidImages,

    #[error("Session {0} not found")]
    UnknownSession(SessionId),

    #[error("Could not write {id}: {reason}")]
    PersistFailure { id: ImageId, reason: String },
}

/// Discriminant of [`SessionError`], for callers that branch on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    EmptySession,
    NoSuchImage,
    ImageLoadFailure,
    InvalidPipeline,
    NoPendingPreview,
    NoConfirmedImages,
    Rejected,
    NoValidImages,
    UnknownSession,
    PersistFailure,
}

impl SessionError {
    /// The kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::EmptySession => ErrorKind::EmptySession,
            SessionError::NoSuchImage(_) => ErrorKind::NoSuchImage,
            SessionError::ImageLoadFailure { .. } => ErrorKind::ImageLoadFailure,
            SessionError::InvalidPipeline(_) => ErrorKind::InvalidPipeline,
            SessionError::NoPendingPreview => ErrorKind::NoPendingPreview,
            SessionError::NoConfirmedImages => ErrorKind::NoConfirmedImages,
            SessionError::Rejected(_) => ErrorKind::Rejected,
            SessionError::NoValidImages => ErrorKind::NoValidImages,
            SessionError::UnknownSession(_) => ErrorKind::UnknownSession,
            SessionError::PersistFailure { .. } => ErrorKind::PersistFailure,
        }
    }

    /// Build a load failure from a store error.
    pub fn load_failure(id: &ImageId, error: StoreError) -> Self {
        SessionError::ImageLoadFailure {
            id: id.clone(),
            reason: error.to_string(),
        }
    }

    /// Get suggestion for recovering from this error.
    pub fn suggested_fix(&self) -> Option<&'static str> {
        match self {
            SessionError::EmptySession | SessionError::NoValidImages => {
                Some("Upload png, jpg, jpeg or bmp files first")
            }
            SessionError::NoPendingPreview => Some("Preview a filter or pipeline before confirming"),
            SessionError::NoConfirmedImages => Some("Confirm at least one preview before exporting"),
            SessionError::InvalidPipeline(_) => Some("Send a JSON body with a 'steps' array"),
            _ => None,
        }
    }
}

/// Result type alias for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Result type alias for I/O boundary operations.
pub type StoreResult<T> = Result<T, StoreError>;
