//! Error types for scanning and matching.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while building a target or scanning a video.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("No face found in the reference photo")]
    NoFaceInReference,

    #[error("Video is empty or unreadable: {0}")]
    EmptyOrUnreadableVideo(String),

    #[error("Reference photo could not be decoded: {0}")]
    UnreadableReference(String),

    #[error("Crop is empty after clamping to the frame")]
    EmptyCrop,

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Embedding dimension mismatch: target has {expected}, candidate has {actual}")]
    EmbeddingDimension { expected: usize, actual: usize },

    #[error("Face detection failed: {0}")]
    DetectionFailed(String),

    #[error("Video decode failed: {0}")]
    Decode(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create a detection failure error.
    pub fn detection_failed(message: impl Into<String>) -> Self {
        Self::DetectionFailed(message.into())
    }

    /// Create an embedding failure error.
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a decode failure error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Create an unreadable video error.
    pub fn unreadable_video(message: impl Into<String>) -> Self {
        Self::EmptyOrUnreadableVideo(message.into())
    }

    /// Create a model not found error.
    pub fn model_not_found(path: impl Into<String>) -> Self {
        Self::ModelNotFound(path.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Boundary artefacts that are expected near frame edges.
    ///
    /// These are skipped quietly. Every other per-detection failure is also
    /// skipped but reported at `warn` and counted.
    pub fn is_benign_skip(&self) -> bool {
        matches!(self, MediaError::EmptyCrop)
    }

    /// Errors that end a scan instead of being recovered per detection.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MediaError::NoFaceInReference
                | MediaError::EmptyOrUnreadableVideo(_)
                | MediaError::UnreadableReference(_)
                | MediaError::Cancelled
                | MediaError::Timeout(_)
        )
    }
}
