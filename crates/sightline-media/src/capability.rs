//! Capabilities the scan pipeline consumes.
//!
//! The pipeline never names a concrete detector, embedder or decoder. Backends
//! implement these traits and are handed in through [`ModelCapabilities`].

use image::RgbImage;
use sightline_models::FaceBox;
use std::path::Path;
use std::sync::Arc;

use crate::error::MediaResult;

/// Fixed-length face descriptor.
pub type Embedding = Vec<f32>;

/// Locates faces in a frame.
#[cfg_attr(test, mockall::automock)]
pub trait FaceLocator: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &'static str;

    /// Face boxes in `frame`, origins clamped to be non-negative.
    ///
    /// Callers consume the boxes in the order returned.
    fn locate(&self, frame: &RgbImage) -> MediaResult<Vec<FaceBox>>;
}

/// Produces embeddings for face crops.
#[cfg_attr(test, mockall::automock)]
pub trait FaceEmbedder: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &'static str;

    /// Width and height the crop must be resized to before [`embed`](Self::embed).
    fn input_size(&self) -> (u32, u32);

    /// Embed a crop already resized to [`input_size`](Self::input_size).
    /// Must be deterministic for a given crop.
    fn embed(&self, face: &RgbImage) -> MediaResult<Embedding>;
}

/// A finite, file-backed frame stream.
///
/// Implementations release the underlying handle when dropped.
pub trait VideoSource: Send {
    /// Nominal frame rate; zero or non-finite when unknown.
    fn fps(&self) -> f64;

    /// Decode the next frame; `None` at end of stream.
    fn next_frame(&mut self) -> MediaResult<Option<RgbImage>>;

    /// Advance past the next frame without keeping it.
    ///
    /// Returns `false` at end of stream. Backends that can grab without
    /// colour conversion should override this.
    fn skip_frame(&mut self) -> MediaResult<bool> {
        Ok(self.next_frame()?.is_some())
    }
}

/// Opens video files as [`VideoSource`]s.
pub trait VideoOpener: Send + Sync {
    fn open(&self, path: &Path) -> MediaResult<Box<dyn VideoSource>>;
}

/// The face capabilities used by every scan, built once per process.
#[derive(Clone)]
pub struct ModelCapabilities {
    pub locator: Arc<dyn FaceLocator>,
    pub embedder: Arc<dyn FaceEmbedder>,
}

impl ModelCapabilities {
    pub fn new(locator: Arc<dyn FaceLocator>, embedder: Arc<dyn FaceEmbedder>) -> Self {
        Self { locator, embedder }
    }
}

impl std::fmt::Debug for ModelCapabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelCapabilities")
            .field("locator", &self.locator.name())
            .field("embedder", &self.embedder.name())
            .finish()
    }
}
