//! Concrete capability backends.
//!
//! - [`FaceNetEmbedder`]: FaceNet embeddings through ONNX Runtime
//! - [`YuNetLocator`]: OpenCV YuNet face detection (feature `opencv`)
//! - [`OpenCvVideoOpener`]: OpenCV video decoding (feature `opencv`)

pub mod facenet;
pub mod models;
#[cfg(feature = "opencv")]
pub mod video;
#[cfg(feature = "opencv")]
pub mod yunet;

pub use facenet::{FaceNetEmbedder, FACENET_INPUT_SIZE};
pub use models::ModelPaths;
#[cfg(feature = "opencv")]
pub use video::{OpenCvVideo, OpenCvVideoOpener};
#[cfg(feature = "opencv")]
pub use yunet::YuNetLocator;

#[cfg(feature = "opencv")]
use crate::capability::ModelCapabilities;
#[cfg(feature = "opencv")]
use crate::error::MediaResult;

#[cfg(feature = "opencv")]
impl ModelCapabilities {
    /// Load the YuNet locator and FaceNet embedder once for the process.
    pub fn load(paths: &ModelPaths) -> MediaResult<Self> {
        use std::sync::Arc;

        let locator = YuNetLocator::load(paths.yunet_path()?)?;
        let embedder = FaceNetEmbedder::load(paths.facenet_path()?)?;
        tracing::info!(
            yunet = locator.model_path(),
            "Face capabilities ready"
        );
        Ok(Self::new(Arc::new(locator), Arc::new(embedder)))
    }
}
