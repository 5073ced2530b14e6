//! Model file discovery.
//!
//! Each model is looked up from its environment variable first, then from a
//! list of conventional install locations.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// YuNet 2023mar models need OpenCV 4.8+; 2022mar works from 4.5.
pub(crate) const YUNET_CANDIDATES: &[&str] = &[
    "./models/face_detection/yunet/face_detection_yunet_2023mar.onnx",
    "./models/face_detection/yunet/face_detection_yunet_2023mar_int8.onnx",
    "/app/models/face_detection/yunet/face_detection_yunet_2023mar.onnx",
    "/app/models/face_detection/yunet/face_detection_yunet_2023mar_int8.onnx",
    "/usr/share/opencv/models/face_detection_yunet_2023mar.onnx",
    "./models/face_detection/yunet/face_detection_yunet_2022mar.onnx",
    "/app/models/face_detection/yunet/face_detection_yunet_2022mar.onnx",
    "/usr/share/opencv/models/face_detection_yunet_2022mar.onnx",
];

pub(crate) const FACENET_CANDIDATES: &[&str] = &[
    "./models/face_embedding/facenet/facenet.onnx",
    "/app/models/face_embedding/facenet/facenet.onnx",
    "/app/models/facenet.onnx",
];

/// Where the face models live.
#[derive(Debug, Clone, Default)]
pub struct ModelPaths {
    /// YuNet face detector (ONNX)
    pub yunet: Option<PathBuf>,
    /// FaceNet embedder (ONNX)
    pub facenet: Option<PathBuf>,
    /// TrueType font for annotation labels
    pub font: Option<PathBuf>,
}

impl ModelPaths {
    /// Resolve from `SIGHTLINE_YUNET_MODEL`, `SIGHTLINE_FACENET_MODEL` and
    /// `SIGHTLINE_FONT`, falling back to the candidate lists.
    pub fn from_env() -> Self {
        Self {
            yunet: env_path("SIGHTLINE_YUNET_MODEL").or_else(|| first_existing(YUNET_CANDIDATES)),
            facenet: env_path("SIGHTLINE_FACENET_MODEL")
                .or_else(|| first_existing(FACENET_CANDIDATES)),
            font: env_path("SIGHTLINE_FONT"),
        }
    }

    pub fn yunet_path(&self) -> MediaResult<&Path> {
        require(self.yunet.as_deref(), "YuNet face detector (set SIGHTLINE_YUNET_MODEL)")
    }

    pub fn facenet_path(&self) -> MediaResult<&Path> {
        require(self.facenet.as_deref(), "FaceNet embedder (set SIGHTLINE_FACENET_MODEL)")
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

pub(crate) fn first_existing(candidates: &[&str]) -> Option<PathBuf> {
    candidates.iter().map(Path::new).find(|p| p.exists()).map(|p| {
        debug!(path = %p.display(), "Found model");
        p.to_path_buf()
    })
}

fn require<'a>(path: Option<&'a Path>, what: &str) -> MediaResult<&'a Path> {
    let path = path.ok_or_else(|| MediaError::model_not_found(what))?;
    if !path.exists() {
        return Err(MediaError::model_not_found(path.display().to_string()));
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_is_reported() {
        let paths = ModelPaths::default();
        assert!(matches!(paths.yunet_path(), Err(MediaError::ModelNotFound(_))));
    }

    #[test]
    fn test_configured_path_must_exist() {
        let paths = ModelPaths {
            facenet: Some(PathBuf::from("/nonexistent/facenet.onnx")),
            ..Default::default()
        };
        assert!(paths.facenet_path().is_err());
    }

    #[test]
    fn test_existing_path_resolves() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("facenet.onnx");
        std::fs::write(&model, b"onnx").unwrap();
        let paths = ModelPaths {
            facenet: Some(model.clone()),
            ..Default::default()
        };
        assert_eq!(paths.facenet_path().unwrap(), model.as_path());
    }
}
