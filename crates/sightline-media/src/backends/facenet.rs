//! FaceNet embeddings through ONNX Runtime.
//!
//! Expects the keras-facenet export: NHWC float input of 160x160 RGB with
//! per-image standardization, one embedding vector as the first output.

use image::RgbImage;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::{Tensor, Value};
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

use crate::capability::{Embedding, FaceEmbedder};
use crate::error::{MediaError, MediaResult};

/// Input edge length expected by FaceNet.
pub const FACENET_INPUT_SIZE: u32 = 160;

/// FaceNet embedder. Inference is serialized through the session lock.
pub struct FaceNetEmbedder {
    session: Mutex<Session>,
}

impl FaceNetEmbedder {
    pub fn load(model_path: &Path) -> MediaResult<Self> {
        if !model_path.exists() {
            return Err(MediaError::model_not_found(model_path.display().to_string()));
        }

        let model_bytes = std::fs::read(model_path)?;
        let session = Session::builder()
            .map_err(|e| MediaError::embedding(format!("ORT session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| MediaError::embedding(format!("ORT opt level: {e}")))?
            .commit_from_memory(model_bytes.as_slice())
            .map_err(|e| MediaError::embedding(format!("ORT load model: {e}")))?;

        info!(model = %model_path.display(), "FaceNet embedder loaded");
        Ok(Self {
            session: Mutex::new(session),
        })
    }
}

impl FaceEmbedder for FaceNetEmbedder {
    fn name(&self) -> &'static str {
        "facenet"
    }

    fn input_size(&self) -> (u32, u32) {
        (FACENET_INPUT_SIZE, FACENET_INPUT_SIZE)
    }

    fn embed(&self, face: &RgbImage) -> MediaResult<Embedding> {
        if face.dimensions() != self.input_size() {
            return Err(MediaError::embedding(format!(
                "expected {0}x{0} crop, got {1}x{2}",
                FACENET_INPUT_SIZE,
                face.width(),
                face.height()
            )));
        }
        let tensor = nhwc_tensor(face)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| MediaError::embedding("ORT session poisoned"))?;
        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| MediaError::embedding(format!("ORT run failed: {e}")))?;

        let (_, first) = outputs
            .iter()
            .next()
            .ok_or_else(|| MediaError::embedding("FaceNet produced no outputs"))?;
        let (_shape, data) = first
            .try_extract_tensor::<f32>()
            .map_err(|e| MediaError::embedding(format!("ORT extract: {e}")))?;

        Ok(data.to_vec())
    }
}

/// Per-image standardization: `(x - mean) / max(std, 1 / sqrt(n))` over all channels.
pub fn standardize(face: &RgbImage) -> Vec<f32> {
    let raw = face.as_raw();
    if raw.is_empty() {
        return Vec::new();
    }
    let n = raw.len() as f64;
    let mean = raw.iter().map(|&v| v as f64).sum::<f64>() / n;
    let variance = raw.iter().map(|&v| (v as f64 - mean).powi(2)).sum::<f64>() / n;
    let std = variance.sqrt().max(1.0 / n.sqrt());

    raw.iter().map(|&v| ((v as f64 - mean) / std) as f32).collect()
}

fn nhwc_tensor(face: &RgbImage) -> MediaResult<Value> {
    let shape = vec![1usize, face.height() as usize, face.width() as usize, 3];
    let data = standardize(face).into_boxed_slice();
    Tensor::from_array((shape, data))
        .map(Value::from)
        .map_err(|e| MediaError::embedding(format!("ORT tensor: {e}")))
}
