//! Face similarity against the target embedding.

use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::capability::{Embedding, FaceEmbedder};
use crate::error::{MediaError, MediaResult};
use crate::metrics;

/// Resize `crop` to the embedder's input size and embed it.
pub fn embed_face(embedder: &dyn FaceEmbedder, crop: &RgbImage) -> MediaResult<Embedding> {
    if crop.width() == 0 || crop.height() == 0 {
        return Err(MediaError::EmptyCrop);
    }

    let (width, height) = embedder.input_size();
    let embedding = if crop.dimensions() == (width, height) {
        embedder.embed(crop)?
    } else {
        let resized = imageops::resize(crop, width, height, FilterType::Triangle);
        embedder.embed(&resized)?
    };
    metrics::record_embedding();

    if embedding.is_empty() {
        return Err(MediaError::embedding("embedder returned an empty vector"));
    }
    Ok(embedding)
}

/// Cosine similarity in `[-1, 1]`.
///
/// The vectors need not be normalized. Differing lengths and zero vectors
/// are errors rather than silent zeros.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> MediaResult<f64> {
    if a.len() != b.len() {
        return Err(MediaError::EmbeddingDimension {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let (dot, norm_a, norm_b) = a.iter().zip(b).fold((0.0f64, 0.0f64, 0.0f64), |acc, (&x, &y)| {
        let (x, y) = (x as f64, y as f64);
        (acc.0 + x * y, acc.1 + x * x, acc.2 + y * y)
    });

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom <= f64::EPSILON {
        return Err(MediaError::embedding("zero-norm embedding"));
    }
    Ok((dot / denom).clamp(-1.0, 1.0))
}

/// Face score of `crop` against `target`.
pub fn compare(embedder: &dyn FaceEmbedder, target: &[f32], crop: &RgbImage) -> MediaResult<f64> {
    let candidate = embed_face(embedder, crop)?;
    cosine_similarity(target, &candidate)
}
