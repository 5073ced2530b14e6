//! The search target: who we are looking for.

use image::{imageops, RgbImage};
use std::path::Path;
use tracing::{debug, info};

use crate::capability::{Embedding, ModelCapabilities};
use crate::color::ColorQuery;
use crate::error::{MediaError, MediaResult};
use crate::matcher::embed_face;

/// Immutable description of the person being searched for.
#[derive(Debug, Clone)]
pub struct TargetDescriptor {
    pub embedding: Embedding,
    pub shirt: ColorQuery,
    /// Absent when no pant colour was given
    pub pants: Option<ColorQuery>,
}

impl TargetDescriptor {
    /// Build from a precomputed embedding and raw colour names.
    pub fn new(embedding: Embedding, shirt_color: &str, pant_color: &str) -> Self {
        Self {
            embedding,
            shirt: ColorQuery::parse(shirt_color),
            pants: pants_requested(pant_color).then(|| ColorQuery::parse(pant_color)),
        }
    }

    pub fn wants_pants(&self) -> bool {
        self.pants.is_some()
    }
}

/// Pants are scored unless the colour is "none", ignoring case and surrounding whitespace.
pub fn pants_requested(pant_color: &str) -> bool {
    !pant_color.trim().eq_ignore_ascii_case(sightline_models::NO_PANT_COLOR)
}

/// Build the target from a reference photo.
///
/// The first face the locator returns is the reference face. Fails with
/// [`MediaError::NoFaceInReference`] when there is none.
pub fn build_target(
    capabilities: &ModelCapabilities,
    photo: &RgbImage,
    shirt_color: &str,
    pant_color: &str,
) -> MediaResult<TargetDescriptor> {
    let faces = capabilities.locator.locate(photo)?;
    let Some(face) = faces.first() else {
        return Err(MediaError::NoFaceInReference);
    };
    debug!(
        faces = faces.len(),
        x = face.x,
        y = face.y,
        w = face.width,
        h = face.height,
        "Reference face located"
    );

    let region = face.clip(photo.width(), photo.height());
    if region.is_empty() {
        return Err(MediaError::NoFaceInReference);
    }
    let crop = imageops::crop_imm(photo, region.x1, region.y1, region.width(), region.height())
        .to_image();
    let embedding = embed_face(capabilities.embedder.as_ref(), &crop)?;

    let target = TargetDescriptor::new(embedding, shirt_color, pant_color);
    info!(
        dims = target.embedding.len(),
        shirt = %target.shirt,
        pants = %target.pants.as_ref().map(ToString::to_string).unwrap_or_else(|| "-".to_string()),
        "Target descriptor built"
    );
    Ok(target)
}

/// Decode a reference photo from disk.
pub fn load_reference_photo(path: &Path) -> MediaResult<RgbImage> {
    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }
    let image = image::open(path)
        .map_err(|e| MediaError::UnreadableReference(format!("{}: {e}", path.display())))?;
    Ok(image.to_rgb8())
}

/// Decode a reference photo from encoded bytes.
pub fn decode_reference_photo(bytes: &[u8]) -> MediaResult<RgbImage> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| MediaError::UnreadableReference(e.to_string()))?;
    Ok(image.to_rgb8())
}
