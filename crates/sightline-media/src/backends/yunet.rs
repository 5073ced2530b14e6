//! OpenCV YuNet face locator.
//!
//! Wraps `FaceDetectorYN`. The detector runs at the frame's own resolution,
//! so the input size is updated whenever the frame size changes.
//!
//! # Known Issues
//! - OpenCV 4.6.0 can fail with "Layer with requested id=-1 not found" on
//!   2023mar models; creation falls back across DNN backends and the 2022mar
//!   model should be used there.

use image::RgbImage;
use opencv::core::{Mat, Ptr, Size};
use opencv::objdetect::FaceDetectorYN;
use opencv::prelude::{FaceDetectorYNTrait, MatTraitConst};
use sightline_models::FaceBox;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, warn};

use super::video::rgb_to_bgr_mat;
use crate::capability::FaceLocator;
use crate::error::{MediaError, MediaResult};

/// Minimum detector confidence.
const SCORE_THRESHOLD: f32 = 0.6;

/// NMS threshold for face detection
const NMS_THRESHOLD: f32 = 0.3;

/// Faces kept per frame before NMS
const TOP_K: i32 = 5000;

/// Column of the confidence score in each YuNet output row.
const SCORE_COLUMN: i32 = 14;

struct DetectorState {
    detector: Ptr<FaceDetectorYN>,
    input_size: (i32, i32),
}

/// YuNet face locator. Detection is serialized through the detector lock.
pub struct YuNetLocator {
    state: Mutex<DetectorState>,
    model_path: String,
}

impl YuNetLocator {
    /// Load the YuNet model at `model_path`.
    pub fn load(model_path: &Path) -> MediaResult<Self> {
        let model_path = model_path
            .to_str()
            .ok_or_else(|| MediaError::model_not_found(model_path.display().to_string()))?;

        let metadata = std::fs::metadata(model_path)
            .map_err(|_| MediaError::model_not_found(model_path))?;
        if metadata.len() < 50_000 {
            return Err(MediaError::detection_failed(format!(
                "YuNet model file appears corrupted (size: {} bytes)",
                metadata.len()
            )));
        }

        // Resized to the real frame size on first use.
        let input_size = (320, 320);
        let detector = create_detector_with_fallback(model_path, input_size)?;
        info!(model = model_path, "YuNet face locator initialized");

        Ok(Self {
            state: Mutex::new(DetectorState {
                detector,
                input_size,
            }),
            model_path: model_path.to_string(),
        })
    }

    pub fn model_path(&self) -> &str {
        &self.model_path
    }
}

impl FaceLocator for YuNetLocator {
    fn name(&self) -> &'static str {
        "yunet"
    }

    fn locate(&self, frame: &RgbImage) -> MediaResult<Vec<FaceBox>> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Ok(Vec::new());
        }
        let bgr = rgb_to_bgr_mat(frame)?;

        let mut state = self
            .state
            .lock()
            .map_err(|_| MediaError::detection_failed("YuNet detector poisoned"))?;

        let size = (width as i32, height as i32);
        if state.input_size != size {
            state
                .detector
                .set_input_size(Size::new(size.0, size.1))
                .map_err(|e| MediaError::detection_failed(format!("YuNet set input size: {e}")))?;
            state.input_size = size;
        }

        let mut faces = Mat::default();
        state
            .detector
            .detect(&bgr, &mut faces)
            .map_err(|e| MediaError::detection_failed(format!("YuNet detection failed: {e}")))?;

        parse_detections(&faces)
    }
}

/// Try the default DNN backend, then the plain OpenCV one.
fn create_detector_with_fallback(
    model_path: &str,
    input_size: (i32, i32),
) -> MediaResult<Ptr<FaceDetectorYN>> {
    use opencv::dnn::{DNN_BACKEND_DEFAULT, DNN_BACKEND_OPENCV, DNN_TARGET_CPU};

    let backends = [
        (DNN_BACKEND_DEFAULT, DNN_TARGET_CPU, "default"),
        (DNN_BACKEND_OPENCV, DNN_TARGET_CPU, "opencv"),
    ];

    let mut last_error = String::new();
    for (backend_id, target_id, backend_name) in backends {
        match FaceDetectorYN::create(
            model_path,
            "",
            Size::new(input_size.0, input_size.1),
            SCORE_THRESHOLD,
            NMS_THRESHOLD,
            TOP_K,
            backend_id,
            target_id,
        ) {
            Ok(detector) => {
                debug!(backend = backend_name, "YuNet created");
                return Ok(detector);
            }
            Err(e) => {
                warn!(backend = backend_name, error = %e, "YuNet backend failed");
                last_error = e.to_string();
            }
        }
    }

    Err(MediaError::detection_failed(format!(
        "Failed to create YuNet detector with any backend: {last_error}"
    )))
}

/// Output rows are `[x, y, w, h, 10 landmark coords, score]`. Rows keep detector order.
fn parse_detections(faces: &Mat) -> MediaResult<Vec<FaceBox>> {
    let rows = faces.rows();
    if rows <= 0 {
        return Ok(Vec::new());
    }
    if faces.cols() <= SCORE_COLUMN {
        return Err(MediaError::detection_failed(format!(
            "YuNet output has {} columns, expected 15",
            faces.cols()
        )));
    }

    let at = |row: i32, col: i32| -> MediaResult<f32> {
        faces
            .at_2d::<f32>(row, col)
            .copied()
            .map_err(|e| MediaError::detection_failed(format!("YuNet output: {e}")))
    };

    let mut boxes = Vec::with_capacity(rows as usize);
    for row in 0..rows {
        if at(row, SCORE_COLUMN)? < SCORE_THRESHOLD {
            continue;
        }
        let face = FaceBox::from_raw(
            at(row, 0)?.round() as i32,
            at(row, 1)?.round() as i32,
            at(row, 2)?.round() as i32,
            at(row, 3)?.round() as i32,
        );
        if face.width > 0 && face.height > 0 {
            boxes.push(face);
        }
    }
    Ok(boxes)
}
