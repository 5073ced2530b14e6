//! OpenCV `VideoCapture` frame source.

use image::RgbImage;
use opencv::core::{Mat, Scalar, CV_8UC3};
use opencv::imgproc;
use opencv::prelude::{MatTraitConst, MatTraitConstManual, MatTraitManual};
use opencv::prelude::{VideoCaptureTrait, VideoCaptureTraitConst};
use opencv::videoio::{VideoCapture, CAP_ANY, CAP_PROP_FPS};
use std::path::Path;
use tracing::{debug, warn};

use crate::capability::{VideoOpener, VideoSource};
use crate::error::{MediaError, MediaResult};

/// Opens videos with OpenCV.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenCvVideoOpener;

impl VideoOpener for OpenCvVideoOpener {
    fn open(&self, path: &Path) -> MediaResult<Box<dyn VideoSource>> {
        Ok(Box::new(OpenCvVideo::open(path)?))
    }
}

/// An open `VideoCapture`. Released on drop.
pub struct OpenCvVideo {
    cap: VideoCapture,
    fps: f64,
    frame: Mat,
}

impl OpenCvVideo {
    pub fn open(path: &Path) -> MediaResult<Self> {
        if !path.exists() {
            return Err(MediaError::unreadable_video(format!(
                "{} does not exist",
                path.display()
            )));
        }
        let path_str = path
            .to_str()
            .ok_or_else(|| MediaError::unreadable_video(format!("{} is not UTF-8", path.display())))?;

        let cap = VideoCapture::from_file(path_str, CAP_ANY)
            .map_err(|e| MediaError::unreadable_video(format!("Failed to open video: {e}")))?;
        if !cap.is_opened().unwrap_or(false) {
            return Err(MediaError::unreadable_video(format!(
                "Failed to open video file: {path_str}"
            )));
        }

        let fps = cap.get(CAP_PROP_FPS).unwrap_or(0.0);
        debug!(video = path_str, fps, "Video opened");

        Ok(Self {
            cap,
            fps,
            frame: Mat::default(),
        })
    }
}

impl VideoSource for OpenCvVideo {
    fn fps(&self) -> f64 {
        self.fps
    }

    fn next_frame(&mut self) -> MediaResult<Option<RgbImage>> {
        let ok = self
            .cap
            .read(&mut self.frame)
            .map_err(|e| MediaError::decode(format!("Failed to read frame: {e}")))?;
        if !ok || self.frame.empty() {
            return Ok(None);
        }
        bgr_mat_to_rgb(&self.frame).map(Some)
    }

    fn skip_frame(&mut self) -> MediaResult<bool> {
        self.cap
            .grab()
            .map_err(|e| MediaError::decode(format!("Failed to grab frame: {e}")))
    }
}

impl Drop for OpenCvVideo {
    fn drop(&mut self) {
        if let Err(e) = self.cap.release() {
            warn!(error = %e, "Failed to release video capture");
        }
    }
}

/// Convert a BGR `Mat` from OpenCV into an `RgbImage`.
pub fn bgr_mat_to_rgb(frame: &Mat) -> MediaResult<RgbImage> {
    let mut rgb = Mat::default();
    imgproc::cvt_color_def(frame, &mut rgb, imgproc::COLOR_BGR2RGB)
        .map_err(|e| MediaError::decode(format!("BGR2RGB failed: {e}")))?;

    let (width, height) = (rgb.cols() as u32, rgb.rows() as u32);
    let data = rgb
        .data_bytes()
        .map_err(|e| MediaError::decode(format!("Failed to get frame data: {e}")))?;

    RgbImage::from_raw(width, height, data.to_vec())
        .ok_or_else(|| MediaError::decode("frame buffer smaller than its dimensions"))
}

/// Convert an `RgbImage` into a BGR `Mat` for OpenCV.
pub fn rgb_to_bgr_mat(image: &RgbImage) -> MediaResult<Mat> {
    let mut rgb = Mat::new_rows_cols_with_default(
        image.height() as i32,
        image.width() as i32,
        CV_8UC3,
        Scalar::all(0.0),
    )
    .map_err(|e| MediaError::internal(format!("Mat alloc: {e}")))?;
    rgb.data_bytes_mut()
        .map_err(|e| MediaError::internal(format!("Mat data: {e}")))?
        .copy_from_slice(image.as_raw());

    let mut bgr = Mat::default();
    imgproc::cvt_color_def(&rgb, &mut bgr, imgproc::COLOR_RGB2BGR)
        .map_err(|e| MediaError::internal(format!("RGB2BGR failed: {e}")))?;
    Ok(bgr)
}
