#![deny(unreachable_patterns)]
//! Person search in recorded video.
//!
//! This crate provides:
//! - Frame sampling at one frame per nominal second of video
//! - Face matching against a reference embedding with a two-stage gate
//! - Garment region estimation and HSV colour-presence scoring
//! - Score fusion with first-match-wins early exit
//! - Match annotation on the returned frame
//! - YuNet, FaceNet and OpenCV video backends behind capability traits

pub mod annotate;
pub mod backends;
pub mod capability;
pub mod color;
pub mod config;
pub mod error;
pub mod fusion;
pub mod logging;
pub mod matcher;
pub mod metrics;
pub mod regions;
pub mod scan;
pub mod target;

#[cfg(test)]
mod tests;

pub use annotate::Annotator;
pub use backends::{FaceNetEmbedder, ModelPaths};
#[cfg(feature = "opencv")]
pub use backends::{OpenCvVideoOpener, YuNetLocator};
pub use capability::{
    Embedding, FaceEmbedder, FaceLocator, ModelCapabilities, VideoOpener, VideoSource,
};
pub use color::{color_presence, score_color, ColorQuery, NamedColor};
pub use config::{BodyGeometry, MatchPolicy, ScanConfig};
pub use error::{MediaError, MediaResult};
pub use logging::SearchLogger;
pub use scan::{
    sampling_stride, scan_many, FaceDetection, FrameSample, MatchOutcome, ScanControl,
    ScanReport, ScanStats, Scanner, Sighting, VideoScan,
};
pub use target::{build_target, decode_reference_photo, load_reference_photo, TargetDescriptor};
