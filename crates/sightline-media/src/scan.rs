//! Frame sampling and the scan loop.
//!
//! One sampled frame per nominal second of video is run through face
//! localization, the face gate, garment scoring and fusion. The first full
//! match ends the scan; face-only matches are reported and scanning goes on.

use image::{imageops, RgbImage};
use rayon::prelude::*;
use serde::Serialize;
use sightline_models::{FaceBox, GarmentRegions, MatchKind, ScoreSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::annotate::Annotator;
use crate::capability::{ModelCapabilities, VideoOpener, VideoSource};
use crate::color::color_presence;
use crate::config::ScanConfig;
use crate::error::{MediaError, MediaResult};
use crate::fusion::{classify, clothing_score, fuse};
use crate::matcher::compare;
use crate::metrics;
use crate::regions::{estimate_regions, view_region};
use crate::target::{build_target, TargetDescriptor};

/// One analyzed frame.
#[derive(Debug, Clone)]
pub struct FrameSample {
    /// Ordinal of the frame in decode order
    pub frame_index: u64,
    /// `frame_index / stride`, the nominal second of video
    pub timestamp_seconds: f64,
    pub image: RgbImage,
}

/// A located face and its pixels.
#[derive(Debug, Clone)]
pub struct FaceDetection {
    pub face: FaceBox,
    pub crop: RgbImage,
}

/// Everything known about a classified detection.
///
/// `sample.image` carries the match annotation.
#[derive(Debug, Clone)]
pub struct Sighting {
    pub kind: MatchKind,
    pub sample: FrameSample,
    pub detection: FaceDetection,
    pub regions: GarmentRegions,
    pub scores: ScoreSet,
}

/// Result of evaluating one detection.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub detection: FaceDetection,
    pub scores: ScoreSet,
    /// Present only when the face gate was passed
    pub regions: Option<GarmentRegions>,
    pub kind: Option<MatchKind>,
}

/// Outcome of a completed scan.
///
/// Face-only matches never end a scan; they go to the match callback.
#[derive(Debug, Clone)]
pub enum MatchOutcome {
    NoMatch,
    FullMatch(Box<Sighting>),
}

impl MatchOutcome {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchOutcome::FullMatch(_))
    }

    pub fn sighting(&self) -> Option<&Sighting> {
        match self {
            MatchOutcome::NoMatch => None,
            MatchOutcome::FullMatch(s) => Some(s),
        }
    }

    pub fn into_sighting(self) -> Option<Sighting> {
        match self {
            MatchOutcome::NoMatch => None,
            MatchOutcome::FullMatch(s) => Some(*s),
        }
    }

    fn label(&self) -> &'static str {
        match self {
            MatchOutcome::NoMatch => "no_match",
            MatchOutcome::FullMatch(_) => "full_match",
        }
    }
}

/// Deadline and cancellation for one scan, checked on every decoded frame.
#[derive(Debug, Clone, Default)]
pub struct ScanControl {
    deadline: Option<(Instant, u64)>,
    cancel_rx: Option<watch::Receiver<bool>>,
}

impl ScanControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort with [`MediaError::Timeout`] once `secs` have passed from now.
    pub fn with_timeout(self, secs: u64) -> Self {
        self.with_budget(Duration::from_secs(secs))
    }

    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.deadline = Some((Instant::now() + budget, budget.as_secs()));
        self
    }

    /// Abort with [`MediaError::Cancelled`] once `true` is sent.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    pub fn has_deadline(&self) -> bool {
        self.deadline.is_some()
    }

    /// Error if the scan should stop now.
    pub fn check(&self) -> MediaResult<()> {
        if let Some(ref cancel_rx) = self.cancel_rx {
            if *cancel_rx.borrow() {
                return Err(MediaError::Cancelled);
            }
        }
        if let Some((deadline, secs)) = self.deadline {
            if Instant::now() >= deadline {
                return Err(MediaError::Timeout(secs));
            }
        }
        Ok(())
    }
}

/// Counters for one scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanStats {
    pub stride: u64,
    pub frames_decoded: u64,
    pub frames_sampled: u64,
    pub faces_located: u64,
    /// Detections whose face score passed the gate
    pub detections_gated: u64,
    /// Detections skipped for boundary artefacts such as empty crops
    pub skipped_boundary: u64,
    /// Detections skipped for embedding or scoring faults
    pub skipped_errors: u64,
    pub locator_failures: u64,
    pub face_only_matches: u64,
    pub elapsed: Duration,
}

/// Outcome of a scan plus its counters.
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub outcome: MatchOutcome,
    pub stats: ScanStats,
}

/// Sampling stride for a frame rate: `trunc(fps)`, or `fallback` when that is unusable.
pub fn sampling_stride(fps: f64, fallback: u64) -> u64 {
    if fps.is_finite() && fps >= 1.0 {
        fps.trunc() as u64
    } else {
        fallback.max(1)
    }
}

/// Scan engine shared by every search in a process.
#[derive(Clone)]
pub struct Scanner {
    capabilities: Arc<ModelCapabilities>,
    config: ScanConfig,
    annotator: Arc<Annotator>,
}

impl Scanner {
    /// Scanner that annotates boxes without label text.
    pub fn new(capabilities: Arc<ModelCapabilities>, config: ScanConfig) -> Self {
        Self {
            capabilities,
            config,
            annotator: Arc::new(Annotator::without_text()),
        }
    }

    pub fn with_annotator(mut self, annotator: Annotator) -> Self {
        self.annotator = Arc::new(annotator);
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn capabilities(&self) -> &Arc<ModelCapabilities> {
        &self.capabilities
    }

    /// Scan `source` until the first full match or the end of the video.
    pub fn scan(
        &self,
        source: &mut dyn VideoSource,
        target: &TargetDescriptor,
    ) -> MediaResult<ScanReport> {
        self.scan_with(source, target, &ScanControl::new(), |_| {})
    }

    /// Scan with a deadline/cancel flag and a callback for every classified detection.
    ///
    /// The callback sees face-only matches as they happen and the final full
    /// match just before it is returned.
    pub fn scan_with<F>(
        &self,
        source: &mut dyn VideoSource,
        target: &TargetDescriptor,
        control: &ScanControl,
        on_match: F,
    ) -> MediaResult<ScanReport>
    where
        F: FnMut(&Sighting),
    {
        let started = Instant::now();
        let control = match self.config.timeout() {
            Some(budget) if !control.has_deadline() => control.clone().with_budget(budget),
            _ => control.clone(),
        };

        let result = self.run(source, target, &control, on_match, started);
        let duration = started.elapsed().as_secs_f64();
        let label = match &result {
            Ok(report) => report.outcome.label(),
            Err(MediaError::Cancelled) => "cancelled",
            Err(MediaError::Timeout(_)) => "timeout",
            Err(_) => "error",
        };
        metrics::record_scan(label, duration);
        result
    }

    /// Build the target from `photo`, then scan the video at `path`.
    ///
    /// A photo without a face fails before the video is opened.
    pub fn search(
        &self,
        opener: &dyn VideoOpener,
        path: &Path,
        photo: &RgbImage,
        shirt_color: &str,
        pant_color: &str,
        control: &ScanControl,
    ) -> MediaResult<ScanReport> {
        let target = build_target(&self.capabilities, photo, shirt_color, pant_color)?;
        self.scan_path(opener, path, &target, control, |_| {})
    }

    /// Open `path` with `opener` and scan it. The video is released when this returns.
    pub fn scan_path<F>(
        &self,
        opener: &dyn VideoOpener,
        path: &Path,
        target: &TargetDescriptor,
        control: &ScanControl,
        on_match: F,
    ) -> MediaResult<ScanReport>
    where
        F: FnMut(&Sighting),
    {
        let mut source = opener.open(path)?;
        self.scan_with(source.as_mut(), target, control, on_match)
    }

    fn run<F>(
        &self,
        source: &mut dyn VideoSource,
        target: &TargetDescriptor,
        control: &ScanControl,
        mut on_match: F,
        started: Instant,
    ) -> MediaResult<ScanReport>
    where
        F: FnMut(&Sighting),
    {
        let fps = source.fps();
        let stride = sampling_stride(fps, self.config.fallback_stride);
        let mut stats = ScanStats {
            stride,
            ..Default::default()
        };
        info!(fps, stride, locator = self.capabilities.locator.name(), "Scanning video");

        let mut frame_index: u64 = 0;
        let mut consecutive_failures: u32 = 0;

        loop {
            control.check()?;

            if frame_index % stride != 0 {
                if !source.skip_frame()? {
                    break;
                }
                stats.frames_decoded += 1;
                frame_index += 1;
                continue;
            }

            let Some(image) = source.next_frame()? else {
                break;
            };
            stats.frames_decoded += 1;
            stats.frames_sampled += 1;

            let sample = FrameSample {
                frame_index,
                timestamp_seconds: frame_index as f64 / stride as f64,
                image,
            };
            frame_index += 1;

            if stats.frames_sampled % self.config.heartbeat_every.max(1) == 0 {
                info!(
                    frame = sample.frame_index,
                    timestamp = sample.timestamp_seconds,
                    sampled = stats.frames_sampled,
                    "Scan progress"
                );
            }

            let faces = match self.capabilities.locator.locate(&sample.image) {
                Ok(faces) => {
                    consecutive_failures = 0;
                    faces
                }
                Err(e) => {
                    consecutive_failures += 1;
                    stats.locator_failures += 1;
                    warn!(frame = sample.frame_index, error = %e, "Face localization failed");
                    let budget = self.config.max_consecutive_locator_failures;
                    if budget > 0 && consecutive_failures >= budget {
                        return Err(MediaError::detection_failed(format!(
                            "locator failed on {consecutive_failures} consecutive frames: {e}"
                        )));
                    }
                    continue;
                }
            };
            stats.faces_located += faces.len() as u64;
            metrics::record_frame_sampled(faces.len());

            let mut full_match = None;
            for face in &faces {
                let evaluation = match self.evaluate_detection(&sample.image, face, target) {
                    Ok(evaluation) => evaluation,
                    Err(e) if e.is_benign_skip() => {
                        stats.skipped_boundary += 1;
                        metrics::record_detection_skipped("boundary");
                        debug!(frame = sample.frame_index, error = %e, "Skipping detection");
                        continue;
                    }
                    Err(e) => {
                        stats.skipped_errors += 1;
                        metrics::record_detection_skipped("error");
                        warn!(frame = sample.frame_index, error = %e, "Skipping detection");
                        continue;
                    }
                };

                let (Some(regions), Some(kind)) = (evaluation.regions, evaluation.kind) else {
                    if evaluation.regions.is_some() {
                        stats.detections_gated += 1;
                    }
                    continue;
                };
                stats.detections_gated += 1;
                metrics::record_match(kind.as_str());

                if kind.is_terminal() {
                    full_match = Some((evaluation.detection, regions, evaluation.scores));
                    break;
                }

                stats.face_only_matches += 1;
                info!(
                    frame = sample.frame_index,
                    timestamp = sample.timestamp_seconds,
                    face_score = evaluation.scores.face_score,
                    final_score = evaluation.scores.final_score,
                    "Face-only match, clothing disagrees; continuing"
                );
                let mut annotated = sample.clone();
                self.annotator.annotate(
                    &mut annotated.image,
                    &evaluation.detection.face,
                    &regions.shirt,
                    kind,
                    &evaluation.scores,
                );
                on_match(&Sighting {
                    kind,
                    sample: annotated,
                    detection: evaluation.detection,
                    regions,
                    scores: evaluation.scores,
                });
            }

            if let Some((detection, regions, scores)) = full_match {
                let mut sample = sample;
                self.annotator.annotate(
                    &mut sample.image,
                    &detection.face,
                    &regions.shirt,
                    MatchKind::FullMatch,
                    &scores,
                );
                info!(
                    frame = sample.frame_index,
                    timestamp = sample.timestamp_seconds,
                    face_score = scores.face_score,
                    final_score = scores.final_score,
                    "Match found"
                );
                let sighting = Sighting {
                    kind: MatchKind::FullMatch,
                    sample,
                    detection,
                    regions,
                    scores,
                };
                on_match(&sighting);
                stats.elapsed = started.elapsed();
                return Ok(ScanReport {
                    outcome: MatchOutcome::FullMatch(Box::new(sighting)),
                    stats,
                });
            }
        }

        if stats.frames_decoded == 0 {
            return Err(MediaError::unreadable_video("no decodable frames"));
        }

        stats.elapsed = started.elapsed();
        info!(
            sampled = stats.frames_sampled,
            faces = stats.faces_located,
            face_only = stats.face_only_matches,
            "Video exhausted without a match"
        );
        Ok(ScanReport {
            outcome: MatchOutcome::NoMatch,
            stats,
        })
    }

    /// Score one detection against the target.
    ///
    /// Clothing is only looked at when the face score passes the gate.
    pub fn evaluate_detection(
        &self,
        frame: &RgbImage,
        face: &FaceBox,
        target: &TargetDescriptor,
    ) -> MediaResult<Evaluation> {
        let policy = &self.config.policy;
        let (frame_width, frame_height) = frame.dimensions();

        let face_region = face.clip(frame_width, frame_height);
        if face_region.is_empty() {
            return Err(MediaError::EmptyCrop);
        }
        let crop = imageops::crop_imm(
            frame,
            face_region.x1,
            face_region.y1,
            face_region.width(),
            face_region.height(),
        )
        .to_image();

        let face_score = compare(
            self.capabilities.embedder.as_ref(),
            &target.embedding,
            &crop,
        )?;
        metrics::record_detection_scored();
        let detection = FaceDetection { face: *face, crop };

        if !policy.passes_gate(face_score) {
            return Ok(Evaluation {
                detection,
                scores: ScoreSet {
                    face_score,
                    clothing_score: None,
                    final_score: policy.face_weight * face_score,
                },
                regions: None,
                kind: None,
            });
        }

        let regions = estimate_regions(
            face,
            &self.config.geometry,
            frame_width,
            frame_height,
            target.wants_pants(),
        );
        let shirt_score = color_presence(&*view_region(frame, &regions.shirt), &target.shirt);
        let pant_score = match (&regions.pants, &target.pants) {
            (Some(region), Some(query)) => Some(color_presence(&*view_region(frame, region), query)),
            _ => None,
        };

        let scores = fuse(policy, face_score, clothing_score(shirt_score, pant_score));
        let kind = classify(policy, &scores);
        debug!(
            x = face.x,
            y = face.y,
            face_score,
            shirt_score,
            pant_score = ?pant_score,
            final_score = scores.final_score,
            kind = ?kind,
            "Detection scored"
        );

        Ok(Evaluation {
            detection,
            scores,
            regions: Some(regions),
            kind,
        })
    }
}

/// Result of scanning one video in [`scan_many`].
#[derive(Debug)]
pub struct VideoScan {
    pub path: PathBuf,
    pub result: MediaResult<ScanReport>,
}

/// Scan several videos in parallel, one independent scan per video.
///
/// `on_match` is called from worker threads with the video's path.
pub fn scan_many<F>(
    scanner: &Scanner,
    opener: &dyn VideoOpener,
    paths: &[PathBuf],
    target: &TargetDescriptor,
    control: &ScanControl,
    on_match: F,
) -> Vec<VideoScan>
where
    F: Fn(&Path, &Sighting) + Sync,
{
    paths
        .par_iter()
        .map(|path| {
            let result = scanner.scan_path(opener, path, target, control, |sighting| {
                on_match(path.as_path(), sighting)
            });
            if let Err(ref e) = result {
                warn!(video = %path.display(), error = %e, "Scan failed");
            }
            VideoScan {
                path: path.clone(),
                result,
            }
        })
        .collect()
}
