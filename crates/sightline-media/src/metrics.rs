//! Pipeline metrics.
//!
//! Recorded through the `metrics` facade; whichever recorder the binary
//! installs (Prometheus in the API) picks them up.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const FRAMES_SAMPLED_TOTAL: &str = "sightline_frames_sampled_total";
    pub const FACES_LOCATED_TOTAL: &str = "sightline_faces_located_total";
    pub const DETECTIONS_SCORED_TOTAL: &str = "sightline_detections_scored_total";
    pub const DETECTIONS_SKIPPED_TOTAL: &str = "sightline_detections_skipped_total";
    pub const EMBEDDINGS_TOTAL: &str = "sightline_embeddings_total";
    pub const MATCHES_TOTAL: &str = "sightline_matches_total";
    pub const SCANS_TOTAL: &str = "sightline_scans_total";
    pub const SCAN_DURATION_SECONDS: &str = "sightline_scan_duration_seconds";
}

pub fn record_frame_sampled(faces: usize) {
    counter!(names::FRAMES_SAMPLED_TOTAL).increment(1);
    counter!(names::FACES_LOCATED_TOTAL).increment(faces as u64);
}

pub fn record_detection_scored() {
    counter!(names::DETECTIONS_SCORED_TOTAL).increment(1);
}

/// `reason` is `"boundary"` for empty crops, `"error"` otherwise.
pub fn record_detection_skipped(reason: &'static str) {
    counter!(names::DETECTIONS_SKIPPED_TOTAL, "reason" => reason).increment(1);
}

pub fn record_embedding() {
    counter!(names::EMBEDDINGS_TOTAL).increment(1);
}

pub fn record_match(kind: &'static str) {
    counter!(names::MATCHES_TOTAL, "kind" => kind).increment(1);
}

/// Record a finished scan. `outcome` is `full_match`, `no_match` or an error label.
pub fn record_scan(outcome: &'static str, duration_secs: f64) {
    counter!(names::SCANS_TOTAL, "outcome" => outcome).increment(1);
    histogram!(names::SCAN_DURATION_SECONDS, "outcome" => outcome).record(duration_secs);
}
