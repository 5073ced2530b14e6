//! Configuration for the scan pipeline.
//!
//! Defaults reproduce the reference matching behaviour exactly. Every value
//! can be overridden from `SIGHTLINE_*` environment variables.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Thresholds and weights of the match decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchPolicy {
    /// Clothing is only scored when the face score is strictly above this (default: 0.40)
    pub face_gate: f64,
    /// Final score strictly above this is a full match (default: 0.55)
    pub full_match_threshold: f64,
    /// Face score strictly above this is a face-only match (default: 0.60)
    pub face_only_threshold: f64,
    /// Weight of the face score in the fused score (default: 0.70)
    pub face_weight: f64,
    /// Weight of the clothing score in the fused score (default: 0.30)
    pub clothing_weight: f64,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            face_gate: 0.40,
            full_match_threshold: 0.55,
            face_only_threshold: 0.60,
            face_weight: 0.70,
            clothing_weight: 0.30,
        }
    }
}

impl MatchPolicy {
    /// Whether a face score is worth the clothing check.
    #[inline]
    pub fn passes_gate(&self, face_score: f64) -> bool {
        face_score > self.face_gate
    }
}

/// Body proportions used to place garment regions below a face box.
///
/// All multipliers are in units of the face box size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyGeometry {
    /// Shirt region extends this many face widths left of the face (default: 1.0)
    pub shoulder_left: f64,
    /// Shirt region extends to this many face widths right of the face's left edge (default: 2.0)
    pub shoulder_right: f64,
    /// Shirt depth below the chin in face heights (default: 2.5)
    pub shirt_depth: f64,
    /// Pant depth below the shirt in face heights (default: 3.0)
    pub pant_depth: f64,
}

impl Default for BodyGeometry {
    fn default() -> Self {
        Self {
            shoulder_left: 1.0,
            shoulder_right: 2.0,
            shirt_depth: 2.5,
            pant_depth: 3.0,
        }
    }
}

/// Configuration for one scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    pub policy: MatchPolicy,
    pub geometry: BodyGeometry,
    /// Sampling stride used when the source reports no usable frame rate (default: 1)
    pub fallback_stride: u64,
    /// Consecutive sampled frames the face locator may fail on before the scan aborts (default: 3)
    pub max_consecutive_locator_failures: u32,
    /// Wall-clock budget for one scan in seconds; `None` means unbounded
    pub timeout_secs: Option<u64>,
    /// Log a progress heartbeat every this many sampled frames (default: 60)
    pub heartbeat_every: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            policy: MatchPolicy::default(),
            geometry: BodyGeometry::default(),
            fallback_stride: 1,
            max_consecutive_locator_failures: 3,
            timeout_secs: None,
            heartbeat_every: 60,
        }
    }
}

impl ScanConfig {
    /// Create config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let policy = MatchPolicy {
            face_gate: env_or("SIGHTLINE_FACE_GATE", defaults.policy.face_gate),
            full_match_threshold: env_or(
                "SIGHTLINE_MATCH_THRESHOLD",
                defaults.policy.full_match_threshold,
            ),
            face_only_threshold: env_or(
                "SIGHTLINE_FACE_ONLY_THRESHOLD",
                defaults.policy.face_only_threshold,
            ),
            face_weight: env_or("SIGHTLINE_FACE_WEIGHT", defaults.policy.face_weight),
            clothing_weight: env_or("SIGHTLINE_CLOTHING_WEIGHT", defaults.policy.clothing_weight),
        };
        let geometry = BodyGeometry {
            shoulder_left: env_or("SIGHTLINE_SHOULDER_LEFT", defaults.geometry.shoulder_left),
            shoulder_right: env_or("SIGHTLINE_SHOULDER_RIGHT", defaults.geometry.shoulder_right),
            shirt_depth: env_or("SIGHTLINE_SHIRT_DEPTH", defaults.geometry.shirt_depth),
            pant_depth: env_or("SIGHTLINE_PANT_DEPTH", defaults.geometry.pant_depth),
        };

        Self {
            policy,
            geometry,
            fallback_stride: env_or("SIGHTLINE_FALLBACK_STRIDE", defaults.fallback_stride).max(1),
            max_consecutive_locator_failures: env_or(
                "SIGHTLINE_MAX_LOCATOR_FAILURES",
                defaults.max_consecutive_locator_failures,
            ),
            timeout_secs: std::env::var("SIGHTLINE_SCAN_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok()),
            heartbeat_every: env_or("SIGHTLINE_HEARTBEAT_EVERY", defaults.heartbeat_every).max(1),
        }
    }

    /// Set the wall-clock budget.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Wall-clock budget as a duration.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}
