//! Score fusion and match classification.

use sightline_models::{MatchKind, ScoreSet};

use crate::config::MatchPolicy;

/// Combine garment scores. Pants, when requested, weigh the same as the shirt.
pub fn clothing_score(shirt: f64, pants: Option<f64>) -> f64 {
    match pants {
        Some(pants) => (shirt + pants) / 2.0,
        None => shirt,
    }
}

/// Weighted fusion of a gated face score and its clothing score.
pub fn fuse(policy: &MatchPolicy, face_score: f64, clothing_score: f64) -> ScoreSet {
    ScoreSet {
        face_score,
        clothing_score: Some(clothing_score),
        final_score: policy.face_weight * face_score + policy.clothing_weight * clothing_score,
    }
}

/// Classify a fused score set; the full match is checked first.
pub fn classify(policy: &MatchPolicy, scores: &ScoreSet) -> Option<MatchKind> {
    if scores.final_score > policy.full_match_threshold {
        Some(MatchKind::FullMatch)
    } else if scores.face_score > policy.face_only_threshold {
        Some(MatchKind::FaceOnlyMatch)
    } else {
        None
    }
}
