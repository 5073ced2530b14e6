//! Score sets and match classifications.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scores computed for one face detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScoreSet {
    /// Cosine similarity between the detection and the target embedding
    pub face_score: f64,
    /// Garment colour agreement; absent when the face gate was not passed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clothing_score: Option<f64>,
    /// Weighted fusion of face and clothing scores
    pub final_score: f64,
}

impl ScoreSet {
    /// Final score as a whole percentage, for labels.
    pub fn percent(&self) -> i64 {
        (self.final_score * 100.0).round() as i64
    }
}

/// Classification of a scored detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Face and clothing together clear the match threshold
    FullMatch,
    /// Strong face similarity, clothing disagrees; advisory only
    FaceOnlyMatch,
}

impl MatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchKind::FullMatch => "full_match",
            MatchKind::FaceOnlyMatch => "face_only_match",
        }
    }

    /// Human-readable status shown on annotated frames.
    pub fn status_label(&self) -> &'static str {
        match self {
            MatchKind::FullMatch => "MATCH FOUND",
            MatchKind::FaceOnlyMatch => "FACE MATCH (Check Clothes)",
        }
    }

    /// Whether this classification ends a scan.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MatchKind::FullMatch)
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_rounds_to_integer() {
        let scores = ScoreSet {
            face_score: 0.9,
            clothing_score: Some(1.0),
            final_score: 0.9349,
        };
        assert_eq!(scores.percent(), 93);
    }

    #[test]
    fn test_only_full_match_is_terminal() {
        assert!(MatchKind::FullMatch.is_terminal());
        assert!(!MatchKind::FaceOnlyMatch.is_terminal());
    }

    #[test]
    fn test_match_kind_serializes_snake_case() {
        let json = serde_json::to_string(&MatchKind::FaceOnlyMatch).unwrap();
        assert_eq!(json, "\"face_only_match\"");
    }
}
