//! Search history records.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::id::{PersonId, SearchId, VideoId};
use crate::person::MissingPerson;
use crate::video::VideoRecord;

/// Result of one person-in-video search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    MatchFound,
    NoMatch,
}

/// History entry for a completed search.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchRecord {
    pub id: SearchId,
    pub person_id: PersonId,
    pub person_name: String,
    pub video_id: VideoId,
    pub video_filename: String,
    pub location: String,
    pub department: String,
    pub search_date: DateTime<Utc>,
    pub status: SearchStatus,
    /// Final fused score of the matching detection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_score: Option<f64>,
    /// Position of the matching frame in the video
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_seconds: Option<f64>,
}

impl SearchRecord {
    /// Record a search that ended without a match.
    pub fn no_match(person: &MissingPerson, video: &VideoRecord) -> Self {
        Self::build(person, video, SearchStatus::NoMatch, None, None)
    }

    /// Record a search that produced a full match.
    pub fn match_found(
        person: &MissingPerson,
        video: &VideoRecord,
        final_score: f64,
        timestamp_seconds: f64,
    ) -> Self {
        Self::build(
            person,
            video,
            SearchStatus::MatchFound,
            Some(final_score),
            Some(timestamp_seconds),
        )
    }

    fn build(
        person: &MissingPerson,
        video: &VideoRecord,
        status: SearchStatus,
        final_score: Option<f64>,
        timestamp_seconds: Option<f64>,
    ) -> Self {
        Self {
            id: SearchId::new(),
            person_id: person.id.clone(),
            person_name: person.name.clone(),
            video_id: video.id.clone(),
            video_filename: video.filename.clone(),
            location: video.location.clone(),
            department: video.department.clone(),
            search_date: Utc::now(),
            status,
            final_score,
            timestamp_seconds,
        }
    }
}
