//! Uploaded video records.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

use crate::id::VideoId;

/// Availability of an uploaded video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    /// Stored and available for searches
    #[default]
    Ready,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Ready => "ready",
        }
    }
}

/// Fields submitted with a video upload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct NewVideo {
    #[validate(length(min = 1, max = 200))]
    pub department: String,
    #[validate(length(min = 1, max = 200))]
    pub location: String,
    #[validate(length(min = 1, max = 200))]
    pub time_window: String,
}

/// A stored CCTV video.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VideoRecord {
    pub id: VideoId,
    /// Original upload file name
    pub filename: String,
    /// Stored location on disk
    pub path: PathBuf,
    pub department: String,
    pub location: String,
    pub time_window: String,
    pub upload_date: DateTime<Utc>,
    pub status: VideoStatus,
    /// Stored size in bytes
    pub size: u64,
    /// Number of searches run against this video
    pub search_count: u32,
}

impl VideoRecord {
    /// Create a ready record for a stored upload.
    pub fn new(id: VideoId, fields: NewVideo, filename: String, path: PathBuf, size: u64) -> Self {
        Self {
            id,
            filename,
            path,
            department: fields.department,
            location: fields.location,
            time_window: fields.time_window,
            upload_date: Utc::now(),
            status: VideoStatus::Ready,
            size,
            search_count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_video_requires_all_fields() {
        let fields = NewVideo {
            department: "Metro".to_string(),
            location: "Platform 2".to_string(),
            time_window: String::new(),
        };
        assert!(fields.validate().is_err());
    }

    #[test]
    fn test_record_starts_ready_and_unsearched() {
        let record = VideoRecord::new(
            VideoId::from_string("video_1"),
            NewVideo {
                department: "Metro".to_string(),
                location: "Platform 2".to_string(),
                time_window: "08:00-09:00".to_string(),
            },
            "cam2.mp4".to_string(),
            PathBuf::from("/tmp/video_1.mp4"),
            1024,
        );
        assert_eq!(record.status, VideoStatus::Ready);
        assert_eq!(record.search_count, 0);
        assert_eq!(record.size, 1024);
    }
}
