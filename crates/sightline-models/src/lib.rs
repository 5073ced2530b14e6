//! Shared data models for the Sightline search pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Face boxes and garment regions in frame pixel coordinates
//! - Score sets and match classifications
//! - Missing-person, video and search-history records

pub mod geometry;
pub mod id;
pub mod person;
pub mod scoring;
pub mod search;
pub mod video;

// Re-export common types
pub use geometry::{FaceBox, GarmentRegions, Region};
pub use id::{PersonId, SearchId, VideoId};
pub use person::{MissingPerson, NewMissingPerson, PersonStatus, NO_PANT_COLOR};
pub use scoring::{MatchKind, ScoreSet};
pub use search::{SearchRecord, SearchStatus};
pub use video::{NewVideo, VideoRecord, VideoStatus};
