//! Missing-person records.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

use crate::id::PersonId;

/// Pant colour value meaning "not specified".
pub const NO_PANT_COLOR: &str = "none";

/// Search status of a reported person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum PersonStatus {
    /// Reported, not yet found in any video
    #[default]
    Pending,
    /// A search produced a full match
    Found,
}

/// Fields submitted when reporting a missing person.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct NewMissingPerson {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub last_seen_location: String,
    #[validate(length(min = 1, max = 64))]
    pub shirt_color: String,
    #[serde(default = "default_pant_color")]
    #[validate(length(max = 64))]
    pub pant_color: String,
    #[serde(default)]
    pub height: String,
    #[serde(default)]
    #[validate(length(max = 4000))]
    pub additional_notes: String,
    #[serde(default)]
    pub contact_info: String,
}

fn default_pant_color() -> String {
    NO_PANT_COLOR.to_string()
}

/// A reported missing person.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MissingPerson {
    pub id: PersonId,
    pub name: String,
    pub age: String,
    pub gender: String,
    pub last_seen_location: String,
    pub shirt_color: String,
    pub pant_color: String,
    pub height: String,
    pub additional_notes: String,
    pub contact_info: String,
    /// Stored photo file name
    pub photo_filename: String,
    /// Stored photo location on disk
    pub photo_path: PathBuf,
    pub reported_date: DateTime<Utc>,
    pub status: PersonStatus,
    /// Number of searches run for this person
    pub search_count: u32,
}

impl MissingPerson {
    /// Create a pending record from submitted fields.
    pub fn new(id: PersonId, fields: NewMissingPerson, photo_filename: String, photo_path: PathBuf) -> Self {
        let pant_color = if fields.pant_color.trim().is_empty() {
            default_pant_color()
        } else {
            fields.pant_color
        };

        Self {
            id,
            name: fields.name,
            age: fields.age,
            gender: fields.gender,
            last_seen_location: fields.last_seen_location,
            shirt_color: fields.shirt_color,
            pant_color,
            height: fields.height,
            additional_notes: fields.additional_notes,
            contact_info: fields.contact_info,
            photo_filename,
            photo_path,
            reported_date: Utc::now(),
            status: PersonStatus::Pending,
            search_count: 0,
        }
    }
}
