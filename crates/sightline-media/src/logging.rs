//! Structured search logging.
//!
//! Keeps the person and video on every line logged for one search.

use tracing::{error, info, warn, Span};

/// Logger bound to one person-in-video search.
#[derive(Debug, Clone)]
pub struct SearchLogger {
    person: String,
    video: String,
}

impl SearchLogger {
    /// Create a logger for searching `person` in `video`.
    ///
    /// Both are free-form labels: record ids in the API, file names in the CLI.
    pub fn new(person: impl Into<String>, video: impl Into<String>) -> Self {
        Self {
            person: person.into(),
            video: video.into(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(person = %self.person, video = %self.video, "Search started: {}", message);
    }

    pub fn log_progress(&self, message: &str) {
        info!(person = %self.person, video = %self.video, "Search progress: {}", message);
    }

    pub fn log_warning(&self, message: &str) {
        warn!(person = %self.person, video = %self.video, "Search warning: {}", message);
    }

    pub fn log_error(&self, message: &str) {
        error!(person = %self.person, video = %self.video, "Search error: {}", message);
    }

    pub fn log_completion(&self, message: &str) {
        info!(person = %self.person, video = %self.video, "Search completed: {}", message);
    }

    pub fn person(&self) -> &str {
        &self.person
    }

    pub fn video(&self) -> &str {
        &self.video
    }

    /// Span carrying the search context, for work that logs on its own.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("search", person = %self.person, video = %self.video)
    }
}
