//! In-memory registries for persons, videos and search history.

use std::collections::HashMap;

use tokio::sync::RwLock;

use sightline_models::{
    MissingPerson, PersonId, PersonStatus, SearchRecord, SearchStatus, VideoId, VideoRecord,
};

/// Process-local record store. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct Registry {
    persons: RwLock<HashMap<PersonId, MissingPerson>>,
    videos: RwLock<HashMap<VideoId, VideoRecord>>,
    history: RwLock<Vec<SearchRecord>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_person(&self, person: MissingPerson) {
        self.persons.write().await.insert(person.id.clone(), person);
    }

    pub async fn person(&self, id: &PersonId) -> Option<MissingPerson> {
        self.persons.read().await.get(id).cloned()
    }

    /// All persons, oldest report first.
    pub async fn persons(&self) -> Vec<MissingPerson> {
        let mut persons: Vec<_> = self.persons.read().await.values().cloned().collect();
        persons.sort_by(|a, b| a.reported_date.cmp(&b.reported_date).then(a.id.cmp(&b.id)));
        persons
    }

    pub async fn remove_person(&self, id: &PersonId) -> Option<MissingPerson> {
        self.persons.write().await.remove(id)
    }

    pub async fn insert_video(&self, video: VideoRecord) {
        self.videos.write().await.insert(video.id.clone(), video);
    }

    pub async fn video(&self, id: &VideoId) -> Option<VideoRecord> {
        self.videos.read().await.get(id).cloned()
    }

    /// All videos, oldest upload first.
    pub async fn videos(&self) -> Vec<VideoRecord> {
        let mut videos: Vec<_> = self.videos.read().await.values().cloned().collect();
        videos.sort_by(|a, b| a.upload_date.cmp(&b.upload_date).then(a.id.cmp(&b.id)));
        videos
    }

    pub async fn remove_video(&self, id: &VideoId) -> Option<VideoRecord> {
        self.videos.write().await.remove(id)
    }

    /// Book a completed search.
    ///
    /// Both records' search counts go up by one and a match marks the person
    /// found. Records deleted while the search ran are skipped.
    pub async fn complete_search(&self, record: SearchRecord) {
        {
            let mut persons = self.persons.write().await;
            if let Some(person) = persons.get_mut(&record.person_id) {
                person.search_count += 1;
                if record.status == SearchStatus::MatchFound {
                    person.status = PersonStatus::Found;
                }
            }
        }
        {
            let mut videos = self.videos.write().await;
            if let Some(video) = videos.get_mut(&record.video_id) {
                video.search_count += 1;
            }
        }
        self.history.write().await.push(record);
    }

    /// Every search, in completion order.
    pub async fn history(&self) -> Vec<SearchRecord> {
        self.history.read().await.clone()
    }

    pub async fn history_for(&self, person_id: &PersonId) -> Vec<SearchRecord> {
        self.history
            .read()
            .await
            .iter()
            .filter(|r| &r.person_id == person_id)
            .cloned()
            .collect()
    }

    /// (persons, videos, searches)
    pub async fn counts(&self) -> (usize, usize, usize) {
        (
            self.persons.read().await.len(),
            self.videos.read().await.len(),
            self.history.read().await.len(),
        )
    }
}
