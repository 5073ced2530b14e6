//! Health check handlers.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use sightline_media::MatchPolicy;

use crate::state::AppState;

const SERVICE_NAME: &str = "Missing Person Search API";

/// Service banner.
#[derive(Serialize)]
pub struct RootResponse {
    pub message: String,
    pub version: String,
}

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: String,
    pub uploaded_videos: usize,
    pub missing_persons: usize,
    pub search_results: usize,
    pub match_policy: MatchPolicy,
}

/// Health check endpoint (liveness probe).
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let (persons, videos, searches) = state.registry.counts().await;
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
        uploaded_videos: videos,
        missing_persons: persons,
        search_results: searches,
        match_policy: state.scan_config().policy,
    })
}
