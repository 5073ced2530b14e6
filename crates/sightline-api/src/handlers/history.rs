//! Search history handlers.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use sightline_models::{PersonId, SearchRecord};

use crate::state::AppState;

/// Response listing search records.
#[derive(Serialize)]
pub struct HistoryResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_id: Option<PersonId>,
    pub count: usize,
    pub results: Vec<SearchRecord>,
}

/// Every search performed.
pub async fn search_history(State(state): State<AppState>) -> Json<HistoryResponse> {
    let results = state.registry.history().await;
    Json(HistoryResponse {
        success: true,
        person_id: None,
        count: results.len(),
        results,
    })
}

/// Searches performed for one person. Unknown ids yield an empty list.
pub async fn person_search_history(
    State(state): State<AppState>,
    Path(person_id): Path<String>,
) -> Json<HistoryResponse> {
    let person_id = PersonId::from_string(person_id);
    let results = state.registry.history_for(&person_id).await;
    Json(HistoryResponse {
        success: true,
        person_id: Some(person_id),
        count: results.len(),
        results,
    })
}
