//! API routes.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::{
    delete_missing_person, delete_video, get_missing_person, get_missing_person_photo, health,
    list_missing_persons, list_videos, person_search_history, report_missing_person, root,
    search_history, search_person, upload_video,
};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, rate_limit_middleware, request_id, request_logging, security_headers,
    RateLimiterCache,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let user_routes = Router::new()
        .route("/user/report-missing-person", post(report_missing_person))
        .route("/user/missing-persons", get(list_missing_persons));

    let admin_routes = Router::new()
        // Videos
        .route("/admin/upload-video", post(upload_video))
        .route("/admin/videos", get(list_videos))
        .route("/admin/videos/:video_id", delete(delete_video))
        // Missing persons
        .route("/admin/missing-persons", get(list_missing_persons))
        .route(
            "/admin/missing-persons/:person_id",
            get(get_missing_person).delete(delete_missing_person),
        )
        .route("/admin/missing-persons/:person_id/photo", get(get_missing_person_photo))
        // History
        .route("/admin/search-history", get(search_history))
        .route("/admin/search-history/:person_id", get(person_search_history));

    // Searches are expensive; limit them per client IP
    let rate_limiter = Arc::new(RateLimiterCache::new(
        state.config.rate_limit_rps,
        state.config.rate_limit_burst,
    ));
    let search_routes = Router::new()
        .route("/admin/search", post(search_person))
        .layer(middleware::from_fn_with_state(rate_limiter, rate_limit_middleware));

    let health_routes = Router::new()
        .route("/", get(root))
        .route("/health", get(health));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .merge(user_routes)
        .merge(admin_routes)
        .merge(search_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        // Uploads are bounded by MAX_BODY_SIZE instead of the multipart default
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
