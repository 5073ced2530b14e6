//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Install the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "sightline_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "sightline_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "sightline_http_requests_in_flight";

    // Registry metrics
    pub const PERSONS_REPORTED_TOTAL: &str = "sightline_persons_reported_total";
    pub const VIDEOS_UPLOADED_TOTAL: &str = "sightline_videos_uploaded_total";
    pub const UPLOAD_BYTES_TOTAL: &str = "sightline_upload_bytes_total";

    // Search metrics
    pub const SEARCHES_TOTAL: &str = "sightline_searches_total";
    pub const SEARCHES_IN_FLIGHT: &str = "sightline_searches_in_flight";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "sightline_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a missing-person report.
pub fn record_person_reported(photo_bytes: u64) {
    counter!(names::PERSONS_REPORTED_TOTAL).increment(1);
    counter!(names::UPLOAD_BYTES_TOTAL, "kind" => "photo").increment(photo_bytes);
}

/// Record a video upload.
pub fn record_video_uploaded(bytes: u64) {
    counter!(names::VIDEOS_UPLOADED_TOTAL).increment(1);
    counter!(names::UPLOAD_BYTES_TOTAL, "kind" => "video").increment(bytes);
}

/// Record a finished search: `match_found`, `no_match` or an error label.
pub fn record_search(outcome: &str) {
    let labels = [("outcome", outcome.to_string())];
    counter!(names::SEARCHES_TOTAL, &labels).increment(1);
}

/// Track searches currently running on the blocking pool.
pub fn search_started() {
    gauge!(names::SEARCHES_IN_FLIGHT).increment(1.0);
}

pub fn search_finished() {
    gauge!(names::SEARCHES_IN_FLIGHT).decrement(1.0);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", endpoint.to_string())];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Route template for metric labels, so record ids don't explode cardinality.
fn route_label(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string())
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = route_label(&request);
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
