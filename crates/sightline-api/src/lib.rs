//! Axum HTTP API for missing-person search.
//!
//! This crate provides:
//! - Missing-person reports with reference photos
//! - CCTV video uploads
//! - Person-in-video searches that return the annotated match frame
//! - Search history, per-IP rate limiting and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod store;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
pub use store::Registry;
