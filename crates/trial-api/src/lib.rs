//! # Clinical Trials Analytics API
//!
//! HTTP boundary over the trial analytics pipeline.
//!
//! ## Endpoints
//!
//! - `POST /api/upload`: upload a CSV and get its summary statistics
//! - `GET /api/summary`: summary statistics for the configured data file
//! - `GET /api/analytics`: every analysis section for the configured data file
//! - `GET /api/report`: the same analysis rendered as Markdown
//! - `GET /health`: liveness check
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Axum HTTP Server                         │
//! │        (CORS, body limit, tracing, error mapping)           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │              spawn_blocking + scoped temp file              │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │    trial-analytics: load → aggregate → insights             │
//! └─────────────────────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod routes;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use error::{ApiError, ApiResult};

/// Application state for Axum handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    "OK"
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        cors.allow_origin(AllowOrigin::list(allowed))
    }
}

/// Build the Axum router
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/api/upload", post(routes::upload_csv))
        .route("/api/summary", get(routes::default_summary))
        .route("/api/analytics", get(routes::all_analytics))
        .route("/api/report", get(routes::markdown_report))
        .route("/health", get(health_check))
        .route("/", get(|| async { "Clinical Trials Analytics API" }))
        .fallback(routes::not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
