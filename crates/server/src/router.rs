//! HTTP router construction.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api;
use crate::state::AppState;

/// Build the application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route(
            "/worker/health",
            get(api::worker_health).post(api::worker_heartbeat),
        )
        .route("/worker/process", post(api::worker_process))
        .route("/import-jobs", post(api::jobs_create))
        .route("/import-jobs/{id}", get(api::jobs_get))
        .route("/import-jobs/{id}/retry", post(api::jobs_retry))
        .route("/calendar/sources", post(api::sources_create))
        .route("/calendar/sync", post(api::calendar_sync))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
