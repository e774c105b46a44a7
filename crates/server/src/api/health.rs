//! Liveness and worker heartbeat/staffing endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use marquee_pipeline::{health_report, WorkerHealth};

use crate::state::AppState;

use super::{bad_request, internal_error, ApiResult};

// ── Liveness ──────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ── Worker heartbeats ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct HeartbeatRequest {
    pub worker_id: String,
    pub worker_type: String,
}

#[derive(Serialize)]
pub struct HeartbeatResponse {
    pub ok: bool,
}

/// POST /worker/health -- register one heartbeat for a worker process.
pub async fn worker_heartbeat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<HeartbeatRequest>,
) -> ApiResult<Json<HeartbeatResponse>> {
    if req.worker_id.trim().is_empty() {
        return Err(bad_request("worker_id must not be empty"));
    }

    state
        .heartbeats
        .record(&req.worker_id, &req.worker_type, Utc::now())
        .await
        .map_err(internal_error)?;

    Ok(Json(HeartbeatResponse { ok: true }))
}

/// GET /worker/health -- staffing report. Degrades to `healthy: false`
/// when the registry is unreachable; never a 500.
pub async fn worker_health(State(state): State<Arc<AppState>>) -> Json<WorkerHealth> {
    let report = health_report(
        state.heartbeats.as_ref(),
        Utc::now(),
        state.config.worker.heartbeat_staleness(),
    )
    .await;
    Json(report)
}
