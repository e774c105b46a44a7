//! Calendar feed subscriptions and the cron entry point.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use marquee_calendar::{run_sync_pass, SyncPassReport};
use marquee_core::CalendarSyncSource;

use crate::auth::authorize_worker;
use crate::state::AppState;

use super::{bad_request, internal_error, unauthorized, ApiResult};

// ── Subscriptions ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateSourceRequest {
    pub tenant_id: Uuid,
    pub source_url: String,
    pub sync_interval_minutes: i32,
}

/// POST /calendar/sources -- subscribe one external feed. The source is
/// immediately due (no `last_synced_at`) and will sync on the next pass.
pub async fn sources_create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSourceRequest>,
) -> ApiResult<(StatusCode, Json<CalendarSyncSource>)> {
    let source = CalendarSyncSource::new(req.tenant_id, req.source_url, req.sync_interval_minutes)
        .map_err(|e| bad_request(e.to_string()))?;
    state
        .calendar
        .create_source(&source)
        .await
        .map_err(internal_error)?;

    Ok((StatusCode::CREATED, Json(source)))
}

// ── Cron entry point ──────────────────────────────────────────────

/// POST /calendar/sync -- evaluate due sources and sync each, recording
/// one run row per attempt. Same authorization as /worker/process.
pub async fn calendar_sync(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<SyncPassReport>> {
    if !authorize_worker(&headers, state.config.worker.secret.as_deref()) {
        return Err(unauthorized());
    }

    let report = run_sync_pass(state.calendar.as_ref(), state.fetcher.as_ref(), Utc::now())
        .await
        .map_err(internal_error)?;

    Ok(Json(report))
}
