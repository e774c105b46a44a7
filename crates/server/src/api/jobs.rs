//! Import-job ingestion, lookup, retry, and the worker-trigger endpoint.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use marquee_core::{ImportJob, RawSource};
use marquee_pipeline::{ImportWorker, ResolverPolicy};

use crate::auth::authorize_worker;
use crate::state::AppState;

use super::{bad_request, internal_error, not_found, store_error, unauthorized, ApiResult};

// ── Ingestion ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub tenant_id: Uuid,
    pub raw_sources: Vec<RawSource>,
}

/// POST /import-jobs -- enqueue one ingestion attempt. Returns 201 with
/// the pending job; processing happens asynchronously.
pub async fn jobs_create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateJobRequest>,
) -> ApiResult<(StatusCode, Json<ImportJob>)> {
    if req.raw_sources.is_empty() {
        return Err(bad_request("at least one raw source is required"));
    }

    let job = ImportJob::new(req.tenant_id, req.raw_sources);
    state.jobs.create(&job).await.map_err(internal_error)?;

    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /import-jobs/{id} -- fetch one job record.
pub async fn jobs_get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ImportJob>> {
    let job = state
        .jobs
        .get(id)
        .await
        .map_err(internal_error)?
        .ok_or_else(|| not_found("job", id))?;
    Ok(Json(job))
}

/// POST /import-jobs/{id}/retry -- explicit human retry of a failed or
/// needs_review job. 409 when the job is in any other state.
pub async fn jobs_retry(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ImportJob>> {
    let job = state.jobs.retry(id).await.map_err(store_error)?;
    Ok(Json(job))
}

// ── Worker trigger ────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ProcessResponse {
    pub processed: usize,
}

/// POST /worker/process -- run one batch-processing pass inline.
/// Authorized via the scheduled-invocation header or the bearer secret.
pub async fn worker_process(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<ProcessResponse>> {
    if !authorize_worker(&headers, state.config.worker.secret.as_deref()) {
        return Err(unauthorized());
    }

    let worker = ImportWorker::new(
        format!("http-{}", Uuid::new_v4()),
        Arc::clone(&state.jobs),
        Arc::clone(&state.heartbeats),
        Arc::clone(&state.extractor),
        state.config.worker.clone(),
        ResolverPolicy { accept_threshold: state.config.extraction.accept_threshold },
    );

    let processed = worker.process_once().await.map_err(internal_error)?;
    Ok(Json(ProcessResponse { processed }))
}
