//! HTTP handlers, grouped by surface.

mod calendar;
mod health;
mod jobs;

pub use calendar::*;
pub use health::*;
pub use jobs::*;

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use marquee_store::StoreError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);
pub(crate) type ApiResult<T> = Result<T, ApiError>;

pub(crate) fn internal_error(e: impl std::fmt::Display) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse { error: e.to_string() }),
    )
}

pub(crate) fn not_found(resource: &str, id: Uuid) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse { error: format!("{} not found: {}", resource, id) }),
    )
}

pub(crate) fn bad_request(msg: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: msg.into() }))
}

pub(crate) fn unauthorized() -> ApiError {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse { error: "unauthorized".into() }),
    )
}

/// Map store failures onto response codes, keeping 500 for genuine
/// store trouble only.
pub(crate) fn store_error(e: StoreError) -> ApiError {
    match e {
        StoreError::NotFound { what, id } => not_found(what, id),
        StoreError::Conflict(msg) => (StatusCode::CONFLICT, Json(ErrorResponse { error: msg })),
        other => internal_error(other),
    }
}
