//! Row structs and conversions between SQL rows and domain types.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use uuid::Uuid;

use marquee_core::{
    CalendarEvent, CalendarSyncRun, CalendarSyncSource, ExtractedShow, ImportJob, RawSource,
    WorkerHeartbeat,
};

use crate::error::StoreError;

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct JobRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub status: String,
    pub raw_sources: serde_json::Value,
    pub extracted: Option<serde_json::Value>,
    pub confidence_map: serde_json::Value,
    pub errors: serde_json::Value,
    pub claimed_by: Option<String>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Column list matching `JobRow`, shared by every job query.
pub(crate) const JOB_COLUMNS: &str = "id, tenant_id, status, raw_sources, extracted, \
     confidence_map, errors, claimed_by, claimed_at, created_at, updated_at";

impl TryFrom<JobRow> for ImportJob {
    type Error = StoreError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse()
            .map_err(|e| StoreError::CorruptRow(format!("job {}: {}", row.id, e)))?;
        let raw_sources: Vec<RawSource> = serde_json::from_value(row.raw_sources)?;
        let extracted: Option<ExtractedShow> =
            row.extracted.map(serde_json::from_value).transpose()?;
        let confidence_map: IndexMap<String, f64> = serde_json::from_value(row.confidence_map)?;
        let errors: Vec<String> = serde_json::from_value(row.errors)?;

        Ok(ImportJob {
            id: row.id,
            tenant_id: row.tenant_id,
            status,
            raw_sources,
            extracted,
            confidence_map,
            errors,
            claimed_by: row.claimed_by,
            claimed_at: row.claimed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct HeartbeatRow {
    pub worker_id: String,
    pub worker_type: String,
    pub last_seen_at: DateTime<Utc>,
}

impl From<HeartbeatRow> for WorkerHeartbeat {
    fn from(row: HeartbeatRow) -> Self {
        WorkerHeartbeat {
            worker_id: row.worker_id,
            worker_type: row.worker_type,
            last_seen_at: row.last_seen_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct SourceRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub source_url: String,
    pub sync_interval_minutes: i32,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub status: String,
}

impl TryFrom<SourceRow> for CalendarSyncSource {
    type Error = StoreError;

    fn try_from(row: SourceRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse()
            .map_err(|e| StoreError::CorruptRow(format!("source {}: {}", row.id, e)))?;
        Ok(CalendarSyncSource {
            id: row.id,
            tenant_id: row.tenant_id,
            source_url: row.source_url,
            sync_interval_minutes: row.sync_interval_minutes,
            last_synced_at: row.last_synced_at,
            last_error: row.last_error,
            status,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct RunRow {
    pub id: Uuid,
    pub source_id: Uuid,
    pub status: String,
    pub message: Option<String>,
    pub events_processed: i32,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl TryFrom<RunRow> for CalendarSyncRun {
    type Error = StoreError;

    fn try_from(row: RunRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse()
            .map_err(|e| StoreError::CorruptRow(format!("run {}: {}", row.id, e)))?;
        Ok(CalendarSyncRun {
            id: row.id,
            source_id: row.source_id,
            status,
            message: row.message,
            events_processed: row.events_processed,
            started_at: row.started_at,
            finished_at: row.finished_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct EventRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub source_id: Uuid,
    pub external_uid: String,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EventRow> for CalendarEvent {
    fn from(row: EventRow) -> Self {
        CalendarEvent {
            id: row.id,
            tenant_id: row.tenant_id,
            source_id: row.source_id,
            external_uid: row.external_uid,
            title: row.title,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
            location: row.location,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
