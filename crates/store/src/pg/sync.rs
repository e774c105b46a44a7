use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use marquee_core::{CalendarEvent, CalendarSyncRun, CalendarSyncSource};

use crate::error::StoreError;
use crate::sync::CalendarStore;

use super::rows::{EventRow, RunRow, SourceRow};
use super::PgStore;

const SOURCE_COLUMNS: &str =
    "id, tenant_id, source_url, sync_interval_minutes, last_synced_at, last_error, status";

const EVENT_COLUMNS: &str = "id, tenant_id, source_id, external_uid, title, starts_at, \
     ends_at, location, description, created_at, updated_at";

#[async_trait]
impl CalendarStore for PgStore {
    async fn create_source(&self, source: &CalendarSyncSource) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO calendar_sync_sources
                 (id, tenant_id, source_url, sync_interval_minutes,
                  last_synced_at, last_error, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(source.id)
        .bind(source.tenant_id)
        .bind(&source.source_url)
        .bind(source.sync_interval_minutes)
        .bind(source.last_synced_at)
        .bind(&source.last_error)
        .bind(source.status.as_str())
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn list_sources(&self) -> Result<Vec<CalendarSyncSource>, StoreError> {
        let rows = sqlx::query_as::<_, SourceRow>(&format!(
            "SELECT {SOURCE_COLUMNS} FROM calendar_sync_sources ORDER BY id"
        ))
        .fetch_all(self.pool())
        .await?;
        rows.into_iter().map(CalendarSyncSource::try_from).collect()
    }

    async fn mark_synced(&self, source_id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE calendar_sync_sources
             SET last_synced_at = $1, last_error = NULL
             WHERE id = $2",
        )
        .bind(at)
        .bind(source_id)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn mark_sync_failed(&self, source_id: Uuid, error: &str) -> Result<(), StoreError> {
        sqlx::query("UPDATE calendar_sync_sources SET last_error = $1 WHERE id = $2")
            .bind(error)
            .bind(source_id)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    async fn record_run(&self, run: &CalendarSyncRun) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO calendar_sync_runs
                 (id, source_id, status, message, events_processed, started_at, finished_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(run.id)
        .bind(run.source_id)
        .bind(run.status.as_str())
        .bind(&run.message)
        .bind(run.events_processed)
        .bind(run.started_at)
        .bind(run.finished_at)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn list_runs(
        &self,
        source_id: Uuid,
        limit: i64,
    ) -> Result<Vec<CalendarSyncRun>, StoreError> {
        let rows = sqlx::query_as::<_, RunRow>(
            "SELECT id, source_id, status, message, events_processed, started_at, finished_at
             FROM calendar_sync_runs
             WHERE source_id = $1
             ORDER BY started_at DESC
             LIMIT $2",
        )
        .bind(source_id)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        rows.into_iter().map(CalendarSyncRun::try_from).collect()
    }

    async fn get_event(
        &self,
        source_id: Uuid,
        external_uid: &str,
    ) -> Result<Option<CalendarEvent>, StoreError> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM calendar_events
             WHERE source_id = $1 AND external_uid = $2"
        ))
        .bind(source_id)
        .bind(external_uid)
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(CalendarEvent::from))
    }

    async fn insert_event(&self, event: &CalendarEvent) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO calendar_events
                 (id, tenant_id, source_id, external_uid, title, starts_at,
                  ends_at, location, description, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(event.id)
        .bind(event.tenant_id)
        .bind(event.source_id)
        .bind(&event.external_uid)
        .bind(&event.title)
        .bind(event.starts_at)
        .bind(event.ends_at)
        .bind(&event.location)
        .bind(&event.description)
        .bind(event.created_at)
        .bind(event.updated_at)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn update_event(&self, event: &CalendarEvent) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE calendar_events
             SET title = $1, starts_at = $2, ends_at = $3, location = $4,
                 description = $5, updated_at = $6
             WHERE id = $7",
        )
        .bind(&event.title)
        .bind(event.starts_at)
        .bind(event.ends_at)
        .bind(&event.location)
        .bind(&event.description)
        .bind(event.updated_at)
        .bind(event.id)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn list_events(&self, source_id: Uuid) -> Result<Vec<CalendarEvent>, StoreError> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM calendar_events
             WHERE source_id = $1
             ORDER BY starts_at ASC"
        ))
        .bind(source_id)
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(CalendarEvent::from).collect())
    }
}
