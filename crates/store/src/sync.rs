use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use marquee_core::{CalendarEvent, CalendarSyncRun, CalendarSyncSource};

use crate::error::StoreError;

/// Calendar feed subscriptions, their run history, and the local event
/// records the diff/import engine maintains.
#[async_trait]
pub trait CalendarStore: Send + Sync {
    async fn create_source(&self, source: &CalendarSyncSource) -> Result<(), StoreError>;

    async fn list_sources(&self) -> Result<Vec<CalendarSyncSource>, StoreError>;

    /// Advance `last_synced_at` after a successful run and clear any
    /// previous error.
    async fn mark_synced(&self, source_id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Record a fetch/import failure. `last_synced_at` is deliberately
    /// left unchanged so the source stays due on the next pass.
    async fn mark_sync_failed(&self, source_id: Uuid, error: &str) -> Result<(), StoreError>;

    /// Append one run-history row. Called exactly once per due source
    /// per scheduler pass, success or failure.
    async fn record_run(&self, run: &CalendarSyncRun) -> Result<(), StoreError>;

    async fn list_runs(&self, source_id: Uuid, limit: i64)
        -> Result<Vec<CalendarSyncRun>, StoreError>;

    async fn get_event(
        &self,
        source_id: Uuid,
        external_uid: &str,
    ) -> Result<Option<CalendarEvent>, StoreError>;

    async fn insert_event(&self, event: &CalendarEvent) -> Result<(), StoreError>;

    async fn update_event(&self, event: &CalendarEvent) -> Result<(), StoreError>;

    async fn list_events(&self, source_id: Uuid) -> Result<Vec<CalendarEvent>, StoreError>;
}
