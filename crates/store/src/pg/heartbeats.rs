use async_trait::async_trait;
use chrono::{DateTime, Utc};

use marquee_core::WorkerHeartbeat;

use crate::error::StoreError;
use crate::heartbeats::HeartbeatStore;

use super::rows::HeartbeatRow;
use super::PgStore;

#[async_trait]
impl HeartbeatStore for PgStore {
    async fn record(
        &self,
        worker_id: &str,
        worker_type: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO worker_heartbeats (worker_id, worker_type, last_seen_at)
             VALUES ($1, $2, $3)
             ON CONFLICT (worker_id)
             DO UPDATE SET worker_type = $2, last_seen_at = $3",
        )
        .bind(worker_id)
        .bind(worker_type)
        .bind(now)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<WorkerHeartbeat>, StoreError> {
        let rows = sqlx::query_as::<_, HeartbeatRow>(
            "SELECT worker_id, worker_type, last_seen_at
             FROM worker_heartbeats
             ORDER BY last_seen_at DESC",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(WorkerHeartbeat::from).collect())
    }
}
