use async_trait::async_trait;
use chrono::{DateTime, Utc};

use marquee_core::WorkerHeartbeat;

use crate::error::StoreError;

/// Durable worker liveness registry. Upsert-only: stale rows age out of
/// the active view rather than being deleted.
#[async_trait]
pub trait HeartbeatStore: Send + Sync {
    async fn record(
        &self,
        worker_id: &str,
        worker_type: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn list(&self) -> Result<Vec<WorkerHeartbeat>, StoreError>;
}
