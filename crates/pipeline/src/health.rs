//! Pipeline staffing view derived from the heartbeat registry.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use marquee_store::HeartbeatStore;

#[derive(Debug, Serialize)]
pub struct WorkerStatus {
    pub worker_id: String,
    pub worker_type: String,
    pub last_seen_at: DateTime<Utc>,
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct WorkerHealth {
    /// True iff at least one worker heartbeat is fresh. Observability
    /// only; job acceptance is never gated on this.
    pub healthy: bool,
    pub active_workers: usize,
    pub workers: Vec<WorkerStatus>,
}

/// Build the staffing report. A store failure degrades to an unhealthy
/// report instead of propagating: alerting must keep working when the
/// store does not.
pub async fn health_report(
    store: &dyn HeartbeatStore,
    now: DateTime<Utc>,
    staleness: Duration,
) -> WorkerHealth {
    let heartbeats = match store.list().await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!("heartbeat registry unavailable: {}", e);
            return WorkerHealth { healthy: false, active_workers: 0, workers: Vec::new() };
        }
    };

    let workers: Vec<WorkerStatus> = heartbeats
        .into_iter()
        .map(|hb| {
            let active = hb.is_active(now, staleness);
            WorkerStatus {
                worker_id: hb.worker_id,
                worker_type: hb.worker_type,
                last_seen_at: hb.last_seen_at,
                active,
            }
        })
        .collect();

    let active_workers = workers.iter().filter(|w| w.active).count();
    WorkerHealth { healthy: active_workers > 0, active_workers, workers }
}
