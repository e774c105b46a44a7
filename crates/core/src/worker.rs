use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Liveness record for one worker process. Upserted on every heartbeat,
/// never deleted — stale rows simply age out of the active view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerHeartbeat {
    /// Caller-supplied identifier, stable for the worker's lifetime.
    pub worker_id: String,
    pub worker_type: String,
    pub last_seen_at: DateTime<Utc>,
}

impl WorkerHeartbeat {
    pub fn is_active(&self, now: DateTime<Utc>, staleness: Duration) -> bool {
        now.signed_duration_since(self.last_seen_at) < staleness
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heartbeat_staleness_boundary() {
        let now = Utc::now();
        let hb = WorkerHeartbeat {
            worker_id: "w1".into(),
            worker_type: "import".into(),
            last_seen_at: now - Duration::seconds(120),
        };
        // exactly at the threshold is stale
        assert!(!hb.is_active(now, Duration::seconds(120)));
        assert!(hb.is_active(now, Duration::seconds(121)));
    }
}
