use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use uuid::Uuid;

use marquee_core::{ExtractedShow, ImportJob};

use crate::error::StoreError;

/// Terminal write produced by the confidence resolver for one job.
#[derive(Debug, Clone)]
pub struct ResolvedUpdate {
    pub extracted: ExtractedShow,
    pub confidence_map: IndexMap<String, f64>,
    /// Full updated error history, including conflict-audit entries.
    pub errors: Vec<String>,
    pub needs_review: bool,
}

/// Durable import-job table — the source of truth for pipeline state.
///
/// Mutating operations that carry a `worker_id` are guarded on the
/// caller still holding the claim; they return `false` (zero rows)
/// when the lease was lost to another worker in the meantime.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create(&self, job: &ImportJob) -> Result<(), StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<ImportJob>, StoreError>;

    /// Atomically claim up to `limit` eligible jobs for `worker_id`,
    /// oldest first. Eligible means `pending`, or `processing` with a
    /// claim older than `lease` (abandoned by a crashed worker). Each
    /// job transitions via its own compare-and-swap; racing workers
    /// never both win a job, the loser simply claims fewer.
    async fn claim_batch(
        &self,
        worker_id: &str,
        limit: u32,
        lease: Duration,
        now: DateTime<Utc>,
    ) -> Result<Vec<ImportJob>, StoreError>;

    /// Write the resolver outcome (`completed` or `needs_review`) and
    /// release the claim.
    async fn mark_resolved(
        &self,
        id: Uuid,
        worker_id: &str,
        update: ResolvedUpdate,
    ) -> Result<bool, StoreError>;

    /// Transient failure: append the error, return the job to `pending`,
    /// and release the claim so any worker may pick it up again.
    async fn requeue(&self, id: Uuid, worker_id: &str, error: &str) -> Result<bool, StoreError>;

    /// Permanent failure: append the error, set `failed`, release the claim.
    async fn mark_failed(&self, id: Uuid, worker_id: &str, error: &str)
        -> Result<bool, StoreError>;

    /// Explicit human-triggered retry: re-queue a `failed` or
    /// `needs_review` job to `pending`, clearing the claim fields.
    async fn retry(&self, id: Uuid) -> Result<ImportJob, StoreError>;
}
