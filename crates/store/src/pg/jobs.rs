use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::debug;
use uuid::Uuid;

use marquee_core::ImportJob;

use crate::error::StoreError;
use crate::jobs::{JobStore, ResolvedUpdate};

use super::rows::{JobRow, JOB_COLUMNS};
use super::PgStore;

/// Wrap a single error string as a one-element JSONB array for `||` append.
fn error_entry(error: &str) -> serde_json::Value {
    serde_json::Value::Array(vec![serde_json::Value::String(error.to_string())])
}

#[async_trait]
impl JobStore for PgStore {
    async fn create(&self, job: &ImportJob) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO import_jobs
                 (id, tenant_id, status, raw_sources, extracted, confidence_map,
                  errors, claimed_by, claimed_at, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(job.id)
        .bind(job.tenant_id)
        .bind(job.status.as_str())
        .bind(serde_json::to_value(&job.raw_sources)?)
        .bind(job.extracted.as_ref().map(serde_json::to_value).transpose()?)
        .bind(serde_json::to_value(&job.confidence_map)?)
        .bind(serde_json::to_value(&job.errors)?)
        .bind(&job.claimed_by)
        .bind(job.claimed_at)
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<ImportJob>, StoreError> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM import_jobs WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        row.map(ImportJob::try_from).transpose()
    }

    async fn claim_batch(
        &self,
        worker_id: &str,
        limit: u32,
        lease: Duration,
        now: DateTime<Utc>,
    ) -> Result<Vec<ImportJob>, StoreError> {
        let lease_cutoff = now - lease;

        // Candidate scan, then one compare-and-swap per job. A candidate
        // snatched by another worker between the two statements fails its
        // CAS and is simply skipped — this worker claims fewer jobs.
        let candidates: Vec<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM import_jobs
             WHERE status = 'pending'
                OR (status = 'processing' AND claimed_at < $1)
             ORDER BY created_at ASC
             LIMIT $2",
        )
        .bind(lease_cutoff)
        .bind(limit as i64)
        .fetch_all(self.pool())
        .await?;

        let mut claimed = Vec::with_capacity(candidates.len());
        for (id,) in candidates {
            let row = sqlx::query_as::<_, JobRow>(&format!(
                "UPDATE import_jobs
                 SET status = 'processing', claimed_by = $1, claimed_at = $2, updated_at = $2
                 WHERE id = $3
                   AND (status = 'pending'
                        OR (status = 'processing' AND claimed_at < $4))
                 RETURNING {JOB_COLUMNS}"
            ))
            .bind(worker_id)
            .bind(now)
            .bind(id)
            .bind(lease_cutoff)
            .fetch_optional(self.pool())
            .await?;

            match row {
                Some(row) => claimed.push(ImportJob::try_from(row)?),
                None => debug!(job_id = %id, worker_id, "lost claim race, skipping"),
            }
        }

        Ok(claimed)
    }

    async fn mark_resolved(
        &self,
        id: Uuid,
        worker_id: &str,
        update: ResolvedUpdate,
    ) -> Result<bool, StoreError> {
        let status = if update.needs_review { "needs_review" } else { "completed" };
        let result = sqlx::query(
            "UPDATE import_jobs
             SET status = $1, extracted = $2, confidence_map = $3, errors = $4,
                 claimed_by = NULL, claimed_at = NULL, updated_at = $5
             WHERE id = $6 AND status = 'processing' AND claimed_by = $7",
        )
        .bind(status)
        .bind(serde_json::to_value(&update.extracted)?)
        .bind(serde_json::to_value(&update.confidence_map)?)
        .bind(serde_json::to_value(&update.errors)?)
        .bind(Utc::now())
        .bind(id)
        .bind(worker_id)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn requeue(&self, id: Uuid, worker_id: &str, error: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE import_jobs
             SET status = 'pending', errors = errors || $1,
                 claimed_by = NULL, claimed_at = NULL, updated_at = $2
             WHERE id = $3 AND status = 'processing' AND claimed_by = $4",
        )
        .bind(error_entry(error))
        .bind(Utc::now())
        .bind(id)
        .bind(worker_id)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn mark_failed(
        &self,
        id: Uuid,
        worker_id: &str,
        error: &str,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE import_jobs
             SET status = 'failed', errors = errors || $1,
                 claimed_by = NULL, claimed_at = NULL, updated_at = $2
             WHERE id = $3 AND status = 'processing' AND claimed_by = $4",
        )
        .bind(error_entry(error))
        .bind(Utc::now())
        .bind(id)
        .bind(worker_id)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn retry(&self, id: Uuid) -> Result<ImportJob, StoreError> {
        let row = sqlx::query_as::<_, JobRow>(&format!(
            "UPDATE import_jobs
             SET status = 'pending', claimed_by = NULL, claimed_at = NULL, updated_at = $1
             WHERE id = $2 AND status IN ('failed', 'needs_review')
             RETURNING {JOB_COLUMNS}"
        ))
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        match row {
            Some(row) => ImportJob::try_from(row),
            None => match self.get(id).await? {
                Some(job) => Err(StoreError::Conflict(format!(
                    "job {} is {} and cannot be retried",
                    id, job.status
                ))),
                None => Err(StoreError::not_found("job", id)),
            },
        }
    }
}
