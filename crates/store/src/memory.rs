//! In-memory store with the same conditional-write semantics as the
//! Postgres implementation. Backs the test suites of the pipeline,
//! calendar, and server crates.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use marquee_core::{
    CalendarEvent, CalendarSyncRun, CalendarSyncSource, ImportJob, JobStatus, WorkerHeartbeat,
};

use crate::error::StoreError;
use crate::heartbeats::HeartbeatStore;
use crate::jobs::{JobStore, ResolvedUpdate};
use crate::sync::CalendarStore;

#[derive(Default)]
struct Inner {
    jobs: HashMap<Uuid, ImportJob>,
    heartbeats: HashMap<String, WorkerHeartbeat>,
    sources: HashMap<Uuid, CalendarSyncSource>,
    runs: Vec<CalendarSyncRun>,
    events: HashMap<(Uuid, String), CalendarEvent>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn eligible(job: &ImportJob, lease_cutoff: DateTime<Utc>) -> bool {
    match job.status {
        JobStatus::Pending => true,
        JobStatus::Processing => job.claimed_at.map(|at| at < lease_cutoff).unwrap_or(false),
        _ => false,
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn create(&self, job: &ImportJob) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.jobs.insert(job.id, job.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<ImportJob>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.jobs.get(&id).cloned())
    }

    async fn claim_batch(
        &self,
        worker_id: &str,
        limit: u32,
        lease: Duration,
        now: DateTime<Utc>,
    ) -> Result<Vec<ImportJob>, StoreError> {
        let lease_cutoff = now - lease;
        let mut inner = self.inner.lock().unwrap();

        let mut candidates: Vec<(DateTime<Utc>, Uuid)> = inner
            .jobs
            .values()
            .filter(|j| eligible(j, lease_cutoff))
            .map(|j| (j.created_at, j.id))
            .collect();
        candidates.sort();
        candidates.truncate(limit as usize);

        let mut claimed = Vec::with_capacity(candidates.len());
        for (_, id) in candidates {
            if let Some(job) = inner.jobs.get_mut(&id) {
                if eligible(job, lease_cutoff) {
                    job.status = JobStatus::Processing;
                    job.claimed_by = Some(worker_id.to_string());
                    job.claimed_at = Some(now);
                    job.updated_at = now;
                    claimed.push(job.clone());
                }
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
        let mut inner = self.inner.lock().unwrap();
        match inner.jobs.get_mut(&id) {
            Some(job)
                if job.status == JobStatus::Processing
                    && job.claimed_by.as_deref() == Some(worker_id) =>
            {
                job.status = if update.needs_review {
                    JobStatus::NeedsReview
                } else {
                    JobStatus::Completed
                };
                job.extracted = Some(update.extracted);
                job.confidence_map = update.confidence_map;
                job.errors = update.errors;
                job.claimed_by = None;
                job.claimed_at = None;
                job.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn requeue(&self, id: Uuid, worker_id: &str, error: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.jobs.get_mut(&id) {
            Some(job)
                if job.status == JobStatus::Processing
                    && job.claimed_by.as_deref() == Some(worker_id) =>
            {
                job.status = JobStatus::Pending;
                job.errors.push(error.to_string());
                job.claimed_by = None;
                job.claimed_at = None;
                job.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_failed(
        &self,
        id: Uuid,
        worker_id: &str,
        error: &str,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.jobs.get_mut(&id) {
            Some(job)
                if job.status == JobStatus::Processing
                    && job.claimed_by.as_deref() == Some(worker_id) =>
            {
                job.status = JobStatus::Failed;
                job.errors.push(error.to_string());
                job.claimed_by = None;
                job.claimed_at = None;
                job.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn retry(&self, id: Uuid) -> Result<ImportJob, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.jobs.get_mut(&id) {
            Some(job) if job.status.is_retryable() => {
                job.status = JobStatus::Pending;
                job.claimed_by = None;
                job.claimed_at = None;
                job.updated_at = Utc::now();
                Ok(job.clone())
            }
            Some(job) => Err(StoreError::Conflict(format!(
                "job {} is {} and cannot be retried",
                id, job.status
            ))),
            None => Err(StoreError::not_found("job", id)),
        }
    }
}

#[async_trait]
impl HeartbeatStore for MemoryStore {
    async fn record(
        &self,
        worker_id: &str,
        worker_type: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.heartbeats.insert(
            worker_id.to_string(),
            WorkerHeartbeat {
                worker_id: worker_id.to_string(),
                worker_type: worker_type.to_string(),
                last_seen_at: now,
            },
        );
        Ok(())
    }

    async fn list(&self) -> Result<Vec<WorkerHeartbeat>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut out: Vec<_> = inner.heartbeats.values().cloned().collect();
        out.sort_by(|a, b| b.last_seen_at.cmp(&a.last_seen_at));
        Ok(out)
    }
}

#[async_trait]
impl CalendarStore for MemoryStore {
    async fn create_source(&self, source: &CalendarSyncSource) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.sources.insert(source.id, source.clone());
        Ok(())
    }

    async fn list_sources(&self) -> Result<Vec<CalendarSyncSource>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut out: Vec<_> = inner.sources.values().cloned().collect();
        out.sort_by_key(|s| s.id);
        Ok(out)
    }

    async fn mark_synced(&self, source_id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let source = inner
            .sources
            .get_mut(&source_id)
            .ok_or_else(|| StoreError::not_found("source", source_id))?;
        source.last_synced_at = Some(at);
        source.last_error = None;
        Ok(())
    }

    async fn mark_sync_failed(&self, source_id: Uuid, error: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let source = inner
            .sources
            .get_mut(&source_id)
            .ok_or_else(|| StoreError::not_found("source", source_id))?;
        source.last_error = Some(error.to_string());
        Ok(())
    }

    async fn record_run(&self, run: &CalendarSyncRun) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.runs.push(run.clone());
        Ok(())
    }

    async fn list_runs(
        &self,
        source_id: Uuid,
        limit: i64,
    ) -> Result<Vec<CalendarSyncRun>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut out: Vec<_> = inner
            .runs
            .iter()
            .filter(|r| r.source_id == source_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        out.truncate(limit as usize);
        Ok(out)
    }

    async fn get_event(
        &self,
        source_id: Uuid,
        external_uid: &str,
    ) -> Result<Option<CalendarEvent>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.events.get(&(source_id, external_uid.to_string())).cloned())
    }

    async fn insert_event(&self, event: &CalendarEvent) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let key = (event.source_id, event.external_uid.clone());
        if inner.events.contains_key(&key) {
            return Err(StoreError::Conflict(format!(
                "event already exists for uid {}",
                event.external_uid
            )));
        }
        inner.events.insert(key, event.clone());
        Ok(())
    }

    async fn update_event(&self, event: &CalendarEvent) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let key = (event.source_id, event.external_uid.clone());
        match inner.events.get_mut(&key) {
            Some(existing) => {
                *existing = event.clone();
                Ok(())
            }
            None => Err(StoreError::not_found("event", event.id)),
        }
    }

    async fn list_events(&self, source_id: Uuid) -> Result<Vec<CalendarEvent>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut out: Vec<_> = inner
            .events
            .values()
            .filter(|e| e.source_id == source_id)
            .cloned()
            .collect();
        out.sort_by_key(|e| e.starts_at);
        Ok(out)
    }
}
