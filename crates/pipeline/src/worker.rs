//! The worker loop: claim a batch, extract, resolve, persist, repeat.
//!
//! Failures are captured into the affected job's record; a bad job
//! never aborts the batch or crashes the loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::StreamExt;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use marquee_core::config::WorkerConfig;
use marquee_core::ImportJob;
use marquee_extract::FactExtractor;
use marquee_store::{HeartbeatStore, JobStore, ResolvedUpdate, StoreError};

use crate::resolver::{resolve, ResolverPolicy};

const WORKER_TYPE: &str = "import";

/// One import-worker instance. Stateless between iterations; any number
/// of instances may run against the same store.
pub struct ImportWorker {
    jobs: Arc<dyn JobStore>,
    heartbeats: Arc<dyn HeartbeatStore>,
    extractor: Arc<dyn FactExtractor>,
    config: WorkerConfig,
    policy: ResolverPolicy,
    worker_id: String,
    shutdown: Arc<AtomicBool>,
}

impl ImportWorker {
    pub fn new(
        worker_id: impl Into<String>,
        jobs: Arc<dyn JobStore>,
        heartbeats: Arc<dyn HeartbeatStore>,
        extractor: Arc<dyn FactExtractor>,
        config: WorkerConfig,
        policy: ResolverPolicy,
    ) -> Self {
        Self {
            jobs,
            heartbeats,
            extractor,
            config,
            policy,
            worker_id: worker_id.into(),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle for external shutdown signaling. Setting the flag stops
    /// the loop from claiming new batches; in-flight jobs finish first.
    pub fn shutdown_signal(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Poll loop: sleep, claim, process, repeat until shutdown.
    pub async fn run(&self) {
        info!(worker_id = %self.worker_id, "import worker started");
        let poll = Duration::from_secs(self.config.poll_interval_secs.max(1));

        while !self.shutdown.load(Ordering::Relaxed) {
            match self.process_once().await {
                Ok(0) => {}
                Ok(n) => debug!(worker_id = %self.worker_id, processed = n, "batch processed"),
                Err(e) => {
                    warn!(worker_id = %self.worker_id, "claim pass failed: {}, backing off", e);
                }
            }
            tokio::time::sleep(poll).await;
        }

        info!(worker_id = %self.worker_id, "import worker stopped");
    }

    /// One batch-processing pass: heartbeat, claim, process each claimed
    /// job with bounded concurrency. Returns the number of jobs claimed.
    pub async fn process_once(&self) -> Result<usize, StoreError> {
        let now = Utc::now();

        // Liveness only: a failed heartbeat write must not stop processing.
        if let Err(e) = self
            .heartbeats
            .record(&self.worker_id, WORKER_TYPE, now)
            .await
        {
            warn!(worker_id = %self.worker_id, "heartbeat write failed: {}", e);
        }

        let batch = self
            .jobs
            .claim_batch(
                &self.worker_id,
                self.config.batch_size,
                self.config.claim_lease(),
                now,
            )
            .await?;

        if batch.is_empty() {
            return Ok(0);
        }

        let count = batch.len();
        // Bounded fan-out to respect the extraction adapter's rate
        // limits; jobs are started in claim (created_at) order.
        futures::stream::iter(batch)
            .map(|job| self.process_job(job))
            .buffer_unordered(self.config.concurrency.max(1))
            .collect::<Vec<()>>()
            .await;

        Ok(count)
    }

    async fn process_job(&self, job: ImportJob) {
        let job_id = job.id;

        // Non-retryable: detectable before spending an adapter call.
        if job
            .raw_sources
            .iter()
            .all(|s| s.raw_text.trim().is_empty())
        {
            self.finish_failed(job_id, "no usable raw sources attached").await;
            return;
        }

        match self.extractor.extract(&job.raw_sources).await {
            Ok(facts) => {
                let resolution = resolve(&facts, &self.policy);
                let mut errors = job.errors;
                errors.extend(resolution.audit);

                let needs_review = resolution.needs_review;
                let update = ResolvedUpdate {
                    extracted: resolution.extracted,
                    confidence_map: resolution.confidence_map,
                    errors,
                    needs_review,
                };

                match self.jobs.mark_resolved(job_id, &self.worker_id, update).await {
                    Ok(true) => {
                        info!(job_id = %job_id, needs_review, "job resolved");
                    }
                    Ok(false) => {
                        warn!(job_id = %job_id, "claim lease lost before resolution was written");
                    }
                    Err(e) => {
                        // The job stays `processing` and will be
                        // reclaimed once its lease expires.
                        error!(job_id = %job_id, "failed to persist resolution: {}", e);
                    }
                }
            }
            Err(e) if e.is_transient() => {
                if job.attempts() + 1 >= self.config.max_attempts as usize {
                    self.finish_failed(job_id, &format!("retry budget exhausted: {}", e))
                        .await;
                } else {
                    let message = format!("transient extraction failure: {}", e);
                    match self.jobs.requeue(job_id, &self.worker_id, &message).await {
                        Ok(true) => info!(job_id = %job_id, "job re-queued for retry"),
                        Ok(false) => {
                            warn!(job_id = %job_id, "claim lease lost before re-queue")
                        }
                        Err(e) => error!(job_id = %job_id, "failed to re-queue job: {}", e),
                    }
                }
            }
            Err(e) => {
                self.finish_failed(job_id, &format!("extraction failed: {}", e))
                    .await;
            }
        }
    }

    async fn finish_failed(&self, job_id: Uuid, message: &str) {
        match self.jobs.mark_failed(job_id, &self.worker_id, message).await {
            Ok(true) => warn!(job_id = %job_id, "job failed: {}", message),
            Ok(false) => warn!(job_id = %job_id, "claim lease lost before failure was written"),
            Err(e) => error!(job_id = %job_id, "failed to persist job failure: {}", e),
        }
    }
}

#[cfg(test)]
#[path = "worker/tests.rs"]
mod tests;
