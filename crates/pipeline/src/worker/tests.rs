use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

use marquee_core::config::WorkerConfig;
use marquee_core::{CandidateFact, ImportJob, JobStatus, RawSource};
use marquee_extract::{ExtractError, FactExtractor};
use marquee_store::{JobStore, MemoryStore};

use crate::resolver::ResolverPolicy;
use crate::worker::ImportWorker;

/// Scripted outcomes keyed by the first raw source's text.
enum Script {
    Facts(Vec<CandidateFact>),
    Transient,
    Permanent,
}

struct StubExtractor {
    scripts: HashMap<String, Script>,
    calls: AtomicUsize,
}

impl StubExtractor {
    fn new(scripts: HashMap<String, Script>) -> Self {
        Self { scripts, calls: AtomicUsize::new(0) }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl FactExtractor for StubExtractor {
    async fn extract(&self, sources: &[RawSource]) -> Result<Vec<CandidateFact>, ExtractError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        match self.scripts.get(sources[0].raw_text.as_str()) {
            Some(Script::Facts(facts)) => Ok(facts.clone()),
            Some(Script::Transient) => Err(ExtractError::Api {
                status: 503,
                body: "upstream overloaded".into(),
            }),
            Some(Script::Permanent) => Err(ExtractError::Parse("unintelligible response".into())),
            None => Ok(Vec::new()),
        }
    }
}

fn test_config() -> WorkerConfig {
    WorkerConfig {
        poll_interval_secs: 1,
        batch_size: 10,
        claim_lease_secs: 300,
        max_attempts: 3,
        concurrency: 2,
        heartbeat_staleness_secs: 120,
        secret: None,
    }
}

fn worker_with(
    store: &Arc<MemoryStore>,
    extractor: Arc<StubExtractor>,
) -> ImportWorker {
    ImportWorker::new(
        "worker-test",
        store.clone(),
        store.clone(),
        extractor,
        test_config(),
        ResolverPolicy::default(),
    )
}

fn job_with_text(text: &str) -> ImportJob {
    ImportJob::new(
        Uuid::new_v4(),
        vec![RawSource {
            filename: Some("forwarded.eml".into()),
            mime_type: Some("message/rfc822".into()),
            raw_text: text.into(),
        }],
    )
}

fn confident_facts() -> Vec<CandidateFact> {
    vec![
        CandidateFact::new("title", json!("Midnight Ramble"), 0.95),
        CandidateFact::new("date", json!("2026-07-04"), 0.9),
        CandidateFact::new("venue_name", json!("The Velvet Room"), 0.85),
    ]
}

#[tokio::test]
async fn confident_extraction_completes_the_job() {
    let store = Arc::new(MemoryStore::new());
    let job = job_with_text("show announcement");
    store.create(&job).await.unwrap();

    let extractor = Arc::new(StubExtractor::new(HashMap::from([(
        "show announcement".to_string(),
        Script::Facts(confident_facts()),
    )])));
    let worker = worker_with(&store, Arc::clone(&extractor));

    assert_eq!(worker.process_once().await.unwrap(), 1);

    let stored = store.get(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Completed);
    assert_eq!(
        stored.extracted.as_ref().unwrap().title.as_deref(),
        Some("Midnight Ramble")
    );
    assert_eq!(stored.confidence_map["venue_name"], 0.85);
    assert!(stored.claimed_by.is_none());
    assert!(stored.claimed_at.is_none());
}

#[tokio::test]
async fn missing_required_field_routes_to_review() {
    let store = Arc::new(MemoryStore::new());
    let job = job_with_text("Show at The Venue, July 4");
    store.create(&job).await.unwrap();

    let extractor = Arc::new(StubExtractor::new(HashMap::from([(
        "Show at The Venue, July 4".to_string(),
        Script::Facts(vec![
            CandidateFact::new("title", json!("Show"), 0.9),
            CandidateFact::new("date", json!(null), 0.0),
        ]),
    )])));
    let worker = worker_with(&store, extractor);
    worker.process_once().await.unwrap();

    let stored = store.get(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::NeedsReview);
    assert!(stored.extracted.is_some());
    assert_eq!(stored.confidence_map["date"], 0.0);
}

#[tokio::test]
async fn transient_failures_requeue_until_the_budget_runs_out() {
    let store = Arc::new(MemoryStore::new());
    let job = job_with_text("flaky");
    store.create(&job).await.unwrap();

    let extractor = Arc::new(StubExtractor::new(HashMap::from([(
        "flaky".to_string(),
        Script::Transient,
    )])));
    let worker = worker_with(&store, extractor);

    // Attempts 1 and 2 re-queue.
    worker.process_once().await.unwrap();
    let stored = store.get(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Pending);
    assert_eq!(stored.errors.len(), 1);

    worker.process_once().await.unwrap();
    let stored = store.get(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Pending);
    assert_eq!(stored.errors.len(), 2);

    // Attempt 3 exhausts the budget.
    worker.process_once().await.unwrap();
    let stored = store.get(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Failed);
    assert_eq!(stored.errors.len(), 3);
    assert!(stored.errors[2].contains("retry budget exhausted"));

    // A failed job is out of the queue.
    assert_eq!(worker.process_once().await.unwrap(), 0);
}

#[tokio::test]
async fn permanent_failure_fails_without_retrying() {
    let store = Arc::new(MemoryStore::new());
    let job = job_with_text("garbled");
    store.create(&job).await.unwrap();

    let extractor = Arc::new(StubExtractor::new(HashMap::from([(
        "garbled".to_string(),
        Script::Permanent,
    )])));
    let worker = worker_with(&store, Arc::clone(&extractor));
    worker.process_once().await.unwrap();

    let stored = store.get(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Failed);
    assert_eq!(stored.errors.len(), 1);
    assert!(stored.errors[0].contains("extraction failed"));
    assert_eq!(extractor.call_count(), 1);
}

#[tokio::test]
async fn blank_input_fails_before_calling_the_adapter() {
    let store = Arc::new(MemoryStore::new());
    let job = job_with_text("   ");
    store.create(&job).await.unwrap();

    let extractor = Arc::new(StubExtractor::new(HashMap::new()));
    let worker = worker_with(&store, Arc::clone(&extractor));
    worker.process_once().await.unwrap();

    let stored = store.get(job.id).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Failed);
    assert!(stored.errors[0].contains("no usable raw sources"));
    assert_eq!(extractor.call_count(), 0);
}

#[tokio::test]
async fn one_bad_job_does_not_poison_the_batch() {
    let store = Arc::new(MemoryStore::new());
    let bad = job_with_text("garbled");
    let good = job_with_text("show announcement");
    store.create(&bad).await.unwrap();
    store.create(&good).await.unwrap();

    let extractor = Arc::new(StubExtractor::new(HashMap::from([
        ("garbled".to_string(), Script::Permanent),
        (
            "show announcement".to_string(),
            Script::Facts(confident_facts()),
        ),
    ])));
    let worker = worker_with(&store, extractor);

    assert_eq!(worker.process_once().await.unwrap(), 2);
    assert_eq!(
        store.get(bad.id).await.unwrap().unwrap().status,
        JobStatus::Failed
    );
    assert_eq!(
        store.get(good.id).await.unwrap().unwrap().status,
        JobStatus::Completed
    );
}

#[tokio::test]
async fn heartbeats_are_recorded_each_pass() {
    use marquee_store::HeartbeatStore;

    let store = Arc::new(MemoryStore::new());
    let extractor = Arc::new(StubExtractor::new(HashMap::new()));
    let worker = worker_with(&store, extractor);

    worker.process_once().await.unwrap();

    let beats = HeartbeatStore::list(store.as_ref()).await.unwrap();
    assert_eq!(beats.len(), 1);
    assert_eq!(beats[0].worker_id, "worker-test");
    assert_eq!(beats[0].worker_type, "import");
}
