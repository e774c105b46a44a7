use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use marquee_core::{CalendarSyncSource, RunStatus, SourceStatus};
use marquee_store::{CalendarStore, MemoryStore};

use crate::error::CalendarError;
use crate::fetch::FeedFetcher;
use crate::scheduler::{due_sources, run_sync_pass};

/// Serves canned payloads by URL; unknown URLs fail like a dead host.
struct StubFetcher {
    payloads: HashMap<String, String>,
}

#[async_trait]
impl FeedFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<String, CalendarError> {
        match self.payloads.get(url) {
            Some(payload) => Ok(payload.clone()),
            None => Err(CalendarError::Status { status: 502 }),
        }
    }
}

const FEED: &str = "BEGIN:VEVENT\nUID:a@feed\nSUMMARY:Opening Night\nDTSTART:20260901T200000Z\nEND:VEVENT\n";

fn source(
    url: &str,
    interval: i32,
    now: chrono::DateTime<Utc>,
    synced_minutes_ago: Option<i64>,
) -> CalendarSyncSource {
    let mut s = CalendarSyncSource::new(Uuid::new_v4(), url, interval).unwrap();
    s.last_synced_at = synced_minutes_ago.map(|m| now - Duration::minutes(m));
    s
}

#[test]
fn due_calculation_boundaries() {
    let now = Utc::now();
    let never = source("u", 60, now, None);
    let fresh = source("u", 60, now, Some(59));
    let exact = source("u", 60, now, Some(60));
    let overdue = source("u", 60, now, Some(90));
    let mut paused = source("u", 60, now, None);
    paused.status = SourceStatus::Paused;

    let sources = vec![never.clone(), fresh, exact.clone(), overdue.clone(), paused];
    let due = due_sources(&sources, now);
    let due_ids: Vec<Uuid> = due.iter().map(|s| s.id).collect();

    assert!(due_ids.contains(&never.id));
    assert!(due_ids.contains(&exact.id));
    assert!(due_ids.contains(&overdue.id));
    assert_eq!(due_ids.len(), 3);
}

#[tokio::test]
async fn successful_pass_records_a_run_and_advances_the_clock() {
    let store = MemoryStore::new();
    // 60-minute interval, last synced 90 minutes ago: due.
    let src = source("https://venue.example/feed.ics", 60, Utc::now(), Some(90));
    store.create_source(&src).await.unwrap();

    let fetcher = StubFetcher {
        payloads: HashMap::from([(src.source_url.clone(), FEED.to_string())]),
    };

    let report = run_sync_pass(&store, &fetcher, Utc::now()).await.unwrap();
    assert_eq!(report.processed, 1);
    assert_eq!(report.results[0].status, RunStatus::Success);
    assert_eq!(report.results[0].events_processed, 1);

    let runs = store.list_runs(src.id, 10).await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, RunStatus::Success);
    assert_eq!(runs[0].events_processed, 1);

    let stored = &store.list_sources().await.unwrap()[0];
    assert!(stored.last_synced_at.unwrap() > src.last_synced_at.unwrap());
    assert!(stored.last_error.is_none());

    // No longer due immediately after the pass.
    let report = run_sync_pass(&store, &fetcher, Utc::now()).await.unwrap();
    assert_eq!(report.processed, 0);
}

#[tokio::test]
async fn failed_fetch_keeps_the_source_due() {
    let store = MemoryStore::new();
    let src = source("https://dead.example/feed.ics", 60, Utc::now(), None);
    store.create_source(&src).await.unwrap();

    let fetcher = StubFetcher { payloads: HashMap::new() };

    let report = run_sync_pass(&store, &fetcher, Utc::now()).await.unwrap();
    assert_eq!(report.processed, 1);
    assert_eq!(report.results[0].status, RunStatus::Failed);

    // One run row, the error recorded, last_synced_at untouched.
    let runs = store.list_runs(src.id, 10).await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, RunStatus::Failed);
    assert!(runs[0].message.as_deref().unwrap().contains("502"));

    let stored = &store.list_sources().await.unwrap()[0];
    assert!(stored.last_synced_at.is_none());
    assert!(stored.last_error.is_some());

    // Still due: the next pass tries again and appends another run.
    run_sync_pass(&store, &fetcher, Utc::now()).await.unwrap();
    assert_eq!(store.list_runs(src.id, 10).await.unwrap().len(), 2);
}

#[tokio::test]
async fn repeated_passes_are_idempotent_on_events() {
    let store = MemoryStore::new();
    let src = source("https://venue.example/feed.ics", 60, Utc::now(), None);
    store.create_source(&src).await.unwrap();

    let fetcher = StubFetcher {
        payloads: HashMap::from([(src.source_url.clone(), FEED.to_string())]),
    };

    let now = Utc::now();
    run_sync_pass(&store, &fetcher, now).await.unwrap();
    // Force the source due again and re-sync the identical feed.
    let report = run_sync_pass(&store, &fetcher, now + Duration::minutes(61))
        .await
        .unwrap();

    assert_eq!(report.processed, 1);
    // Second pass saw no genuine changes.
    assert_eq!(report.results[0].events_processed, 0);
    assert_eq!(store.list_events(src.id).await.unwrap().len(), 1);
}
