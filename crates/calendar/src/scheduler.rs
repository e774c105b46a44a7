//! Due-source evaluation and the per-pass sync driver.
//!
//! All schedule state is derived from persisted timestamps; the pass is
//! an explicit, externally-triggered function with no process-wide
//! timers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use marquee_core::{CalendarSyncRun, CalendarSyncSource, RunStatus, SourceStatus};
use marquee_store::CalendarStore;

use crate::error::CalendarError;
use crate::fetch::FeedFetcher;
use crate::import::import_feed;

/// Active sources whose sync interval has elapsed (or that have never
/// synced). Pure over the given `now`.
pub fn due_sources(
    sources: &[CalendarSyncSource],
    now: DateTime<Utc>,
) -> Vec<&CalendarSyncSource> {
    sources
        .iter()
        .filter(|s| s.status == SourceStatus::Active && s.is_due(now))
        .collect()
}

#[derive(Debug, Serialize)]
pub struct SyncOutcome {
    pub source_id: Uuid,
    pub status: RunStatus,
    pub events_processed: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SyncPassReport {
    /// Number of sources attempted this pass.
    pub processed: usize,
    pub results: Vec<SyncOutcome>,
}

/// Run one scheduler pass: evaluate due sources and sync each in turn.
///
/// Every due source gets exactly one run row, success or failure. A
/// fetch or import failure records the error and leaves
/// `last_synced_at` untouched, so the source stays due on the next
/// pass. Store failures propagate: without the store there is nothing
/// to record against.
pub async fn run_sync_pass(
    store: &dyn CalendarStore,
    fetcher: &dyn FeedFetcher,
    now: DateTime<Utc>,
) -> Result<SyncPassReport, CalendarError> {
    let sources = store.list_sources().await?;
    let due: Vec<&CalendarSyncSource> = due_sources(&sources, now);

    info!(due = due.len(), total = sources.len(), "calendar sync pass starting");

    let mut results = Vec::with_capacity(due.len());
    for source in due {
        results.push(sync_source(store, fetcher, source).await?);
    }

    Ok(SyncPassReport { processed: results.len(), results })
}

async fn sync_source(
    store: &dyn CalendarStore,
    fetcher: &dyn FeedFetcher,
    source: &CalendarSyncSource,
) -> Result<SyncOutcome, CalendarError> {
    let started_at = Utc::now();

    let imported = match fetcher.fetch(&source.source_url).await {
        Ok(payload) => {
            import_feed(store, source.tenant_id, source.id, &payload).await
        }
        Err(e) => Err(e),
    };

    let finished_at = Utc::now();
    match imported {
        Ok(outcome) => {
            store
                .record_run(&CalendarSyncRun {
                    id: Uuid::new_v4(),
                    source_id: source.id,
                    status: RunStatus::Success,
                    message: None,
                    events_processed: outcome.count,
                    started_at,
                    finished_at,
                })
                .await?;
            store.mark_synced(source.id, finished_at).await?;

            info!(
                source_id = %source.id,
                events = outcome.count,
                "calendar source synced"
            );
            Ok(SyncOutcome {
                source_id: source.id,
                status: RunStatus::Success,
                events_processed: outcome.count,
                message: None,
            })
        }
        Err(e) => {
            let message = e.to_string();
            store
                .record_run(&CalendarSyncRun {
                    id: Uuid::new_v4(),
                    source_id: source.id,
                    status: RunStatus::Failed,
                    message: Some(message.clone()),
                    events_processed: 0,
                    started_at,
                    finished_at,
                })
                .await?;
            store.mark_sync_failed(source.id, &message).await?;

            warn!(source_id = %source.id, "calendar sync failed: {}", message);
            Ok(SyncOutcome {
                source_id: source.id,
                status: RunStatus::Failed,
                events_processed: 0,
                message: Some(message),
            })
        }
    }
}

#[cfg(test)]
#[path = "scheduler/tests.rs"]
mod tests;
