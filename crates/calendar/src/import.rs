//! Diff/import engine: turn a fetched feed into create/update operations
//! against local event records, keyed by the feed-provided UID.

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use marquee_core::CalendarEvent;
use marquee_store::CalendarStore;

use crate::error::CalendarError;
use crate::feed::parse_feed;

#[derive(Debug, Default)]
pub struct ImportOutcome {
    /// Genuine changes only: events created plus events whose fields
    /// actually differed. Re-importing an identical feed yields 0.
    pub count: i32,
    /// Feed events dropped by the parser.
    pub skipped: usize,
}

/// Import one fetched feed payload for a source.
///
/// Idempotent: the feed UID is the idempotency key, so repeated imports
/// of the same payload update rather than duplicate, and unchanged
/// events are left untouched.
pub async fn import_feed(
    store: &dyn CalendarStore,
    tenant_id: Uuid,
    source_id: Uuid,
    payload: &str,
) -> Result<ImportOutcome, CalendarError> {
    let parsed = parse_feed(payload);
    let mut outcome = ImportOutcome { count: 0, skipped: parsed.skipped };

    for event in parsed.events {
        let now = Utc::now();
        match store.get_event(source_id, &event.uid).await? {
            None => {
                let record = CalendarEvent {
                    id: Uuid::new_v4(),
                    tenant_id,
                    source_id,
                    external_uid: event.uid,
                    title: event.title,
                    starts_at: event.starts_at,
                    ends_at: event.ends_at,
                    location: event.location,
                    description: event.description,
                    created_at: now,
                    updated_at: now,
                };
                store.insert_event(&record).await?;
                outcome.count += 1;
            }
            Some(existing) => {
                let changed = existing.title != event.title
                    || existing.starts_at != event.starts_at
                    || existing.ends_at != event.ends_at
                    || existing.location != event.location
                    || existing.description != event.description;
                if !changed {
                    continue;
                }
                let record = CalendarEvent {
                    title: event.title,
                    starts_at: event.starts_at,
                    ends_at: event.ends_at,
                    location: event.location,
                    description: event.description,
                    updated_at: now,
                    ..existing
                };
                store.update_event(&record).await?;
                outcome.count += 1;
            }
        }
    }

    debug!(
        source_id = %source_id,
        changed = outcome.count,
        skipped = outcome.skipped,
        "feed import finished"
    );
    Ok(outcome)
}
