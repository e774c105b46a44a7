//! Calendar synchronization: due-checking of subscribed feeds,
//! idempotent diff import, and run-history accounting.

pub mod error;
pub mod feed;
pub mod fetch;
pub mod import;
pub mod scheduler;

pub use error::CalendarError;
pub use feed::{parse_feed, FeedEvent, ParsedFeed};
pub use fetch::{FeedFetcher, HttpFeedFetcher};
pub use import::{import_feed, ImportOutcome};
pub use scheduler::{due_sources, run_sync_pass, SyncOutcome, SyncPassReport};
