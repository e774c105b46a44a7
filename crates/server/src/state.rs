use std::sync::Arc;

use marquee_calendar::FeedFetcher;
use marquee_core::Config;
use marquee_extract::FactExtractor;
use marquee_store::{CalendarStore, HeartbeatStore, JobStore};

/// Shared handles behind every endpoint. Stores and adapters are trait
/// objects so tests can run the full router against in-memory fakes.
pub struct AppState {
    pub config: Config,
    pub jobs: Arc<dyn JobStore>,
    pub heartbeats: Arc<dyn HeartbeatStore>,
    pub calendar: Arc<dyn CalendarStore>,
    pub extractor: Arc<dyn FactExtractor>,
    pub fetcher: Arc<dyn FeedFetcher>,
}
