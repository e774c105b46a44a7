//! Durable stores for the import pipeline and calendar scheduler.
//!
//! All pipeline state lives behind the repository traits in this crate;
//! workers are stateless between iterations and coordinate only through
//! conditional single-row writes.

pub mod db;
pub mod error;
pub mod heartbeats;
pub mod jobs;
pub mod memory;
pub mod pg;
pub mod sync;

pub use error::StoreError;
pub use heartbeats::HeartbeatStore;
pub use jobs::{JobStore, ResolvedUpdate};
pub use memory::MemoryStore;
pub use pg::PgStore;
pub use sync::CalendarStore;
