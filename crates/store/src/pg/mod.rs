mod heartbeats;
mod jobs;
mod rows;
mod sync;

use sqlx::PgPool;

/// PostgreSQL-backed implementation of all three repositories.
///
/// Every mutation is a conditional single-row statement; no multi-row
/// transactions and no advisory locks. Claim correctness rests entirely
/// on the compare-and-swap WHERE clauses.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub(crate) fn pool(&self) -> &PgPool {
        &self.pool
    }
}
