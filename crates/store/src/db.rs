use sqlx::PgPool;
use tracing::info;

use marquee_core::config::PostgresConfig;

use crate::error::StoreError;

/// Create a PostgreSQL connection pool and run migrations.
pub async fn init_pg_pool(config: &PostgresConfig) -> Result<PgPool, StoreError> {
    let url = config.url.as_deref().ok_or_else(|| {
        StoreError::Conflict("PG_URL / DATABASE_URL not configured".to_string())
    })?;

    let pool = PgPool::connect(url).await?;
    info!("PostgreSQL connected");

    sqlx::migrate!("../../migrations").run(&pool).await?;
    info!("Database migrations applied");

    Ok(pool)
}
