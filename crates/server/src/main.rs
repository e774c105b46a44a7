use std::sync::Arc;

use tracing::info;

use marquee_calendar::HttpFeedFetcher;
use marquee_extract::HttpExtractor;
use marquee_server::{build_router, AppState};
use marquee_store::{db, PgStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    marquee_core::config::load_dotenv();
    let config = marquee_core::Config::from_env();
    config.log_summary();

    let pool = db::init_pg_pool(&config.postgres).await?;
    let store = Arc::new(PgStore::new(pool));
    let extractor = Arc::new(HttpExtractor::from_config(&config.extraction)?);
    let fetcher = Arc::new(HttpFeedFetcher::from_config(&config.calendar));

    let bind_addr = config.server.bind_addr();
    let state = Arc::new(AppState {
        config,
        jobs: store.clone(),
        heartbeats: store.clone(),
        calendar: store,
        extractor,
        fetcher,
    });

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("marquee server listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("shutdown requested");
        })
        .await?;

    Ok(())
}
