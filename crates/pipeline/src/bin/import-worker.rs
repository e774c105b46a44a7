//! import-worker — standalone poll-loop worker for the import pipeline.
//!
//! Any number of instances may run concurrently; coordination happens
//! entirely through conditional writes in the job store.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use uuid::Uuid;

use marquee_extract::HttpExtractor;
use marquee_pipeline::{ImportWorker, ResolverPolicy};
use marquee_store::{db, PgStore};

// ── CLI ─────────────────────────────────────────────────────────────

/// Import pipeline worker: claims pending jobs, extracts candidate
/// facts, resolves them into reviewable show records.
#[derive(Parser, Debug)]
#[command(name = "import-worker", version, about)]
struct Cli {
    /// Stable worker identifier; generated when omitted.
    #[arg(long, env = "WORKER_ID")]
    worker_id: Option<String>,
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    marquee_core::config::load_dotenv();
    let config = marquee_core::Config::from_env();
    config.log_summary();

    let worker_id = cli
        .worker_id
        .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

    let pool = db::init_pg_pool(&config.postgres).await?;
    let store = Arc::new(PgStore::new(pool));
    let extractor = Arc::new(HttpExtractor::from_config(&config.extraction)?);

    let worker = ImportWorker::new(
        worker_id.clone(),
        store.clone(),
        store,
        extractor,
        config.worker.clone(),
        ResolverPolicy { accept_threshold: config.extraction.accept_threshold },
    );
    let shutdown = worker.shutdown_signal();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested, finishing in-flight jobs");
            shutdown.store(true, Ordering::Relaxed);
        }
    });

    info!(worker_id = %worker_id, "starting import worker loop");
    worker.run().await;

    Ok(())
}
