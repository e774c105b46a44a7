use std::env;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_u16(key: &str, default: u16) -> u16 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_i64(key: &str, default: i64) -> i64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub postgres: PostgresConfig,
    pub worker: WorkerConfig,
    pub extraction: ExtractionConfig,
    pub calendar: CalendarConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig::from_env(),
            postgres: PostgresConfig::from_env(),
            worker: WorkerConfig::from_env(),
            extraction: ExtractionConfig::from_env(),
            calendar: CalendarConfig::from_env(),
        }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  server:     {}:{}", self.server.host, self.server.port);
        tracing::info!("  postgres:   configured={}", self.postgres.is_configured());
        tracing::info!(
            "  worker:     poll={}s, batch={}, lease={}s, attempts={}, concurrency={}",
            self.worker.poll_interval_secs,
            self.worker.batch_size,
            self.worker.claim_lease_secs,
            self.worker.max_attempts,
            self.worker.concurrency
        );
        tracing::info!(
            "  extraction: url={}, threshold={}",
            self.extraction.url.as_deref().unwrap_or("(none)"),
            self.extraction.accept_threshold
        );
        tracing::info!("  calendar:   fetch_timeout={}s", self.calendar.fetch_timeout_secs);
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            host: env_or("SERVER_HOST", "0.0.0.0"),
            port: env_u16("SERVER_PORT", 8080),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ── Postgres ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    /// Connection URL. `PG_URL` wins, `DATABASE_URL` is the fallback.
    pub url: Option<String>,
}

impl PostgresConfig {
    pub fn from_env() -> Self {
        Self {
            url: env_opt("PG_URL").or_else(|| env_opt("DATABASE_URL")),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.url.is_some()
    }
}

// ── Worker ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Seconds between claim attempts when the queue is drained.
    pub poll_interval_secs: u64,
    /// Max jobs claimed per iteration.
    pub batch_size: u32,
    /// Claim lease duration; an older claim is considered abandoned.
    pub claim_lease_secs: i64,
    /// Automatic retries before a job is failed outright.
    pub max_attempts: u32,
    /// In-flight extraction calls per batch.
    pub concurrency: usize,
    /// Heartbeats older than this fall out of the active view.
    pub heartbeat_staleness_secs: i64,
    /// Bearer secret authorizing `/worker/process`.
    pub secret: Option<String>,
}

impl WorkerConfig {
    pub fn from_env() -> Self {
        Self {
            poll_interval_secs: env_u64("WORKER_POLL_INTERVAL_SECS", 10),
            batch_size: env_u32("WORKER_BATCH_SIZE", 4),
            claim_lease_secs: env_i64("WORKER_CLAIM_LEASE_SECS", 300),
            max_attempts: env_u32("WORKER_MAX_ATTEMPTS", 3),
            concurrency: env_u64("WORKER_CONCURRENCY", 2) as usize,
            heartbeat_staleness_secs: env_i64("WORKER_HEARTBEAT_STALENESS_SECS", 120),
            secret: env_opt("IMPORT_WORKER_SECRET"),
        }
    }

    pub fn claim_lease(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.claim_lease_secs)
    }

    pub fn heartbeat_staleness(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.heartbeat_staleness_secs)
    }
}

// ── Extraction ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Endpoint of the external fact-extraction service.
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// Minimum confidence for a fact to be accepted into `extracted`.
    pub accept_threshold: f64,
}

impl ExtractionConfig {
    pub fn from_env() -> Self {
        Self {
            url: env_opt("EXTRACTOR_URL"),
            api_key: env_opt("EXTRACTOR_API_KEY"),
            timeout_secs: env_u64("EXTRACTOR_TIMEOUT_SECS", 30),
            accept_threshold: env_f64("CONFIDENCE_ACCEPT_THRESHOLD", 0.8).clamp(0.0, 1.0),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.url.is_some()
    }
}

// ── Calendar ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    pub fetch_timeout_secs: u64,
}

impl CalendarConfig {
    pub fn from_env() -> Self {
        Self {
            fetch_timeout_secs: env_u64("CALENDAR_FETCH_TIMEOUT_SECS", 30),
        }
    }
}
