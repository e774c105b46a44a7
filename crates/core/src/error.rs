use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("invalid job status: {0}")]
    InvalidJobStatus(String),

    #[error("invalid source status: {0}")]
    InvalidSourceStatus(String),

    #[error("invalid run status: {0}")]
    InvalidRunStatus(String),

    #[error("sync interval must be positive, got {0}")]
    InvalidSyncInterval(i32),

    #[error("{0}")]
    Other(String),
}
