use async_trait::async_trait;

use marquee_core::{CandidateFact, RawSource};

/// Trait for fact-extraction backends. The pipeline treats the output
/// as untrusted candidate facts; acceptance is the resolver's job.
#[async_trait]
pub trait FactExtractor: Send + Sync {
    /// Extract candidate facts from the given raw sources.
    async fn extract(&self, sources: &[RawSource]) -> Result<Vec<CandidateFact>, ExtractError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("extraction API error: {status}: {body}")]
    Api { status: u16, body: String },

    #[error("failed to parse extraction response: {0}")]
    Parse(String),

    #[error("no raw sources to extract from")]
    EmptyInput,

    #[error("extractor not configured: {0}")]
    NotConfigured(String),
}

impl ExtractError {
    /// Whether the failure is worth an automatic retry. Transport
    /// errors, timeouts, rate limiting, and server-side errors are;
    /// bad requests and malformed input are not.
    pub fn is_transient(&self) -> bool {
        match self {
            ExtractError::Http(_) => true,
            ExtractError::Api { status, .. } => *status >= 500 || *status == 429,
            ExtractError::Parse(_) | ExtractError::EmptyInput | ExtractError::NotConfigured(_) => {
                false
            }
        }
    }
}
