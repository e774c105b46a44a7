use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use marquee_core::config::ExtractionConfig;
use marquee_core::{CandidateFact, RawSource};

use crate::extractor::{ExtractError, FactExtractor};

/// HTTP client for the external fact-extraction service.
pub struct HttpExtractor {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    facts: Vec<FactPayload>,
}

#[derive(Debug, Deserialize)]
struct FactPayload {
    field: String,
    #[serde(default)]
    value: serde_json::Value,
    confidence: f64,
}

impl HttpExtractor {
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, ExtractError> {
        let url = config
            .url
            .clone()
            .ok_or_else(|| ExtractError::NotConfigured("EXTRACTOR_URL not set".into()))?;
        Ok(Self {
            client: reqwest::Client::new(),
            url,
            api_key: config.api_key.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }
}

#[async_trait]
impl FactExtractor for HttpExtractor {
    async fn extract(&self, sources: &[RawSource]) -> Result<Vec<CandidateFact>, ExtractError> {
        if sources.iter().all(|s| s.raw_text.trim().is_empty()) {
            return Err(ExtractError::EmptyInput);
        }

        let body = json!({
            "sources": sources
                .iter()
                .map(|s| json!({
                    "filename": s.filename,
                    "mime_type": s.mime_type,
                    "raw_text": s.raw_text,
                }))
                .collect::<Vec<_>>(),
        });

        debug!("extraction request to {}", self.url);

        let mut request = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;

        let status = response.status().as_u16();
        if status != 200 {
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractError::Api { status, body });
        }

        let resp: ExtractResponse = response
            .json()
            .await
            .map_err(|e| ExtractError::Parse(e.to_string()))?;

        Ok(resp
            .facts
            .into_iter()
            .map(|f| CandidateFact::new(f.field, f.value, f.confidence))
            .collect())
    }
}
