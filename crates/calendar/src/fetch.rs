use std::time::Duration;

use async_trait::async_trait;

use marquee_core::config::CalendarConfig;

use crate::error::CalendarError;

/// Trait for feed transports, so the scheduler can be driven in tests
/// without a network.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    /// Fetch the raw feed payload at `url`.
    async fn fetch(&self, url: &str) -> Result<String, CalendarError>;
}

/// Plain HTTPS fetcher for subscribed feeds.
pub struct HttpFeedFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFeedFetcher {
    pub fn from_config(config: &CalendarConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(config.fetch_timeout_secs),
        }
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, url: &str) -> Result<String, CalendarError> {
        let response = self.client.get(url).timeout(self.timeout).send().await?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(CalendarError::Status { status });
        }

        Ok(response.text().await?)
    }
}
