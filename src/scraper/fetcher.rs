use crate::config::AppConfig;
use crate::model::ScraperError;
use crate::scraper::traits::PageFetcher;

use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use reqwest::Client;
use std::time::Duration;
use tracing::{info, warn};

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &AppConfig) -> Result<Self, ScraperError> {
        let mut headers = HeaderMap::new();
        let language = HeaderValue::from_str(&config.accept_language)
            .map_err(|e| ScraperError::Client(e.to_string()))?;
        headers.insert(ACCEPT_LANGUAGE, language);

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| ScraperError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, ScraperError> {
        info!("Fetching {}", url);
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ScraperError::Timeout
            } else {
                ScraperError::Http(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Unexpected status [{}] for {}", status, url);
            return Err(ScraperError::InvalidResponse(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| ScraperError::Http(e.to_string()))
    }
}
