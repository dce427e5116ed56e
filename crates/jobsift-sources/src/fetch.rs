//! HTTP retrieval of raw listing payloads, one page at a time.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::debug;

use crate::SourceConfig;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("http status {status} for {url}")]
    HttpStatus { status: u16, url: String },
    #[error("malformed listing body from {url}: {reason}")]
    MalformedBody { url: String, reason: String },
}

/// Retrieval seam between the coordinator and the network. The HTTP
/// implementation is the only one shipped; tests substitute canned payloads
/// and failures.
#[async_trait]
pub trait ListingFetcher: Send + Sync {
    /// All raw listing items for a source across its configured page set.
    async fn fetch_listings(&self, source: &SourceConfig) -> Result<Vec<JsonValue>, FetchError>;
}

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub timeout: Duration,
    pub user_agent: Option<String>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: None,
        }
    }
}

#[derive(Debug)]
pub struct HttpListingFetcher {
    client: reqwest::Client,
}

impl HttpListingFetcher {
    pub fn new(config: HttpClientConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder()
            .gzip(true)
            .brotli(true)
            .timeout(config.timeout);

        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }

        let client = builder.build().context("building reqwest client")?;
        Ok(Self { client })
    }

    async fn fetch_page(
        &self,
        source: &SourceConfig,
        page: u32,
    ) -> Result<Vec<JsonValue>, FetchError> {
        let mut params: Vec<(&str, String)> = vec![
            ("q", source.query.terms.clone()),
            ("page", page.to_string()),
        ];
        if let Some(country) = &source.query.country {
            params.push(("country", country.clone()));
        }
        if let Some(days) = source.query.recency_days {
            params.push(("days", days.to_string()));
        }

        let mut request = self.client.get(&source.base_url).query(&params);
        if let Some(api_key) = &source.api_key {
            request = request.header(source.auth_header.as_str(), api_key.as_str());
        }

        let response = request.send().await?;
        let status = response.status();
        let url = response.url().to_string();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url,
            });
        }

        let bytes = response.bytes().await?;
        let body: JsonValue =
            serde_json::from_slice(&bytes).map_err(|err| FetchError::MalformedBody {
                url: url.clone(),
                reason: err.to_string(),
            })?;

        extract_items(&body).ok_or(FetchError::MalformedBody {
            url,
            reason: "no listing array in response".to_string(),
        })
    }
}

#[async_trait]
impl ListingFetcher for HttpListingFetcher {
    async fn fetch_listings(&self, source: &SourceConfig) -> Result<Vec<JsonValue>, FetchError> {
        let mut items = Vec::new();
        for page in 1..=source.query.pages.max(1) {
            let page_items = self.fetch_page(source, page).await?;
            debug!(source = %source.name, page, count = page_items.len(), "fetched listing page");
            if page_items.is_empty() {
                break;
            }
            items.extend(page_items);
        }
        Ok(items)
    }
}

/// Pull the listing array out of a payload that is either a bare array or an
/// object wrapping one under a well-known key. Extra fields are ignored.
pub fn extract_items(body: &JsonValue) -> Option<Vec<JsonValue>> {
    if let Some(items) = body.as_array() {
        return Some(items.clone());
    }
    for key in ["results", "jobs", "data", "items"] {
        if let Some(items) = body.get(key).and_then(|v| v.as_array()) {
            return Some(items.clone());
        }
    }
    None
}
