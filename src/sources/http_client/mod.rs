//! HTTP fetching for job sources.

mod user_agent;

pub use user_agent::{resolve_user_agent, USER_AGENT};

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{redirect, Client};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::feed::{parse_feed, FeedItem};

/// Maximum redirects followed per request.
const MAX_REDIRECTS: usize = 5;

/// Errors that can occur while fetching a source.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} ({url})")]
    Status { status: u16, url: String },

    #[error("Invalid JSON: {url}: {reason}")]
    InvalidJson { url: String, reason: String },

    #[error("Invalid XML: {url}: {reason}")]
    InvalidFeed { url: String, reason: String },
}

/// Something that can GET a URL and hand back the body.
///
/// [`HttpClient`] is the real implementation; ingestion tests swap in
/// canned payloads.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// GET the URL and return the body as text.
    async fn get_text(&self, url: &str) -> Result<String, FetchError>;

    /// GET the URL and parse it as a JSON object or array.
    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        let body = self.get_text(url).await?;
        let value: Value =
            serde_json::from_str(&body).map_err(|e| FetchError::InvalidJson {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        if !(value.is_object() || value.is_array()) {
            return Err(FetchError::InvalidJson {
                url: url.to_string(),
                reason: "expected an object or array".to_string(),
            });
        }
        Ok(value)
    }

    /// GET the URL and parse it as an RSS or Atom feed.
    async fn get_feed(&self, url: &str) -> Result<Vec<FeedItem>, FetchError> {
        let body = self.get_text(url).await?;
        parse_feed(&body).map_err(|reason| FetchError::InvalidFeed {
            url: url.to_string(),
            reason,
        })
    }
}

/// HTTP client settings.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub user_agent: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: USER_AGENT.to_string(),
            timeout: Duration::from_secs(25),
            connect_timeout: Duration::from_secs(12),
        }
    }
}

/// reqwest-backed fetcher with timeouts, redirects and TLS verification.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Create a new HTTP client.
    pub fn new(config: &HttpConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetch for HttpClient {
    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let start = Instant::now();
        let response = self.client.get(url).send().await?;
        let status = response.status();

        debug!(
            "GET {} -> {} in {}ms",
            url,
            status.as_u16(),
            start.elapsed().as_millis()
        );

        if status.is_client_error() || status.is_server_error() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }
}
