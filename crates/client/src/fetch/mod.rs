//! Asset fetch client behind the cache strategies.
//!
//! ### Response handling
//! - HTTP error statuses are returned as values so strategies can forward
//!   them uncached; only transport failures become errors.
//! - Revalidation fetches send `Cache-Control: no-cache` so install-time
//!   precache is never satisfied from a stale intermediary copy.
//! - Bodies larger than `max_bytes` are rejected.
//!
//! A server-side fetch can always inspect what it receives, so responses
//! from this client are never opaque; the opaque path exists for stored
//! entries captured by other producers.

pub mod url;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Url, header};

use reelgate_core::{Error, Fetch, FetchedResponse};

pub use url::{UrlError, canonicalize};

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "reelgate/0.1")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 10MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { user_agent: "reelgate/0.1".to_string(), max_bytes: 10 * 1024 * 1024, timeout: Duration::from_millis(20_000) }
    }
}

/// HTTP fetch client used by the cache strategies.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Fetch(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait]
impl Fetch for FetchClient {
    async fn fetch(&self, url: &Url, revalidate: bool) -> Result<FetchedResponse, Error> {
        let start = Instant::now();

        let mut request = self.http.get(url.as_str());
        if revalidate {
            request = request.header(header::CACHE_CONTROL, "no-cache");
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::FetchTimeout(url.to_string())
            } else {
                Error::Fetch(format!("network error: {e}"))
            }
        })?;

        let status = response.status().as_u16();

        if let Some(len) = response.content_length()
            && len as usize > self.config.max_bytes
        {
            return Err(Error::FetchTooLarge(format!("{len} bytes exceeds {}", self.config.max_bytes)));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Fetch(format!("failed to read response: {e}")))?;

        if body.len() > self.config.max_bytes {
            return Err(Error::FetchTooLarge(format!("{} bytes exceeds {}", body.len(), self.config.max_bytes)));
        }

        tracing::debug!(
            "fetched {} -> {} in {}ms ({} bytes)",
            url,
            status,
            start.elapsed().as_millis(),
            body.len()
        );

        Ok(FetchedResponse { status, opaque: false, content_type, body })
    }
}
