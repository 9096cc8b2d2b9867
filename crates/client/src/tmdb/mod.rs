//! TMDB (The Movie Database) API client.
//!
//! Backs the proxy endpoints: search, trending, title detail, trailer
//! lookup, and the merged genre list. The client is a pass-through — it
//! forwards TMDB's own status code and JSON body rather than reshaping
//! them, so the UI sees exactly what the upstream returned. Requests are
//! rate-limited to stay under TMDB's API limits.
//!
//! - **Base URL**: `https://api.themoviedb.org/3` (overridable for tests)
//! - **Authentication**: `api_key` query parameter, server-held.
//! - **Language**: `en-US` on every request.

pub mod error;

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::{Quota, RateLimiter};
use serde_json::Value;

pub use error::TmdbError;

/// Default base URL for the TMDB API.
const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default user agent.
const DEFAULT_USER_AGENT: &str = "reelgate/0.1";

/// Requests per second allowed against TMDB.
const RATE_LIMIT_PER_SECOND: u32 = 30;

/// TMDB API client configuration.
#[derive(Debug, Clone)]
pub struct TmdbConfig {
    /// API key, server-held; never exposed to the UI.
    pub api_key: String,
    /// Base URL (default: https://api.themoviedb.org/3).
    pub base_url: String,
    /// Request timeout (default: 10s).
    pub timeout: Duration,
    /// User-agent string.
    pub user_agent: String,
    /// Language sent with every request.
    pub language: String,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            language: "en-US".to_string(),
        }
    }
}

impl TmdbConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads REELGATE_TMDB_API_KEY from environment. Returns error if not set.
    pub fn from_env() -> Result<Self, TmdbError> {
        let api_key = std::env::var("REELGATE_TMDB_API_KEY").map_err(|_| TmdbError::MissingApiKey)?;

        Ok(Self { api_key, ..Default::default() })
    }
}

/// Which upstream catalog a title belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Movie,
    Tv,
}

impl MediaType {
    /// Parse the `type` query parameter: `tv` selects tv, anything else movie.
    pub fn from_param(param: Option<&str>) -> Self {
        if param == Some("tv") { MediaType::Tv } else { MediaType::Movie }
    }

    pub fn as_path_segment(self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        }
    }
}

/// An upstream response forwarded verbatim: TMDB's status code and body.
#[derive(Debug, Clone)]
pub struct Upstream {
    pub status: u16,
    pub body: Value,
}

impl Upstream {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

type DirectLimiter = RateLimiter<governor::state::NotKeyed, governor::state::InMemoryState, governor::clock::DefaultClock>;

/// TMDB API client.
#[derive(Clone)]
pub struct TmdbClient {
    http: reqwest::Client,
    config: TmdbConfig,
    limiter: Arc<DirectLimiter>,
}

impl TmdbClient {
    /// Create a new TMDB client with the given configuration.
    pub fn new(config: TmdbConfig) -> Result<Self, TmdbError> {
        if config.api_key.is_empty() {
            return Err(TmdbError::MissingApiKey);
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| TmdbError::Network(Arc::new(e)))?;

        let quota = Quota::per_second(NonZeroU32::new(RATE_LIMIT_PER_SECOND).unwrap());
        Ok(Self { http, config, limiter: Arc::new(RateLimiter::direct(quota)) })
    }

    /// Create a new TMDB client from environment variables.
    pub fn from_env() -> Result<Self, TmdbError> {
        Self::new(TmdbConfig::from_env()?)
    }

    async fn get(&self, path: &str, extra_params: &[(&str, &str)]) -> Result<Upstream, TmdbError> {
        self.limiter.until_ready().await;

        let url = format!("{}{}", self.config.base_url, path);
        let mut params: Vec<(&str, &str)> =
            vec![("api_key", self.config.api_key.as_str()), ("language", self.config.language.as_str())];
        params.extend_from_slice(extra_params);

        tracing::debug!(path, "TMDB request");

        let response = self.http.get(&url).query(&params).send().await?;
        let status = response.status().as_u16();

        let body: Value = response
            .json()
            .await
            .map_err(|e| TmdbError::Parse(e.to_string()))?;

        tracing::debug!(path, status, "TMDB response");
        Ok(Upstream { status, body })
    }

    /// Search the movie catalog.
    pub async fn search(&self, query: &str, page: &str) -> Result<Upstream, TmdbError> {
        self.get("/search/movie", &[("query", query), ("page", page)]).await
    }

    /// The daily trending feed across movies and TV.
    pub async fn trending(&self, page: &str) -> Result<Upstream, TmdbError> {
        self.get("/trending/all/day", &[("page", page)]).await
    }

    /// Detail for a single title.
    pub async fn detail(&self, media: MediaType, id: &str) -> Result<Upstream, TmdbError> {
        self.get(&format!("/{}/{}", media.as_path_segment(), encode_segment(id)), &[])
            .await
    }

    /// Trailer/video list for a single title.
    pub async fn videos(&self, media: MediaType, id: &str) -> Result<Upstream, TmdbError> {
        self.get(&format!("/{}/{}/videos", media.as_path_segment(), encode_segment(id)), &[])
            .await
    }

    /// Movie and TV genre lists, fetched concurrently and merged by id.
    ///
    /// If either upstream call fails with a non-2xx status, that response is
    /// forwarded instead of a partial merge.
    pub async fn genres(&self) -> Result<Upstream, TmdbError> {
        let (movie, tv) = tokio::try_join!(self.get("/genre/movie/list", &[]), self.get("/genre/tv/list", &[]))?;

        if !movie.is_success() {
            return Ok(movie);
        }
        if !tv.is_success() {
            return Ok(tv);
        }

        Ok(Upstream { status: 200, body: merge_genres(&movie.body, &tv.body) })
    }
}

/// Percent-encode a path segment (ids come from the query string).
fn encode_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// Merge two `{ "genres": [...] }` bodies by genre id; movie entries win.
fn merge_genres(movie: &Value, tv: &Value) -> Value {
    let mut merged: Vec<Value> = Vec::new();
    let mut seen: Vec<i64> = Vec::new();

    for body in [movie, tv] {
        if let Some(list) = body.get("genres").and_then(Value::as_array) {
            for genre in list {
                let Some(id) = genre.get("id").and_then(Value::as_i64) else {
                    continue;
                };
                if !seen.contains(&id) {
                    seen.push(id);
                    merged.push(genre.clone());
                }
            }
        }
    }

    serde_json::json!({ "genres": merged })
}
