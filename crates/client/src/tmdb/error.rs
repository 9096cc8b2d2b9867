//! TMDB API client error types.
//!
//! Upstream HTTP error statuses are not errors here; they are forwarded to
//! the caller with their bodies. These variants cover everything that
//! prevents a forwardable response from existing at all.

use std::sync::Arc;

/// Errors from the TMDB proxy client.
#[derive(Debug, thiserror::Error)]
pub enum TmdbError {
    /// Missing TMDB API key.
    #[error("missing API key: REELGATE_TMDB_API_KEY not set")]
    MissingApiKey,

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Upstream body was not JSON.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for TmdbError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { TmdbError::Timeout } else { TmdbError::Network(Arc::new(err)) }
    }
}
