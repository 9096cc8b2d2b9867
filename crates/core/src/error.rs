//! Unified error types for reelgate.

use tokio_rusqlite::rusqlite;

/// Unified error types for the reelgate gateway.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., missing identifier).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No cache entry found and no network fallback available.
    #[error("cache miss: {0}")]
    CacheMiss(String),

    /// Database operation failed.
    #[error("cache store error: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("cache store error: migration failed: {0}")]
    MigrationFailed(String),

    /// Invalid URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Network transport failure while fetching.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// Fetch timeout.
    #[error("fetch timeout: {0}")]
    FetchTimeout(String),

    /// Response body exceeded the configured size limit.
    #[error("fetch too large: {0}")]
    FetchTooLarge(String),

    /// Missing TMDB API key.
    #[error("Missing TMDB_API_KEY")]
    MissingApiKey,

    /// Upstream metadata provider unreachable or misbehaving.
    #[error("Failed to reach TMDB")]
    Upstream(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}
