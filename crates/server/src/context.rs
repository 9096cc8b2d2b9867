//! Shared request-handler state.

use std::sync::Arc;

use reelgate_client::TmdbClient;
use reelgate_core::{CacheManager, Fetch};

use crate::error::ApiError;

/// State shared by the proxy routes and the gateway fallback.
#[derive(Clone)]
pub struct AppContext {
    pub manager: Arc<CacheManager>,
    /// Direct network access for pass-through requests.
    pub fetcher: Arc<dyn Fetch>,
    /// Absent when no API key is configured; proxy endpoints then error.
    pub tmdb: Option<Arc<TmdbClient>>,
}

impl AppContext {
    /// The TMDB client, or the missing-key error every proxy endpoint
    /// returns when no server-held key is configured.
    pub fn tmdb(&self) -> Result<&Arc<TmdbClient>, ApiError> {
        self.tmdb.as_ref().ok_or_else(ApiError::missing_api_key)
    }
}
