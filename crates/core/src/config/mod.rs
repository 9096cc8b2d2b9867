//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (REELGATE_*)
//! 2. TOML config file (if REELGATE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Deployment mode for the cache manager.
///
/// `Serve` is the normal gateway mode. `Teardown` is the explicit retirement
/// mode: every cache partition is deleted and the process exits, so a
/// previous deployment of this gateway can be removed cleanly. It is never
/// selected implicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerMode {
    #[default]
    Serve,
    Teardown,
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (REELGATE_*)
/// 2. TOML config file (if REELGATE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// TMDB API key for the proxy endpoints.
    ///
    /// Set via REELGATE_TMDB_API_KEY environment variable.
    /// Required only when a proxy endpoint is called.
    #[serde(default)]
    pub tmdb_api_key: Option<String>,

    /// Path to the SQLite partition store.
    ///
    /// Set via REELGATE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Address the gateway listens on.
    ///
    /// Set via REELGATE_BIND_ADDR environment variable.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Origin hosting the application shell (root document, stylesheet,
    /// script bundle). Same-origin requests resolve against it.
    ///
    /// Set via REELGATE_SHELL_ORIGIN environment variable.
    #[serde(default = "default_shell_origin")]
    pub shell_origin: String,

    /// Origin of the poster/image CDN (cache-first).
    #[serde(default = "default_image_cdn_origin")]
    pub image_cdn_origin: String,

    /// Web-font provider origins (stale-while-revalidate).
    #[serde(default = "default_font_origins")]
    pub font_origins: Vec<String>,

    /// Path prefix of the proxy API surface. Requests under it always bypass
    /// the cache.
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Host of the upstream metadata provider. Requests to it always bypass
    /// the cache.
    #[serde(default = "default_upstream_api_host")]
    pub upstream_api_host: String,

    /// Version tag suffixed onto partition names. Bumping it retires the
    /// previous version's partitions at activation.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// App-shell paths precached at install time, relative to `shell_origin`.
    #[serde(default = "default_precache_manifest")]
    pub precache_manifest: Vec<String>,

    /// User-Agent string for outbound HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Deployment mode: `serve` (default) or `teardown`.
    #[serde(default)]
    pub mode: WorkerMode,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./reelgate-cache.sqlite")
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".into()
}

fn default_shell_origin() -> String {
    "http://localhost:3000".into()
}

fn default_image_cdn_origin() -> String {
    "https://image.tmdb.org".into()
}

fn default_font_origins() -> Vec<String> {
    vec![
        "https://fonts.googleapis.com".into(),
        "https://fonts.gstatic.com".into(),
    ]
}

fn default_api_prefix() -> String {
    "/api/".into()
}

fn default_upstream_api_host() -> String {
    "api.themoviedb.org".into()
}

fn default_cache_version() -> String {
    "v2".into()
}

fn default_precache_manifest() -> Vec<String> {
    vec![
        "/".into(),
        "/index.html".into(),
        "/style.css".into(),
        "/script.js".into(),
    ]
}

fn default_user_agent() -> String {
    "reelgate/0.1".into()
}

fn default_max_bytes() -> usize {
    10_485_760 // 10MB, poster art included
}

fn default_timeout_ms() -> u64 {
    20_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tmdb_api_key: None,
            db_path: default_db_path(),
            bind_addr: default_bind_addr(),
            shell_origin: default_shell_origin(),
            image_cdn_origin: default_image_cdn_origin(),
            font_origins: default_font_origins(),
            api_prefix: default_api_prefix(),
            upstream_api_host: default_upstream_api_host(),
            cache_version: default_cache_version(),
            precache_manifest: default_precache_manifest(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            mode: WorkerMode::Serve,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `REELGATE_`
    /// 2. TOML file from `REELGATE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("REELGATE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("REELGATE_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Check if the TMDB API key is available (for deferred validation).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the key is not set.
    pub fn require_tmdb_api_key(&self) -> Result<&str, ConfigError> {
        self.tmdb_api_key.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "tmdb_api_key".into(),
            hint: "Set REELGATE_TMDB_API_KEY environment variable".into(),
        })
    }
}
