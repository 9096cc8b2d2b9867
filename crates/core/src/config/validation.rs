//! Validation rules applied after configuration loading.
//!
//! Catches values that would make the gateway misbehave quietly (a cache
//! version with whitespace, a relative origin) before anything is served.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

const MAX_FETCH_BYTES: usize = 50 * 1024 * 1024;
const TIMEOUT_RANGE_MS: std::ops::RangeInclusive<u64> = 100..=300_000;

impl AppConfig {
    /// Validate a loaded configuration before the gateway starts serving.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_bytes == 0 || self.max_bytes > MAX_FETCH_BYTES {
            return Err(invalid("max_bytes", format!("must be between 1 and {MAX_FETCH_BYTES}")));
        }

        if !TIMEOUT_RANGE_MS.contains(&self.timeout_ms) {
            return Err(invalid("timeout_ms", "must be between 100ms and 5 minutes"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        // The version tag is embedded in partition names and in SQL queries
        // comparing them, so keep it a plain token.
        if self.cache_version.is_empty() || self.cache_version.contains(char::is_whitespace) {
            return Err(invalid("cache_version", "must be a non-empty tag without whitespace"));
        }

        for (field, value) in [("shell_origin", &self.shell_origin), ("image_cdn_origin", &self.image_cdn_origin)] {
            // A bare "host:port" parses as scheme:path, so require http(s).
            let scheme_ok = url::Url::parse(value).is_ok_and(|u| matches!(u.scheme(), "http" | "https"));
            if !scheme_ok {
                return Err(invalid(field, "must be an absolute http(s) URL"));
            }
        }

        if let Some(path) = self.precache_manifest.iter().find(|p| !p.starts_with('/')) {
            return Err(invalid("precache_manifest", format!("entry '{path}' must start with '/'")));
        }

        if !self.api_prefix.starts_with('/') {
            return Err(invalid("api_prefix", "must start with '/'"));
        }

        Ok(())
    }
}
