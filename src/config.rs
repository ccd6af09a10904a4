//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::transport::RetryPolicy;

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the upstream API
    pub api_base_url: String,
    /// Language sent with every request
    pub api_lang: String,
    /// Opaque access credential, omitted from requests when unset
    pub api_key: Option<String>,
    /// Schema version sent as `v`, omitted when unset
    pub api_schema_version: Option<String>,
    /// Shared request budget per second
    pub requests_per_second: u32,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds
    pub retry_base_delay_ms: u64,
    /// Upper bound for any single backoff in milliseconds
    pub retry_max_delay_ms: u64,
    /// Growth factor applied per retry
    pub retry_multiplier: f64,
    /// Per-attempt HTTP timeout in seconds
    pub request_timeout_secs: u64,
    /// Directory holding `<kind>.json` snapshots
    pub snapshot_dir: PathBuf,
    /// Maximum number of entries the response cache can hold
    pub max_entries: usize,
    /// Default TTL in seconds for cached responses
    pub default_ttl: u64,
    /// Background sweep interval in seconds
    pub cleanup_interval: u64,
    /// HTTP server port
    pub server_port: u16,
    /// IDs per exporter batch
    pub export_batch_size: usize,
    /// Concurrent exporter workers
    pub export_workers: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `API_BASE_URL` - Upstream base URL (default: https://api.guildwars2.com)
    /// - `API_LANG` - Request language (default: en)
    /// - `API_KEY` - Access credential (default: none)
    /// - `API_SCHEMA_VERSION` - Schema version (default: none)
    /// - `REQUESTS_PER_SECOND` - Rate limit (default: 10)
    /// - `MAX_RETRIES` - Retries per request (default: 3)
    /// - `RETRY_BASE_DELAY_MS` - First backoff (default: 250)
    /// - `RETRY_MAX_DELAY_MS` - Backoff cap (default: 10000)
    /// - `RETRY_MULTIPLIER` - Backoff growth (default: 2.0)
    /// - `REQUEST_TIMEOUT_SECS` - Per-attempt timeout (default: 30)
    /// - `SNAPSHOT_DIR` - Snapshot directory (default: data)
    /// - `MAX_ENTRIES` - Maximum response cache entries (default: 1000)
    /// - `DEFAULT_TTL` - Response TTL in seconds (default: 300)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 60)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `EXPORT_BATCH_SIZE` - IDs per export batch (default: 200)
    /// - `EXPORT_WORKERS` - Concurrent export workers (default: 4)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_base_url: env::var("API_BASE_URL").unwrap_or(defaults.api_base_url),
            api_lang: env::var("API_LANG").unwrap_or(defaults.api_lang),
            api_key: env::var("API_KEY").ok().filter(|v| !v.is_empty()),
            api_schema_version: env::var("API_SCHEMA_VERSION")
                .ok()
                .filter(|v| !v.is_empty()),
            requests_per_second: parse_env("REQUESTS_PER_SECOND", defaults.requests_per_second),
            max_retries: parse_env("MAX_RETRIES", defaults.max_retries),
            retry_base_delay_ms: parse_env("RETRY_BASE_DELAY_MS", defaults.retry_base_delay_ms),
            retry_max_delay_ms: parse_env("RETRY_MAX_DELAY_MS", defaults.retry_max_delay_ms),
            retry_multiplier: parse_env("RETRY_MULTIPLIER", defaults.retry_multiplier),
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs),
            snapshot_dir: env::var("SNAPSHOT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.snapshot_dir),
            max_entries: parse_env("MAX_ENTRIES", defaults.max_entries),
            default_ttl: parse_env("DEFAULT_TTL", defaults.default_ttl),
            cleanup_interval: parse_env("CLEANUP_INTERVAL", defaults.cleanup_interval),
            server_port: parse_env("SERVER_PORT", defaults.server_port),
            export_batch_size: parse_env("EXPORT_BATCH_SIZE", defaults.export_batch_size),
            export_workers: parse_env("EXPORT_WORKERS", defaults.export_workers),
        }
    }

    /// Retry policy described by the `RETRY_*` settings.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_millis(self.retry_base_delay_ms),
            Duration::from_millis(self.retry_max_delay_ms),
            self.retry_multiplier,
        )
    }

    /// Response TTL as a Duration.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl)
    }

    /// Sweep interval as a Duration.
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.guildwars2.com".to_string(),
            api_lang: "en".to_string(),
            api_key: None,
            api_schema_version: None,
            requests_per_second: 10,
            max_retries: 3,
            retry_base_delay_ms: 250,
            retry_max_delay_ms: 10_000,
            retry_multiplier: 2.0,
            request_timeout_secs: 30,
            snapshot_dir: PathBuf::from("data"),
            max_entries: 1000,
            default_ttl: 300,
            cleanup_interval: 60,
            server_port: 3000,
            export_batch_size: 200,
            export_workers: 4,
        }
    }
}

fn parse_env<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
