//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::DEFAULT_TTL_SECS;
use crate::store::ReconnectSettings;

/// Which key-value store backs the cache and the denylist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Redis,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "redis" => Ok(StoreBackend::Redis),
            other => Err(format!("unknown store backend: {}", other)),
        }
    }
}

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Store implementation
    pub backend: StoreBackend,
    /// Full Redis URL; takes precedence over the host/port/password parts
    pub redis_url: Option<String>,
    pub redis_host: String,
    pub redis_port: u16,
    pub redis_password: Option<String>,
    /// Reconnect backoff ceiling in milliseconds
    pub redis_max_delay_ms: u64,
    /// Reconnect attempts per connection loss
    pub redis_retries: usize,
    /// Default TTL in seconds for cache entries and revocation records
    pub default_ttl: u64,
    /// Capacity of the in-process store
    pub max_entries: usize,
    /// In-process store sweep interval in seconds
    pub cleanup_interval: u64,
    /// HS256 signing secret
    pub jwt_secret: Option<String>,
    /// Origins allowed by CORS; empty allows any origin
    pub cors_allowed_origins: Vec<String>,
    /// Requests per client IP per window; 0 disables rate limiting
    pub rate_limit_max: u32,
    /// Rate limit window in seconds
    pub rate_limit_window_secs: u64,
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

/// Splits a comma-separated origin list, dropping blanks.
pub fn parse_origin_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `STORE_BACKEND` - `memory` or `redis` (default: memory)
    /// - `REDIS_URL` - full connection URL (optional)
    /// - `REDIS_HOST` / `REDIS_PORT` / `REDIS_PASSWORD` - connection parts
    ///   (default: 127.0.0.1 / 6379 / none)
    /// - `REDIS_MAX_DELAY_MS` - reconnect backoff ceiling (default: 2000)
    /// - `REDIS_RETRIES` - reconnect attempts (default: 6)
    /// - `DEFAULT_TTL` - default TTL in seconds (default: 3600)
    /// - `MAX_ENTRIES` - in-process store capacity (default: 10000)
    /// - `CLEANUP_INTERVAL` - sweep frequency in seconds (default: 1)
    /// - `JWT_SECRET_KEY` - token signing secret (required to serve)
    /// - `CORS_ALLOWED_ORIGINS` - comma-separated origins (default: any)
    /// - `RATE_LIMIT_MAX` - requests per IP per window (default: 100, 0 = off)
    /// - `RATE_LIMIT_WINDOW_SECS` - rate limit window (default: 900)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            backend: env_or("STORE_BACKEND", defaults.backend),
            redis_url: env_non_empty("REDIS_URL"),
            redis_host: env_non_empty("REDIS_HOST").unwrap_or(defaults.redis_host),
            redis_port: env_or("REDIS_PORT", defaults.redis_port),
            redis_password: env_non_empty("REDIS_PASSWORD"),
            redis_max_delay_ms: env_or("REDIS_MAX_DELAY_MS", defaults.redis_max_delay_ms),
            redis_retries: env_or("REDIS_RETRIES", defaults.redis_retries),
            default_ttl: env_or("DEFAULT_TTL", defaults.default_ttl).max(1),
            max_entries: env_or("MAX_ENTRIES", defaults.max_entries),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval).max(1),
            jwt_secret: env_non_empty("JWT_SECRET_KEY"),
            cors_allowed_origins: env_non_empty("CORS_ALLOWED_ORIGINS")
                .map(|raw| parse_origin_list(&raw))
                .unwrap_or_default(),
            rate_limit_max: env_or("RATE_LIMIT_MAX", defaults.rate_limit_max),
            rate_limit_window_secs: env_or(
                "RATE_LIMIT_WINDOW_SECS",
                defaults.rate_limit_window_secs,
            )
            .max(1),
        }
    }

    /// URL handed to the Redis client.
    pub fn redis_connection_url(&self) -> String {
        if let Some(url) = &self.redis_url {
            return url.clone();
        }
        match &self.redis_password {
            Some(password) => format!(
                "redis://:{}@{}:{}",
                password, self.redis_host, self.redis_port
            ),
            None => format!("redis://{}:{}", self.redis_host, self.redis_port),
        }
    }

    pub fn reconnect_settings(&self) -> ReconnectSettings {
        ReconnectSettings {
            max_delay_ms: self.redis_max_delay_ms,
            retries: self.redis_retries,
            ..ReconnectSettings::default()
        }
    }

    pub fn cleanup_period(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        let reconnect = ReconnectSettings::default();
        Self {
            server_port: 3000,
            backend: StoreBackend::Memory,
            redis_url: None,
            redis_host: "127.0.0.1".to_string(),
            redis_port: 6379,
            redis_password: None,
            redis_max_delay_ms: reconnect.max_delay_ms,
            redis_retries: reconnect.retries,
            default_ttl: DEFAULT_TTL_SECS,
            max_entries: 10_000,
            cleanup_interval: 1,
            jwt_secret: None,
            cors_allowed_origins: Vec::new(),
            rate_limit_max: 100,
            rate_limit_window_secs: 15 * 60,
        }
    }
}
