//! Configuration module for the roster service and sync client.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::AppError;

/// Timing knobs for the sync adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// Delay before the first pending-sync retry
    pub retry_delay: Duration,
    /// Delay between subsequent retries
    pub retry_backoff: Duration,
    /// How often the live subscription polls for a new revision
    pub poll_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_secs(30),
            retry_backoff: Duration::from_secs(60),
            poll_interval: Duration::from_secs(5),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared admin key; writes require it when set
    pub api_psk: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Base URL the sync client talks to
    pub remote_url: String,
    /// Local cache file used when the remote is unreachable
    pub cache_path: PathBuf,
    pub sync: SyncConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let api_psk = env::var("ROSTER_API_PSK").ok().filter(|k| !k.is_empty());

        let db_path = env::var("ROSTER_DB_PATH")
            .unwrap_or_else(|_| "./data/roster.sqlite".to_string())
            .into();

        let bind_addr = env::var("ROSTER_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|e| AppError::Validation(format!("Invalid ROSTER_BIND_ADDR: {}", e)))?;

        let log_level = env::var("ROSTER_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let remote_url =
            env::var("ROSTER_REMOTE_URL").unwrap_or_else(|_| "http://127.0.0.1:8080".to_string());

        let cache_path = env::var("ROSTER_CACHE_PATH")
            .unwrap_or_else(|_| "./data/roster-cache.json".to_string())
            .into();

        let defaults = SyncConfig::default();
        let sync = SyncConfig {
            retry_delay: env_secs("ROSTER_RETRY_DELAY_SECS", defaults.retry_delay)?,
            retry_backoff: env_secs("ROSTER_RETRY_BACKOFF_SECS", defaults.retry_backoff)?,
            poll_interval: env_secs("ROSTER_POLL_INTERVAL_SECS", defaults.poll_interval)?,
        };

        Ok(Self {
            api_psk,
            db_path,
            bind_addr,
            log_level,
            remote_url,
            cache_path,
            sync,
        })
    }
}

fn env_secs(name: &str, default: Duration) -> Result<Duration, AppError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| AppError::Validation(format!("Invalid {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}
