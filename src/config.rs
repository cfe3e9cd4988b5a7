//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// SQLite database file holding the records
    pub database_path: String,
    /// Lifetime of the cached record list in seconds
    pub list_cache_ttl: u64,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// Deadline for a single store or cache call, in milliseconds
    pub call_timeout_ms: u64,
    /// Topic that change notifications are published to
    pub queue_name: String,
    /// Number of notifications that may wait for the dispatcher
    pub notify_buffer: usize,
    /// Number of messages the in-process queue retains
    pub queue_capacity: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `DATABASE_PATH` - SQLite file (default: "data/registry.db")
    /// - `LIST_CACHE_TTL` - List cache lifetime in seconds (default: 60)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 1)
    /// - `CALL_TIMEOUT_MS` - Store/cache call deadline in ms (default: 5000)
    /// - `QUEUE_NAME` - Notification topic (default: "data-queue")
    /// - `NOTIFY_BUFFER` - Pending notification slots (default: 1024)
    /// - `QUEUE_CAPACITY` - Retained queue messages (default: 10000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            database_path: env::var("DATABASE_PATH")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.database_path),
            list_cache_ttl: parse_var("LIST_CACHE_TTL").unwrap_or(defaults.list_cache_ttl),
            cleanup_interval: parse_var("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
            call_timeout_ms: parse_var("CALL_TIMEOUT_MS").unwrap_or(defaults.call_timeout_ms),
            queue_name: env::var("QUEUE_NAME")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.queue_name),
            notify_buffer: parse_var("NOTIFY_BUFFER")
                .filter(|&n: &usize| n > 0)
                .unwrap_or(defaults.notify_buffer),
            queue_capacity: parse_var("QUEUE_CAPACITY")
                .filter(|&n: &usize| n > 0)
                .unwrap_or(defaults.queue_capacity),
        }
    }

    /// Returns the store/cache call deadline as a Duration.
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            database_path: "data/registry.db".to_string(),
            list_cache_ttl: 60,
            cleanup_interval: 1,
            call_timeout_ms: 5000,
            queue_name: "data-queue".to_string(),
            notify_buffer: 1024,
            queue_capacity: 10_000,
        }
    }
}
