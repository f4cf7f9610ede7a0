//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::debug;

use crate::cache::{CacheOptions, LruCache};

// == Length Mode ==
/// How the server weighs cached values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LengthMode {
    /// Every entry weighs 1, so the capacity counts entries
    #[default]
    Entries,
    /// Entries weigh their value's byte length
    Bytes,
}

impl FromStr for LengthMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "entries" | "count" => Ok(Self::Entries),
            "bytes" => Ok(Self::Bytes),
            other => Err(format!("unknown length mode '{}'", other)),
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Capacity on total weight, 0 = unbounded
    pub max: usize,
    /// Cache-wide max age in milliseconds, 0 = none
    pub max_age_ms: u64,
    /// Serve stale values once before evicting them
    pub allow_stale: bool,
    /// How entries are weighed
    pub length_mode: LengthMode,
    /// HTTP server port
    pub server_port: u16,
    /// Where snapshots are written, None = no persistence
    pub snapshot_path: Option<PathBuf>,
    /// Interval in seconds between periodic snapshots
    pub snapshot_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX` - Capacity on total weight, 0 = unbounded (default: 1000)
    /// - `CACHE_MAX_AGE_MS` - Cache-wide max age in milliseconds (default: 0)
    /// - `CACHE_ALLOW_STALE` - Serve stale values once (default: false)
    /// - `CACHE_LENGTH_MODE` - `entries` or `bytes` (default: entries)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `SNAPSHOT_PATH` - Snapshot file (default: unset)
    /// - `SNAPSHOT_INTERVAL` - Snapshot frequency in seconds (default: 30)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max: parse_var("CACHE_MAX").unwrap_or(defaults.max),
            max_age_ms: parse_var("CACHE_MAX_AGE_MS").unwrap_or(defaults.max_age_ms),
            allow_stale: parse_var("CACHE_ALLOW_STALE").unwrap_or(defaults.allow_stale),
            length_mode: parse_var("CACHE_LENGTH_MODE").unwrap_or(defaults.length_mode),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            snapshot_path: env::var("SNAPSHOT_PATH")
                .ok()
                .filter(|path| !path.is_empty())
                .map(PathBuf::from),
            snapshot_interval: parse_var("SNAPSHOT_INTERVAL").unwrap_or(defaults.snapshot_interval),
        }
    }

    // == Build Cache ==
    /// Creates the server's cache from this configuration.
    ///
    /// Disposed entries are logged at debug level.
    pub fn build_cache(&self) -> LruCache<String, String> {
        let mut options = CacheOptions::new()
            .max(self.max)
            .max_age(self.max_age_ms)
            .stale(self.allow_stale)
            .dispose(|key: &String, _value: &String| {
                debug!(key = %key, "Disposed cache entry");
            });

        if self.length_mode == LengthMode::Bytes {
            options = options.length(|value: &String, _key: &String| value.len());
        }

        LruCache::new(options)
    }
}

/// Reads and parses an environment variable, None when unset or invalid.
fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max: 1000,
            max_age_ms: 0,
            allow_stale: false,
            length_mode: LengthMode::Entries,
            server_port: 3000,
            snapshot_path: None,
            snapshot_interval: 30,
        }
    }
}
