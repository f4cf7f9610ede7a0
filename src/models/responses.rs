//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::{Deserialize, Serialize};

use crate::cache::CacheStats;

/// Response body for GET /get/:key and GET /peek/:key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The stored value
    pub value: String,
}

impl GetResponse {
    /// Creates a new GetResponse
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Response body for the SET operation (PUT /set)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
}

impl SetResponse {
    /// Creates a new SetResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
        }
    }
}

/// Response body for GET /has/:key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HasResponse {
    pub key: String,
    /// True if the key holds a fresh value
    pub present: bool,
}

/// Response body for GET /ttl/:key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtlResponse {
    pub key: String,
    /// Milliseconds left before the value goes stale, null if it never does
    pub remaining_ms: Option<u64>,
}

impl TtlResponse {
    /// Builds the response from `LruCache::remaining_ttl`, where `u64::MAX`
    /// means the entry never expires.
    pub fn new(key: String, remaining: u64) -> Self {
        Self {
            key,
            remaining_ms: (remaining != u64::MAX).then_some(remaining),
        }
    }
}

/// Response body for the DELETE operation (DELETE /del/:key)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was deleted
    pub key: String,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted successfully", key),
            key,
        }
    }
}

/// Response body for POST /pop: the evicted least recently used entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopResponse {
    pub key: String,
    pub value: String,
}

/// Response body for POST /reset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetResponse {
    /// Number of entries disposed by the reset
    pub cleared: usize,
}

/// Response body for POST /prune
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PruneResponse {
    /// Number of stale entries removed
    pub removed: usize,
}

/// Response body for GET /keys, most recently used first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeysResponse {
    pub keys: Vec<String>,
}

/// Response body for POST /load
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadResponse {
    /// Records received
    pub received: usize,
    /// Entries cached after loading (expired records are skipped)
    pub loaded: usize,
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    /// Number of lookups that returned a value
    pub hits: u64,
    /// Number of lookups that returned nothing
    pub misses: u64,
    /// Number of LRU evictions
    pub evictions: u64,
    /// Number of stale entries removed
    pub expirations: u64,
    /// Number of oversized sets rejected
    pub rejections: u64,
    /// Current number of entries in cache
    pub total_entries: usize,
    /// Current total weight of the cache
    pub total_weight: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            expirations: stats.expirations,
            rejections: stats.rejections,
            total_entries: stats.total_entries,
            total_weight: stats.total_weight,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
