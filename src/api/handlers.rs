//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::sync::Arc;
use tokio::sync::RwLock;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::LruCache;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::requests::validate_key;
use crate::models::{
    DeleteResponse, GetResponse, HasResponse, HealthResponse, KeysResponse, LoadRequest,
    LoadResponse, PopResponse, PruneResponse, ResetResponse, SetRequest, SetResponse,
    StatsResponse, TtlResponse,
};
use crate::snapshot::SnapshotRecord;

/// The server's cache behind an async lock.
pub type SharedCache = Arc<RwLock<LruCache<String, String>>>;

/// Application state shared across all handlers.
///
/// Every read that may evict a stale entry or bump recency takes the write
/// lock; only `has`, `ttl` and `stats` get by with the read lock.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe cache
    pub cache: SharedCache,
}

impl AppState {
    /// Creates a new AppState with the given cache.
    pub fn new(cache: LruCache<String, String>) -> Self {
        Self {
            cache: Arc::new(RwLock::new(cache)),
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.build_cache())
    }
}

/// Handler for PUT /set
///
/// Stores a key-value pair, optionally with its own max age.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let mut cache = state.cache.write().await;
    if !cache.set_with_max_age(req.key.clone(), req.value, req.max_age_ms) {
        return Err(CacheError::Rejected(req.key));
    }

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /get/:key
///
/// Retrieves a value and marks it most recently used.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let mut cache = state.cache.write().await;
    match cache.get(&key) {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for GET /peek/:key
///
/// Retrieves a value without touching its recency.
pub async fn peek_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let mut cache = state.cache.write().await;
    match cache.peek(&key) {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for GET /has/:key
pub async fn has_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<HasResponse> {
    let cache = state.cache.read().await;
    let present = cache.has(&key);

    Json(HasResponse { key, present })
}

/// Handler for GET /ttl/:key
///
/// Reports how long a fresh value has left. Absent or stale keys are 404.
pub async fn ttl_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<TtlResponse>> {
    let cache = state.cache.read().await;
    if !cache.has(&key) {
        return Err(CacheError::NotFound(key));
    }
    let remaining = cache.remaining_ttl(&key);

    Ok(Json(TtlResponse::new(key, remaining)))
}

/// Handler for DELETE /del/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let mut cache = state.cache.write().await;
    if cache.del(&key) {
        Ok(Json(DeleteResponse::new(key)))
    } else {
        Err(CacheError::NotFound(key))
    }
}

/// Handler for POST /pop
///
/// Removes and returns the least recently used entry.
pub async fn pop_handler(State(state): State<AppState>) -> Result<Json<PopResponse>> {
    let mut cache = state.cache.write().await;
    cache
        .pop()
        .map(|(key, value)| Json(PopResponse { key, value }))
        .ok_or_else(|| CacheError::NotFound("cache is empty".to_string()))
}

/// Handler for POST /reset
pub async fn reset_handler(State(state): State<AppState>) -> Json<ResetResponse> {
    let mut cache = state.cache.write().await;
    let cleared = cache.item_count();
    cache.reset();

    Json(ResetResponse { cleared })
}

/// Handler for POST /prune
pub async fn prune_handler(State(state): State<AppState>) -> Json<PruneResponse> {
    let mut cache = state.cache.write().await;
    Json(PruneResponse {
        removed: cache.prune(),
    })
}

/// Handler for GET /keys
pub async fn keys_handler(State(state): State<AppState>) -> Json<KeysResponse> {
    let mut cache = state.cache.write().await;
    Json(KeysResponse { keys: cache.keys() })
}

/// Handler for GET /dump
pub async fn dump_handler(State(state): State<AppState>) -> Json<Vec<SnapshotRecord>> {
    let mut cache = state.cache.write().await;
    Json(cache.dump())
}

/// Handler for POST /load
///
/// Replaces the cache contents with a previously dumped record list.
pub async fn load_handler(
    State(state): State<AppState>,
    Json(records): Json<LoadRequest>,
) -> Result<Json<LoadResponse>> {
    if let Some(error_msg) = records.iter().find_map(|record| validate_key(&record.key)) {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let received = records.len();
    let mut cache = state.cache.write().await;
    cache.load(records);

    Ok(Json(LoadResponse {
        received,
        loaded: cache.item_count(),
    }))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.cache.read().await;
    Json(StatsResponse::from(cache.stats()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
