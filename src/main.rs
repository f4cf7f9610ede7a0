//! Recency Cache Server
//!
//! Serves a bounded LRU cache over HTTP, persisting its dump between runs.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use recency_cache::api::{create_router, AppState};
use recency_cache::{snapshot, spawn_snapshot_task, Config};

/// Main entry point for the cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache and restore the last snapshot, if configured
/// 4. Start the periodic snapshot task, if configured
/// 5. Start HTTP server on configured port
/// 6. On SIGINT/SIGTERM, stop the task and write a final snapshot
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "recency_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Recency Cache Server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: max={}, max_age_ms={}, allow_stale={}, length_mode={:?}, port={}",
        config.max, config.max_age_ms, config.allow_stale, config.length_mode, config.server_port
    );

    let state = AppState::from_config(&config);

    let snapshot_handle = match &config.snapshot_path {
        Some(path) => {
            let restored = snapshot::restore(&state.cache, path)
                .await
                .with_context(|| format!("failed to restore snapshot from {}", path.display()))?;
            info!("Restored {} entries from {}", restored, path.display());
            Some(spawn_snapshot_task(
                state.cache.clone(),
                path.clone(),
                config.snapshot_interval,
            ))
        }
        None => {
            info!("Snapshot persistence disabled");
            None
        }
    };

    let app = create_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(handle) = snapshot_handle {
        handle.abort();
        warn!("Snapshot task aborted");
    }
    if let Some(path) = &config.snapshot_path {
        match snapshot::save(&state.cache, path).await {
            Ok(records) => info!("Final snapshot: saved {} entries", records),
            Err(e) => warn!("Final snapshot failed: {}", e),
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
