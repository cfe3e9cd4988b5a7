//! Data Registry - a record registry with a write-through cache
//!
//! Serves the registry over HTTP on the configured port.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use data_registry::cache::MemoryCache;
use data_registry::notify::{spawn_dispatcher, MemoryQueue};
use data_registry::store::SqliteStore;
use data_registry::{create_router, spawn_cleanup_task, AppState, Config, RecordService};

/// Time allowed for queued notifications to be published on shutdown
const DISPATCH_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Main entry point for the registry server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Connect the store, cache and notification queue
/// 4. Start the notification dispatcher and TTL cleanup task
/// 5. Serve HTTP until SIGINT/SIGTERM
/// 6. Drain pending notifications
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "data_registry=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Data Registry");

    let config = Config::from_env();
    info!(
        "Configuration loaded: port={}, database={}, list_cache_ttl={}s, call_timeout={}ms, queue={}",
        config.server_port,
        config.database_path,
        config.list_cache_ttl,
        config.call_timeout_ms,
        config.queue_name
    );

    let store = Arc::new(
        SqliteStore::connect(&config.database_path)
            .await
            .context("failed to open record store")?,
    );
    let cache = MemoryCache::new();
    let queue = Arc::new(MemoryQueue::new(config.queue_capacity));
    info!("Store, cache and queue initialized");

    let (notifier, dispatcher) =
        spawn_dispatcher(queue, config.queue_name.clone(), config.notify_buffer);

    let service = RecordService::new(store, Arc::new(cache.clone()), notifier)
        .with_list_ttl(config.list_cache_ttl)
        .with_call_timeout(config.call_timeout());

    let cleanup_handle = spawn_cleanup_task(cache, config.cleanup_interval);
    info!("Background cleanup task started");

    let app = create_router(AppState::new(service));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    // The router owns the last notifier; once it is dropped the dispatcher drains and exits
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cleanup_handle))
        .await
        .context("server error")?;

    if tokio::time::timeout(DISPATCH_DRAIN_TIMEOUT, dispatcher).await.is_err() {
        warn!("Notification dispatcher did not drain in time");
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then stops the cleanup task.
async fn shutdown_signal(cleanup_handle: JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
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

    cleanup_handle.abort();
    warn!("Cleanup task aborted");
}
