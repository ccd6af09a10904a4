//! Bulk Cache server
//!
//! Warms the entity caches from the snapshot directory and serves the JSON
//! lookup API. Run with `export` as the first argument to download fresh
//! snapshots instead.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bulk_cache::{
    create_router, AppState, BulkResolver, Config, DataCacheRegistry, DataService, EntityFetcher,
    EntityKind, Error, SnapshotExporter, TransportClient,
};

/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the transport client
/// 4. Load snapshots into the entity caches
/// 5. Create the response cache (starts its sweep) and the router
/// 6. Serve until SIGINT/SIGTERM, then stop the sweep
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to info for this crate, can be overridden with RUST_LOG
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bulk_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        "Configuration loaded: api={}, rps={}, retries={}, max_entries={}, default_ttl={}s, port={}",
        config.api_base_url,
        config.requests_per_second,
        config.max_retries,
        config.max_entries,
        config.default_ttl,
        config.server_port
    );

    let client = TransportClient::from_config(&config).context("failed to build HTTP client")?;
    let fetcher: Arc<dyn EntityFetcher> = Arc::new(client);

    if std::env::args().nth(1).as_deref() == Some("export") {
        return export_snapshots(&config, fetcher).await;
    }

    let registry = Arc::new(DataCacheRegistry::new());
    match registry.load_from_directory(&config.snapshot_dir) {
        Ok(report) => info!(
            "Snapshots loaded: {} records, {} skipped lines, {} kinds without snapshot",
            report.total_records(),
            report.total_skipped(),
            report.missing.len()
        ),
        Err(Error::SnapshotLoads(errors)) => {
            for e in &errors {
                error!("{}", e);
            }
            warn!("Continuing with {} kinds unloaded", errors.len());
        }
        Err(e) => warn!("Snapshot loading failed: {}", e),
    }

    let service = DataService::new(registry, BulkResolver::new(fetcher));
    let state = AppState::from_config(&config, service);
    let response_cache = Arc::clone(&state.response_cache);
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    match Arc::try_unwrap(response_cache) {
        Ok(cache) => cache.shutdown().await,
        Err(_) => debug!("Response cache still shared at exit; sweep aborted on drop"),
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Downloads every kind into the snapshot directory.
async fn export_snapshots(config: &Config, fetcher: Arc<dyn EntityFetcher>) -> anyhow::Result<()> {
    let exporter = SnapshotExporter::from_config(fetcher, config);
    info!(
        "Exporting snapshots to {} ({} workers, batches of {})",
        config.snapshot_dir.display(),
        exporter.workers(),
        exporter.batch_size()
    );

    let mut failed = Vec::new();
    for kind in EntityKind::ALL {
        match exporter.export_kind(kind, &config.snapshot_dir).await {
            Ok(summary) => info!("{}: {} records", kind, summary.written),
            Err(e) => {
                error!("{}: export failed: {}", kind, e);
                failed.push(kind);
            }
        }
    }

    if !failed.is_empty() {
        anyhow::bail!("export failed for {} kind(s)", failed.len());
    }
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
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
