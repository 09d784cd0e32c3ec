//! LazyKV Server Binary
//!
//! Opens the engine and serves it over HTTP until Ctrl+C.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use lazykv::{Config, Engine, WalSyncStrategy};
use tracing_subscriber::{fmt, EnvFilter};

/// LazyKV Server
#[derive(Parser, Debug)]
#[command(name = "lazykv-server")]
#[command(about = "In-memory key-value store with WAL durability and snapshots")]
#[command(version)]
struct Args {
    /// Write-ahead log path
    #[arg(short, long, default_value = "./lazykv_data/wal.log")]
    wal: PathBuf,

    /// Snapshot path
    #[arg(short, long, default_value = "./lazykv_data/snapshot.db")]
    snapshot: PathBuf,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    listen: String,

    /// Maximum number of cached entries (0 disables the cache)
    #[arg(short, long, default_value = "1024")]
    cache_capacity: usize,

    /// Seconds between automatic snapshots (0 disables them)
    #[arg(short = 'i', long, default_value = "3600")]
    snapshot_interval_secs: u64,

    /// Skip fsync on every WAL append (flush to the OS only)
    #[arg(long)]
    no_fsync: bool,
}

#[tokio::main]
async fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,lazykv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("LazyKV Server v{}", lazykv::VERSION);
    tracing::info!("WAL: {}", args.wal.display());
    tracing::info!("Snapshot: {}", args.snapshot.display());
    tracing::info!("Listen address: {}", args.listen);

    // Build config from args
    let mut builder = Config::builder()
        .wal_path(&args.wal)
        .snapshot_path(&args.snapshot)
        .cache_capacity(args.cache_capacity);
    builder = if args.snapshot_interval_secs == 0 {
        builder.disable_periodic_snapshots()
    } else {
        builder.snapshot_interval(Duration::from_secs(args.snapshot_interval_secs))
    };
    if args.no_fsync {
        builder = builder.wal_sync_strategy(WalSyncStrategy::OsBuffered);
    }
    let config = builder.build();

    // Open engine
    let engine = match Engine::open(config) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(keys = engine.len(), "Engine initialized successfully");

    let listener = match tokio::net::TcpListener::bind(&args.listen).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", args.listen, e);
            std::process::exit(1);
        }
    };

    let app = lazykv::http::router(Arc::clone(&engine));
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Err(e) = served {
        tracing::error!("Server error: {}", e);
    }

    if let Err(e) = engine.close() {
        tracing::error!("Failed to close engine: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}

/// Resolve on Ctrl+C
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C, initiating shutdown..."),
        Err(e) => {
            // Without a signal handler, keep serving until the process is killed
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
