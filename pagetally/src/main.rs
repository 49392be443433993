//! pagetally - single-process web analytics collector
//!
//! Accepts page-view and event telemetry plus user records over
//! HTTP/JSON, keeps them in an in-memory store persisted to one JSON
//! snapshot file, and serves aggregate statistics and a dashboard.

mod dashboard;
mod server;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use pagetally_core::config::LoggingConfig;
use pagetally_core::{Config, Store};

#[derive(Parser)]
#[command(name = "pagetally")]
#[command(about = "Single-process web analytics collector")]
#[command(version)]
struct Args {
    /// Path to a config file (default: ~/.config/pagetally/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Snapshot file path (overrides config)
    #[arg(short, long)]
    data_file: Option<PathBuf>,

    /// Verbose output (debug-level logging)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("failed to load configuration")?;

    // Initialize logging
    let log_config = LoggingConfig {
        level: if args.verbose {
            "debug".to_string()
        } else {
            config.logging.level.clone()
        },
        max_files: config.logging.max_files,
    };
    let _log_guard =
        pagetally_core::logging::init(&log_config).context("failed to initialize logging")?;

    // Open the snapshot-backed store
    let snapshot_path = args.data_file.unwrap_or_else(|| config.snapshot_path());
    tracing::info!(path = %snapshot_path.display(), "Opening store");
    let store = Arc::new(Mutex::new(Store::open(&snapshot_path)));

    // Serve
    let port = args.port.unwrap_or(config.server.port);
    let addr = format!("{}:{}", config.server.host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(addr = %addr, "pagetally listening");

    axum::serve(listener, server::router(store))
        .await
        .context("server error")?;

    Ok(())
}
