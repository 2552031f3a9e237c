//! Vibe Node - realtime chat backend.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use vibe_node::api::{create_router, AppState};
use vibe_node::config::NodeConfig;
use vibe_node::observability::{init_logging, LogFormat};
use vibe_realtime::Dispatcher;

/// Vibe Node - realtime chat backend
#[derive(Parser, Debug)]
#[command(name = "vibe-node")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (toml, yaml or json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// API listen address
    #[arg(long)]
    api_addr: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Log format (pretty, json)
    #[arg(long)]
    log_format: Option<String>,
}

impl Args {
    /// Command-line flags win over file and environment settings.
    fn apply(self, config: &mut NodeConfig) {
        if let Some(addr) = self.api_addr {
            config.api_addr = addr;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
        if let Some(format) = self.log_format {
            config.log_format = format;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = Args::parse();
    let mut config = NodeConfig::load(args.config.take().as_deref())
        .context("failed to load configuration")?;
    args.apply(&mut config);

    init_logging(
        &config.log_level,
        LogFormat::parse(&config.log_format) == LogFormat::Json,
    );

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting Vibe node");

    let addr = config.socket_addr()?;
    let state = AppState::in_memory(&config);
    let realtime = state.realtime.clone();

    tracing::info!(
        api_addr = %addr,
        keepalive_secs = config.realtime.keepalive_secs,
        max_connections = config.realtime.max_connections,
        "Node configuration"
    );

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!("Node is ready. Press Ctrl+C to stop.");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal(realtime))
        .await
        .context("server error")?;

    tracing::info!("Vibe node stopped");
    Ok(())
}

/// Waits for Ctrl+C, then closes every realtime connection so open streams
/// end and graceful shutdown can finish.
async fn shutdown_signal(realtime: Arc<Dispatcher>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
    realtime.shutdown();
}
