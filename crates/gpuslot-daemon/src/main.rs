//! gpuslot daemon
//!
//! Serves the reservation API for a fixed pool of GPUs.

use anyhow::Context;
use clap::Parser;
use gpuslot_api::build_app;
use gpuslot_core::{DaemonConfig, LogFormat, LoggingConfig};
use gpuslot_scheduler::{ResourceRegistry, Scheduler};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// gpuslotd - exclusive time-slot reservations for shared GPUs
#[derive(Parser, Debug)]
#[command(name = "gpuslotd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Address to bind the API server (overrides config)
    #[arg(long)]
    address: Option<String>,

    /// Port for the API server (overrides config)
    #[arg(long)]
    port: Option<u16>,

    /// Log level (overrides config; RUST_LOG takes precedence)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => DaemonConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => DaemonConfig::default(),
    };
    if let Some(address) = args.address {
        config.api.address = address;
    }
    if let Some(port) = args.port {
        config.api.port = port;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    init_logging(&config.logging)?;

    info!("Starting gpuslot daemon v{}", env!("CARGO_PKG_VERSION"));

    // The resource pool is fixed for the lifetime of the process
    let registry = ResourceRegistry::from_config(&config)?;
    for resource in registry.list() {
        info!(resource_id = resource.id, "Registered {}", resource);
    }

    let scheduler = Arc::new(Scheduler::new(registry));
    let app = build_app(scheduler, &config.api);

    let addr: SocketAddr = format!("{}:{}", config.api.address, config.api.port)
        .parse()
        .context("invalid listen address")?;

    info!(prefix = %config.api.prefix, "API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("gpuslot daemon stopped");
    Ok(())
}

fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .context("invalid log level")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let result = match config.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| anyhow::anyhow!("failed to install subscriber: {}", e))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
