//! Forwarding gateway (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌────────────────────────────────────────────────┐
//!                     │                FORWARDING GATEWAY               │
//!                     │                                                 │
//!   Client Request    │  ┌─────────┐    ┌──────────┐    ┌───────────┐  │
//!   ──────────────────┼─▶│  http   │───▶│ proxy::  │───▶│ transport │──┼──▶ Upstream
//!   /api/{*path}      │  │ server  │    │ gateway  │    │ (hyper)   │  │    Origin
//!                     │  └─────────┘    └──────────┘    └─────┬─────┘  │
//!                     │                                        │        │
//!   Client Response   │  ┌──────────────────────────┐          │        │
//!   ◀─────────────────┼──│ relay body (streamed)    │◀─────────┘        │
//!                     │  └──────────────────────────┘                   │
//!                     │                                                 │
//!                     │  config · error · observability · lifecycle     │
//!                     └────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use forwarding_gateway::config::{load_config, validate_config, GatewayConfig};
use forwarding_gateway::observability::{logging, metrics};
use forwarding_gateway::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "forwarding-gateway")]
#[command(about = "Relays every request under a mount prefix to one backend origin", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listener address, overriding file and environment.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    config.apply_env();
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability.log_filter);

    tracing::info!("forwarding-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    if let Err(errors) = validate_config(&config) {
        for error in &errors {
            tracing::error!(%error, "Invalid configuration");
        }
        return Err(format!("{} configuration error(s)", errors.len()).into());
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        mount_prefix = %config.mount.prefix,
        connect_timeout_secs = config.timeouts.connect_secs,
        response_timeout_secs = config.timeouts.response_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    shutdown.trigger_on_signal();

    let server = HttpServer::new(config);
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
