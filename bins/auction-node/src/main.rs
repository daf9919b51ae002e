//! Auction node binary.
//!
//! Loads configuration, builds the auction house, serves JSON-RPC and logs
//! every committed auction event until Ctrl+C.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::broadcast;
use tracing::{info, warn};

use auction_core::types::AuctionEvent;
use auction_house::{start_rpc_server, AuctionHouse, HouseConfig};

#[derive(Parser, Debug)]
#[command(
    name = "auction-node",
    version,
    about = "Dutch-auction house with step price decay and a JSON-RPC interface"
)]
struct Args {
    /// Configuration file (TOML). Defaults to the platform config directory
    /// when that file exists.
    #[arg(long)]
    config: Option<PathBuf>,

    /// RPC server bind address
    #[arg(long)]
    rpc_bind: Option<String>,

    /// RPC server port
    #[arg(long)]
    rpc_port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Log output format ("text" or "json")
    #[arg(long)]
    log_format: Option<String>,
}

impl Args {
    /// Load the configuration file and apply CLI overrides on top.
    fn into_config(mut self) -> anyhow::Result<HouseConfig> {
        let path = self.config.take().or_else(|| {
            let default = HouseConfig::default_path();
            default.exists().then_some(default)
        });
        let mut config = HouseConfig::load(path.as_deref())
            .with_context(|| format!("loading configuration from {path:?}"))?;
        self.apply_overrides(&mut config);
        Ok(config)
    }

    /// Flags given on the command line win over file and environment values.
    fn apply_overrides(self, config: &mut HouseConfig) {
        if let Some(rpc_bind) = self.rpc_bind {
            config.rpc_bind = rpc_bind;
        }
        if let Some(rpc_port) = self.rpc_port {
            config.rpc_port = rpc_port;
        }
        if let Some(log_level) = self.log_level {
            config.log_level = log_level;
        }
        if let Some(log_format) = self.log_format {
            config.log_format = log_format;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Args::parse().into_config()?;
    init_logging(&config.log_level, &config.log_format);

    info!("Auction node v{}", env!("CARGO_PKG_VERSION"));
    info!("rpc_addr: {}", config.rpc_addr());

    let house = Arc::new(AuctionHouse::from_config(&config).context("invalid configuration")?);
    info!(
        governance = %house.governance(),
        want = %house.want().address,
        from_tokens = house.enabled_tokens().len(),
        "auction house initialized"
    );

    let events = tokio::spawn(log_events(house.subscribe()));

    let (addr, rpc_handle) = start_rpc_server(&config.rpc_addr(), Arc::clone(&house))
        .await
        .with_context(|| format!("starting RPC server on {}", config.rpc_addr()))?;
    info!("RPC server listening on {addr}");
    info!("auction node running (Ctrl+C to stop)");

    tokio::signal::ctrl_c()
        .await
        .context("installing Ctrl+C handler")?;
    info!("received Ctrl+C, shutting down...");

    rpc_handle.stop().ok();
    rpc_handle.stopped().await;
    events.abort();
    info!("auction node shutdown complete");
    Ok(())
}

/// Log every auction event as one JSON line at info level.
async fn log_events(mut rx: broadcast::Receiver<AuctionEvent>) {
    loop {
        match rx.recv().await {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(json) => info!(target: "auction_events", "{json}"),
                Err(e) => warn!("failed to serialize event: {e}"),
            },
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(skipped = n, "lagged behind on auction events");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Initialize tracing subscriber with the given log level and output format.
///
/// `format = "json"` selects structured JSON output; anything else is
/// human-readable text.
fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_str));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_level(true))
            .init();
    }
}
