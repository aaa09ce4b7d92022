//! Node Dashboard
//!
//! Live terminal dashboard for a CometBFT/Tendermint node. Polls the node's
//! RPC endpoints and subscribes to its event websocket.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{Level, debug};

use nodewatch::config::{Config, NodeEndpoint};
use nodewatch::viewer::App;

#[derive(Parser, Debug)]
#[command(name = "nodewatch", version)]
#[command(about = "Terminal dashboard for CometBFT nodes", long_about = None)]
struct Args {
    /// Node RPC address: host, host:port, :port or a full URL
    #[arg(value_name = "NODE")]
    node: Option<String>,

    /// Node RPC address (same as the positional argument)
    #[arg(short, long, value_name = "URL", conflicts_with = "node")]
    url: Option<String>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level written to the log file
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: Level,
}

/// Logs go to a file while the TUI owns the terminal
fn init_logging(level: Level) {
    let log_dir = dirs::data_dir()
        .or_else(|| std::env::current_dir().ok())
        .map(|dir| dir.join("nodewatch"));

    let log_file = log_dir.and_then(|dir| {
        std::fs::create_dir_all(&dir).ok()?;
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("nodewatch.log"))
            .ok()
    });

    match log_file {
        Some(file) => {
            tracing_subscriber::fmt()
                .with_target(false)
                .with_level(true)
                .with_ansi(false)
                .with_max_level(level)
                .with_writer(file)
                .init();
        }
        None => {
            // If we can't create a log file, use a minimal stderr logger that only shows errors
            tracing_subscriber::fmt()
                .with_target(false)
                .with_level(true)
                .with_max_level(Level::ERROR)
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_level);
    debug!("started with args: {args:?}");

    let mut config = Config::load(args.config.as_deref())?;

    // Override with CLI args if provided
    if let Some(node) = args.node.or(args.url) {
        config.node = node;
    }

    // Fail before touching the terminal
    let endpoint = NodeEndpoint::parse(&config.node)
        .with_context(|| format!("invalid node address '{}'", config.node))?;
    debug!("rpc {} events {}", endpoint.rpc_url, endpoint.ws_url);

    let app = App::new(config)?;
    app.run().await
}
