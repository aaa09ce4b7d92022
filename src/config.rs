//! Dashboard configuration
//!
//! Loaded once at startup and handed to the supervisor by value. Nothing in
//! the feed layer reads process-wide settings.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::trace;
use url::Url;

const SCHEME_HTTP: &str = "http";
const SCHEME_HTTPS: &str = "https";

/// Dashboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Node RPC address (`host`, `host:port`, `:port` or a full URL)
    #[serde(default = "default_node")]
    pub node: String,

    /// Health check interval in milliseconds (default: 1000)
    #[serde(default = "default_health_interval")]
    pub health_interval_ms: u64,

    /// Network/status refresh interval in seconds (default: 5)
    #[serde(default = "default_status_interval")]
    pub status_interval_secs: u64,

    /// Peer count refresh interval in seconds (default: 5)
    #[serde(default = "default_peers_interval")]
    pub peers_interval_secs: u64,

    /// Validator list refresh interval in seconds (default: 10)
    #[serde(default = "default_validators_interval")]
    pub validators_interval_secs: u64,

    /// Consensus parameter refresh interval in seconds (default: 60)
    #[serde(default = "default_consensus_params_interval")]
    pub consensus_params_interval_secs: u64,

    /// Sync gauge refresh interval in milliseconds (default: 1000)
    #[serde(default = "default_sync_interval")]
    pub sync_interval_ms: u64,

    /// HTTP request timeout in seconds (default: 5)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Websocket connect timeout in seconds (default: 10)
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Capacity of the reconnect signal bus (default: 16)
    #[serde(default = "default_signal_capacity")]
    pub signal_capacity: usize,

    /// How long shutdown waits for tasks before aborting them (default: 5)
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,

    /// Lines kept in the scrolling panels (default: 200)
    #[serde(default = "default_log_lines")]
    pub max_log_lines: usize,
}

fn default_node() -> String {
    "http://localhost:26657".to_string()
}

fn default_health_interval() -> u64 {
    1000
}

fn default_status_interval() -> u64 {
    5
}

fn default_peers_interval() -> u64 {
    5
}

fn default_validators_interval() -> u64 {
    10
}

fn default_consensus_params_interval() -> u64 {
    60
}

fn default_sync_interval() -> u64 {
    1000
}

fn default_request_timeout() -> u64 {
    5
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_signal_capacity() -> usize {
    16
}

fn default_shutdown_grace() -> u64 {
    5
}

fn default_log_lines() -> usize {
    200
}

impl Config {
    /// Load configuration from file, or use defaults if file doesn't exist
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path.map(|p| p.to_path_buf()).or_else(|| {
            let default_path = dirs::config_dir()?.join("nodewatch/config.toml");
            default_path.exists().then_some(default_path)
        });

        if let Some(path) = config_path {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;

            toml::from_str::<Config>(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
                .inspect(|config| trace!("loaded config: {config:?}"))
        } else {
            Ok(Self::default())
        }
    }

    /// Resolve the configured node address into concrete endpoints
    pub fn endpoint(&self) -> Result<NodeEndpoint> {
        NodeEndpoint::parse(&self.node)
    }

    pub fn health_interval(&self) -> Duration {
        Duration::from_millis(self.health_interval_ms)
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_secs(self.status_interval_secs)
    }

    pub fn peers_interval(&self) -> Duration {
        Duration::from_secs(self.peers_interval_secs)
    }

    pub fn validators_interval(&self) -> Duration {
        Duration::from_secs(self.validators_interval_secs)
    }

    pub fn consensus_params_interval(&self) -> Duration {
        Duration::from_secs(self.consensus_params_interval_secs)
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_millis(self.sync_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// At least one second; a zero timeout would fail every connect
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.max(1))
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node: default_node(),
            health_interval_ms: default_health_interval(),
            status_interval_secs: default_status_interval(),
            peers_interval_secs: default_peers_interval(),
            validators_interval_secs: default_validators_interval(),
            consensus_params_interval_secs: default_consensus_params_interval(),
            sync_interval_ms: default_sync_interval(),
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            signal_capacity: default_signal_capacity(),
            shutdown_grace_secs: default_shutdown_grace(),
            max_log_lines: default_log_lines(),
        }
    }
}

/// RPC and websocket locations of one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeEndpoint {
    /// Base URL for request/response calls, always ending in `/`
    pub rpc_url: Url,

    /// Event subscription URL (`ws://host:port[/prefix]/websocket`)
    pub ws_url: Url,
}

impl NodeEndpoint {
    /// Parse a node address
    ///
    /// Accepts `host`, `host:port`, `:port` (meaning localhost) and full
    /// `http(s)://` URLs, optionally with a path prefix. A missing port
    /// defaults to 80 or 443 by scheme.
    pub fn parse(address: &str) -> Result<Self> {
        let address = address.trim();
        anyhow::ensure!(!address.is_empty(), "node address is empty");

        let address = if address.starts_with(':') {
            format!("localhost{address}")
        } else {
            address.to_string()
        };

        let with_scheme = if address.contains("://") {
            address
        } else {
            format!("{SCHEME_HTTP}://{address}")
        };

        let parsed = Url::parse(&with_scheme)
            .with_context(|| format!("Invalid node address: {with_scheme}"))?;

        let ssl = match parsed.scheme() {
            SCHEME_HTTP => false,
            SCHEME_HTTPS => true,
            other => anyhow::bail!("Unsupported node scheme '{other}', expected http or https"),
        };

        let host = parsed
            .host_str()
            .ok_or_else(|| anyhow::anyhow!("Node address missing host: {with_scheme}"))?;
        let port = parsed.port().unwrap_or(if ssl { 443 } else { 80 });

        let (rpc_scheme, ws_scheme) = if ssl { ("https", "wss") } else { ("http", "ws") };

        // a path prefix (reverse proxy) is kept for both endpoints
        let prefix = parsed.path().trim_end_matches('/');

        let rpc_url = Url::parse(&format!("{rpc_scheme}://{host}:{port}{prefix}/"))
            .context("Failed to build RPC URL")?;
        let ws_url = Url::parse(&format!("{ws_scheme}://{host}:{port}{prefix}/websocket"))
            .context("Failed to build websocket URL")?;

        Ok(Self { rpc_url, ws_url })
    }

    pub fn is_ssl(&self) -> bool {
        self.rpc_url.scheme() == SCHEME_HTTPS
    }
}
