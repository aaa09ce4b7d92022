//! Display sink abstraction
//!
//! Feeds and pollers never touch the terminal. They push pre-formatted
//! updates for named panels into a [`DisplaySink`]; the viewer owns the only
//! rendering task and drains those updates between frames.
//!
//! ```text
//! Poller / StreamFeed ──write/reset/gauge──▶ ChannelSink ──mpsc──▶ viewer::App
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

/// Every panel on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Panel {
    Network,
    Health,
    SystemTime,
    Peers,
    LatestBlock,
    MaxBlockSize,
    GasLimit,
    SecondsPerBlock,
    Validators,
    RoundProgress,
    SyncProgress,
    GasMax,
    GasAvgBlock,
    GasAvgTx,
    LatestTxGas,
    Transactions,
}

impl Panel {
    /// Every panel, in layout order
    pub const ALL: [Panel; 16] = [
        Panel::Network,
        Panel::Health,
        Panel::SystemTime,
        Panel::Peers,
        Panel::LatestBlock,
        Panel::MaxBlockSize,
        Panel::GasLimit,
        Panel::SecondsPerBlock,
        Panel::Validators,
        Panel::RoundProgress,
        Panel::SyncProgress,
        Panel::GasMax,
        Panel::GasAvgBlock,
        Panel::GasAvgTx,
        Panel::LatestTxGas,
        Panel::Transactions,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Panel::Network => "Network",
            Panel::Health => "Health",
            Panel::SystemTime => "System Time",
            Panel::Peers => "Connected Peers",
            Panel::LatestBlock => "Latest Block",
            Panel::MaxBlockSize => "Max Block Size",
            Panel::GasLimit => "Block Gas Limit",
            Panel::SecondsPerBlock => "s Between Blocks",
            Panel::Validators => "Validators",
            Panel::RoundProgress => "Current Block Round",
            Panel::SyncProgress => "Blockchain Sync",
            Panel::GasMax => "Gas Max",
            Panel::GasAvgBlock => "Gas Ø Block",
            Panel::GasAvgTx => "Gas Ø Tx",
            Panel::LatestTxGas => "Gas Latest Tx",
            Panel::Transactions => "Latest Confirmed Transactions",
        }
    }
}

/// One update for one panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelUpdate {
    /// Append text to the panel
    Write { panel: Panel, text: String },

    /// Clear the panel's content
    Reset { panel: Panel },

    /// Set a gauge panel to a percentage in `0..=100`
    Gauge { panel: Panel, percent: u8 },
}

impl PanelUpdate {
    pub fn panel(&self) -> Panel {
        match self {
            PanelUpdate::Write { panel, .. }
            | PanelUpdate::Reset { panel }
            | PanelUpdate::Gauge { panel, .. } => *panel,
        }
    }
}

/// Rendering surface that feeds write into
///
/// Implementations must be callable from any task.
pub trait DisplaySink: Send + Sync {
    fn write(&self, panel: Panel, text: String);

    fn reset(&self, panel: Panel);

    fn set_gauge_percent(&self, panel: Panel, percent: u8);

    /// Replace the panel's content with `text`
    fn replace(&self, panel: Panel, text: String) {
        self.reset(panel);
        self.write(panel, text);
    }
}

/// Sink that marshals updates onto the rendering task through a channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<PanelUpdate>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PanelUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, update: PanelUpdate) {
        // The renderer going away means we are shutting down.
        if self.tx.send(update).is_err() {
            tracing::trace!("display receiver dropped, discarding update");
        }
    }
}

impl DisplaySink for ChannelSink {
    fn write(&self, panel: Panel, text: String) {
        self.send(PanelUpdate::Write { panel, text });
    }

    fn reset(&self, panel: Panel) {
        self.send(PanelUpdate::Reset { panel });
    }

    fn set_gauge_percent(&self, panel: Panel, percent: u8) {
        self.send(PanelUpdate::Gauge {
            panel,
            percent: percent.min(100),
        });
    }
}

/// Sink that keeps every update in memory
///
/// Used for headless runs and tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    updates: Arc<Mutex<Vec<PanelUpdate>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All updates received so far, oldest first
    pub fn updates(&self) -> Vec<PanelUpdate> {
        self.updates.lock().clone()
    }

    /// Updates addressed to a single panel
    pub fn updates_for(&self, panel: Panel) -> Vec<PanelUpdate> {
        self.updates
            .lock()
            .iter()
            .filter(|update| update.panel() == panel)
            .cloned()
            .collect()
    }

    /// Gauge values set on a panel, in order
    pub fn gauge_values(&self, panel: Panel) -> Vec<u8> {
        self.updates_for(panel)
            .into_iter()
            .filter_map(|update| match update {
                PanelUpdate::Gauge { percent, .. } => Some(percent),
                _ => None,
            })
            .collect()
    }

    /// Most recent text written to a panel
    pub fn last_text(&self, panel: Panel) -> Option<String> {
        self.updates_for(panel)
            .into_iter()
            .rev()
            .find_map(|update| match update {
                PanelUpdate::Write { text, .. } => Some(text),
                _ => None,
            })
    }
}

impl DisplaySink for MemorySink {
    fn write(&self, panel: Panel, text: String) {
        self.updates.lock().push(PanelUpdate::Write { panel, text });
    }

    fn reset(&self, panel: Panel) {
        self.updates.lock().push(PanelUpdate::Reset { panel });
    }

    fn set_gauge_percent(&self, panel: Panel, percent: u8) {
        self.updates.lock().push(PanelUpdate::Gauge {
            panel,
            percent: percent.min(100),
        });
    }
}
