//! Application state management

use chrono::{DateTime, Local};
use std::collections::{HashMap, VecDeque};

use crate::display::{Panel, PanelUpdate};

/// What the dashboard currently shows
///
/// Only the rendering task touches this; feeds reach it through
/// [`PanelUpdate`]s drained from the display channel.
pub struct DashboardState {
    /// Text lines per panel, oldest first
    panels: HashMap<Panel, VecDeque<String>>,

    /// Gauge positions in percent
    gauges: HashMap<Panel, u8>,

    /// Line cap per panel
    max_lines: usize,

    /// Last time any update arrived
    pub last_update: Option<DateTime<Local>>,
}

impl DashboardState {
    /// Empty dashboard with every panel showing its placeholder
    pub fn new(max_lines: usize) -> Self {
        let panels = Panel::ALL
            .iter()
            .filter_map(|panel| {
                let text = placeholder(*panel)?;
                Some((*panel, text.lines().map(str::to_string).collect()))
            })
            .collect();

        Self {
            panels,
            gauges: HashMap::new(),
            max_lines: max_lines.max(1),
            last_update: None,
        }
    }

    /// Fold one update into the state
    pub fn apply(&mut self, update: PanelUpdate) {
        match update {
            PanelUpdate::Write { panel, text } => {
                let lines = self.panels.entry(panel).or_default();
                lines.extend(text.lines().map(str::to_string));

                // Trim to max buffer size
                while lines.len() > self.max_lines {
                    lines.pop_front();
                }
            }
            PanelUpdate::Reset { panel } => {
                if let Some(lines) = self.panels.get_mut(&panel) {
                    lines.clear();
                }
            }
            PanelUpdate::Gauge { panel, percent } => {
                self.gauges.insert(panel, percent.min(100));
            }
        }

        self.last_update = Some(Local::now());
    }

    pub fn lines(&self, panel: Panel) -> impl Iterator<Item = &str> {
        self.panels
            .get(&panel)
            .into_iter()
            .flat_map(|lines| lines.iter().map(String::as_str))
    }

    /// Panel content joined into one block
    pub fn text(&self, panel: Panel) -> String {
        self.lines(panel).collect::<Vec<_>>().join("\n")
    }

    pub fn gauge(&self, panel: Panel) -> u8 {
        self.gauges.get(&panel).copied().unwrap_or_default()
    }
}

/// Text a panel shows before its first update
fn placeholder(panel: Panel) -> Option<&'static str> {
    match panel {
        Panel::Network | Panel::Health | Panel::LatestBlock => Some("⌛ loading"),
        Panel::Peers | Panel::SecondsPerBlock | Panel::MaxBlockSize => Some("0"),
        Panel::Validators => Some("List available validators."),
        Panel::GasMax | Panel::GasAvgBlock | Panel::GasAvgTx | Panel::LatestTxGas => {
            Some("How much gas.")
        }
        Panel::Transactions => {
            Some("Transactions will appear as soon as they are confirmed in a block.")
        }
        Panel::SystemTime | Panel::GasLimit | Panel::RoundProgress | Panel::SyncProgress => None,
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new(200)
    }
}
