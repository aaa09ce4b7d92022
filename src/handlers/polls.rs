//! Result callbacks for the periodic pollers

use std::sync::Arc;

use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use crate::actors::coordinator::{EdgeDetector, ReconnectCoordinator};
use crate::actors::messages::{ConnectivityState, ReconnectSignal};
use crate::display::{DisplaySink, Panel};
use crate::metrics::{MetricsStore, Mutation};
use crate::progress::sync_progress;
use crate::rpc::types::{ConsensusParamsResult, NetInfoResult, StatusResult, ValidatorsResult};

const HEALTH_GOOD: &str = "✔️ good";
const HEALTH_DOWN: &str = "✖️ no connection";

/// Health poller state: turns reachability samples into reconnect signals
pub struct HealthMonitor {
    detector: EdgeDetector,
    coordinator: ReconnectCoordinator,
    sink: Arc<dyn DisplaySink>,
}

impl HealthMonitor {
    pub fn new(coordinator: ReconnectCoordinator, sink: Arc<dyn DisplaySink>) -> Self {
        Self {
            detector: EdgeDetector::new(),
            coordinator,
            sink,
        }
    }

    pub fn state(&self) -> ConnectivityState {
        self.detector.state()
    }

    /// Record one health sample
    ///
    /// Broadcasts at most one signal, and only on a connectivity edge.
    pub fn observe(&mut self, current: ConnectivityState) {
        let previous = self.detector.state();

        if let Some(signal) = self.detector.observe(current) {
            let delivered = self.coordinator.broadcast(signal);
            match signal {
                ReconnectSignal::NoConnection => warn!("node unreachable, told {} feeds", delivered),
                ReconnectSignal::Reconnect => info!("node reachable, told {} feeds", delivered),
            }
        }

        if previous != current {
            let text = match current {
                ConnectivityState::Connected => HEALTH_GOOD,
                ConnectivityState::Disconnected => HEALTH_DOWN,
                ConnectivityState::Unknown => return,
            };
            self.sink.replace(Panel::Health, text.to_string());
        }
    }
}

pub fn render_status(sink: &dyn DisplaySink, status: &StatusResult) {
    sink.replace(
        Panel::Network,
        format!(
            "{}\nversion {}",
            status.node_info.network, status.node_info.version
        ),
    );
}

pub fn render_peers(sink: &dyn DisplaySink, net_info: &NetInfoResult) {
    sink.replace(Panel::Peers, net_info.n_peers.to_string());
}

/// Rewrite the validator table, one row per validator
pub fn render_validators(sink: &dyn DisplaySink, result: &ValidatorsResult) {
    sink.reset(Panel::Validators);
    for (index, validator) in result.validators.iter().enumerate() {
        sink.write(
            Panel::Validators,
            format!(
                "{:>3} {} {}",
                index, validator.address, validator.voting_power
            ),
        );
    }
}

pub fn render_consensus_params(sink: &dyn DisplaySink, result: &ConsensusParamsResult) {
    let block = &result.consensus_params.block;

    sink.replace(Panel::MaxBlockSize, format!("{} bytes", block.max_bytes));

    let gas_limit = match block.max_gas.trim() {
        "-1" => "unlimited".to_string(),
        other => other.to_string(),
    };
    sink.replace(Panel::GasLimit, gas_limit);
}

/// One sync poll: our height against the consensus height
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSample {
    pub current: u64,
    pub catching_up: bool,

    /// Height the consensus engine is working on, if the node reported it
    pub max: Option<u64>,
}

/// Update the sync gauge; an unknown target height leaves it unchanged
pub fn render_sync(sink: &dyn DisplaySink, sample: SyncSample) {
    let percent = if sample.catching_up {
        sync_progress(sample.current, sample.max)
    } else {
        Some(100)
    };

    match percent {
        Some(percent) => sink.set_gauge_percent(Panel::SyncProgress, percent),
        None => debug!("sync target unknown, keeping gauge"),
    }
}

/// One wall clock second
pub fn clock_tick(metrics: &MetricsStore, sink: &dyn DisplaySink, now: DateTime<Local>) {
    let snapshot = metrics.apply(Mutation::TimeTick);

    sink.replace(
        Panel::SystemTime,
        now.format("%Y-%m-%d\n%I:%M:%S %p").to_string(),
    );

    if let Some(seconds) = snapshot.seconds_per_block() {
        sink.replace(Panel::SecondsPerBlock, format!("{:.1}", seconds));
    }
}
