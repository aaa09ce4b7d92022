//! Reconnect coordination between the health poller and the stream feeds
//!
//! ## Message Flow
//!
//! ```text
//! health poll → EdgeDetector → (edge only) ReconnectCoordinator::broadcast
//!                                               │
//!                       ┌───────────────────────┼───────────────────────┐
//!                       ▼                       ▼                       ▼
//!                 blocks feed            transactions feed        round-step feed
//! ```
//!
//! The bus is a bounded `tokio::sync::broadcast` channel. Sending never
//! blocks; a feed that falls behind loses the oldest signals and sees a
//! `Lagged` error instead. Signals are idempotent at the feed and re-sent on
//! every edge, so dropping one is harmless.

use tokio::sync::broadcast;
use tracing::{debug, trace};

use super::messages::{ConnectivityState, ReconnectSignal};

/// Fan-out point for reconnect signals
#[derive(Debug, Clone)]
pub struct ReconnectCoordinator {
    tx: broadcast::Sender<ReconnectSignal>,
}

impl ReconnectCoordinator {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Register a new consumer
    ///
    /// The receiver only sees signals broadcast after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ReconnectSignal> {
        self.tx.subscribe()
    }

    /// Deliver `signal` once to every registered consumer
    ///
    /// Returns the number of consumers that were registered.
    pub fn broadcast(&self, signal: ReconnectSignal) -> usize {
        match self.tx.send(signal) {
            Ok(receivers) => {
                debug!("broadcast {:?} to {} feeds", signal, receivers);
                receivers
            }
            Err(_) => {
                trace!("no feeds registered for {:?}", signal);
                0
            }
        }
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Turns a stream of health observations into connectivity edges
#[derive(Debug, Clone, Default)]
pub struct EdgeDetector {
    last: ConnectivityState,
}

impl EdgeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ConnectivityState {
        self.last
    }

    /// Record an observation, returning the signal for an edge if there was one
    ///
    /// Only `Connected → Disconnected` and `Disconnected → Connected` are
    /// edges. The first observation out of `Unknown` is not.
    pub fn observe(&mut self, current: ConnectivityState) -> Option<ReconnectSignal> {
        let previous = std::mem::replace(&mut self.last, current);

        match (previous, current) {
            (ConnectivityState::Connected, ConnectivityState::Disconnected) => {
                Some(ReconnectSignal::NoConnection)
            }
            (ConnectivityState::Disconnected, ConnectivityState::Connected) => {
                Some(ReconnectSignal::Reconnect)
            }
            _ => None,
        }
    }
}
