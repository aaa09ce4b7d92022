//! Shared running aggregates fed by the stream feeds and the clock
//!
//! The store is the only mutable state shared between feeds. Every mutation
//! runs under a single lock so a block observation and a transaction
//! observation arriving from different tasks never interleave, and readers
//! always get a consistent copy.

use std::sync::Arc;

use parking_lot::Mutex;

/// A single change to the aggregates, attributable to exactly one feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// A NewBlock event arrived
    BlockObserved {
        /// Height reported in the block header
        height: u64,
        /// Gas wanted by all transactions in this block
        max_gas: u64,
    },

    /// A Tx event arrived
    TxObserved { gas_wanted: u64 },

    /// One second of wall clock elapsed
    TimeTick,
}

/// Point-in-time copy of the aggregates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub block_count: u64,
    pub seconds_observed: u64,
    pub total_gas_wanted: u64,
    pub last_tx_gas_wanted: u64,
    pub max_gas_seen_in_block: u64,
    pub transaction_count: u64,
    pub latest_height: u64,
}

impl MetricsSnapshot {
    /// Average gas wanted per observed block
    ///
    /// The block counter only advances on websocket events while the total
    /// comes from transaction events, so after a reconnect the two can drift.
    /// That is fine for a dashboard.
    pub fn avg_gas_per_block(&self) -> Option<u64> {
        self.total_gas_wanted.checked_div(self.block_count)
    }

    /// Average gas wanted per observed transaction
    pub fn avg_gas_per_tx(&self) -> Option<u64> {
        self.total_gas_wanted.checked_div(self.transaction_count)
    }

    /// Seconds elapsed per observed block
    pub fn seconds_per_block(&self) -> Option<f64> {
        if self.block_count == 0 {
            return None;
        }
        Some(self.seconds_observed as f64 / self.block_count as f64)
    }

    fn apply(&mut self, mutation: Mutation) {
        match mutation {
            Mutation::BlockObserved { height, max_gas } => {
                self.block_count = self.block_count.saturating_add(1);
                self.max_gas_seen_in_block = self.max_gas_seen_in_block.max(max_gas);
                self.latest_height = self.latest_height.max(height);
            }
            Mutation::TxObserved { gas_wanted } => {
                self.transaction_count = self.transaction_count.saturating_add(1);
                self.total_gas_wanted = self.total_gas_wanted.saturating_add(gas_wanted);
                self.last_tx_gas_wanted = gas_wanted;
            }
            Mutation::TimeTick => {
                self.seconds_observed = self.seconds_observed.saturating_add(1);
            }
        }
    }
}

/// Cloneable handle to the shared aggregates
#[derive(Debug, Clone, Default)]
pub struct MetricsStore {
    inner: Arc<Mutex<MetricsSnapshot>>,
}

impl MetricsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a mutation and return the state right after it
    ///
    /// Returning the post-mutation copy lets a handler render exactly the
    /// values its own update produced without a second lock round-trip.
    pub fn apply(&self, mutation: Mutation) -> MetricsSnapshot {
        let mut guard = self.inner.lock();
        guard.apply(mutation);
        *guard
    }

    /// Consistent copy of all aggregates
    pub fn snapshot(&self) -> MetricsSnapshot {
        *self.inner.lock()
    }
}
