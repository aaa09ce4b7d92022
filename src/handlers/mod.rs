//! Concrete callbacks behind each feed and poller
//!
//! Stream handlers implement [`EventHandler`](crate::actors::feed::EventHandler)
//! and are wired into a [`FeedDescriptor`]; poll handlers are plain functions
//! the supervisor passes to a [`Poller`](crate::actors::poller::Poller) as its
//! `on_result`.

pub mod blocks;
pub mod consensus;
pub mod polls;
pub mod transactions;

use std::sync::Arc;

use serde::Deserialize;

use crate::actors::feed::FeedDescriptor;
use crate::display::DisplaySink;
use crate::error::{FeedError, FeedResult};
use crate::metrics::MetricsStore;
use crate::rpc::types::EventData;

pub use blocks::BlockHandler;
pub use consensus::{RoundStepHandler, ValidatorSetHandler};
pub use polls::HealthMonitor;
pub use transactions::TransactionHandler;

pub const NEW_BLOCK_QUERY: &str = "tm.event='NewBlock'";
pub const TX_QUERY: &str = "tm.event='Tx'";
pub const ROUND_STEP_QUERY: &str = "tm.event='NewRoundStep'";
pub const VALIDATOR_SET_QUERY: &str = "tm.event='ValidatorSetUpdates'";

/// What every handler writes to
#[derive(Clone)]
pub struct FeedContext {
    pub metrics: MetricsStore,
    pub sink: Arc<dyn DisplaySink>,
}

impl FeedContext {
    pub fn new(metrics: MetricsStore, sink: Arc<dyn DisplaySink>) -> Self {
        Self { metrics, sink }
    }
}

/// One descriptor per subscription topic, with their fixed request ids
pub fn default_feeds(ctx: &FeedContext) -> Vec<FeedDescriptor> {
    vec![
        FeedDescriptor::new(
            "blocks",
            NEW_BLOCK_QUERY,
            1,
            Arc::new(BlockHandler::new(ctx.clone())),
        ),
        FeedDescriptor::new(
            "transactions",
            TX_QUERY,
            2,
            Arc::new(TransactionHandler::new(ctx.clone())),
        ),
        FeedDescriptor::new(
            "round-step",
            ROUND_STEP_QUERY,
            3,
            Arc::new(RoundStepHandler::new(ctx.clone())),
        ),
        FeedDescriptor::new(
            "validator-set",
            VALIDATOR_SET_QUERY,
            3,
            Arc::new(ValidatorSetHandler::new(ctx.clone())),
        ),
    ]
}

/// Decode an event value after checking its type tag
///
/// The tag suffix (`NewBlock`, `Tx`, ...) is compared so both the
/// `tendermint/event/` and bare forms are accepted.
fn decode_event<'a, T: Deserialize<'a>>(event: &'a EventData, kind: &str) -> FeedResult<T> {
    let actual = event.kind.rsplit('/').next().unwrap_or_default();
    if actual != kind {
        return Err(FeedError::Parse(format!(
            "expected {kind} event, got {}",
            event.kind
        )));
    }

    Ok(T::deserialize(&event.value)?)
}
