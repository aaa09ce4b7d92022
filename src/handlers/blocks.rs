//! NewBlock events

use tracing::trace;

use crate::actors::feed::EventHandler;
use crate::display::Panel;
use crate::error::FeedResult;
use crate::metrics::Mutation;
use crate::rpc::types::{EventData, NewBlockEvent};

use super::{FeedContext, decode_event};

/// Counts blocks and tracks the heaviest block seen
pub struct BlockHandler {
    ctx: FeedContext,
}

impl BlockHandler {
    pub fn new(ctx: FeedContext) -> Self {
        Self { ctx }
    }
}

impl EventHandler for BlockHandler {
    fn handle(&self, event: &EventData) -> FeedResult<()> {
        let block: NewBlockEvent = decode_event(event, "NewBlock")?;
        let height = block.block.header.height;

        // Gas wanted by the block's transactions, when the node includes results
        let block_gas = block
            .result_finalize_block
            .map(|results| {
                results
                    .tx_results
                    .iter()
                    .fold(0u64, |acc, tx| acc.saturating_add(tx.gas_wanted))
            })
            .unwrap_or_default();

        trace!("block {} wants {} gas", height, block_gas);

        let snapshot = self.ctx.metrics.apply(Mutation::BlockObserved {
            height,
            max_gas: block_gas,
        });

        let sink = &self.ctx.sink;
        sink.replace(Panel::LatestBlock, height.to_string());
        sink.replace(Panel::GasMax, snapshot.max_gas_seen_in_block.to_string());
        if let Some(avg) = snapshot.avg_gas_per_block() {
            sink.replace(Panel::GasAvgBlock, avg.to_string());
        }

        Ok(())
    }
}
