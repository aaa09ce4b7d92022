//! Tx events

use chrono::Local;

use crate::actors::feed::EventHandler;
use crate::display::Panel;
use crate::error::FeedResult;
use crate::metrics::Mutation;
use crate::rpc::types::{EventData, TxEvent};

use super::{FeedContext, decode_event};

/// Logs confirmed transactions and keeps the gas averages current
pub struct TransactionHandler {
    ctx: FeedContext,
}

impl TransactionHandler {
    pub fn new(ctx: FeedContext) -> Self {
        Self { ctx }
    }
}

impl EventHandler for TransactionHandler {
    fn handle(&self, event: &EventData) -> FeedResult<()> {
        let tx: TxEvent = decode_event(event, "Tx")?;
        let result = tx.tx_result.result;

        // The first event is the fee payment; the second names the message type.
        let tx_type = result
            .events
            .get(1)
            .map(|e| e.kind.as_str())
            .unwrap_or("unknown");

        let snapshot = self.ctx.metrics.apply(Mutation::TxObserved {
            gas_wanted: result.gas_wanted,
        });

        let sink = &self.ctx.sink;
        sink.write(
            Panel::Transactions,
            format!(
                "{} height {} type {}",
                Local::now().format("%Y-%m-%d %I:%M:%S %p"),
                tx.tx_result.height,
                tx_type
            ),
        );
        sink.replace(Panel::LatestTxGas, result.gas_wanted.to_string());
        if let Some(avg) = snapshot.avg_gas_per_tx() {
            sink.replace(Panel::GasAvgTx, avg.to_string());
        }
        if let Some(avg) = snapshot.avg_gas_per_block() {
            sink.replace(Panel::GasAvgBlock, avg.to_string());
        }

        Ok(())
    }
}
