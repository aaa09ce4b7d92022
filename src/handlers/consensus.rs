//! Consensus events: round steps and validator set changes

use tracing::trace;

use crate::actors::feed::EventHandler;
use crate::display::Panel;
use crate::error::FeedResult;
use crate::progress::map_round_step;
use crate::rpc::types::{EventData, RoundStepEvent, ValidatorSetUpdatesEvent};

use super::{FeedContext, decode_event};

/// Drives the round progress gauge
pub struct RoundStepHandler {
    ctx: FeedContext,
}

impl RoundStepHandler {
    pub fn new(ctx: FeedContext) -> Self {
        Self { ctx }
    }
}

impl EventHandler for RoundStepHandler {
    fn handle(&self, event: &EventData) -> FeedResult<()> {
        let step: RoundStepEvent = decode_event(event, "RoundState")?;

        match map_round_step(&step.step) {
            Some(percent) => {
                self.ctx.sink.set_gauge_percent(Panel::RoundProgress, percent);
            }
            None => {
                trace!(
                    "no gauge position for {} at height {} round {}",
                    step.step, step.height, step.round
                );
            }
        }

        Ok(())
    }
}

/// Appends validator power changes to the validators panel
pub struct ValidatorSetHandler {
    ctx: FeedContext,
}

impl ValidatorSetHandler {
    pub fn new(ctx: FeedContext) -> Self {
        Self { ctx }
    }
}

impl EventHandler for ValidatorSetHandler {
    fn handle(&self, event: &EventData) -> FeedResult<()> {
        let updates: ValidatorSetUpdatesEvent = decode_event(event, "ValidatorSetUpdates")?;

        for validator in updates.validator_updates {
            let line = if validator.voting_power == 0 {
                format!("- {} removed", validator.address)
            } else {
                format!("~ {} power {}", validator.address, validator.voting_power)
            };
            self.ctx.sink.write(Panel::Validators, line);
        }

        Ok(())
    }
}
