//! Poller - periodic request/response feed
//!
//! ## Message Flow
//!
//! ```text
//! Timer tick → fetch → Ok(value) → on_result(value) → [MetricsStore, DisplaySink]
//!                    → Err(e)    → log, keep last display, retry next tick
//!     ↑
//!     └─── cancellation (raced against the tick and the fetch)
//! ```

use std::future::Future;
use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace, warn};

use crate::error::FeedResult;

/// Periodic fetch loop
#[derive(Debug, Clone)]
pub struct Poller {
    label: &'static str,
    interval: Duration,
}

impl Poller {
    pub fn new(label: &'static str, interval: Duration) -> Self {
        Self {
            label,
            // tokio panics on a zero period
            interval: interval.max(Duration::from_millis(1)),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Run until `cancel` fires
    ///
    /// The first fetch happens immediately. A failed fetch is logged and the
    /// result callback is skipped, so whatever was displayed stays.
    #[instrument(skip_all, fields(poller = %self.label))]
    pub async fn run<T, F, Fut, H>(self, cancel: CancellationToken, mut fetch: F, mut on_result: H)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = FeedResult<T>>,
        H: FnMut(T),
    {
        debug!("starting poller, interval {:?}", self.interval);

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break,

                _ = ticker.tick() => {}
            }

            let result = tokio::select! {
                biased;

                _ = cancel.cancelled() => break,

                result = fetch() => result,
            };

            match result {
                Ok(value) => {
                    trace!("fetch succeeded");
                    on_result(value);
                }
                Err(e) => {
                    warn!("fetch failed, retrying next tick: {}", e);
                }
            }
        }

        debug!("poller stopped");
    }
}
