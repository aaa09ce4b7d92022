//! Supervisor - owns every feed task and their shared cancellation scope
//!
//! ## Lifecycle
//!
//! ```text
//! Supervisor::new → start() → [pollers, clock, stream feeds running] → shutdown()
//!                                                                        │
//!                    cancel token ─── every select! point ◄──────────────┘
//! ```
//!
//! There is no top-level retry: a feed that fails goes idle and waits for the
//! health poller to report the node back, which the coordinator fans out.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Local;
use serde::de::DeserializeOwned;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::config::{Config, NodeEndpoint};
use crate::display::DisplaySink;
use crate::error::{FeedError, FeedResult};
use crate::handlers::polls::{self, HealthMonitor, SyncSample};
use crate::handlers::{FeedContext, default_feeds};
use crate::metrics::MetricsStore;
use crate::rpc::types::{
    ConsensusParamsResult, DumpConsensusStateResult, NetInfoResult, StatusResult,
    ValidatorsResult,
};
use crate::rpc::{RpcClient, StreamConnector, fetch_result};

use super::coordinator::ReconnectCoordinator;
use super::feed::{FeedHandle, StreamFeed};
use super::messages::ConnectivityState;
use super::poller::Poller;

/// Starts and stops all feeds against one node
pub struct Supervisor {
    config: Config,
    endpoint: NodeEndpoint,
    client: Arc<dyn RpcClient>,
    connector: Arc<dyn StreamConnector>,
    sink: Arc<dyn DisplaySink>,
    metrics: MetricsStore,
    coordinator: ReconnectCoordinator,
    cancel: CancellationToken,
    tasks: JoinSet<()>,
    feeds: Vec<FeedHandle>,
}

impl Supervisor {
    /// Fails only if the configured node address does not parse
    pub fn new(
        config: Config,
        client: Arc<dyn RpcClient>,
        connector: Arc<dyn StreamConnector>,
        sink: Arc<dyn DisplaySink>,
    ) -> Result<Self> {
        let endpoint = config.endpoint()?;
        let coordinator = ReconnectCoordinator::new(config.signal_capacity);

        Ok(Self {
            config,
            endpoint,
            client,
            connector,
            sink,
            metrics: MetricsStore::new(),
            coordinator,
            cancel: CancellationToken::new(),
            tasks: JoinSet::new(),
            feeds: Vec::new(),
        })
    }

    pub fn metrics(&self) -> &MetricsStore {
        &self.metrics
    }

    pub fn coordinator(&self) -> &ReconnectCoordinator {
        &self.coordinator
    }

    pub fn endpoint(&self) -> &NodeEndpoint {
        &self.endpoint
    }

    /// Token that stops every task when cancelled
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// State observers for the stream feeds, in start order
    pub fn feed_handles(&self) -> &[FeedHandle] {
        &self.feeds
    }

    /// Number of tasks not yet joined
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Spawn all pollers and stream feeds
    ///
    /// Feeds subscribe to the coordinator before the health poller starts, so
    /// no connectivity edge can be missed.
    #[instrument(skip_all, fields(node = %self.endpoint.rpc_url))]
    pub fn start(&mut self) {
        if !self.tasks.is_empty() {
            warn!("supervisor already started");
            return;
        }

        self.start_feeds();
        self.start_health_poller();
        self.start_metric_pollers();
        self.start_clock();

        info!("started {} tasks", self.tasks.len());
    }

    fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.spawn(task);
    }

    fn start_feeds(&mut self) {
        let ctx = FeedContext::new(self.metrics.clone(), self.sink.clone());

        for descriptor in default_feeds(&ctx) {
            let feed = StreamFeed::new(
                descriptor,
                self.endpoint.ws_url.as_str(),
                self.connector.clone(),
                self.coordinator.subscribe(),
                self.config.connect_timeout(),
            );
            self.feeds.push(feed.handle());
            self.spawn(feed.run(self.cancel.clone()));
        }
    }

    fn start_health_poller(&mut self) {
        let client = self.client.clone();
        let mut monitor = HealthMonitor::new(self.coordinator.clone(), self.sink.clone());

        let poller = Poller::new("health", self.config.health_interval());
        let task = poller.run(
            self.cancel.clone(),
            move || {
                let client = client.clone();
                async move {
                    // Reachability is the result, so this never fails
                    let state = match client.fetch("health").await {
                        Ok(_) => ConnectivityState::Connected,
                        Err(e) => {
                            debug!("health check failed: {}", e);
                            ConnectivityState::Disconnected
                        }
                    };
                    Ok::<_, FeedError>(state)
                }
            },
            move |state| monitor.observe(state),
        );
        self.spawn(task);
    }

    fn start_metric_pollers(&mut self) {
        let sink = self.sink.clone();
        self.spawn_endpoint_poller(
            "status",
            self.config.status_interval(),
            "status",
            move |status: StatusResult| polls::render_status(sink.as_ref(), &status),
        );

        let sink = self.sink.clone();
        self.spawn_endpoint_poller(
            "peers",
            self.config.peers_interval(),
            "net_info",
            move |net_info: NetInfoResult| polls::render_peers(sink.as_ref(), &net_info),
        );

        let sink = self.sink.clone();
        self.spawn_endpoint_poller(
            "validators",
            self.config.validators_interval(),
            "validators",
            move |validators: ValidatorsResult| {
                polls::render_validators(sink.as_ref(), &validators)
            },
        );

        let sink = self.sink.clone();
        self.spawn_endpoint_poller(
            "consensus-params",
            self.config.consensus_params_interval(),
            "consensus_params",
            move |params: ConsensusParamsResult| {
                polls::render_consensus_params(sink.as_ref(), &params)
            },
        );

        let client = self.client.clone();
        let sink = self.sink.clone();
        let poller = Poller::new("sync", self.config.sync_interval());
        let task = poller.run(
            self.cancel.clone(),
            move || {
                let client = client.clone();
                async move { fetch_sync_sample(client.as_ref()).await }
            },
            move |sample| polls::render_sync(sink.as_ref(), sample),
        );
        self.spawn(task);
    }

    /// Poller that decodes one endpoint's `result` into `T`
    fn spawn_endpoint_poller<T, H>(
        &mut self,
        label: &'static str,
        interval: Duration,
        endpoint: &'static str,
        on_result: H,
    ) where
        T: DeserializeOwned + Send + 'static,
        H: FnMut(T) + Send + 'static,
    {
        let client = self.client.clone();
        let poller = Poller::new(label, interval);
        let task = poller.run(
            self.cancel.clone(),
            move || {
                let client = client.clone();
                async move { fetch_result::<T>(client.as_ref(), endpoint).await }
            },
            on_result,
        );
        self.spawn(task);
    }

    fn start_clock(&mut self) {
        let metrics = self.metrics.clone();
        let sink = self.sink.clone();

        let poller = Poller::new("clock", Duration::from_secs(1));
        let task = poller.run(
            self.cancel.clone(),
            || async { Ok::<_, FeedError>(Local::now()) },
            move |now| polls::clock_tick(&metrics, sink.as_ref(), now),
        );
        self.spawn(task);
    }

    /// Cancel every task and wait for them to finish
    ///
    /// Tasks still running after the grace period are aborted. Returns the
    /// number of tasks that stopped on their own.
    #[instrument(skip_all)]
    pub async fn shutdown(mut self) -> usize {
        debug!("shutting down {} tasks", self.tasks.len());
        self.cancel.cancel();

        let mut joined = 0;
        let grace = self.config.shutdown_grace();

        let drained = tokio::time::timeout(grace, async {
            while let Some(result) = self.tasks.join_next().await {
                if let Err(e) = result {
                    warn!("task ended abnormally: {}", e);
                }
                joined += 1;
            }
        })
        .await;

        if drained.is_err() {
            warn!(
                "{} tasks still running after {:?}, aborting",
                self.tasks.len(),
                grace
            );
            self.tasks.abort_all();
            while self.tasks.join_next().await.is_some() {}
        }

        info!("supervisor stopped");
        joined
    }
}

/// Our latest height plus the height consensus is working on
///
/// A failing `dump_consensus_state` (often disabled on public nodes) only
/// leaves the target unknown.
async fn fetch_sync_sample(client: &dyn RpcClient) -> FeedResult<SyncSample> {
    let status: StatusResult = fetch_result(client, "status").await?;

    let max = match fetch_result::<DumpConsensusStateResult>(client, "dump_consensus_state").await
    {
        Ok(dump) => Some(dump.round_state.height),
        Err(e) => {
            debug!("consensus height unavailable: {}", e);
            None
        }
    };

    Ok(SyncSample {
        current: status.sync_info.latest_block_height,
        catching_up: status.sync_info.catching_up,
        max,
    })
}
