//! StreamFeed - one long-lived event subscription
//!
//! Each feed owns a single subscription topic for its whole lifetime and runs
//! an explicit state loop. Reconnecting is a phase change inside one task, not
//! a new task.
//!
//! ## Key Behaviours
//!
//! 1. **Starts connecting immediately** and subscribes with a fixed message
//! 2. **Never retries on its own**: after an error it idles until a
//!    `Reconnect` signal arrives from the coordinator
//! 3. **Bad messages are dropped**, the subscription stays up
//! 4. **Cancellation closes the socket** before the task exits
//!
//! ## Message Flow
//!
//! ```text
//! node event → parse envelope → EventHandler::handle → [MetricsStore, DisplaySink]
//!     ↑
//!     └─── ReconnectSignal (NoConnection, Reconnect), cancellation
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};

use crate::error::{FeedError, FeedResult};
use crate::rpc::types::{EventData, EventEnvelope};
use crate::rpc::{StreamConnection, StreamConnector, subscribe_message};

use super::messages::{FeedState, ReconnectSignal};

/// Turns one decoded event into metric mutations and panel updates
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &EventData) -> FeedResult<()>;
}

/// Immutable description of one feed
#[derive(Clone)]
pub struct FeedDescriptor {
    /// Human readable name used in logs
    pub label: &'static str,

    /// Event query, e.g. `tm.event='NewBlock'`
    pub query: String,

    /// JSON-RPC id of the subscribe request
    pub request_id: u64,

    pub handler: Arc<dyn EventHandler>,
}

impl FeedDescriptor {
    pub fn new(
        label: &'static str,
        query: impl Into<String>,
        request_id: u64,
        handler: Arc<dyn EventHandler>,
    ) -> Self {
        Self {
            label,
            query: query.into(),
            request_id,
            handler,
        }
    }

    pub fn subscribe_message(&self) -> String {
        subscribe_message(&self.query, self.request_id)
    }
}

impl std::fmt::Debug for FeedDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedDescriptor")
            .field("label", &self.label)
            .field("query", &self.query)
            .field("request_id", &self.request_id)
            .finish_non_exhaustive()
    }
}

/// Where the feed loop is; `Streaming` owns the open socket
enum Phase {
    Idle,
    Connecting,
    Streaming(Box<dyn StreamConnection>),
}

/// Actor running a single subscription
pub struct StreamFeed {
    descriptor: FeedDescriptor,

    /// Websocket URL of the node
    url: String,

    connector: Arc<dyn StreamConnector>,

    /// Reconnect signals from the coordinator
    signals: broadcast::Receiver<ReconnectSignal>,

    /// Set once the coordinator is gone so we stop polling a closed channel
    signals_closed: bool,

    state_tx: watch::Sender<FeedState>,

    connect_timeout: Duration,
}

impl StreamFeed {
    pub fn new(
        descriptor: FeedDescriptor,
        url: impl Into<String>,
        connector: Arc<dyn StreamConnector>,
        signals: broadcast::Receiver<ReconnectSignal>,
        connect_timeout: Duration,
    ) -> Self {
        // run() begins by connecting
        let (state_tx, _) = watch::channel(FeedState::Connecting);

        Self {
            descriptor,
            url: url.into(),
            connector,
            signals,
            signals_closed: false,
            state_tx,
            connect_timeout,
        }
    }

    /// Observer for this feed's state
    pub fn handle(&self) -> FeedHandle {
        FeedHandle {
            label: self.descriptor.label,
            state_rx: self.state_tx.subscribe(),
        }
    }

    /// Run the feed until `cancel` fires
    #[instrument(skip_all, fields(feed = %self.descriptor.label))]
    pub async fn run(mut self, cancel: CancellationToken) {
        debug!("starting stream feed for {}", self.descriptor.query);

        let mut phase = Phase::Connecting;

        loop {
            let next = match phase {
                Phase::Idle => self.idle(&cancel).await,
                Phase::Connecting => self.connect(&cancel).await,
                Phase::Streaming(conn) => self.stream(conn, &cancel).await,
            };

            match next {
                Some(next) => phase = next,
                None => break,
            }
        }

        self.set_state(FeedState::Terminated);
        debug!("stream feed stopped");
    }

    fn set_state(&self, state: FeedState) {
        let previous = self.state_tx.send_replace(state);
        if previous != state {
            trace!("{} -> {}", previous, state);
        }
    }

    /// Wait for a `Reconnect` signal
    async fn idle(&mut self, cancel: &CancellationToken) -> Option<Phase> {
        self.set_state(FeedState::Idle);

        loop {
            if self.signals_closed {
                cancel.cancelled().await;
                return None;
            }

            tokio::select! {
                biased;

                _ = cancel.cancelled() => return None,

                signal = self.signals.recv() => match signal {
                    Ok(ReconnectSignal::Reconnect) => {
                        info!("node reachable again, resubscribing");
                        return Some(Phase::Connecting);
                    }
                    Ok(ReconnectSignal::NoConnection) => {
                        trace!("already idle, ignoring NoConnection");
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        debug!("missed {} reconnect signals", missed);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        warn!("reconnect coordinator gone, feed will stay idle");
                        self.signals_closed = true;
                    }
                },
            }
        }
    }

    /// Open the socket and send the subscribe message
    async fn connect(&self, cancel: &CancellationToken) -> Option<Phase> {
        self.set_state(FeedState::Connecting);

        let attempt = async {
            let mut conn = self.connector.open(&self.url).await?;

            if let Err(e) = conn.send(self.descriptor.subscribe_message()).await {
                conn.close().await;
                return Err(e);
            }

            Ok::<_, FeedError>(conn)
        };

        // Dropping `attempt` on cancel or timeout releases a half-open socket.
        tokio::select! {
            biased;

            _ = cancel.cancelled() => None,

            result = tokio::time::timeout(self.connect_timeout, attempt) => match result {
                Ok(Ok(conn)) => {
                    info!("subscribed to {}", self.descriptor.query);
                    Some(Phase::Streaming(conn))
                }
                Ok(Err(e)) => {
                    warn!("failed to subscribe, waiting for reconnect signal: {}", e);
                    Some(Phase::Idle)
                }
                Err(_) => {
                    warn!(
                        "connect timed out after {:?}, waiting for reconnect signal",
                        self.connect_timeout
                    );
                    Some(Phase::Idle)
                }
            },
        }
    }

    /// Forward events until the socket ends, a `NoConnection` arrives or we are cancelled
    async fn stream(
        &mut self,
        mut conn: Box<dyn StreamConnection>,
        cancel: &CancellationToken,
    ) -> Option<Phase> {
        self.set_state(FeedState::Streaming);

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    conn.close().await;
                    return None;
                }

                signal = self.signals.recv(), if !self.signals_closed => match signal {
                    Ok(ReconnectSignal::NoConnection) => {
                        info!("node unreachable, closing subscription");
                        conn.close().await;
                        return Some(Phase::Idle);
                    }
                    Ok(ReconnectSignal::Reconnect) => {
                        trace!("already streaming, ignoring Reconnect");
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        debug!("missed {} reconnect signals", missed);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        warn!("reconnect coordinator gone");
                        self.signals_closed = true;
                    }
                },

                message = conn.next_message() => match message {
                    Some(Ok(text)) => self.dispatch(&text),
                    Some(Err(e)) => {
                        warn!("subscription failed: {}", e);
                        conn.close().await;
                        return Some(Phase::Idle);
                    }
                    None => {
                        info!("subscription closed by node");
                        conn.close().await;
                        return Some(Phase::Idle);
                    }
                },
            }
        }
    }

    /// Decode one inbound message and hand it to the handler
    ///
    /// Anything that does not decode is logged and dropped.
    fn dispatch(&self, text: &str) {
        let envelope: EventEnvelope = match serde_json::from_str(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("dropping malformed message: {}", e);
                return;
            }
        };

        if let Some(error) = envelope.error {
            warn!("node returned an error for {:?}: {}", envelope.id, error);
            return;
        }

        let Some(event) = envelope.result.and_then(|result| result.data) else {
            trace!("skipping message without event data");
            return;
        };

        if let Err(e) = self.descriptor.handler.handle(&event) {
            debug!("dropping {} event: {}", event.kind, e);
        }
    }
}

/// Read-only view of a running feed
#[derive(Debug, Clone)]
pub struct FeedHandle {
    label: &'static str,
    state_rx: watch::Receiver<FeedState>,
}

impl FeedHandle {
    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn state(&self) -> FeedState {
        *self.state_rx.borrow()
    }

    /// Wait until the feed reaches `state`
    ///
    /// Fails with `Timeout` if it does not get there in time and with
    /// `Closed` if the feed was dropped first.
    pub async fn wait_for(&mut self, state: FeedState, timeout: Duration) -> FeedResult<()> {
        let reached = tokio::time::timeout(timeout, self.state_rx.wait_for(|s| *s == state)).await?;
        reached.map(|_| ()).map_err(|_| FeedError::Closed)
    }
}
