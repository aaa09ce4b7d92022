//! Message and state types shared by the feed actors
//!
//! ## Design Principles
//!
//! 1. **Signals**: broadcast to every feed, never queued per consumer
//! 2. **States**: published through watch channels so observers always see the latest
//! 3. **Immutability**: everything here is `Copy`, cheap to fan out

/// Reachability of the node as seen by the health poller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectivityState {
    /// No health poll has completed yet
    #[default]
    Unknown,
    Connected,
    Disconnected,
}

/// Signal fanned out to all stream feeds on a connectivity edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectSignal {
    /// Node became unreachable: close sockets and wait
    NoConnection,

    /// Node is reachable again: resubscribe
    Reconnect,
}

/// Lifecycle of a single stream feed
///
/// ```text
///   Idle ──connect──▶ Connecting ──subscribed──▶ Streaming
///    ▲                    │                         │
///    └──── error ─────────┴── closed / NoConnection ┘
///
///   any ──cancel──▶ Terminated
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    Idle,
    Connecting,
    Streaming,
    Terminated,
}

impl FeedState {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedState::Idle => "idle",
            FeedState::Connecting => "connecting",
            FeedState::Streaming => "streaming",
            FeedState::Terminated => "terminated",
        }
    }
}

impl std::fmt::Display for FeedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
