//! Error types for feed and poller operations

use std::fmt;

/// Result type alias for feed operations
pub type FeedResult<T> = Result<T, FeedError>;

/// Errors that can occur while talking to the node or decoding its payloads
///
/// None of these are fatal: pollers retry on the next tick and stream feeds
/// fall back to `Idle` until the coordinator asks them to reconnect.
#[derive(Debug)]
pub enum FeedError {
    /// Connecting, sending or receiving failed at the transport level
    Transport(String),

    /// The node answered with a non-success HTTP status
    Http(u16),

    /// The node answered with a JSON-RPC error object
    Rpc(String),

    /// Payload was not valid JSON or did not match the expected shape
    Parse(String),

    /// A required field was absent from an otherwise valid payload
    MissingField(&'static str),

    /// Operation did not complete within its deadline
    Timeout,

    /// The connection was closed by the remote side
    Closed,
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedError::Transport(msg) => write!(f, "transport error: {}", msg),
            FeedError::Http(status) => write!(f, "HTTP error: {}", status),
            FeedError::Rpc(msg) => write!(f, "node returned an error: {}", msg),
            FeedError::Parse(msg) => write!(f, "failed to parse payload: {}", msg),
            FeedError::MissingField(field) => write!(f, "payload is missing field '{}'", field),
            FeedError::Timeout => write!(f, "operation timed out"),
            FeedError::Closed => write!(f, "connection closed by remote"),
        }
    }
}

impl std::error::Error for FeedError {}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FeedError::Timeout
        } else if let Some(status) = err.status() {
            FeedError::Http(status.as_u16())
        } else if err.is_decode() {
            FeedError::Parse(err.to_string())
        } else {
            FeedError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        FeedError::Parse(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for FeedError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;

        match err {
            WsError::ConnectionClosed | WsError::AlreadyClosed => FeedError::Closed,
            other => FeedError::Transport(other.to_string()),
        }
    }
}

impl From<tokio::time::error::Elapsed> for FeedError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        FeedError::Timeout
    }
}
