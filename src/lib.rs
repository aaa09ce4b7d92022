//! Live telemetry for a CometBFT node
//!
//! Pollers and event subscriptions run as independent tasks under one
//! [`Supervisor`](actors::supervisor::Supervisor), fold what they see into a
//! shared [`MetricsStore`](metrics::MetricsStore) and push rendered text to a
//! [`DisplaySink`](display::DisplaySink).

pub mod actors;
pub mod config;
pub mod display;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod progress;
pub mod rpc;
pub mod viewer;

pub use error::{FeedError, FeedResult};
