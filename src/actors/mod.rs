//! Actor-based feed layer
//!
//! Every poller and stream feed runs as an independent tokio task. They share
//! nothing but the metrics store, the display sink and the reconnect bus.
//!
//! ## Architecture Overview
//!
//! ```text
//!                     ┌─────────────────┐
//!                     │   Supervisor    │  (cancellation scope, JoinSet)
//!                     └────────┬────────┘
//!                              │ spawns
//!        ┌──────────────┬──────┴───────┬──────────────────┐
//!        │              │              │                  │
//!  ┌─────▼─────┐  ┌─────▼─────┐  ┌─────▼─────┐   ┌────────▼────────┐
//!  │  Health   │  │  Metric   │  │   Clock   │   │  StreamFeed x N │
//!  │  Poller   │  │  Pollers  │  │           │   │  (one per topic)│
//!  └─────┬─────┘  └─────┬─────┘  └─────┬─────┘   └───▲─────────┬───┘
//!        │ edges        │              │             │         │
//!  ┌─────▼──────────────┴──┐           │             │         │
//!  │ ReconnectCoordinator  ├───────────┼─────────────┘         │
//!  │ (bounded broadcast)   │           │   NoConnection        │
//!  └───────────────────────┘           │   Reconnect           │
//!                                      ▼                       ▼
//!                           MetricsStore / DisplaySink ◄───────┘
//! ```
//!
//! ## Actor Types
//!
//! - **Poller**: fetches one endpoint on a fixed tick
//! - **StreamFeed**: holds one event subscription, idles between connections
//! - **ReconnectCoordinator**: fans connectivity edges out to every feed
//! - **Supervisor**: starts all of the above and stops them together

pub mod coordinator;
pub mod feed;
pub mod messages;
pub mod poller;
pub mod supervisor;
