//! TUI Dashboard Module
//!
//! Terminal dashboard for a single node. Owns the only rendering task; every
//! feed reaches it through the display channel.

#[cfg(feature = "dashboard")]
mod app;
#[cfg(feature = "dashboard")]
mod state;
#[cfg(feature = "dashboard")]
mod ui;

#[cfg(feature = "dashboard")]
pub use app::App;
#[cfg(feature = "dashboard")]
pub use state::DashboardState;
