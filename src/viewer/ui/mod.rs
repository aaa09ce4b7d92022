//! UI rendering module

mod layout;
mod widgets;

pub use layout::render;
