//! Terminal rendering.
//!
//! - [`common`]: header, tabs, status bar, help overlay
//! - [`live`]: temperature and humidity cards
//! - [`charts`]: history toolbar and line charts
//! - [`theme`]: colors, light/dark detection

pub mod charts;
pub mod common;
pub mod live;
pub mod theme;

pub use theme::Theme;
