//! Subscribing components.
//!
//! Each component owns its subscriptions and local state exclusively; the
//! only thing they share is the database handle. The UI loop calls `poll()`
//! on both every tick, which never blocks.
//!
//! - [`RealtimeFeed`]: the two live scalars behind the gauges
//! - [`HistoricalGraph`]: aggregated history behind the two line charts

pub mod historical;
pub mod realtime;

pub use historical::HistoricalGraph;
pub use realtime::{RealtimeFeed, HUMIDITY_PATH, TEMPERATURE_PATH};
