//! Data models and processing for temperature/humidity readings.
//!
//! ## Submodules
//!
//! - [`reading`]: [`Reading`] and [`ChartPoint`]
//! - [`filter`]: [`FilterMode`], history paths and date stepping
//! - [`aggregate`]: snapshot → chart points, the daily/monthly transformation
//! - [`history`]: recent live samples for sparklines and rates
//!
//! ## Data Flow
//!
//! ```text
//! Snapshot at data/{yyyy}/{MM}[/{dd}]
//!        │
//!        ▼
//! aggregate(FilterMode, value)
//!        │
//!        ▼
//! Vec<ChartPoint> ──▶ temperature chart + humidity chart
//! ```

pub mod aggregate;
pub mod filter;
pub mod history;
pub mod reading;

pub use aggregate::aggregate;
pub use filter::FilterMode;
pub use history::{History, Series};
pub use reading::{ChartPoint, Reading};
