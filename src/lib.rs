//! # rtc-monitor
//!
//! A terminal dashboard for live and historical temperature/humidity readings
//! stored in a realtime database.
//!
//! The database pushes snapshots for subscribed paths; this crate mirrors the
//! two live scalars, aggregates the daily or monthly history into chart
//! points, and renders both in an interactive terminal UI.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Application                          │
//! │  ┌─────────┐    ┌───────────┐    ┌─────────┐    ┌──────────┐ │
//! │  │  app    │───▶│ component │───▶│   ui    │───▶│ Terminal │ │
//! │  │ (state) │    │ (mirrors) │    │(render) │    │          │ │
//! │  └─────────┘    └─────┬─────┘    └─────────┘    └──────────┘ │
//! │                       │ subscribe / poll                     │
//! │                       ▼                                      │
//! │                 ┌──────────┐                                 │
//! │                 │  source  │◀── Firebase | Memory | File     │
//! │                 └──────────┘                                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: the [`Database`] trait and its backends. Subscriptions
//!   deliver [`Snapshot`]s over a channel and are released explicitly or on
//!   drop.
//! - **[`component`]**: [`RealtimeFeed`] for the live values and
//!   [`HistoricalGraph`] for the selected day or month.
//! - **[`data`]**: readings, chart points, filter modes and the
//!   [`aggregate`] step that flattens a history snapshot.
//! - **[`app`]**, **[`events`]**, **[`ui`]**: state, input handling and
//!   ratatui rendering.
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Connect to the configured database
//! rtc-monitor
//!
//! # Replay a JSON export, starting on a monthly view
//! rtc-monitor --file export.json --mode monthly --date 2025-03-01
//!
//! # Write the chart points for one day and exit
//! rtc-monitor --date 2025-03-05 --export day.json
//! ```
//!
//! ### As a library
//!
//! ```
//! use std::sync::Arc;
//! use chrono::NaiveDate;
//! use rtc_monitor::{DbPath, FilterMode, HistoricalGraph, MemoryDatabase};
//! use serde_json::json;
//!
//! let db = MemoryDatabase::new();
//! db.set(
//!     &DbPath::parse("data/2025/03/05/08:00"),
//!     json!({"temperature": 21.5, "humidity": 48}),
//! );
//!
//! let date = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
//! let mut graph = HistoricalGraph::new(Arc::new(db), FilterMode::Daily, date);
//! graph.poll();
//! assert_eq!(graph.points()[0].time, "08:00");
//! ```

pub mod app;
pub mod component;
pub mod config;
pub mod data;
pub mod error;
pub mod events;
pub mod export;
pub mod logging;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use component::{HistoricalGraph, RealtimeFeed};
pub use config::{DatabaseConfig, MonitorConfig};
pub use data::{aggregate, ChartPoint, FilterMode, Reading};
pub use error::DatabaseError;
pub use source::{
    Database, DbPath, FileReplay, FirebaseDatabase, MemoryDatabase, Snapshot, Subscription,
    SubscriptionHandle,
};
