//! History charts for a selected day or month.

use std::sync::Arc;
use std::time::Instant;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::data::{aggregate, ChartPoint, FilterMode};
use crate::error::DatabaseError;
use crate::source::{Database, DbPath, Subscription};

/// Subscribes to the history path chosen by (filter mode, date) and keeps
/// the aggregated chart points for it.
///
/// Changing the mode or date releases the current subscription before the
/// next one is installed, and clears the points. Snapshots are also checked
/// against the current path, so a payload shaped for one mode is never
/// aggregated under the other.
#[derive(Debug)]
pub struct HistoricalGraph {
    db: Arc<dyn Database>,
    mode: FilterMode,
    date: NaiveDate,
    subscription: Option<Subscription>,
    points: Vec<ChartPoint>,
    loaded: bool,
    last_update: Option<Instant>,
}

impl HistoricalGraph {
    /// Create the component and subscribe to its initial target.
    pub fn new(db: Arc<dyn Database>, mode: FilterMode, date: NaiveDate) -> Self {
        let mut graph = Self {
            db,
            mode,
            date,
            subscription: None,
            points: Vec::new(),
            loaded: false,
            last_update: None,
        };
        graph.resubscribe();
        graph
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// The path currently subscribed to.
    pub fn path(&self) -> DbPath {
        self.mode.history_path(self.date)
    }

    /// Aggregated points for the current target, in delivery order.
    pub fn points(&self) -> &[ChartPoint] {
        &self.points
    }

    /// True once a snapshot has arrived for the current target.
    pub fn loaded(&self) -> bool {
        self.loaded
    }

    pub fn last_update(&self) -> Option<Instant> {
        self.last_update
    }

    pub fn error(&self) -> Option<DatabaseError> {
        self.subscription.as_ref().and_then(Subscription::error)
    }

    pub fn x_axis_title(&self) -> &'static str {
        self.mode.x_axis_title()
    }

    pub fn date_label(&self) -> String {
        self.mode.date_label(self.date)
    }

    pub fn set_filter(&mut self, mode: FilterMode) {
        self.retarget(mode, self.date);
    }

    pub fn toggle_filter(&mut self) {
        self.retarget(self.mode.toggle(), self.date);
    }

    pub fn set_date(&mut self, date: NaiveDate) {
        self.retarget(self.mode, date);
    }

    /// Next day (daily) or month (monthly).
    pub fn step_forward(&mut self) {
        self.set_date(self.mode.step(self.date, true));
    }

    /// Previous day (daily) or month (monthly).
    pub fn step_back(&mut self) {
        self.set_date(self.mode.step(self.date, false));
    }

    /// Jump to the local calendar date.
    pub fn today(&mut self) {
        self.set_date(chrono::Local::now().date_naive());
    }

    /// Tear down and re-establish the subscription for the current target.
    pub fn resubscribe(&mut self) {
        if let Some(previous) = self.subscription.take() {
            previous.unsubscribe();
        }
        self.points.clear();
        self.loaded = false;

        let path = self.path();
        info!(mode = %self.mode, path = %path, "Subscribing to history");
        self.subscription = Some(self.db.subscribe(&path));
    }

    fn retarget(&mut self, mode: FilterMode, date: NaiveDate) {
        if mode == self.mode && date == self.date && self.subscription.is_some() {
            return;
        }
        self.mode = mode;
        self.date = date;
        self.resubscribe();
    }

    /// Apply the latest snapshot, if any. Returns `true` if points changed.
    pub fn poll(&mut self) -> bool {
        let path = self.path();
        let Some(subscription) = self.subscription.as_mut() else {
            return false;
        };
        let Some(snapshot) = subscription.poll() else {
            return false;
        };
        if snapshot.path != path {
            debug!(expected = %path, got = %snapshot.path, "Discarding stale snapshot");
            return false;
        }

        self.points = aggregate(self.mode, snapshot.val());
        self.loaded = true;
        self.last_update = Some(Instant::now());
        true
    }

    /// Release the subscription.
    pub fn unmount(mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }
}
