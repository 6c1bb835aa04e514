//! Live temperature/humidity feed.

use std::time::Instant;

use serde_json::Value;
use tracing::info;

use crate::data::History;
use crate::error::DatabaseError;
use crate::source::{Database, DbPath, Snapshot, Subscription};

/// Path of the latest temperature value.
pub const TEMPERATURE_PATH: &str = "realtime/temperature";
/// Path of the latest humidity value.
pub const HUMIDITY_PATH: &str = "realtime/humidity";

/// Mirrors the two live scalars.
///
/// Values are shown exactly as delivered: no validation, clamping or unit
/// conversion. `None` means nothing has arrived yet (or the path was
/// cleared), and the UI shows a loading indicator instead.
#[derive(Debug)]
pub struct RealtimeFeed {
    temperature_sub: Subscription,
    humidity_sub: Subscription,
    temperature: Option<Value>,
    humidity: Option<Value>,
    history: History,
    last_update: Option<Instant>,
}

impl RealtimeFeed {
    /// Subscribe to both live paths.
    pub fn mount(db: &dyn Database) -> Self {
        info!("Mounting realtime feed");
        Self {
            temperature_sub: db.subscribe(&DbPath::parse(TEMPERATURE_PATH)),
            humidity_sub: db.subscribe(&DbPath::parse(HUMIDITY_PATH)),
            temperature: None,
            humidity: None,
            history: History::new(),
            last_update: None,
        }
    }

    /// Apply pending deliveries. Returns `true` if either value changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;

        if let Some(snapshot) = self.temperature_sub.poll() {
            apply(&mut self.temperature, snapshot, |v| self.history.temperature.record(v));
            changed = true;
        }
        if let Some(snapshot) = self.humidity_sub.poll() {
            apply(&mut self.humidity, snapshot, |v| self.history.humidity.record(v));
            changed = true;
        }

        if changed {
            self.last_update = Some(Instant::now());
        }
        changed
    }

    pub fn temperature(&self) -> Option<&Value> {
        self.temperature.as_ref()
    }

    pub fn humidity(&self) -> Option<&Value> {
        self.humidity.as_ref()
    }

    /// Recent numeric samples, for sparklines.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// When the last delivery was applied.
    pub fn last_update(&self) -> Option<Instant> {
        self.last_update
    }

    /// The first error reported by either subscription.
    pub fn error(&self) -> Option<DatabaseError> {
        self.temperature_sub.error().or_else(|| self.humidity_sub.error())
    }

    /// Replace both subscriptions with fresh ones on `db`.
    ///
    /// The last values and the sample history are kept until the new
    /// subscriptions deliver.
    pub fn resubscribe(&mut self, db: &dyn Database) {
        info!("Resubscribing realtime feed");
        let temperature = db.subscribe(&DbPath::parse(TEMPERATURE_PATH));
        std::mem::replace(&mut self.temperature_sub, temperature).unsubscribe();
        let humidity = db.subscribe(&DbPath::parse(HUMIDITY_PATH));
        std::mem::replace(&mut self.humidity_sub, humidity).unsubscribe();
    }

    /// Release both subscriptions.
    pub fn unmount(self) {
        info!("Unmounting realtime feed");
        self.temperature_sub.unsubscribe();
        self.humidity_sub.unsubscribe();
    }
}

fn apply(slot: &mut Option<Value>, snapshot: Snapshot, mut record: impl FnMut(f64)) {
    *slot = snapshot.val().cloned();
    if let Some(value) = slot.as_ref().and_then(Value::as_f64) {
        record(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryDatabase;
    use serde_json::json;

    #[test]
    fn test_loading_until_first_value() {
        let db = MemoryDatabase::new();
        let mut feed = RealtimeFeed::mount(&db);

        // Initial (absent) deliveries keep the loading state
        feed.poll();
        assert!(feed.temperature().is_none());
        assert!(feed.humidity().is_none());

        db.set(&DbPath::parse(TEMPERATURE_PATH), json!(21.5));
        assert!(feed.poll());
        assert_eq!(feed.temperature(), Some(&json!(21.5)));
        assert!(feed.humidity().is_none());
    }

    #[test]
    fn test_values_are_not_validated() {
        let db = MemoryDatabase::with_root(json!({
            "realtime": {"temperature": "hot", "humidity": 150}
        }));
        let mut feed = RealtimeFeed::mount(&db);
        feed.poll();

        assert_eq!(feed.temperature(), Some(&json!("hot")));
        assert_eq!(feed.humidity(), Some(&json!(150)));
        // Only numbers go into the sparkline history
        assert!(feed.history().temperature.is_empty());
        assert_eq!(feed.history().humidity.latest(), Some(150.0));
    }

    #[test]
    fn test_each_push_replaces_value() {
        let db = MemoryDatabase::new();
        let mut feed = RealtimeFeed::mount(&db);
        let path = DbPath::parse(HUMIDITY_PATH);

        db.set(&path, json!(40));
        feed.poll();
        db.set(&path, json!(45));
        feed.poll();
        assert_eq!(feed.humidity(), Some(&json!(45)));
        assert_eq!(feed.history().humidity.len(), 2);

        // Clearing the path goes back to loading
        db.set(&path, Value::Null);
        feed.poll();
        assert!(feed.humidity().is_none());
    }

    #[test]
    fn test_unmount_releases_both_subscriptions() {
        let db = MemoryDatabase::new();
        let feed = RealtimeFeed::mount(&db);
        assert_eq!(db.listener_count(), 2);

        feed.unmount();
        assert_eq!(db.listener_count(), 0);

        // Later writes reach nobody
        db.set(&DbPath::parse(TEMPERATURE_PATH), json!(30));
        assert_eq!(db.listener_count(), 0);
    }

    #[test]
    fn test_resubscribe_replaces_both_subscriptions() {
        let db = MemoryDatabase::with_root(json!({
            "realtime": {"temperature": 21.5, "humidity": 48}
        }));
        let mut feed = RealtimeFeed::mount(&db);
        feed.poll();

        feed.resubscribe(&db);
        assert_eq!(db.listener_count(), 2);
        // Old values stay until the new subscriptions deliver
        assert_eq!(feed.temperature(), Some(&json!(21.5)));

        db.set(&DbPath::parse(TEMPERATURE_PATH), json!(23));
        db.set(&DbPath::parse(HUMIDITY_PATH), json!(51));
        assert!(feed.poll());
        assert_eq!(feed.temperature(), Some(&json!(23)));
        assert_eq!(feed.humidity(), Some(&json!(51)));

        feed.unmount();
        assert_eq!(db.listener_count(), 0);
    }
}
