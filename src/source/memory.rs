//! In-memory database.
//!
//! Holds the whole tree as a JSON value and pushes snapshots to listeners
//! whenever a write changes the value at their path. Used by the file
//! replay mode and throughout the tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

use super::tree::{set_at, value_at};
use super::{Database, DbPath, ErrorSlot, Snapshot, Subscription, SubscriptionHandle};

/// A database backed by an in-process JSON tree.
///
/// Cloning yields another handle to the same tree.
///
/// # Example
///
/// ```
/// use rtc_monitor::{Database, DbPath, MemoryDatabase};
/// use serde_json::json;
///
/// let db = MemoryDatabase::new();
/// let path = DbPath::parse("realtime/temperature");
/// let mut subscription = db.subscribe(&path);
///
/// db.set(&path, json!(21.5));
/// assert_eq!(subscription.poll().unwrap().value, json!(21.5));
/// ```
#[derive(Debug, Clone)]
pub struct MemoryDatabase {
    inner: Arc<Mutex<Inner>>,
    description: String,
}

#[derive(Debug, Default)]
struct Inner {
    root: Value,
    listeners: BTreeMap<u64, Listener>,
    next_id: u64,
}

#[derive(Debug)]
struct Listener {
    path: DbPath,
    sender: mpsc::UnboundedSender<Snapshot>,
    /// Last value delivered, to skip writes that change nothing here.
    last: Value,
}

impl Default for MemoryDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDatabase {
    /// Create an empty database.
    pub fn new() -> Self {
        Self::with_root(Value::Null)
    }

    /// Create a database holding `root`.
    pub fn with_root(root: Value) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                root,
                ..Inner::default()
            })),
            description: "memory".to_string(),
        }
    }

    /// Set the description shown in the TUI header.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Write `value` at `path`. Writing `null` deletes the node.
    pub fn set(&self, path: &DbPath, value: Value) {
        let mut inner = self.inner.lock();
        set_at(&mut inner.root, path, value);
        inner.notify(path);
    }

    /// Replace the whole tree.
    pub fn replace_root(&self, root: Value) {
        let mut inner = self.inner.lock();
        inner.root = root;
        inner.notify(&DbPath::root());
    }

    /// Returns a copy of the value at `path` (`null` if absent).
    pub fn get(&self, path: &DbPath) -> Value {
        value_at(&self.inner.lock().root, path)
    }

    /// Number of active listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.lock().listeners.len()
    }
}

impl Inner {
    /// Push the new value to every listener a write at `changed` may affect.
    fn notify(&mut self, changed: &DbPath) {
        let root = &self.root;
        self.listeners.retain(|id, listener| {
            if !listener.path.overlaps(changed) {
                return true;
            }
            let value = value_at(root, &listener.path);
            if value == listener.last {
                return true;
            }
            listener.last = value.clone();
            let delivered = listener.sender.send(Snapshot::new(listener.path.clone(), value)).is_ok();
            if !delivered {
                debug!(listener = id, path = %listener.path, "Dropping closed listener");
            }
            delivered
        });
    }
}

impl Database for MemoryDatabase {
    fn subscribe(&self, path: &DbPath) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock();

        let id = inner.next_id;
        inner.next_id += 1;

        let current = value_at(&inner.root, path);
        // Receiver is alive, this cannot fail.
        let _ = tx.send(Snapshot::new(path.clone(), current.clone()));
        inner.listeners.insert(
            id,
            Listener {
                path: path.clone(),
                sender: tx,
                last: current,
            },
        );
        debug!(listener = id, path = %path, "Subscribed");

        let weak: Weak<Mutex<Inner>> = Arc::downgrade(&self.inner);
        let handle = SubscriptionHandle::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.lock().listeners.remove(&id);
                debug!(listener = id, "Unsubscribed");
            }
        });

        Subscription::new(path.clone(), rx, ErrorSlot::default(), handle)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_subscribe_delivers_current_value() {
        let db = MemoryDatabase::with_root(json!({"realtime": {"humidity": 55}}));
        let mut subscription = db.subscribe(&DbPath::parse("realtime/humidity"));
        assert_eq!(subscription.poll().unwrap().value, json!(55));
    }

    #[test]
    fn test_subscribe_absent_path_delivers_null() {
        let db = MemoryDatabase::new();
        let mut subscription = db.subscribe(&DbPath::parse("data/2025/03/05"));
        let snapshot = subscription.poll().unwrap();
        assert!(!snapshot.exists());
    }

    #[test]
    fn test_descendant_write_notifies_ancestor() {
        let db = MemoryDatabase::new();
        let mut month = db.subscribe(&DbPath::parse("data/2025/03"));
        let _ = month.poll();

        db.set(&DbPath::parse("data/2025/03/05/08:00"), json!({"temperature": 20, "humidity": 50}));

        let snapshot = month.poll().unwrap();
        assert_eq!(snapshot.value, json!({"05": {"08:00": {"temperature": 20, "humidity": 50}}}));
    }

    #[test]
    fn test_unrelated_write_does_not_notify() {
        let db = MemoryDatabase::new();
        let mut temperature = db.subscribe(&DbPath::parse("realtime/temperature"));
        let _ = temperature.poll();

        db.set(&DbPath::parse("realtime/humidity"), json!(40));
        assert!(temperature.poll().is_none());
    }

    #[test]
    fn test_unchanged_value_does_not_notify() {
        let db = MemoryDatabase::new();
        let path = DbPath::parse("realtime/temperature");
        let mut subscription = db.subscribe(&path);
        let _ = subscription.poll();

        db.set(&path, json!(20));
        assert!(subscription.poll().is_some());
        db.set(&path, json!(20));
        assert!(subscription.poll().is_none());
    }

    #[test]
    fn test_unsubscribe_removes_listener() {
        let db = MemoryDatabase::new();
        let subscription = db.subscribe(&DbPath::parse("realtime/temperature"));
        assert_eq!(db.listener_count(), 1);
        subscription.unsubscribe();
        assert_eq!(db.listener_count(), 0);
    }

    #[test]
    fn test_replace_root_notifies_everyone_affected() {
        let db = MemoryDatabase::new();
        let mut temperature = db.subscribe(&DbPath::parse("realtime/temperature"));
        let mut humidity = db.subscribe(&DbPath::parse("realtime/humidity"));
        let _ = (temperature.poll(), humidity.poll());

        db.replace_root(json!({"realtime": {"temperature": 19.5}}));

        assert_eq!(temperature.poll().unwrap().value, json!(19.5));
        // Humidity stayed absent, so nothing new is delivered.
        assert!(humidity.poll().is_none());
    }
}
