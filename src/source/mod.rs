//! Realtime database abstraction.
//!
//! Components never talk to a concrete backend. They hold a shared
//! `Arc<dyn Database>` created once at startup and call
//! [`Database::subscribe`] for each path they display. A [`Subscription`]
//! is a non-blocking stream of [`Snapshot`]s plus the handle that releases it.
//!
//! Backends:
//!
//! - [`FirebaseDatabase`]: the REST streaming API of a Firebase Realtime Database
//! - [`MemoryDatabase`]: an in-process JSON tree with listeners
//! - [`FileReplay`]: a JSON export on disk, replayed into a [`MemoryDatabase`]

mod file;
mod firebase;
mod memory;
mod snapshot;
pub mod sse;
pub mod tree;

pub use file::{FileReplay, MIN_REFRESH};
pub use firebase::FirebaseDatabase;
pub use memory::MemoryDatabase;
pub use snapshot::{DbPath, Snapshot};

use std::fmt::{self, Debug};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::error::DatabaseError;

/// Last error reported by a subscription's producer.
pub(crate) type ErrorSlot = Arc<Mutex<Option<DatabaseError>>>;

/// A realtime database that pushes values for subscribed paths.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use rtc_monitor::{Database, DbPath, MemoryDatabase};
///
/// let db: Arc<dyn Database> = Arc::new(MemoryDatabase::new());
/// let mut subscription = db.subscribe(&DbPath::parse("realtime/temperature"));
/// // The current value (here: nothing) is delivered immediately.
/// assert!(subscription.poll().unwrap().val().is_none());
/// subscription.unsubscribe();
/// ```
pub trait Database: Send + Sync + Debug {
    /// Start listening to `path`.
    ///
    /// The current value is delivered first, then every change. Delivery
    /// stops once the returned subscription is released or dropped.
    fn subscribe(&self, path: &DbPath) -> Subscription;

    /// Returns a human-readable description of the backend.
    ///
    /// Used for display in the TUI header.
    fn description(&self) -> &str;
}

/// Releases a subscription when invoked or dropped.
pub struct SubscriptionHandle {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl SubscriptionHandle {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Stop delivery. Calling this more than once has no effect.
    pub fn release(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("active", &self.release.is_some())
            .finish()
    }
}

/// A live subscription to one path.
#[derive(Debug)]
pub struct Subscription {
    path: DbPath,
    receiver: mpsc::UnboundedReceiver<Snapshot>,
    last_error: ErrorSlot,
    handle: SubscriptionHandle,
}

impl Subscription {
    pub(crate) fn new(
        path: DbPath,
        receiver: mpsc::UnboundedReceiver<Snapshot>,
        last_error: ErrorSlot,
        handle: SubscriptionHandle,
    ) -> Self {
        Self {
            path,
            receiver,
            last_error,
            handle,
        }
    }

    /// The path this subscription listens to.
    pub fn path(&self) -> &DbPath {
        &self.path
    }

    /// Returns the most recent undelivered snapshot, if any.
    ///
    /// Older pending snapshots are skipped; local state only mirrors the
    /// latest value. This method never blocks.
    pub fn poll(&mut self) -> Option<Snapshot> {
        let mut latest = None;
        while let Ok(snapshot) = self.receiver.try_recv() {
            latest = Some(snapshot);
        }
        latest
    }

    /// The last error reported by the backend for this subscription.
    pub fn error(&self) -> Option<DatabaseError> {
        self.last_error.lock().clone()
    }

    /// Release the subscription. No snapshot is delivered afterwards.
    pub fn unsubscribe(self) {
        let Subscription { handle, .. } = self;
        handle.release();
    }
}
