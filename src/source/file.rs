//! File replay source.
//!
//! Polls a JSON export of the database and loads it into a
//! [`MemoryDatabase`] whenever the file changes.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::MemoryDatabase;

/// Shortest interval between two reloads in [`FileReplay::spawn`].
pub const MIN_REFRESH: Duration = Duration::from_millis(100);

/// Replays a database export from disk.
///
/// The replay tracks the file's modification time and only reloads when the
/// file has been updated. A file that fails to read or parse leaves the last
/// good tree in place.
#[derive(Debug)]
pub struct FileReplay {
    path: PathBuf,
    database: MemoryDatabase,
    last_error: Option<String>,
    last_modified: Option<SystemTime>,
}

impl FileReplay {
    /// Create a replay for `path` with a fresh, empty database.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let database =
            MemoryDatabase::new().with_description(format!("file: {}", path.display()));
        Self {
            path,
            database,
            last_error: None,
            last_modified: None,
        }
    }

    /// Returns the path being replayed.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The database the file is loaded into.
    pub fn database(&self) -> &MemoryDatabase {
        &self.database
    }

    /// The error from the last reload attempt, if it failed.
    pub fn error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Reload the file if it changed. Returns `true` if a new tree was loaded.
    pub fn poll(&mut self) -> bool {
        let current_modified = self.get_modified_time();

        let file_changed = match (&self.last_modified, &current_modified) {
            (None, _) => true,        // First poll, always read
            (Some(_), None) => false, // File disappeared, keep the last tree
            (Some(last), Some(current)) => current > last,
        };

        if !file_changed {
            return false;
        }

        match self.read_file() {
            Some(root) => {
                self.last_modified = current_modified;
                self.database.replace_root(root);
                debug!(path = %self.path.display(), "Reloaded database export");
                true
            }
            None => false,
        }
    }

    /// Keep polling the file on the current runtime every `refresh`.
    ///
    /// `refresh` is raised to [`MIN_REFRESH`]. The first reload happens one
    /// interval after the call, so callers poll once themselves for the
    /// initial load. File access runs on the blocking pool. Aborting the
    /// returned handle stops the replay.
    pub fn spawn(self, refresh: Duration) -> JoinHandle<()> {
        let refresh = refresh.max(MIN_REFRESH);
        let mut replay = self;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(refresh);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval.tick().await;
            loop {
                interval.tick().await;
                let reload = tokio::task::spawn_blocking(move || {
                    let changed = replay.poll();
                    (replay, changed)
                });
                match reload.await {
                    Ok((next, _)) => replay = next,
                    Err(err) => {
                        warn!(error = %err, "File replay task stopped");
                        return;
                    }
                }
            }
        })
    }

    fn get_modified_time(&self) -> Option<SystemTime> {
        fs::metadata(&self.path).ok()?.modified().ok()
    }

    fn read_file(&mut self) -> Option<Value> {
        let result = fs::read_to_string(&self.path)
            .map_err(|e| format!("Read error: {}", e))
            .and_then(|content| {
                serde_json::from_str(&content).map_err(|e| format!("Parse error: {}", e))
            });
        match result {
            Ok(root) => {
                self.last_error = None;
                Some(root)
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to load database export");
                self.last_error = Some(e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Database, DbPath};
    use serde_json::json;
    use std::io::{Seek, Write};
    use tempfile::NamedTempFile;

    fn sample_json() -> &'static str {
        r#"{
            "realtime": { "temperature": 21.5, "humidity": 48 },
            "data": {
                "2025": { "03": { "05": {
                    "08:00": { "temperature": 20, "humidity": 50 }
                } } }
            }
        }"#
    }

    #[test]
    fn test_file_replay_new() {
        let replay = FileReplay::new("/tmp/db.json");
        assert_eq!(replay.path(), Path::new("/tmp/db.json"));
        assert_eq!(replay.database().description(), "file: /tmp/db.json");
        assert!(replay.error().is_none());
    }

    #[test]
    fn test_file_replay_loads_tree() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", sample_json()).unwrap();

        let mut replay = FileReplay::new(file.path());
        let mut temperature = replay.database().subscribe(&DbPath::parse("realtime/temperature"));
        let _ = temperature.poll();

        assert!(replay.poll());
        assert_eq!(temperature.poll().unwrap().value, json!(21.5));

        // Second poll without file change loads nothing
        assert!(!replay.poll());
    }

    #[test]
    fn test_file_replay_detects_changes() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", sample_json()).unwrap();

        let mut replay = FileReplay::new(file.path());
        replay.poll();

        std::thread::sleep(std::time::Duration::from_millis(10));
        file.as_file_mut().set_len(0).unwrap();
        file.rewind().unwrap();
        writeln!(file, r#"{{ "realtime": {{ "temperature": 30 }} }}"#).unwrap();
        file.flush().unwrap();

        // May not fire on filesystems with coarse mtime resolution
        if replay.poll() {
            assert_eq!(
                replay.database().get(&DbPath::parse("realtime/temperature")),
                json!(30)
            );
        }
    }

    #[tokio::test]
    async fn test_file_replay_spawn_reloads_with_zero_refresh() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", sample_json()).unwrap();

        let mut replay = FileReplay::new(file.path());
        assert!(replay.poll());
        let database = replay.database().clone();
        let handle = replay.spawn(Duration::ZERO);

        file.as_file_mut().set_len(0).unwrap();
        file.rewind().unwrap();
        writeln!(file, r#"{{ "realtime": {{ "temperature": 30 }} }}"#).unwrap();
        file.flush().unwrap();
        // Push the mtime forward so the change is visible on any filesystem
        file.as_file()
            .set_modified(SystemTime::now() + Duration::from_secs(5))
            .unwrap();

        let path = DbPath::parse("realtime/temperature");
        let mut reloaded = false;
        for _ in 0..100 {
            if database.get(&path) == json!(30) {
                reloaded = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        assert!(reloaded);
        assert!(!handle.is_finished());
        handle.abort();
    }

    #[test]
    fn test_file_replay_missing_file() {
        let mut replay = FileReplay::new("/nonexistent/path/db.json");
        assert!(!replay.poll());
        assert!(replay.error().unwrap().contains("Read error"));
    }

    #[test]
    fn test_file_replay_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid json").unwrap();

        let mut replay = FileReplay::new(file.path());
        assert!(!replay.poll());
        assert!(replay.error().unwrap().contains("Parse error"));
    }
}
