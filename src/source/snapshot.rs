//! Paths and snapshots delivered by database subscriptions.
//!
//! Paths are slash-delimited, matching the realtime database's own
//! addressing (`realtime/temperature`, `data/2025/03/05`). A snapshot is the
//! complete value found at a path at one moment; `null` means no data.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

/// A slash-delimited location in the database tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DbPath {
    segments: Vec<String>,
}

impl DbPath {
    /// The root of the tree.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a path, ignoring leading, trailing and repeated slashes.
    pub fn parse(path: &str) -> Self {
        Self {
            segments: path.split('/').filter(|s| !s.is_empty()).map(str::to_string).collect(),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns a new path with `segment` appended.
    pub fn child(&self, segment: &str) -> Self {
        let mut path = self.clone();
        path.segments.extend(Self::parse(segment).segments);
        path
    }

    /// Returns a new path with all of `other`'s segments appended.
    pub fn join(&self, other: &DbPath) -> Self {
        let mut path = self.clone();
        path.segments.extend(other.segments.iter().cloned());
        path
    }

    /// True if `self` equals `other` or is one of its ancestors.
    pub fn contains(&self, other: &DbPath) -> bool {
        other.segments.starts_with(&self.segments)
    }

    /// True if a write at one path can change the value at the other.
    pub fn overlaps(&self, other: &DbPath) -> bool {
        self.contains(other) || other.contains(self)
    }

    /// Returns the part of `self` below `base`, if `base` contains `self`.
    pub fn strip_prefix(&self, base: &DbPath) -> Option<DbPath> {
        self.segments.strip_prefix(base.segments.as_slice()).map(|rest| DbPath {
            segments: rest.to_vec(),
        })
    }
}

impl fmt::Display for DbPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

impl FromStr for DbPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for DbPath {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

/// The value at a subscribed path at one moment.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// The path this snapshot was taken at.
    pub path: DbPath,
    /// The raw value; `Value::Null` when nothing is stored there.
    pub value: Value,
}

impl Snapshot {
    pub fn new(path: DbPath, value: Value) -> Self {
        Self { path, value }
    }

    /// A snapshot of a path holding no data.
    pub fn absent(path: DbPath) -> Self {
        Self::new(path, Value::Null)
    }

    /// Returns the value, or `None` if the path holds no data.
    pub fn val(&self) -> Option<&Value> {
        if self.value.is_null() {
            None
        } else {
            Some(&self.value)
        }
    }

    pub fn exists(&self) -> bool {
        !self.value.is_null()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_trims_slashes() {
        let path = DbPath::parse("/data//2025/03/");
        assert_eq!(path.segments(), &["data", "2025", "03"]);
        assert_eq!(path.to_string(), "data/2025/03");
        assert!(DbPath::parse("/").is_root());
    }

    #[test]
    fn test_contains_and_overlaps() {
        let month = DbPath::parse("data/2025/03");
        let day = DbPath::parse("data/2025/03/05");
        let other = DbPath::parse("data/2025/04");

        assert!(month.contains(&day));
        assert!(!day.contains(&month));
        assert!(day.overlaps(&month));
        assert!(!day.overlaps(&other));
        assert!(DbPath::root().contains(&day));
    }

    #[test]
    fn test_strip_prefix() {
        let base = DbPath::parse("data/2025");
        let path = DbPath::parse("data/2025/03/05");
        assert_eq!(path.strip_prefix(&base), Some(DbPath::parse("03/05")));
        assert_eq!(base.strip_prefix(&path), None);
    }

    #[test]
    fn test_snapshot_val() {
        let path = DbPath::parse("realtime/temperature");
        assert_eq!(Snapshot::absent(path.clone()).val(), None);
        let snapshot = Snapshot::new(path, json!(21.5));
        assert_eq!(snapshot.val(), Some(&json!(21.5)));
        assert!(snapshot.exists());
    }
}
