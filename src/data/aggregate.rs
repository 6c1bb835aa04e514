//! Historical aggregation.
//!
//! Turns the snapshot at a history path into the flat, ordered sequence of
//! [`ChartPoint`]s both charts are drawn from.
//!
//! ```text
//! daily   data/2025/03/05  { "08:00": Reading, "09:00": Reading, ... }
//!                          -> one point per time label
//! monthly data/2025/03     { "01": { "08:00": Reading, ... }, "02": ... }
//!                          -> one point per day, the mean of its readings
//! ```
//!
//! Points follow the key order of the delivered mapping. Entries that are
//! not a `{temperature, humidity}` object are skipped, and a day without a
//! single usable entry produces no point.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::filter::FilterMode;
use super::reading::{ChartPoint, Reading};

/// Build chart points from a history snapshot.
///
/// An absent (`None` or `null`) or non-object snapshot yields no points.
pub fn aggregate(mode: FilterMode, snapshot: Option<&Value>) -> Vec<ChartPoint> {
    let Some(Value::Object(buckets)) = snapshot else {
        return Vec::new();
    };

    match mode {
        FilterMode::Daily => buckets
            .iter()
            .filter_map(|(time, entry)| parse_reading(time, entry).map(|r| ChartPoint::new(time, r)))
            .collect(),
        FilterMode::Monthly => buckets
            .iter()
            .filter_map(|(day, entries)| day_mean(day, entries).map(|r| ChartPoint::new(day, r)))
            .collect(),
    }
}

fn parse_reading(label: &str, entry: &Value) -> Option<Reading> {
    match Reading::deserialize(entry) {
        Ok(reading) => Some(reading),
        Err(e) => {
            debug!(label, error = %e, "Skipping malformed reading");
            None
        }
    }
}

fn day_mean(day: &str, entries: &Value) -> Option<Reading> {
    let Value::Object(entries) = entries else {
        debug!(day, "Skipping day that is not a mapping of readings");
        return None;
    };
    let readings: Vec<Reading> =
        entries.iter().filter_map(|(time, entry)| parse_reading(time, entry)).collect();
    Reading::mean(&readings)
}
