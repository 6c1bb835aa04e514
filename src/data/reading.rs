//! Reading and chart point types.

use serde::{Deserialize, Serialize};

/// One temperature/humidity pair as stored in the database.
///
/// Extra fields on an entry are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub temperature: f64,
    pub humidity: f64,
}

impl Reading {
    pub fn new(temperature: f64, humidity: f64) -> Self {
        Self {
            temperature,
            humidity,
        }
    }

    /// Arithmetic mean of each quantity, or `None` for an empty slice.
    pub fn mean(readings: &[Reading]) -> Option<Reading> {
        if readings.is_empty() {
            return None;
        }
        let count = readings.len() as f64;
        let (temperature, humidity) = readings
            .iter()
            .fold((0.0, 0.0), |(t, h), r| (t + r.temperature, h + r.humidity));
        Some(Reading::new(temperature / count, humidity / count))
    }
}

/// One labelled point on the history charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// Time of day (daily mode) or day of month (monthly mode).
    pub time: String,
    pub temperature: f64,
    pub humidity: f64,
}

impl ChartPoint {
    pub fn new(time: impl Into<String>, reading: Reading) -> Self {
        Self {
            time: time.into(),
            temperature: reading.temperature,
            humidity: reading.humidity,
        }
    }
}
