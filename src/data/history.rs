//! Recent live readings for sparklines and rate calculations.

use std::collections::VecDeque;
use std::time::Instant;

/// Maximum number of samples to keep per quantity.
const MAX_HISTORY_SIZE: usize = 60;

/// A bounded series of timestamped samples of one quantity.
#[derive(Debug, Clone, Default)]
pub struct Series {
    samples: VecDeque<(Instant, f64)>,
}

impl Series {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new sample, dropping the oldest past capacity.
    pub fn record(&mut self, value: f64) {
        self.record_at(Instant::now(), value);
    }

    pub fn record_at(&mut self, at: Instant, value: f64) {
        self.samples.push_back((at, value));
        if self.samples.len() > MAX_HISTORY_SIZE {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn latest(&self) -> Option<f64> {
        self.samples.back().map(|(_, v)| *v)
    }

    /// Sparkline data (normalized to 0-7 for 8 bar levels).
    ///
    /// Returns an empty Vec if there's not enough history.
    pub fn sparkline(&self) -> Vec<u8> {
        if self.samples.len() < 2 {
            return Vec::new();
        }

        let (min, max) = self
            .samples
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (_, v)| (lo.min(*v), hi.max(*v)));
        let range = max - min;

        self.samples
            .iter()
            .map(|(_, v)| {
                if range <= f64::EPSILON {
                    3
                } else {
                    (((v - min) / range) * 7.0).round().clamp(0.0, 7.0) as u8
                }
            })
            .collect()
    }

    /// Rate of change per minute between the last two samples.
    ///
    /// Returns None if there's not enough history to calculate a rate.
    pub fn rate_per_minute(&self) -> Option<f64> {
        if self.samples.len() < 2 {
            return None;
        }
        let (current_time, current) = self.samples.back()?;
        let (previous_time, previous) = self.samples.get(self.samples.len() - 2)?;
        let elapsed = current_time.duration_since(*previous_time).as_secs_f64();

        if elapsed > 0.0 {
            Some((current - previous) / elapsed * 60.0)
        } else {
            None
        }
    }
}

/// Tracks recent live temperature and humidity readings.
#[derive(Debug, Clone, Default)]
pub struct History {
    pub temperature: Series,
    pub humidity: Series,
}

impl History {
    /// Create a new empty history.
    pub fn new() -> Self {
        Self::default()
    }
}
