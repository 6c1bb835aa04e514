//! History granularity and the database paths it selects.

use std::fmt;

use chrono::{Datelike, Months, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::source::DbPath;

/// Granularity of the history view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Every reading of one day, keyed by time of day.
    #[default]
    #[value(alias = "day", alias = "d")]
    Daily,
    /// One averaged point per day of one month.
    #[value(alias = "month", alias = "m")]
    Monthly,
}

impl FilterMode {
    /// Switch to the other mode.
    pub fn toggle(self) -> Self {
        match self {
            FilterMode::Daily => FilterMode::Monthly,
            FilterMode::Monthly => FilterMode::Daily,
        }
    }

    /// Returns the display label for this mode.
    pub fn label(&self) -> &'static str {
        match self {
            FilterMode::Daily => "Daily",
            FilterMode::Monthly => "Monthly",
        }
    }

    /// The database path holding history for `date`.
    ///
    /// Daily: `data/{yyyy}/{MM}/{dd}`. Monthly: `data/{yyyy}/{MM}`.
    pub fn history_path(&self, date: NaiveDate) -> DbPath {
        let path = match self {
            FilterMode::Daily => format!("data/{}", date.format("%Y/%m/%d")),
            FilterMode::Monthly => format!("data/{}", date.format("%Y/%m")),
        };
        DbPath::parse(&path)
    }

    /// Move `date` by one unit of this mode (a day or a calendar month).
    ///
    /// Month steps clamp the day to the target month's length. Dates past
    /// chrono's range are returned unchanged.
    pub fn step(&self, date: NaiveDate, forward: bool) -> NaiveDate {
        let stepped = match (self, forward) {
            (FilterMode::Daily, true) => date.succ_opt(),
            (FilterMode::Daily, false) => date.pred_opt(),
            (FilterMode::Monthly, true) => date.checked_add_months(Months::new(1)),
            (FilterMode::Monthly, false) => date.checked_sub_months(Months::new(1)),
        };
        stepped.unwrap_or(date)
    }

    /// Title of the shared x axis.
    pub fn x_axis_title(&self) -> &'static str {
        match self {
            FilterMode::Daily => "Time (HH:MM)",
            FilterMode::Monthly => "Day",
        }
    }

    /// Human-readable date ("March 5th, 2025" or "March 2025").
    pub fn date_label(&self, date: NaiveDate) -> String {
        match self {
            FilterMode::Daily => format!(
                "{} {}{}, {}",
                date.format("%B"),
                date.day(),
                ordinal_suffix(date.day()),
                date.year()
            ),
            FilterMode::Monthly => date.format("%B %Y").to_string(),
        }
    }
}

fn ordinal_suffix(n: u32) -> &'static str {
    match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterMode::Daily => write!(f, "daily"),
            FilterMode::Monthly => write!(f, "monthly"),
        }
    }
}
