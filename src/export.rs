//! JSON export of the aggregated history.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::component::HistoricalGraph;
use crate::data::{ChartPoint, FilterMode};

/// The chart points of one history target, as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryExport {
    pub mode: FilterMode,
    pub date: NaiveDate,
    pub path: String,
    pub points: Vec<ChartPoint>,
}

impl HistoryExport {
    /// Capture the current state of a history component.
    pub fn from_graph(graph: &HistoricalGraph) -> Self {
        Self {
            mode: graph.mode(),
            date: graph.date(),
            path: graph.path().to_string(),
            points: graph.points().to_vec(),
        }
    }

    /// Write as pretty-printed JSON.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Reading;
    use tempfile::tempdir;

    #[test]
    fn test_write_export() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");

        let export = HistoryExport {
            mode: FilterMode::Monthly,
            date: NaiveDate::from_ymd_opt(2025, 3, 5).unwrap(),
            path: "data/2025/03".to_string(),
            points: vec![ChartPoint::new("01", Reading::new(21.0, 55.0))],
        };
        export.write_to(&path).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["mode"], "monthly");
        assert_eq!(written["date"], "2025-03-05");
        assert_eq!(written["points"][0]["time"], "01");
        assert_eq!(written["points"][0]["temperature"], 21.0);

        let roundtrip: HistoryExport = serde_json::from_value(written).unwrap();
        assert_eq!(roundtrip, export);
    }
}
