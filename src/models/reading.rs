use chrono::{DateTime, Local};
use indexmap::IndexMap;

use crate::models::sensor::SensorId;

/// Format used for timestamps in the log file and the table view.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One decoded observation. Only the decoder constructs these.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    timestamp: DateTime<Local>,
    sensor: SensorId,
    value: f64,
}

impl Reading {
    pub(crate) fn new(timestamp: DateTime<Local>, sensor: SensorId, value: f64) -> Self {
        Self {
            timestamp,
            sensor,
            value,
        }
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    pub fn sensor(&self) -> &SensorId {
        &self.sensor
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

/// A point in a sensor's time series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<Local>,
    pub value: f64,
}

/// Cross-sensor snapshot: every table sensor's last known value as of
/// `timestamp`. `None` marks a sensor that has not reported yet.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub timestamp: DateTime<Local>,
    pub values: IndexMap<SensorId, Option<f64>>,
}

impl Row {
    pub fn timestamp_display(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Timestamp followed by one cell per sensor, in table order. Values keep
    /// a decimal point (`22.0`), never-reported sensors are empty cells.
    pub fn to_record(&self) -> Vec<String> {
        let mut record = Vec::with_capacity(self.values.len() + 1);
        record.push(self.timestamp_display());
        for value in self.values.values() {
            record.push(value.map(|v| format!("{:?}", v)).unwrap_or_default());
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_record_has_cell_per_sensor() {
        let timestamp = Local.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap();
        let mut values = IndexMap::new();
        values.insert(SensorId::new("28AA"), Some(21.5));
        values.insert(SensorId::new("28BB"), None);
        values.insert(SensorId::new("28CC"), Some(-3.25));
        let row = Row { timestamp, values };

        assert_eq!(
            row.to_record(),
            vec!["2024-03-01 12:30:05", "21.5", "", "-3.25"]
        );
    }
}
