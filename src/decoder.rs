use chrono::{Local, TimeZone};
use log::{trace, warn};
use std::sync::Arc;
use thiserror::Error;

use crate::models::{Reading, SensorTable};

/// Fields in a line: `<unix_ts>;<id>,<temp>;<id>,<temp>;...`
const FIELD_SEPARATOR: char = ';';
const PAIR_SEPARATOR: char = ',';

/// Sensor fields the three-sensor device always sends.
pub const DEFAULT_MIN_SENSOR_FIELDS: usize = 3;

/// Reasons a whole line is dropped.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed line: {found} fields, expected at least {expected}")]
    MalformedLine { found: usize, expected: usize },

    #[error("invalid timestamp: {0:?}")]
    InvalidTimestamp(String),
}

/// Turns one text line from the device into readings for known sensors.
#[derive(Debug, Clone)]
pub struct LineDecoder {
    sensors: Arc<SensorTable>,
    min_sensor_fields: usize,
}

impl LineDecoder {
    pub fn new(sensors: Arc<SensorTable>) -> Self {
        Self::with_min_fields(sensors, DEFAULT_MIN_SENSOR_FIELDS)
    }

    /// `min_sensor_fields` is clamped to at least one.
    pub fn with_min_fields(sensors: Arc<SensorTable>, min_sensor_fields: usize) -> Self {
        Self {
            sensors,
            min_sensor_fields: min_sensor_fields.max(1),
        }
    }

    pub fn sensors(&self) -> &Arc<SensorTable> {
        &self.sensors
    }

    /// Decode a line. Bad sensor fields are skipped, not fatal; only a short
    /// line or a bad timestamp rejects the whole line.
    pub fn decode(&self, line: &str) -> Result<Vec<Reading>, DecodeError> {
        let parts: Vec<&str> = line.trim().split(FIELD_SEPARATOR).collect();

        let expected = self.min_sensor_fields + 1;
        if parts.len() < expected {
            return Err(DecodeError::MalformedLine {
                found: parts.len(),
                expected,
            });
        }

        let raw_ts = parts[0].trim();
        let timestamp = raw_ts
            .parse::<i64>()
            .ok()
            .and_then(|secs| Local.timestamp_opt(secs, 0).single())
            .ok_or_else(|| DecodeError::InvalidTimestamp(raw_ts.to_string()))?;

        let mut readings = Vec::with_capacity(parts.len() - 1);
        for field in &parts[1..] {
            let pair: Vec<&str> = field.split(PAIR_SEPARATOR).collect();
            let [address, temperature] = pair.as_slice() else {
                trace!("Skipping field without address/value pair: {:?}", field);
                continue;
            };

            let Some(sensor) = self.sensors.lookup(address) else {
                trace!("Skipping unknown sensor {:?}", address.trim());
                continue;
            };

            match temperature.trim().parse::<f64>() {
                Ok(value) => readings.push(Reading::new(timestamp, sensor.clone(), value)),
                Err(_) => warn!("Invalid temperature value for {}: {:?}", sensor, temperature),
            }
        }

        Ok(readings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SensorId;

    const S1: &str = "28C49A5C0000009D";
    const S2: &str = "28FD486000000061";
    const S3: &str = "281B176000000000";

    fn decoder() -> LineDecoder {
        let table = SensorTable::new([(S1, "Sensor 1"), (S2, "Sensor 2"), (S3, "Sensor 3")]).unwrap();
        LineDecoder::new(Arc::new(table))
    }

    #[test]
    fn test_full_line() {
        let readings = decoder()
            .decode("1700000000;28C49A5C0000009D,21.5;28FD486000000061,22.0;281B176000000000,19.9")
            .unwrap();

        assert_eq!(readings.len(), 3);
        assert!(readings.iter().all(|r| r.timestamp().timestamp() == 1_700_000_000));
        assert_eq!(readings[0].sensor(), &SensorId::new(S1));
        assert_eq!(readings[0].value(), 21.5);
        assert_eq!(readings[1].value(), 22.0);
        assert_eq!(readings[2].sensor(), &SensorId::new(S3));
        assert_eq!(readings[2].value(), 19.9);
    }

    #[test]
    fn test_invalid_timestamp_drops_line() {
        let result = decoder().decode("badts;28C49A5C0000009D,21.5;x,y;z,w");
        assert_eq!(result, Err(DecodeError::InvalidTimestamp("badts".to_string())));
    }

    #[test]
    fn test_out_of_range_timestamp() {
        let result = decoder().decode(&format!("{};{S1},1;{S2},2;{S3},3", i64::MAX));
        assert!(matches!(result, Err(DecodeError::InvalidTimestamp(_))));
    }

    #[test]
    fn test_bad_value_skips_only_that_field() {
        let readings = decoder()
            .decode("1700000000;28C49A5C0000009D,notanumber;28FD486000000061,22.0;281B176000000000,19.9")
            .unwrap();

        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].sensor(), &SensorId::new(S2));
        assert_eq!(readings[1].sensor(), &SensorId::new(S3));
    }

    #[test]
    fn test_too_few_fields() {
        let result = decoder().decode("1700000000;a,b");
        assert_eq!(
            result,
            Err(DecodeError::MalformedLine {
                found: 2,
                expected: 4
            })
        );

        // Valid fields do not rescue a short line.
        let result = decoder().decode(&format!("1700000000;{S1},21.5;{S2},22.0"));
        assert!(matches!(result, Err(DecodeError::MalformedLine { .. })));
    }

    #[test]
    fn test_unknown_and_unpaired_fields_are_skipped() {
        let line = format!("1700000000;DEADBEEF,10.0;{S2};{S3},1,2;{S1},-0.5");
        let readings = decoder().decode(&line).unwrap();

        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].sensor(), &SensorId::new(S1));
        assert_eq!(readings[0].value(), -0.5);
    }

    #[test]
    fn test_no_valid_fields_is_not_an_error() {
        let readings = decoder().decode("1700000000;x,y;z,w;q,r").unwrap();
        assert!(readings.is_empty());
    }

    #[test]
    fn test_trims_whitespace_and_crlf() {
        let line = format!(" 1700000000 ; {S1} , 21.5;{S2},22.0 ;{S3},19.9\r\n");
        let readings = decoder().decode(&line).unwrap();
        assert_eq!(readings.len(), 3);
        assert_eq!(readings[0].value(), 21.5);
    }

    #[test]
    fn test_lowercase_address_maps_to_registered_id() {
        let line = format!("1700000000;{};{S2},1;{S3},2", "28c49a5c0000009d,3.5");
        let readings = decoder().decode(&line).unwrap();
        assert_eq!(readings[0].sensor().as_str(), S1);
    }

    #[test]
    fn test_configurable_minimum() {
        let table = SensorTable::new([(S1, "Sensor 1")]).unwrap();
        let decoder = LineDecoder::with_min_fields(Arc::new(table), 1);
        let readings = decoder.decode(&format!("1700000000;{S1},20.25")).unwrap();
        assert_eq!(readings.len(), 1);

        let zero = LineDecoder::with_min_fields(decoder.sensors().clone(), 0);
        assert!(matches!(
            zero.decode("1700000000"),
            Err(DecodeError::MalformedLine { expected: 2, .. })
        ));
    }
}
