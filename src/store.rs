use chrono::{DateTime, Local};
use indexmap::IndexMap;
use std::sync::Arc;
use thiserror::Error;

use crate::models::{Reading, Row, Sample, SensorId, SensorTable};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("reading for unregistered sensor {0}")]
    UnknownSensor(SensorId),
}

/// Session-long, append-only record of every accepted reading.
///
/// Each sensor owns its own series; the latest row is derived from the
/// series tails on demand.
#[derive(Debug)]
pub struct SampleStore {
    sensors: Arc<SensorTable>,
    series: IndexMap<SensorId, Vec<Sample>>,
    timestamps: Vec<DateTime<Local>>,
    // Table index of the sensor behind each accepted reading.
    arrivals: Vec<usize>,
}

impl SampleStore {
    pub fn new(sensors: Arc<SensorTable>) -> Self {
        let series = sensors.ids().map(|id| (id.clone(), Vec::new())).collect();
        Self {
            sensors,
            series,
            timestamps: Vec::new(),
            arrivals: Vec::new(),
        }
    }

    pub fn sensors(&self) -> &Arc<SensorTable> {
        &self.sensors
    }

    pub fn append(&mut self, reading: &Reading) -> Result<(), StoreError> {
        let (index, _, series) = self
            .series
            .get_full_mut(reading.sensor())
            .ok_or_else(|| StoreError::UnknownSensor(reading.sensor().clone()))?;

        series.push(Sample {
            timestamp: reading.timestamp(),
            value: reading.value(),
        });
        self.timestamps.push(reading.timestamp());
        self.arrivals.push(index);
        Ok(())
    }

    /// Samples for `sensor` in arrival order; empty for unknown sensors.
    pub fn series_for(&self, sensor: &SensorId) -> &[Sample] {
        self.series.get(sensor).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every sensor's series, in table order.
    pub fn series(&self) -> impl Iterator<Item = (&SensorId, &[Sample])> {
        self.series.iter().map(|(id, s)| (id, s.as_slice()))
    }

    /// Arrival timestamps of all accepted readings, across sensors.
    pub fn timestamps(&self) -> &[DateTime<Local>] {
        &self.timestamps
    }

    /// Each sensor's last known value, stamped with the most recent arrival.
    /// `None` until the first reading is stored.
    pub fn latest_row(&self) -> Option<Row> {
        let timestamp = *self.timestamps.last()?;
        let values = self
            .series
            .iter()
            .map(|(id, samples)| (id.clone(), samples.last().map(|s| s.value)))
            .collect();
        Some(Row { timestamp, values })
    }

    /// One snapshot per reading accepted at position `start` or later, each
    /// as of that reading: later readings are not yet visible in it.
    pub fn rows_since(&self, start: usize) -> Vec<Row> {
        let start = start.min(self.arrivals.len());
        let mut seen = vec![0usize; self.series.len()];
        for &index in &self.arrivals[..start] {
            seen[index] += 1;
        }

        let mut rows = Vec::with_capacity(self.arrivals.len() - start);
        for (&index, &timestamp) in self.arrivals[start..].iter().zip(&self.timestamps[start..]) {
            seen[index] += 1;
            let values = self
                .series
                .iter()
                .zip(&seen)
                .map(|((id, samples), &count)| {
                    let value = count.checked_sub(1).and_then(|i| samples.get(i)).map(|s| s.value);
                    (id.clone(), value)
                })
                .collect();
            rows.push(Row { timestamp, values });
        }
        rows
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}
