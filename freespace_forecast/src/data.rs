//! Observation handling for forecasting

use crate::error::{ForecastError, Result};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// A single free-space reading, in percent of capacity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: DateTime<FixedOffset>,
    pub value: f64,
}

impl Observation {
    pub fn new(timestamp: DateTime<FixedOffset>, value: f64) -> Self {
        Self { timestamp, value }
    }

    /// Usable for training: finite and not negative
    pub fn is_valid(&self) -> bool {
        self.value.is_finite() && self.value >= 0.0
    }
}

/// Zip parallel timestamp and value sequences into observations
pub fn observations_from_parts(
    timestamps: &[DateTime<FixedOffset>],
    values: &[f64],
) -> Result<Vec<Observation>> {
    if timestamps.len() != values.len() {
        return Err(ForecastError::ShapeMismatch(format!(
            "Timestamps length ({}) doesn't match values length ({})",
            timestamps.len(),
            values.len()
        )));
    }

    Ok(timestamps
        .iter()
        .zip(values.iter())
        .map(|(&timestamp, &value)| Observation::new(timestamp, value))
        .collect())
}

/// Latest instant of a set of observations
pub fn latest_instant(observations: &[Observation]) -> Option<DateTime<FixedOffset>> {
    observations.iter().map(|o| o.timestamp).max()
}

/// Data loader for observation files
#[derive(Debug)]
pub struct ObservationLoader;

impl ObservationLoader {
    /// Load observations from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Observation>> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Load observations from any CSV source with a header row
    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<Observation>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let time_idx = Self::detect_time_column(&headers)?;
        let value_idx = Self::detect_value_column(&headers)?;

        let mut observations = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record?;
            let raw_time = record.get(time_idx).unwrap_or_default();
            let raw_value = record.get(value_idx).unwrap_or_default();
            if raw_value.is_empty() {
                continue;
            }

            let timestamp = DateTime::parse_from_rfc3339(raw_time).map_err(|e| {
                ForecastError::DataError(format!(
                    "Row {}: invalid timestamp '{}': {}",
                    line + 1,
                    raw_time,
                    e
                ))
            })?;
            let value = raw_value.parse::<f64>().map_err(|e| {
                ForecastError::DataError(format!(
                    "Row {}: invalid value '{}': {}",
                    line + 1,
                    raw_value,
                    e
                ))
            })?;

            observations.push(Observation::new(timestamp, value));
        }

        Ok(observations)
    }

    /// Detect the time column in the header row
    fn detect_time_column(headers: &csv::StringRecord) -> Result<usize> {
        Self::find_column(headers, &["timestamp", "time", "date", "ds"]).ok_or_else(|| {
            ForecastError::DataError("No time column found in data".to_string())
        })
    }

    /// Detect the free-space value column in the header row
    fn detect_value_column(headers: &csv::StringRecord) -> Result<usize> {
        Self::find_column(
            headers,
            &["freespace_percentage", "value", "y", "freespace"],
        )
        .ok_or_else(|| ForecastError::DataError("No value column found in data".to_string()))
    }

    fn find_column(headers: &csv::StringRecord, candidates: &[&str]) -> Option<usize> {
        candidates.iter().find_map(|candidate| {
            headers
                .iter()
                .position(|name| name.eq_ignore_ascii_case(candidate))
        })
    }
}
