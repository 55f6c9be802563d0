//! Occupancy feed readings
//!
//! The facility monitor broadcasts a JSON array with one entry per facility:
//!
//! ```json
//! [{"name": "Hallenbad City", "maxspace": 180, "currentfill": 42, "freespace": 138}]
//! ```

use crate::config::ForecastConfig;
use crate::data::Observation;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One facility entry of the broadcast
#[derive(Debug, Clone, PartialEq, Deserialize)]
struct FacilityStatus {
    name: String,
    maxspace: u32,
    currentfill: u32,
    freespace: u32,
}

/// Occupancy of the facility at one instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeedReading {
    pub timestamp: DateTime<Utc>,
    pub total_capacity: u32,
    pub usage: u32,
    pub freespace: u32,
}

impl FeedReading {
    pub fn new(timestamp: DateTime<Utc>, total_capacity: u32, usage: u32, freespace: u32) -> Self {
        Self {
            timestamp,
            total_capacity,
            usage,
            freespace,
        }
    }

    /// The reading with its capacity limited to `cap`
    pub fn capped(mut self, cap: u32) -> Self {
        self.total_capacity = self.total_capacity.min(cap);
        self
    }

    /// Free space in percent of capacity; 0 when the capacity is 0
    pub fn freespace_percentage(&self) -> f64 {
        if self.total_capacity == 0 {
            return 0.0;
        }
        self.freespace as f64 / self.total_capacity as f64 * 100.0
    }

    pub fn to_observation(&self) -> Observation {
        Observation::new(self.timestamp.fixed_offset(), self.freespace_percentage())
    }
}

/// Parse a broadcast and return the reading of the configured facility, if
/// present, with its capacity limited to `capacity_cap`
pub fn parse_feed_message(
    message: &str,
    config: &ForecastConfig,
    received_at: DateTime<Utc>,
) -> Result<Option<FeedReading>> {
    let statuses: Vec<FacilityStatus> = serde_json::from_str(message)?;
    Ok(statuses
        .into_iter()
        .find(|s| s.name == config.facility)
        .map(|s| {
            FeedReading::new(received_at, s.maxspace, s.currentfill, s.freespace)
                .capped(config.capacity_cap)
        }))
}
