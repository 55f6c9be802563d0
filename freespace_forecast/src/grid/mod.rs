//! Regular time grids and time-of-day classification
//!
//! The grid is the atomic unit of both the training and the future frame:
//! every slot is a stride-aligned, zone-naive timestamp. [`PERIOD_WINDOWS`]
//! is the single table of named windows every other component refers to.

pub mod periods;

pub use periods::{
    is_operating_hour, regular_windows, PeriodWindow, TimePeriod, CLOSING_HOUR, OPENING_HOUR,
    PERIOD_WINDOWS,
};

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

/// Length of one slot in minutes
pub const SLOT_MINUTES: i64 = 30;

/// Builds evenly spaced slot sequences and classifies slots into windows
#[derive(Debug, Clone, Copy)]
pub struct GridBuilder {
    stride: Duration,
}

impl Default for GridBuilder {
    fn default() -> Self {
        Self::half_hourly()
    }
}

impl GridBuilder {
    /// Create a grid builder with a custom stride
    pub fn new(stride: Duration) -> Result<Self> {
        if stride <= Duration::zero() {
            return Err(ForecastError::InvalidParameter(
                "Grid stride must be positive".to_string(),
            ));
        }
        Ok(Self { stride })
    }

    /// The standard 30 minute grid
    pub fn half_hourly() -> Self {
        Self {
            stride: Duration::minutes(SLOT_MINUTES),
        }
    }

    pub fn stride(&self) -> Duration {
        self.stride
    }

    /// Every stride mark from `start` to `end`, both ends inclusive
    pub fn build(&self, start: NaiveDateTime, end: NaiveDateTime) -> Vec<NaiveDateTime> {
        let mut slots = Vec::new();
        let mut current = start;
        while current <= end {
            slots.push(current);
            current += self.stride;
        }
        slots
    }

    /// Grid from midnight of `start_date` through 23:59 of `end_date`
    pub fn build_day_range(&self, start_date: NaiveDate, end_date: NaiveDate) -> Vec<NaiveDateTime> {
        self.build(start_date.and_time(NaiveTime::MIN), end_of_day(end_date))
    }

    /// Step in absolute time from `start` while the local wall clock is at or
    /// before `end`, then drop the zone annotation.
    ///
    /// Across a DST transition the wall-clock sequence repeats or skips an hour.
    pub fn build_zoned<Tz: TimeZone>(&self, start: &DateTime<Tz>, end: NaiveDateTime) -> Vec<NaiveDateTime> {
        let mut slots = Vec::new();
        let mut current = start.clone();
        while current.naive_local() <= end {
            slots.push(current.naive_local());
            current = current + self.stride;
        }
        slots
    }

    /// Names of every window the slot falls into (feature semantics)
    pub fn classify(&self, slot: &NaiveDateTime) -> Vec<TimePeriod> {
        classify(slot)
    }
}

/// Names of every window `slot` falls into, in table order
pub fn classify(slot: &NaiveDateTime) -> Vec<TimePeriod> {
    PERIOD_WINDOWS
        .iter()
        .filter(|w| w.contains(slot))
        .map(|w| w.period)
        .collect()
}

/// The single aggregation window of `slot`, if it is inside opening hours
pub fn regular_period(slot: &NaiveDateTime) -> Option<TimePeriod> {
    regular_windows().find(|w| w.contains(slot)).map(|w| w.period)
}

/// 23:59 on `date`
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN))
}
