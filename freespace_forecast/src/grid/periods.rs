//! Named time-of-day windows

use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

/// First hour of the facility's opening hours.
pub const OPENING_HOUR: u32 = 6;
/// Hour at which the facility closes; slots from this hour on are closed.
pub const CLOSING_HOUR: u32 = 22;

/// Name of a time-of-day window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimePeriod {
    EarlyMorning,
    LateMorning,
    Lunch,
    Afternoon,
    AfterWork,
    PeakHours,
    WeekendDay,
    Evening,
    Closed,
}

impl TimePeriod {
    /// Column / wire name of the period
    pub fn as_str(&self) -> &'static str {
        match self {
            TimePeriod::EarlyMorning => "early_morning",
            TimePeriod::LateMorning => "late_morning",
            TimePeriod::Lunch => "lunch",
            TimePeriod::Afternoon => "afternoon",
            TimePeriod::AfterWork => "after_work",
            TimePeriod::PeakHours => "peak_hours",
            TimePeriod::WeekendDay => "weekend_day",
            TimePeriod::Evening => "evening",
            TimePeriod::Closed => "closed",
        }
    }

    /// The window definition of this period
    pub fn window(&self) -> &'static PeriodWindow {
        // Variants are declared in table order.
        &PERIOD_WINDOWS[*self as usize]
    }
}

impl fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A half-open hour interval `[start_hour, end_hour)` on the 24 hour clock.
///
/// Intervals with `start_hour > end_hour` wrap midnight and match when the
/// hour is on either side of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodWindow {
    pub period: TimePeriod,
    pub start_hour: u32,
    pub end_hour: u32,
    /// Only matches on Saturdays and Sundays
    pub weekend_only: bool,
    /// Part of the six non-overlapping aggregation windows
    pub regular: bool,
}

impl PeriodWindow {
    const fn new(period: TimePeriod, start_hour: u32, end_hour: u32) -> Self {
        Self {
            period,
            start_hour,
            end_hour,
            weekend_only: false,
            regular: true,
        }
    }

    const fn feature_only(mut self) -> Self {
        self.regular = false;
        self
    }

    const fn on_weekends(mut self) -> Self {
        self.weekend_only = true;
        self
    }

    /// Whether the window wraps past midnight
    pub fn wraps_midnight(&self) -> bool {
        self.start_hour > self.end_hour
    }

    /// Hour range test without the weekday gate
    pub fn contains_hour(&self, hour: u32) -> bool {
        if self.wraps_midnight() {
            hour >= self.start_hour || hour < self.end_hour
        } else {
            hour >= self.start_hour && hour < self.end_hour
        }
    }

    /// Full membership test for a zone-naive timestamp
    pub fn contains(&self, timestamp: &NaiveDateTime) -> bool {
        if self.weekend_only && !is_weekend(timestamp.weekday()) {
            return false;
        }
        self.contains_hour(timestamp.hour())
    }
}

/// Every window, in covariate column order.
pub static PERIOD_WINDOWS: [PeriodWindow; 9] = [
    PeriodWindow::new(TimePeriod::EarlyMorning, 6, 9),
    PeriodWindow::new(TimePeriod::LateMorning, 9, 11),
    PeriodWindow::new(TimePeriod::Lunch, 11, 13),
    PeriodWindow::new(TimePeriod::Afternoon, 13, 16),
    PeriodWindow::new(TimePeriod::AfterWork, 16, 19),
    PeriodWindow::new(TimePeriod::PeakHours, 17, 19).feature_only(),
    PeriodWindow::new(TimePeriod::WeekendDay, 10, 18)
        .feature_only()
        .on_weekends(),
    PeriodWindow::new(TimePeriod::Evening, 19, 22),
    PeriodWindow::new(TimePeriod::Closed, CLOSING_HOUR, OPENING_HOUR).feature_only(),
];

/// The six aggregation windows in ascending start-hour order
pub fn regular_windows() -> impl Iterator<Item = &'static PeriodWindow> {
    PERIOD_WINDOWS.iter().filter(|w| w.regular)
}

/// Whether `hour` lies inside opening hours `[06:00, 22:00)`
pub fn is_operating_hour(hour: u32) -> bool {
    (OPENING_HOUR..CLOSING_HOUR).contains(&hour)
}

pub(crate) fn is_weekend(weekday: Weekday) -> bool {
    matches!(weekday, Weekday::Sat | Weekday::Sun)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_windows_partition_opening_hours() {
        for hour in 0..24 {
            let matches = regular_windows().filter(|w| w.contains_hour(hour)).count();
            if is_operating_hour(hour) {
                assert_eq!(matches, 1, "hour {} should be in exactly one window", hour);
            } else {
                assert_eq!(matches, 0, "hour {} should be in no window", hour);
            }
        }
    }

    #[test]
    fn test_regular_windows_ascending() {
        let starts: Vec<u32> = regular_windows().map(|w| w.start_hour).collect();
        assert_eq!(starts, vec![6, 9, 11, 13, 16, 19]);
    }

    #[test]
    fn test_closed_window_wraps() {
        let closed = TimePeriod::Closed.window();
        assert!(closed.wraps_midnight());
        assert!(closed.contains_hour(22));
        assert!(closed.contains_hour(23));
        assert!(closed.contains_hour(0));
        assert!(closed.contains_hour(5));
        assert!(!closed.contains_hour(6));
        assert!(!closed.contains_hour(21));
    }

    #[test]
    fn test_each_period_has_its_window() {
        for window in PERIOD_WINDOWS.iter() {
            assert_eq!(window.period.window(), window);
        }
        assert_eq!(TimePeriod::AfterWork.to_string(), "after_work");
    }
}
