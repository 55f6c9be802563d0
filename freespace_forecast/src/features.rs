//! Covariates shared by the training and the future frame
//!
//! Both frames derive their features through [`FeatureRow::new`] and expose
//! them through a [`FeatureSchema`], so the column set and order a model was
//! fitted on is exactly the one it is asked to predict on.

use crate::calendar::HolidayCalendar;
use crate::error::{ForecastError, Result};
use crate::grid::{classify, TimePeriod, PERIOD_WINDOWS};
use chrono::{Datelike, NaiveDateTime, Timelike};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Name of the timestamp column in exported frames
pub const TIMESTAMP_COLUMN: &str = "ds";
/// Name of the holiday indicator column
pub const HOLIDAY_COLUMN: &str = "holiday";

/// Which optional covariates a frame carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub include_holidays: bool,
}

impl FeatureSchema {
    pub fn new(include_holidays: bool) -> Self {
        Self { include_holidays }
    }

    /// Covariate column names in model order
    pub fn columns(&self) -> Vec<&'static str> {
        let mut columns = vec!["hour_sin", "hour_cos", "weekday"];
        columns.extend(PERIOD_WINDOWS.iter().map(|w| w.period.as_str()));
        if self.include_holidays {
            columns.push(HOLIDAY_COLUMN);
        }
        columns
    }

    pub fn width(&self) -> usize {
        self.columns().len()
    }
}

/// Derived features of a single zone-naive timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub timestamp: NaiveDateTime,
    pub hour_sin: f64,
    pub hour_cos: f64,
    /// Monday = 0 … Sunday = 6
    pub weekday: u32,
    /// Every window the timestamp falls into, in table order
    pub periods: Vec<TimePeriod>,
    pub holiday: bool,
}

impl FeatureRow {
    pub fn new(timestamp: NaiveDateTime, calendar: &dyn HolidayCalendar) -> Self {
        let angle = 2.0 * PI * timestamp.hour() as f64 / 24.0;
        Self {
            timestamp,
            hour_sin: angle.sin(),
            hour_cos: angle.cos(),
            weekday: timestamp.weekday().num_days_from_monday(),
            periods: classify(&timestamp),
            holiday: calendar.is_holiday(timestamp.date()),
        }
    }

    /// 0/1 indicator of a window
    pub fn indicator(&self, period: TimePeriod) -> u8 {
        u8::from(self.periods.contains(&period))
    }

    /// Covariate values in the order of `schema.columns()`
    pub fn covariates(&self, schema: &FeatureSchema) -> Vec<f64> {
        let mut values = Vec::with_capacity(schema.width());
        values.push(self.hour_sin);
        values.push(self.hour_cos);
        values.push(self.weekday as f64);
        values.extend(
            PERIOD_WINDOWS
                .iter()
                .map(|w| self.indicator(w.period) as f64),
        );
        if schema.include_holidays {
            values.push(if self.holiday { 1.0 } else { 0.0 });
        }
        values
    }
}

/// Build a polars frame with a millisecond `ds` column followed by the
/// covariate columns, plus any `extra` value columns.
pub(crate) fn feature_dataframe<'a, I>(
    rows: I,
    schema: &FeatureSchema,
    extra: Vec<Series>,
) -> Result<DataFrame>
where
    I: IntoIterator<Item = &'a FeatureRow>,
{
    let rows: Vec<&FeatureRow> = rows.into_iter().collect();
    let columns = schema.columns();

    let timestamps: Vec<i64> = rows
        .iter()
        .map(|r| r.timestamp.and_utc().timestamp_millis())
        .collect();
    let mut series = vec![Series::new(TIMESTAMP_COLUMN, timestamps)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?];

    let mut values: Vec<Vec<f64>> = vec![Vec::with_capacity(rows.len()); columns.len()];
    for row in &rows {
        let covariates = row.covariates(schema);
        if covariates.len() != columns.len() {
            return Err(ForecastError::ShapeMismatch(format!(
                "Row has {} covariates, schema has {} columns",
                covariates.len(),
                columns.len()
            )));
        }
        for (column, value) in values.iter_mut().zip(covariates) {
            column.push(value);
        }
    }
    for (name, column) in columns.iter().zip(values) {
        series.push(Series::new(*name, column));
    }
    series.extend(extra);

    Ok(DataFrame::new(series)?)
}
