//! Prediction-time grid
//!
//! The future frame starts at the next half-hour mark after the latest
//! observation and runs through the last requested day, restricted to opening
//! hours.

use crate::calendar::{HolidayCalendar, SwissHolidays};
use crate::error::{ForecastError, Result};
use crate::features::{feature_dataframe, FeatureRow, FeatureSchema};
use crate::grid::{end_of_day, is_operating_hour, GridBuilder, CLOSING_HOUR, OPENING_HOUR};
use chrono::{DateTime, Days, Duration, FixedOffset, NaiveDate, NaiveDateTime, Timelike};
use chrono_tz::Tz;
use log::debug;
use polars::prelude::DataFrame;

/// Rows the model is asked to predict
#[derive(Debug, Clone, PartialEq)]
pub struct FutureFrame {
    rows: Vec<FeatureRow>,
    schema: FeatureSchema,
    prediction_start: NaiveDateTime,
    end: NaiveDateTime,
}

impl FutureFrame {
    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// First half-hour mark after the latest observation (zone-naive)
    pub fn prediction_start(&self) -> NaiveDateTime {
        self.prediction_start
    }

    /// 23:59 of the last requested day (zone-naive)
    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Design rows in schema column order
    pub fn design(&self) -> Vec<Vec<f64>> {
        self.rows.iter().map(|r| r.covariates(&self.schema)).collect()
    }

    /// Export as a polars frame with `ds` and the covariate columns
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        feature_dataframe(&self.rows, &self.schema, Vec::new())
    }
}

/// Builds the future frame for a horizon of whole days
#[derive(Debug)]
pub struct FutureFrameBuilder {
    tz: Tz,
    grid: GridBuilder,
    calendar: Box<dyn HolidayCalendar>,
}

impl FutureFrameBuilder {
    pub fn new(tz: Tz) -> Self {
        Self {
            tz,
            grid: GridBuilder::half_hourly(),
            calendar: Box::new(SwissHolidays),
        }
    }

    pub fn with_calendar(mut self, calendar: Box<dyn HolidayCalendar>) -> Self {
        self.calendar = calendar;
        self
    }

    /// Round up to the next half-hour mark: `:30` of the same hour below
    /// minute 30, otherwise `:00` of the next hour.
    pub fn prediction_start(&self, latest_observation: DateTime<FixedOffset>) -> DateTime<Tz> {
        let local = latest_observation.with_timezone(&self.tz);
        let hour_start = local
            - Duration::minutes(local.minute() as i64)
            - Duration::seconds(local.second() as i64)
            - Duration::nanoseconds(local.nanosecond() as i64);
        if local.minute() < 30 {
            hour_start + Duration::minutes(30)
        } else {
            hour_start + Duration::hours(1)
        }
    }

    /// Build the future frame for `horizon_days` days after the latest
    /// observation's day; `0` asks for the rest of today only.
    pub fn build_future(
        &self,
        latest_observation: DateTime<FixedOffset>,
        horizon_days: u32,
        schema: &FeatureSchema,
    ) -> Result<FutureFrame> {
        let current_date = latest_observation.with_timezone(&self.tz).date_naive();
        let start = self.prediction_start(latest_observation);
        let last_date = current_date
            .checked_add_days(Days::new(horizon_days as u64))
            .ok_or_else(|| {
                ForecastError::InvalidParameter(format!(
                    "Horizon of {} days is out of range",
                    horizon_days
                ))
            })?;
        let end = end_of_day(last_date);

        let first_hour_today = start.hour().max(OPENING_HOUR);
        let rows: Vec<FeatureRow> = self
            .grid
            .build_zoned(&start, end)
            .into_iter()
            .filter(|slot| keep_slot(slot, current_date, first_hour_today))
            .map(|slot| FeatureRow::new(slot, self.calendar.as_ref()))
            .collect();

        if rows.is_empty() {
            return Err(ForecastError::EmptyHorizon(format!(
                "No opening-hour slots between {} and {}",
                start.naive_local(),
                end
            )));
        }

        debug!(
            "Future frame: {} slots from {} to {} ({} days ahead)",
            rows.len(),
            start.naive_local(),
            end,
            horizon_days
        );

        Ok(FutureFrame {
            rows,
            schema: *schema,
            prediction_start: start.naive_local(),
            end,
        })
    }
}

fn keep_slot(slot: &NaiveDateTime, current_date: NaiveDate, first_hour_today: u32) -> bool {
    let hour = slot.hour();
    if slot.date() == current_date {
        hour >= first_hour_today && hour < CLOSING_HOUR
    } else {
        is_operating_hour(hour)
    }
}
