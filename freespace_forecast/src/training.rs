//! Training frame assembly
//!
//! Turns an irregular, operating-hours-only observation stream into a sorted,
//! deduplicated frame. Closed-hour slots of every covered day are filled with
//! synthetic zero readings so the model learns that the pool is empty at
//! night; slots after the latest observation are only filled once the feed has
//! reached the end of the day.

use crate::calendar::{HolidayCalendar, SwissHolidays};
use crate::data::Observation;
use crate::error::{ForecastError, Result};
use crate::features::{feature_dataframe, FeatureRow, FeatureSchema};
use crate::grid::{end_of_day, GridBuilder, TimePeriod};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;
use log::debug;
use polars::prelude::{DataFrame, NamedFrom, Series};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Local time from which the latest day's closed-hour rows are kept in full
const LATE_CUTOFF_HOUR: u32 = 21;
const LATE_CUTOFF_MINUTE: u32 = 30;

/// One row of the training frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRecord {
    pub features: FeatureRow,
    pub target: f64,
    /// Fabricated closed-hour zero reading
    pub synthetic: bool,
}

impl TrainingRecord {
    pub fn timestamp(&self) -> NaiveDateTime {
        self.features.timestamp
    }
}

/// When the holiday covariate becomes part of a frame's schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayRule {
    pub enabled: bool,
    /// Minimum number of distinct covered days
    pub min_days: usize,
}

impl Default for HolidayRule {
    fn default() -> Self {
        Self {
            enabled: true,
            min_days: 4,
        }
    }
}

impl HolidayRule {
    /// Schema for a frame covering `distinct_days` calendar days
    pub fn schema_for(&self, distinct_days: usize) -> FeatureSchema {
        FeatureSchema::new(self.enabled && distinct_days >= self.min_days)
    }
}

/// Deduplicated, time-sorted training rows and the schema they are fitted with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingFrame {
    records: Vec<TrainingRecord>,
    schema: FeatureSchema,
    /// Rule the schema was derived with; re-applied when frames are merged
    #[serde(default)]
    holiday_rule: Option<HolidayRule>,
}

impl TrainingFrame {
    /// Build a frame from records; sorts and deduplicates by timestamp, the
    /// last record for a timestamp wins.
    pub fn new(records: Vec<TrainingRecord>, schema: FeatureSchema) -> Self {
        let mut by_time: BTreeMap<NaiveDateTime, TrainingRecord> = BTreeMap::new();
        for record in records {
            by_time.insert(record.timestamp(), record);
        }
        Self {
            records: by_time.into_values().collect(),
            schema,
            holiday_rule: None,
        }
    }

    pub fn holiday_rule(&self) -> Option<&HolidayRule> {
        self.holiday_rule.as_ref()
    }

    pub fn records(&self) -> &[TrainingRecord] {
        &self.records
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.records.first().map(|r| r.timestamp())
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.records.last().map(|r| r.timestamp())
    }

    /// Number of distinct calendar days covered
    pub fn distinct_days(&self) -> usize {
        count_days(self.records.iter().map(|r| r.timestamp()))
    }

    pub fn synthetic_count(&self) -> usize {
        self.records.iter().filter(|r| r.synthetic).count()
    }

    /// Design rows in `schema` column order together with the targets
    pub fn design(&self) -> (Vec<Vec<f64>>, Vec<f64>) {
        self.records
            .iter()
            .map(|r| (r.features.covariates(&self.schema), r.target))
            .unzip()
    }

    /// Union of `history` and `update`, deduplicated by timestamp.
    ///
    /// A row of `update` replaces the history row of the same timestamp
    /// unless it is synthetic and the history row is real. The holiday rule
    /// is re-applied to the days the merged frame covers; frames without a
    /// rule keep the schema of `update`.
    pub fn merge(history: &TrainingFrame, update: &TrainingFrame) -> TrainingFrame {
        let mut by_time: BTreeMap<NaiveDateTime, TrainingRecord> = history
            .records
            .iter()
            .map(|r| (r.timestamp(), r.clone()))
            .collect();
        for record in &update.records {
            let keeps_real = by_time
                .get(&record.timestamp())
                .map(|existing| record.synthetic && !existing.synthetic)
                .unwrap_or(false);
            if !keeps_real {
                by_time.insert(record.timestamp(), record.clone());
            }
        }

        let holiday_rule = update.holiday_rule.or(history.holiday_rule);
        let schema = match holiday_rule {
            Some(rule) => rule.schema_for(count_days(by_time.keys().copied())),
            None => update.schema,
        };
        TrainingFrame {
            records: by_time.into_values().collect(),
            schema,
            holiday_rule,
        }
    }

    /// Export as a polars frame with `ds`, covariate columns and `y`
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let targets: Vec<f64> = self.records.iter().map(|r| r.target).collect();
        feature_dataframe(
            self.records.iter().map(|r| &r.features),
            &self.schema,
            vec![Series::new("y", targets)],
        )
    }
}

/// Merges observations with synthetic closed-hour rows
#[derive(Debug)]
pub struct TrainingFrameAssembler {
    tz: Tz,
    grid: GridBuilder,
    holiday_rule: HolidayRule,
    calendar: Box<dyn HolidayCalendar>,
}

impl TrainingFrameAssembler {
    /// Create an assembler normalizing into `tz`, with the Swiss holiday calendar
    pub fn new(tz: Tz) -> Self {
        Self {
            tz,
            grid: GridBuilder::half_hourly(),
            holiday_rule: HolidayRule::default(),
            calendar: Box::new(SwissHolidays),
        }
    }

    /// Minimum number of covered days before the holiday covariate is included
    pub fn with_holiday_min_days(mut self, days: usize) -> Self {
        self.holiday_rule.min_days = days;
        self
    }

    /// Enable or disable the holiday covariate entirely
    pub fn with_holidays(mut self, enabled: bool) -> Self {
        self.holiday_rule.enabled = enabled;
        self
    }

    pub fn with_calendar(mut self, calendar: Box<dyn HolidayCalendar>) -> Self {
        self.calendar = calendar;
        self
    }

    /// Assemble the training frame
    pub fn assemble(
        &self,
        observations: &[Observation],
        latest_observation: DateTime<FixedOffset>,
    ) -> Result<TrainingFrame> {
        let real: Vec<(NaiveDateTime, f64)> = observations
            .iter()
            .filter(|o| o.is_valid())
            .map(|o| (self.to_local(&o.timestamp), o.value))
            .collect();
        if real.is_empty() {
            return Err(ForecastError::EmptyInput(format!(
                "No valid observations among {} supplied",
                observations.len()
            )));
        }

        let latest = self.to_local(&latest_observation);
        let first_day = real
            .iter()
            .map(|(t, _)| t.date())
            .min()
            .unwrap_or_else(|| latest.date());
        let range_start = first_day.and_time(NaiveTime::MIN);
        let range_end = end_of_day(latest.date());

        let keep_whole_day = latest.time()
            >= NaiveTime::from_hms_opt(LATE_CUTOFF_HOUR, LATE_CUTOFF_MINUTE, 0)
                .unwrap_or(NaiveTime::MIN);

        let closed = TimePeriod::Closed.window();
        let mut rows: BTreeMap<NaiveDateTime, (f64, bool)> = self
            .grid
            .build(range_start, range_end)
            .into_iter()
            .filter(|slot| closed.contains(slot))
            .filter(|slot| keep_whole_day || *slot <= latest)
            .map(|slot| (slot, (0.0, true)))
            .collect();
        let synthetic_rows = rows.len();

        for (timestamp, value) in real {
            rows.insert(timestamp, (value, false));
        }

        let days = count_days(rows.keys().copied());
        let schema = self.holiday_rule.schema_for(days);

        debug!(
            "Assembled training frame: {} rows ({} synthetic candidates) over {} days, holidays={}",
            rows.len(),
            synthetic_rows,
            days,
            schema.include_holidays
        );

        let records = rows
            .into_iter()
            .map(|(timestamp, (target, synthetic))| TrainingRecord {
                features: FeatureRow::new(timestamp, self.calendar.as_ref()),
                target,
                synthetic,
            })
            .collect();

        let mut frame = TrainingFrame::new(records, schema);
        frame.holiday_rule = Some(self.holiday_rule);
        Ok(frame)
    }

    fn to_local(&self, instant: &DateTime<FixedOffset>) -> NaiveDateTime {
        self.tz.from_utc_datetime(&instant.naive_utc()).naive_local()
    }
}

fn count_days<I: IntoIterator<Item = NaiveDateTime>>(timestamps: I) -> usize {
    timestamps
        .into_iter()
        .map(|t| t.date())
        .collect::<BTreeSet<NaiveDate>>()
        .len()
}
