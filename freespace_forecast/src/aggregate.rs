//! Post-processing of raw model output into per-day predictions
//!
//! Every value is clipped into `[0, 100]`, slots are grouped by their local
//! calendar day, and each day gets a summary per regular window. A window
//! without any slot is left out of the summary rather than reported as 0%.

use crate::grid::{regular_period, TimePeriod};
use crate::models::ForecastPoint;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use forecast_math::{clip, round_to};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const MIN_PERCENTAGE: f64 = 0.0;
const MAX_PERCENTAGE: f64 = 100.0;

/// Prediction for a single slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedPrediction {
    pub timestamp: DateTime<FixedOffset>,
    pub predicted_freespace_percentage: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_period: Option<TimePeriod>,
}

/// Average prediction of one regular window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodPrediction {
    pub predicted_freespace_percentage: f64,
    pub period: TimePeriod,
    /// Sum of the clipped means the average is taken over
    #[serde(skip)]
    pub total: f64,
    /// Number of slots in the window
    #[serde(skip)]
    pub count: usize,
}

/// All predictions of one local calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPrediction {
    /// Already the key of the response map
    #[serde(skip)]
    pub day: NaiveDate,
    pub last_updated: DateTime<FixedOffset>,
    pub predictions: Vec<DetailedPrediction>,
    pub periods: BTreeMap<TimePeriod, PeriodPrediction>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Accumulator {
    total: f64,
    count: usize,
}

/// Groups forecast points into [`DayPrediction`]s in a reference zone
#[derive(Debug, Clone, Copy)]
pub struct ForecastAggregator {
    tz: Tz,
}

impl ForecastAggregator {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Aggregate `points`, stamping the current time as `last_updated`
    pub fn aggregate(&self, points: &[ForecastPoint]) -> BTreeMap<NaiveDate, DayPrediction> {
        self.aggregate_at(points, Utc::now().with_timezone(&self.tz))
    }

    /// Aggregate `points` with an explicit `last_updated` instant
    pub fn aggregate_at(
        &self,
        points: &[ForecastPoint],
        now: DateTime<Tz>,
    ) -> BTreeMap<NaiveDate, DayPrediction> {
        let last_updated = now.fixed_offset();
        let mut details: BTreeMap<NaiveDate, Vec<DetailedPrediction>> = BTreeMap::new();
        let mut sums: BTreeMap<NaiveDate, BTreeMap<TimePeriod, Accumulator>> = BTreeMap::new();

        for point in points {
            let timestamp = match self.tz.from_local_datetime(&point.slot).earliest() {
                Some(t) => t.fixed_offset(),
                None => {
                    warn!("Skipping slot {} which doesn't exist in {}", point.slot, self.tz);
                    continue;
                }
            };
            let day = point.slot.date();
            let mean = clip(point.mean, MIN_PERCENTAGE, MAX_PERCENTAGE);
            let lower = clip(point.lower, MIN_PERCENTAGE, MAX_PERCENTAGE);
            let upper = clip(point.upper, MIN_PERCENTAGE, MAX_PERCENTAGE);
            let period = regular_period(&point.slot);

            if let Some(period) = period {
                let acc = sums.entry(day).or_default().entry(period).or_default();
                acc.total += mean;
                acc.count += 1;
            }

            details.entry(day).or_default().push(DetailedPrediction {
                timestamp,
                predicted_freespace_percentage: round_to(mean, 2),
                lower_bound: round_to(lower, 2),
                upper_bound: round_to(upper, 2),
                time_period: period,
            });
        }

        details
            .into_iter()
            .map(|(day, mut predictions)| {
                predictions.sort_by_key(|p| p.timestamp);
                let periods = sums
                    .remove(&day)
                    .unwrap_or_default()
                    .into_iter()
                    .filter(|(_, acc)| acc.count > 0)
                    .map(|(period, acc)| {
                        (
                            period,
                            PeriodPrediction {
                                predicted_freespace_percentage: round_to(
                                    acc.total / acc.count as f64,
                                    1,
                                ),
                                period,
                                total: acc.total,
                                count: acc.count,
                            },
                        )
                    })
                    .collect();
                (
                    day,
                    DayPrediction {
                        day,
                        last_updated,
                        predictions,
                        periods,
                    },
                )
            })
            .collect()
    }
}
