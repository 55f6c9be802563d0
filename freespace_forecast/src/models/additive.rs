//! Additive regression with daily seasonality
//!
//! `y = intercept + trend + Σ covariates + Σ daily Fourier terms + ε`, fitted
//! by ridge least squares. Prediction intervals assume Normal residuals with
//! the in-sample residual spread.

use crate::config::ModelConfig;
use crate::error::{ForecastError, Result};
use crate::features::{FeatureRow, FeatureSchema};
use crate::future::FutureFrame;
use crate::models::{ForecastPoint, RegressionModel};
use crate::training::TrainingFrame;
use chrono::{NaiveDateTime, Timelike};
use forecast_math::RidgeRegression;
use log::debug;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use std::f64::consts::PI;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Additive ridge regression over the frame covariates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdditiveRegression {
    name: String,
    config: ModelConfig,
    regression: Option<RidgeRegression>,
    schema: Option<FeatureSchema>,
    history: Option<TrainingFrame>,
    trend_origin: Option<NaiveDateTime>,
    trend_scale_days: f64,
}

impl AdditiveRegression {
    /// Create an unfitted model
    pub fn new(config: ModelConfig) -> Result<Self> {
        if config.interval_width <= 0.0 || config.interval_width >= 1.0 {
            return Err(ForecastError::InvalidParameter(
                "Interval width must be between 0 and 1".to_string(),
            ));
        }
        RidgeRegression::new(config.ridge_penalty)?;

        Ok(Self {
            name: format!(
                "Additive Regression (fourier={}, penalty={})",
                config.daily_fourier_order, config.ridge_penalty
            ),
            config,
            regression: None,
            schema: None,
            history: None,
            trend_origin: None,
            trend_scale_days: 1.0,
        })
    }

    pub fn is_fitted(&self) -> bool {
        self.regression.is_some()
    }

    fn design_row(&self, features: &FeatureRow, schema: &FeatureSchema) -> Vec<f64> {
        let mut row = vec![1.0];
        if self.config.trend {
            let elapsed = self
                .trend_origin
                .map(|origin| (features.timestamp - origin).num_seconds() as f64 / SECONDS_PER_DAY)
                .unwrap_or(0.0);
            row.push(elapsed / self.trend_scale_days);
        }
        row.extend(features.covariates(schema));

        let time = features.timestamp.time();
        let day_fraction = time.num_seconds_from_midnight() as f64 / SECONDS_PER_DAY;
        for k in 1..=self.config.daily_fourier_order {
            let angle = 2.0 * PI * k as f64 * day_fraction;
            row.push(angle.sin());
            row.push(angle.cos());
        }
        row
    }

    /// Half-width multiplier of the prediction interval
    fn interval_z(&self) -> Result<f64> {
        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| ForecastError::InvalidParameter(e.to_string()))?;
        Ok(normal.inverse_cdf(0.5 + self.config.interval_width / 2.0))
    }
}

impl RegressionModel for AdditiveRegression {
    fn fit(&mut self, frame: &TrainingFrame) -> Result<()> {
        let (first, last) = match (frame.first_timestamp(), frame.last_timestamp()) {
            (Some(first), Some(last)) => (first, last),
            _ => {
                return Err(ForecastError::FitFailure(
                    "Training frame is empty".to_string(),
                ))
            }
        };

        let schema = *frame.schema();
        self.trend_origin = Some(first);
        self.trend_scale_days = ((last - first).num_seconds() as f64 / SECONDS_PER_DAY).max(1.0);

        let design: Vec<Vec<f64>> = frame
            .records()
            .iter()
            .map(|r| self.design_row(&r.features, &schema))
            .collect();
        let target: Vec<f64> = frame.records().iter().map(|r| r.target).collect();

        let mut regression = RidgeRegression::new(self.config.ridge_penalty)?;
        regression
            .fit(&design, &target)
            .map_err(|e| ForecastError::FitFailure(e.to_string()))?;

        debug!(
            "Fitted {} on {} rows, residual std {:.3}",
            self.name,
            frame.len(),
            regression.residual_std().unwrap_or_default()
        );

        self.regression = Some(regression);
        self.schema = Some(schema);
        self.history = Some(frame.clone());
        Ok(())
    }

    fn predict(&self, frame: &FutureFrame) -> Result<Vec<ForecastPoint>> {
        let (regression, schema) = match (&self.regression, &self.schema) {
            (Some(regression), Some(schema)) => (regression, schema),
            _ => {
                return Err(ForecastError::ModelUnavailable(
                    "Model has not been fitted".to_string(),
                ))
            }
        };
        if frame.schema() != schema {
            return Err(ForecastError::ShapeMismatch(format!(
                "Future frame columns {:?} don't match fitted columns {:?}",
                frame.schema().columns(),
                schema.columns()
            )));
        }

        let margin = self.interval_z()? * regression.residual_std().unwrap_or_default();
        frame
            .rows()
            .iter()
            .map(|row| {
                let mean = regression.predict(&self.design_row(row, schema))?;
                Ok(ForecastPoint::new(
                    row.timestamp,
                    mean,
                    mean - margin,
                    mean + margin,
                ))
            })
            .collect()
    }

    fn history(&self) -> Option<&TrainingFrame> {
        self.history.as_ref()
    }

    fn schema(&self) -> Option<&FeatureSchema> {
        self.schema.as_ref()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Observation;
    use crate::future::FutureFrameBuilder;
    use crate::models::PersistableModel;
    use crate::training::TrainingFrameAssembler;
    use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone};
    use chrono_tz::Europe::Zurich;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn start() -> DateTime<FixedOffset> {
        let naive = NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap();
        Zurich.from_local_datetime(&naive).unwrap().fixed_offset()
    }

    /// Busy at lunch and after work, quiet in the morning
    fn synthetic_week(seed: u64) -> Vec<Observation> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut observations = Vec::new();
        for day in 0..7 {
            for step in 0..96 {
                let t = start() + Duration::days(day) + Duration::minutes(10 * step);
                let hour = t.with_timezone(&Zurich).hour();
                if hour >= 22 {
                    continue;
                }
                let base = match hour {
                    6..=8 => 85.0,
                    11..=12 | 16..=18 => 45.0,
                    _ => 65.0,
                };
                observations.push(Observation::new(t, base + rng.gen_range(-3.0..3.0)));
            }
        }
        observations
    }

    fn fitted_model() -> (AdditiveRegression, DateTime<FixedOffset>) {
        let observations = synthetic_week(7);
        let latest = observations.last().unwrap().timestamp;
        let frame = TrainingFrameAssembler::new(Zurich)
            .assemble(&observations, latest)
            .unwrap();
        let mut model = AdditiveRegression::new(ModelConfig::default()).unwrap();
        model.fit(&frame).unwrap();
        (model, latest)
    }

    #[test]
    fn test_fit_and_predict_shape() {
        let (model, latest) = fitted_model();
        assert!(model.is_fitted());
        assert!(model.history().is_some());

        let future = FutureFrameBuilder::new(Zurich)
            .build_future(latest, 2, model.schema().unwrap())
            .unwrap();
        let points = model.predict(&future).unwrap();
        assert_eq!(points.len(), future.len());
        for point in &points {
            assert!(point.lower <= point.mean && point.mean <= point.upper);
        }
    }

    #[test]
    fn test_learns_daily_profile() {
        let (model, latest) = fitted_model();
        let future = FutureFrameBuilder::new(Zurich)
            .build_future(latest, 1, model.schema().unwrap())
            .unwrap();
        let points = model.predict(&future).unwrap();

        let mean_at = |hour: u32| {
            let values: Vec<f64> = points
                .iter()
                .filter(|p| p.slot.hour() == hour)
                .map(|p| p.mean)
                .collect();
            values.iter().sum::<f64>() / values.len() as f64
        };
        assert!(mean_at(7) > mean_at(12) + 10.0);
        assert!(mean_at(17) < mean_at(14));
    }

    #[test]
    fn test_predict_requires_fit_and_matching_schema() {
        let model = AdditiveRegression::new(ModelConfig::default()).unwrap();
        let future = FutureFrameBuilder::new(Zurich)
            .build_future(start(), 1, &FeatureSchema::default())
            .unwrap();
        assert!(matches!(
            model.predict(&future),
            Err(ForecastError::ModelUnavailable(_))
        ));

        let (model, latest) = fitted_model();
        let other = FeatureSchema::new(!model.schema().unwrap().include_holidays);
        let future = FutureFrameBuilder::new(Zurich)
            .build_future(latest, 1, &other)
            .unwrap();
        assert!(matches!(
            model.predict(&future),
            Err(ForecastError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_model_data_round_trip_predicts_identically() {
        let (model, latest) = fitted_model();
        let restored = AdditiveRegression::from_model_data(model.to_model_data().unwrap()).unwrap();
        let future = FutureFrameBuilder::new(Zurich)
            .build_future(latest, 1, model.schema().unwrap())
            .unwrap();
        assert_eq!(model.predict(&future).unwrap(), restored.predict(&future).unwrap());
    }

    #[test]
    fn test_invalid_config() {
        let config = ModelConfig {
            interval_width: 1.2,
            ..ModelConfig::default()
        };
        assert!(AdditiveRegression::new(config).is_err());

        let config = ModelConfig {
            ridge_penalty: -1.0,
            ..ModelConfig::default()
        };
        assert!(AdditiveRegression::new(config).is_err());
    }
}
