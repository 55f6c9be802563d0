//! End-to-end forecasting: observations in, per-day predictions out
//!
//! A [`ForecastPipeline`] owns its configuration and an injected
//! [`ModelStore`]; every call is synchronous and keeps no state besides what
//! the store persists.

use crate::aggregate::{DayPrediction, ForecastAggregator};
use crate::config::ForecastConfig;
use crate::data::{latest_instant, observations_from_parts};
use crate::error::{ForecastError, Result};
use crate::future::FutureFrameBuilder;
use crate::models::{AdditiveRegression, PersistableModel};
use crate::policy::{FitAction, IncrementalFitPolicy};
use crate::store::{ModelRecord, ModelStore};
use crate::training::TrainingFrameAssembler;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use chrono_tz::Tz;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A forecasting request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionInput {
    pub timestamps: Vec<DateTime<FixedOffset>>,
    pub values: Vec<f64>,
    /// Number of days ahead; the configured default when absent
    #[serde(default)]
    pub days: Option<u32>,
    /// Replace the stored model instead of updating it
    #[serde(default)]
    pub is_full_history: bool,
}

impl PredictionInput {
    pub fn new(timestamps: Vec<DateTime<FixedOffset>>, values: Vec<f64>) -> Self {
        Self {
            timestamps,
            values,
            days: None,
            is_full_history: false,
        }
    }

    pub fn with_days(mut self, days: u32) -> Self {
        self.days = Some(days);
        self
    }

    pub fn full_history(mut self, enabled: bool) -> Self {
        self.is_full_history = enabled;
        self
    }
}

/// Predictions keyed by ISO date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub message: String,
    pub predictions: BTreeMap<String, DayPrediction>,
}

impl PredictionResponse {
    fn from_days(message: &str, days: BTreeMap<NaiveDate, DayPrediction>) -> Self {
        Self {
            message: message.to_string(),
            predictions: days
                .into_iter()
                .map(|(day, prediction)| (day.format("%Y-%m-%d").to_string(), prediction))
                .collect(),
        }
    }
}

/// Forecasting pipeline over an injected model store
#[derive(Debug)]
pub struct ForecastPipeline<S: ModelStore> {
    config: ForecastConfig,
    tz: Tz,
    store: S,
    policy: IncrementalFitPolicy,
}

impl<S: ModelStore> ForecastPipeline<S> {
    pub fn new(config: ForecastConfig, store: S) -> Result<Self> {
        config.validate()?;
        let tz = config.tz()?;
        Ok(Self {
            config,
            tz,
            store,
            policy: IncrementalFitPolicy::new(),
        })
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fit or update the stored additive model and forecast
    pub fn run(&self, input: &PredictionInput) -> Result<PredictionResponse> {
        let model_config = self.config.model.clone();
        self.run_with(input, || AdditiveRegression::new(model_config.clone()))
    }

    /// Fit or update a model built by `factory` and forecast.
    ///
    /// A stored model of the configured type is updated with the new
    /// observations unless `is_full_history` is set; the fitted model is
    /// saved back before the predictions are returned.
    pub fn run_with<M, F>(&self, input: &PredictionInput, factory: F) -> Result<PredictionResponse>
    where
        M: PersistableModel,
        F: Fn() -> Result<M>,
    {
        let days = self.horizon(input.days)?;
        let observations = observations_from_parts(&input.timestamps, &input.values)?;
        let latest = latest_instant(&observations)
            .ok_or_else(|| ForecastError::EmptyInput("No observations supplied".to_string()))?;

        info!(
            "Forecasting {} days from {} observations (latest {})",
            days,
            observations.len(),
            latest
        );

        let frame = self.assembler().assemble(&observations, latest)?;
        debug!(
            "Training frame: {} rows, {} synthetic, {} days",
            frame.len(),
            frame.synthetic_count(),
            frame.distinct_days()
        );

        let mut state = if input.is_full_history {
            None
        } else {
            self.load_model::<M>()?
        };
        let action = self
            .policy
            .apply(&mut state, &frame, input.is_full_history, factory)?;
        let model = state.ok_or_else(|| {
            ForecastError::FitFailure("No model available after fitting".to_string())
        })?;
        info!("Model '{}' ready ({:?})", model.name(), action);

        let schema = *model.schema().unwrap_or(frame.schema());
        let future = self.future_builder().build_future(latest, days, &schema)?;
        let points = model.predict(&future)?;
        let predictions = ForecastAggregator::new(self.tz).aggregate(&points);

        let record = ModelRecord::from_model(&self.config.model_type, &model, Utc::now())?;
        self.store.save(record)?;

        let message = match action {
            FitAction::RefitFull => "Model trained and predictions generated",
            FitAction::UpdateExisting => "Model updated and predictions generated",
        };
        Ok(PredictionResponse::from_days(message, predictions))
    }

    /// Forecast from the stored model without fitting
    pub fn predict_only(
        &self,
        latest_observation: DateTime<FixedOffset>,
        days: Option<u32>,
    ) -> Result<PredictionResponse> {
        self.predict_only_with::<AdditiveRegression>(latest_observation, days)
    }

    /// Forecast from the stored model of type `M`; `ModelUnavailable` when
    /// nothing has been stored yet.
    pub fn predict_only_with<M: PersistableModel>(
        &self,
        latest_observation: DateTime<FixedOffset>,
        days: Option<u32>,
    ) -> Result<PredictionResponse> {
        let days = self.horizon(days)?;
        let record = self.store.load_latest(&self.config.model_type)?;
        let model: M = record.to_model()?;
        let schema = *model.schema().ok_or_else(|| {
            ForecastError::ModelUnavailable("Stored model has not been fitted".to_string())
        })?;

        let future = self
            .future_builder()
            .build_future(latest_observation, days, &schema)?;
        let points = model.predict(&future)?;
        info!(
            "Predicted {} slots with stored model from {}",
            points.len(),
            record.updated_at
        );
        let predictions = ForecastAggregator::new(self.tz).aggregate(&points);
        Ok(PredictionResponse::from_days(
            "Predictions generated from stored model",
            predictions,
        ))
    }

    fn horizon(&self, days: Option<u32>) -> Result<u32> {
        let days = days.unwrap_or(self.config.default_days);
        if days == 0 || days > self.config.max_days {
            return Err(ForecastError::InvalidParameter(format!(
                "days must be within 1..={}, got {}",
                self.config.max_days, days
            )));
        }
        Ok(days)
    }

    fn assembler(&self) -> TrainingFrameAssembler {
        TrainingFrameAssembler::new(self.tz)
            .with_holiday_min_days(self.config.holiday_min_days)
            .with_holidays(self.config.use_holidays)
    }

    fn future_builder(&self) -> FutureFrameBuilder {
        FutureFrameBuilder::new(self.tz)
    }

    /// The stored model, or `None` when there is none or it can't be decoded
    fn load_model<M: PersistableModel>(&self) -> Result<Option<M>> {
        match self.store.load_latest(&self.config.model_type) {
            Ok(record) => match record.to_model::<M>() {
                Ok(model) => Ok(Some(model)),
                Err(e) => {
                    warn!("Ignoring undecodable stored model: {}", e);
                    Ok(None)
                }
            },
            Err(ForecastError::ModelUnavailable(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryModelStore;
    use chrono::TimeZone;
    use chrono_tz::Europe::Zurich;

    fn pipeline() -> ForecastPipeline<InMemoryModelStore> {
        ForecastPipeline::new(ForecastConfig::default(), InMemoryModelStore::new()).unwrap()
    }

    fn at(h: u32, m: u32) -> DateTime<FixedOffset> {
        Zurich
            .with_ymd_and_hms(2024, 5, 6, h, m, 0)
            .unwrap()
            .fixed_offset()
    }

    #[test]
    fn test_rejects_mismatched_lengths() {
        let input = PredictionInput::new(vec![at(9, 0), at(9, 30)], vec![40.0]);
        assert!(matches!(
            pipeline().run(&input),
            Err(ForecastError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_rejects_out_of_range_days() {
        let input = PredictionInput::new(vec![at(9, 0)], vec![40.0]).with_days(15);
        assert!(matches!(
            pipeline().run(&input),
            Err(ForecastError::InvalidParameter(_))
        ));
        let input = PredictionInput::new(vec![at(9, 0)], vec![40.0]).with_days(0);
        assert!(pipeline().run(&input).is_err());
    }

    #[test]
    fn test_rejects_empty_and_negative_input() {
        let empty = PredictionInput::new(Vec::new(), Vec::new());
        assert!(matches!(
            pipeline().run(&empty),
            Err(ForecastError::EmptyInput(_))
        ));

        let negative = PredictionInput::new(vec![at(9, 0)], vec![-1.0]);
        assert!(matches!(
            pipeline().run(&negative),
            Err(ForecastError::EmptyInput(_))
        ));
    }

    #[test]
    fn test_predict_only_without_model() {
        assert!(matches!(
            pipeline().predict_only(at(9, 0), None),
            Err(ForecastError::ModelUnavailable(_))
        ));
    }

    #[test]
    fn test_input_days_default_from_json() {
        let input: PredictionInput = serde_json::from_str(
            r#"{"timestamps": ["2024-05-06T09:00:00+02:00"], "values": [40.0]}"#,
        )
        .unwrap();
        assert_eq!(input.days, None);
        assert!(!input.is_full_history);
        assert_eq!(pipeline().horizon(input.days).unwrap(), 5);
    }
}
