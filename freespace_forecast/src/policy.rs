//! Choosing between a full refit and an incremental update

use crate::error::{ForecastError, Result};
use crate::models::RegressionModel;
use crate::training::TrainingFrame;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// How a model is brought up to date with a new training frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitAction {
    /// Fit a fresh model on the new frame only
    RefitFull,
    /// Merge the model's history with the new frame and refit in place
    UpdateExisting,
}

/// Decides and executes the fit action for caller-owned model state
#[derive(Debug, Clone, Copy, Default)]
pub struct IncrementalFitPolicy;

impl IncrementalFitPolicy {
    pub fn new() -> Self {
        Self
    }

    /// Pick the fit action for `frame`
    pub fn decide<M: RegressionModel>(
        &self,
        existing: Option<&M>,
        frame: &TrainingFrame,
        is_full_history: bool,
    ) -> FitAction {
        let action = match existing {
            _ if is_full_history => FitAction::RefitFull,
            None => FitAction::RefitFull,
            Some(model) if model.history().is_none() => FitAction::RefitFull,
            Some(_) => FitAction::UpdateExisting,
        };
        debug!(
            "Fit decision for {} rows (full history: {}): {:?}",
            frame.len(),
            is_full_history,
            action
        );
        action
    }

    /// Bring `state` up to date with `frame` and return the action that was
    /// actually performed.
    ///
    /// A failed update falls back to a fresh model from `factory` fitted on
    /// `frame` alone; only a failing full refit is reported as `FitFailure`.
    pub fn apply<M, F>(
        &self,
        state: &mut Option<M>,
        frame: &TrainingFrame,
        is_full_history: bool,
        factory: F,
    ) -> Result<FitAction>
    where
        M: RegressionModel,
        F: Fn() -> Result<M>,
    {
        if self.decide(state.as_ref(), frame, is_full_history) == FitAction::UpdateExisting {
            if let Some(model) = state.as_mut() {
                match Self::update(model, frame) {
                    Ok(()) => return Ok(FitAction::UpdateExisting),
                    Err(e) => warn!("Incremental update failed, refitting from scratch: {}", e),
                }
            }
        }

        let mut model = factory()?;
        model.fit(frame).map_err(|e| match e {
            ForecastError::FitFailure(_) => e,
            other => ForecastError::FitFailure(other.to_string()),
        })?;
        *state = Some(model);
        Ok(FitAction::RefitFull)
    }

    fn update<M: RegressionModel>(model: &mut M, frame: &TrainingFrame) -> Result<()> {
        let merged = match model.history() {
            Some(history) => TrainingFrame::merge(history, frame),
            None => {
                return Err(ForecastError::ModelUnavailable(
                    "Model keeps no training history".to_string(),
                ))
            }
        };
        debug!(
            "Updating {} with {} merged rows",
            model.name(),
            merged.len()
        );
        model.fit(&merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::SwissHolidays;
    use crate::features::{FeatureRow, FeatureSchema};
    use crate::future::FutureFrame;
    use crate::models::ForecastPoint;
    use crate::training::TrainingRecord;
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use std::cell::Cell;

    /// Model double that remembers what it was fitted on
    #[derive(Debug, Default)]
    struct RecordingModel {
        history: Option<TrainingFrame>,
        keeps_history: bool,
        fail_when_longer_than: Option<usize>,
        fits: usize,
    }

    impl RegressionModel for RecordingModel {
        fn fit(&mut self, frame: &TrainingFrame) -> Result<()> {
            if let Some(limit) = self.fail_when_longer_than {
                if frame.len() > limit {
                    return Err(ForecastError::FitFailure("too many rows".to_string()));
                }
            }
            self.fits += 1;
            if self.keeps_history {
                self.history = Some(frame.clone());
            }
            Ok(())
        }

        fn predict(&self, _frame: &FutureFrame) -> Result<Vec<ForecastPoint>> {
            Ok(Vec::new())
        }

        fn history(&self) -> Option<&TrainingFrame> {
            self.history.as_ref()
        }

        fn schema(&self) -> Option<&FeatureSchema> {
            self.history.as_ref().map(|h| h.schema())
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    fn slot(offset_slots: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 6)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap()
            + Duration::minutes(30 * offset_slots)
    }

    fn frame(range: std::ops::Range<i64>, value: f64) -> TrainingFrame {
        let records = range
            .map(|i| TrainingRecord {
                features: FeatureRow::new(slot(i), &SwissHolidays),
                target: value,
                synthetic: false,
            })
            .collect();
        TrainingFrame::new(records, FeatureSchema::default())
    }

    fn history_model() -> RecordingModel {
        RecordingModel {
            keeps_history: true,
            ..RecordingModel::default()
        }
    }

    #[test]
    fn test_decide() {
        let policy = IncrementalFitPolicy::new();
        let new_frame = frame(0..4, 50.0);

        assert_eq!(
            policy.decide::<RecordingModel>(None, &new_frame, false),
            FitAction::RefitFull
        );

        let mut fitted = history_model();
        fitted.fit(&frame(0..2, 40.0)).unwrap();
        assert_eq!(
            policy.decide(Some(&fitted), &new_frame, true),
            FitAction::RefitFull
        );
        assert_eq!(
            policy.decide(Some(&fitted), &new_frame, false),
            FitAction::UpdateExisting
        );

        let no_history = RecordingModel::default();
        assert_eq!(
            policy.decide(Some(&no_history), &new_frame, false),
            FitAction::RefitFull
        );
    }

    #[test]
    fn test_update_merges_history_new_rows_win() {
        let policy = IncrementalFitPolicy::new();
        let mut state = None;
        let action = policy
            .apply(&mut state, &frame(0..4, 40.0), false, || Ok(history_model()))
            .unwrap();
        assert_eq!(action, FitAction::RefitFull);

        let action = policy
            .apply(&mut state, &frame(2..6, 60.0), false, || Ok(history_model()))
            .unwrap();
        assert_eq!(action, FitAction::UpdateExisting);

        let model = state.unwrap();
        assert_eq!(model.fits, 2);
        let history = model.history().unwrap();
        let targets: Vec<f64> = history.records().iter().map(|r| r.target).collect();
        assert_eq!(targets, vec![40.0, 40.0, 60.0, 60.0, 60.0, 60.0]);
    }

    #[test]
    fn test_full_history_replaces_model() {
        let policy = IncrementalFitPolicy::new();
        let mut state = None;
        policy
            .apply(&mut state, &frame(0..4, 40.0), false, || Ok(history_model()))
            .unwrap();
        let action = policy
            .apply(&mut state, &frame(10..12, 70.0), true, || Ok(history_model()))
            .unwrap();

        assert_eq!(action, FitAction::RefitFull);
        assert_eq!(state.unwrap().history().unwrap().len(), 2);
    }

    #[test]
    fn test_failed_update_falls_back_to_refit() {
        let policy = IncrementalFitPolicy::new();
        let fragile = || {
            Ok(RecordingModel {
                keeps_history: true,
                fail_when_longer_than: Some(4),
                ..RecordingModel::default()
            })
        };
        let mut state = None;
        policy.apply(&mut state, &frame(0..4, 40.0), false, fragile).unwrap();

        // merged history would be 8 rows, the fresh frame alone only 4
        let action = policy
            .apply(&mut state, &frame(4..8, 60.0), false, fragile)
            .unwrap();
        assert_eq!(action, FitAction::RefitFull);
        let history = state.unwrap().history().unwrap().clone();
        assert_eq!(history.len(), 4);
        assert_eq!(history.first_timestamp(), Some(slot(4)));
    }

    #[test]
    fn test_failed_full_refit_is_fit_failure() {
        let policy = IncrementalFitPolicy::new();
        let calls = Cell::new(0);
        let mut state: Option<RecordingModel> = None;
        let result = policy.apply(&mut state, &frame(0..4, 40.0), true, || {
            calls.set(calls.get() + 1);
            Ok(RecordingModel {
                fail_when_longer_than: Some(1),
                ..RecordingModel::default()
            })
        });

        assert!(matches!(result, Err(ForecastError::FitFailure(_))));
        assert_eq!(calls.get(), 1);
        assert!(state.is_none());
    }
}
