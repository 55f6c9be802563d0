//! Regression model boundary
//!
//! The pipeline only needs a model to `fit` a [`TrainingFrame`], `predict` a
//! [`FutureFrame`] and, for incremental updates, hand back the history it was
//! fitted on. [`additive::AdditiveRegression`] is the bundled implementation.

use crate::error::Result;
use crate::features::FeatureSchema;
use crate::future::FutureFrame;
use crate::training::TrainingFrame;
use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

pub mod additive;

pub use additive::AdditiveRegression;

/// Raw model output for a single future slot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub slot: NaiveDateTime,
    pub mean: f64,
    pub lower: f64,
    pub upper: f64,
}

impl ForecastPoint {
    pub fn new(slot: NaiveDateTime, mean: f64, lower: f64, upper: f64) -> Self {
        Self {
            slot,
            mean,
            lower,
            upper,
        }
    }
}

/// Regression model that can be fitted on a training frame
pub trait RegressionModel: Debug {
    /// Fit (or refit) the model on `frame`, replacing any previous fit
    fn fit(&mut self, frame: &TrainingFrame) -> Result<()>;

    /// Mean and interval bounds for every row of `frame`
    fn predict(&self, frame: &FutureFrame) -> Result<Vec<ForecastPoint>>;

    /// The frame the model was last fitted on, if it keeps one
    fn history(&self) -> Option<&TrainingFrame>;

    /// Covariate schema the model was fitted with
    fn schema(&self) -> Option<&FeatureSchema>;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Conversion of a model to and from its persisted JSON form
pub trait PersistableModel: RegressionModel + Sized {
    fn to_model_data(&self) -> Result<serde_json::Value>;

    fn from_model_data(data: serde_json::Value) -> Result<Self>;
}

impl<M> PersistableModel for M
where
    M: RegressionModel + Serialize + DeserializeOwned,
{
    fn to_model_data(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    fn from_model_data(data: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(data)?)
    }
}
