//! # Freespace Forecast
//!
//! Data preparation and post-processing around a regression model that
//! forecasts the free space of a swimming pool in half-hour slots.
//!
//! ## Features
//!
//! - Half-hour grids and the table of named time-of-day windows
//! - Training frames with synthetic closed-hour rows and calendar covariates
//! - Future frames restricted to opening hours
//! - Per-day aggregation of predictions with per-window averages
//! - Full refits or incremental updates of a stored model
//! - An additive ridge regression as the bundled model
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use freespace_forecast::data::ObservationLoader;
//! use freespace_forecast::pipeline::{ForecastPipeline, PredictionInput};
//! use freespace_forecast::store::InMemoryModelStore;
//! use freespace_forecast::ForecastConfig;
//!
//! # fn main() -> freespace_forecast::error::Result<()> {
//! let observations = ObservationLoader::from_csv("freespace.csv")?;
//! let (timestamps, values) = observations
//!     .iter()
//!     .map(|o| (o.timestamp, o.value))
//!     .unzip();
//!
//! let pipeline = ForecastPipeline::new(ForecastConfig::default(), InMemoryModelStore::new())?;
//! let response = pipeline.run(&PredictionInput::new(timestamps, values).with_days(3))?;
//!
//! for (day, prediction) in &response.predictions {
//!     println!("{}: {} slots", day, prediction.predictions.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod calendar;
pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod feed;
pub mod future;
pub mod grid;
pub mod models;
pub mod pipeline;
pub mod policy;
pub mod store;
pub mod training;

// Re-export commonly used types
pub use crate::aggregate::{DayPrediction, ForecastAggregator};
pub use crate::config::ForecastConfig;
pub use crate::data::{Observation, ObservationLoader};
pub use crate::error::ForecastError;
pub use crate::future::{FutureFrame, FutureFrameBuilder};
pub use crate::grid::{GridBuilder, TimePeriod};
pub use crate::models::{ForecastPoint, RegressionModel};
pub use crate::pipeline::{ForecastPipeline, PredictionInput, PredictionResponse};
pub use crate::policy::{FitAction, IncrementalFitPolicy};
pub use crate::store::{ModelRecord, ModelStore};
pub use crate::training::{TrainingFrame, TrainingFrameAssembler};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
