//! Error types for the freespace_forecast crate

use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the freespace_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Input sequences that must line up don't
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// No usable observations remained after filtering
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// The future grid is empty after operating-hours filtering
    #[error("Empty forecast horizon: {0}")]
    EmptyHorizon(String),

    /// No persisted model is available for a predict-only call
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// The regression model could not be fitted
    #[error("Model fit failed: {0}")]
    FitFailure(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error in the configuration file or values
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error raised by a model store
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from JSON (de)serialization
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Error from CSV parsing
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Error from numerical routines
    #[error("Math error: {0}")]
    MathError(#[from] forecast_math::MathError),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<toml::de::Error> for ForecastError {
    fn from(err: toml::de::Error) -> Self {
        ForecastError::ConfigError(err.to_string())
    }
}
