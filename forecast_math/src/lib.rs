//! # Forecast Math
//!
//! Numerical building blocks for the free-space forecasting pipeline.
//! This crate provides the rounding and clipping rules used when publishing
//! predictions, a small dense linear solver and a ridge least-squares fit
//! used by the reference regression model.

use thiserror::Error;

pub mod linalg;
pub mod regression;
pub mod rounding;

pub use regression::RidgeRegression;
pub use rounding::{clip, round_to};

/// Errors that can occur in numerical calculations
#[derive(Error, Debug)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),

    #[error("Singular system: {0}")]
    SingularMatrix(String),
}

/// Result type for numerical operations
pub type Result<T> = std::result::Result<T, MathError>;
