//! Ridge least-squares regression
//!
//! Fits `y ≈ X·β` by solving the regularized normal equations
//! `(XᵀX + λ·P)·β = Xᵀy`, where `P` is the identity with the intercept
//! column (column 0) left unpenalized.

use crate::linalg::{dot, solve};
use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Ridge regression over a dense design matrix whose first column is the intercept
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RidgeRegression {
    penalty: f64,
    coefficients: Option<Vec<f64>>,
    residual_std: Option<f64>,
}

impl RidgeRegression {
    /// Create a new ridge regression with the given L2 penalty
    pub fn new(penalty: f64) -> Result<Self> {
        if !penalty.is_finite() || penalty < 0.0 {
            return Err(MathError::InvalidInput(
                "Ridge penalty must be a finite, non-negative number".to_string(),
            ));
        }

        Ok(Self {
            penalty,
            coefficients: None,
            residual_std: None,
        })
    }

    /// Fit the coefficients on `design` rows and `target` values
    pub fn fit(&mut self, design: &[Vec<f64>], target: &[f64]) -> Result<()> {
        if design.len() != target.len() {
            return Err(MathError::InvalidInput(format!(
                "Design rows ({}) don't match target length ({})",
                design.len(),
                target.len()
            )));
        }
        let width = match design.first() {
            Some(row) if !row.is_empty() => row.len(),
            _ => {
                return Err(MathError::InsufficientData(
                    "At least one non-empty design row is required".to_string(),
                ))
            }
        };
        if design.iter().any(|row| row.len() != width) {
            return Err(MathError::InvalidInput(
                "Design rows must all have the same width".to_string(),
            ));
        }

        // Accumulate XᵀX and Xᵀy
        let mut gram = vec![vec![0.0; width]; width];
        let mut moment = vec![0.0; width];
        for (row, &y) in design.iter().zip(target.iter()) {
            for i in 0..width {
                moment[i] += row[i] * y;
                for j in i..width {
                    gram[i][j] += row[i] * row[j];
                }
            }
        }
        for i in 0..width {
            for j in 0..i {
                gram[i][j] = gram[j][i];
            }
        }
        for (i, row) in gram.iter_mut().enumerate().skip(1) {
            row[i] += self.penalty;
        }

        let coefficients = solve(gram, moment)?;

        let mut squared = 0.0;
        for (row, &y) in design.iter().zip(target.iter()) {
            let residual = y - dot(row, &coefficients)?;
            squared += residual * residual;
        }
        let dof = design.len().saturating_sub(width).max(1) as f64;

        self.coefficients = Some(coefficients);
        self.residual_std = Some((squared / dof).sqrt());
        Ok(())
    }

    /// Predict a single design row
    pub fn predict(&self, row: &[f64]) -> Result<f64> {
        let coefficients = self.coefficients.as_ref().ok_or_else(|| {
            MathError::CalculationError("Regression has not been fitted".to_string())
        })?;
        dot(row, coefficients)
    }

    /// Fitted coefficients, intercept first
    pub fn coefficients(&self) -> Option<&[f64]> {
        self.coefficients.as_deref()
    }

    /// Standard deviation of the in-sample residuals
    pub fn residual_std(&self) -> Option<f64> {
        self.residual_std
    }

    pub fn penalty(&self) -> f64 {
        self.penalty
    }

    pub fn is_fitted(&self) -> bool {
        self.coefficients.is_some()
    }
}
