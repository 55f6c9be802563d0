//! Pipeline configuration.
//!
//! Settings are read from a TOML file; every field has a default so an empty
//! file (or no file at all) yields the production configuration.
//!
//! ```toml
//! timezone = "Europe/Zurich"
//! default_days = 5
//! holiday_min_days = 4
//!
//! [model]
//! interval_width = 0.8
//! ```

use crate::error::{ForecastError, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level forecasting configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// IANA zone all timestamps are normalized into
    pub timezone: String,
    /// Horizon used when a request doesn't specify `days`
    pub default_days: u32,
    /// Largest accepted horizon
    pub max_days: u32,
    /// Minimum number of distinct covered days before the holiday covariate is used
    pub holiday_min_days: usize,
    /// Whether the holiday covariate is offered at all
    pub use_holidays: bool,
    /// Upper bound applied to the feed's reported capacity
    pub capacity_cap: u32,
    /// Key models are persisted under
    pub model_type: String,
    /// Facility name selected from the feed broadcast
    pub facility: String,
    /// Directory for the JSON model store; in-memory when unset
    pub store_dir: Option<PathBuf>,
    pub model: ModelConfig,
}

/// Settings of the reference additive regression model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// L2 penalty on every non-intercept coefficient
    pub ridge_penalty: f64,
    /// Number of sin/cos pairs of the daily seasonality
    pub daily_fourier_order: usize,
    /// Coverage of the prediction interval, in (0, 1)
    pub interval_width: f64,
    /// Include a linear trend term
    pub trend: bool,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            default_days: 5,
            max_days: 14,
            holiday_min_days: 4,
            use_holidays: true,
            capacity_cap: 200,
            model_type: "badi_predictions".to_string(),
            facility: "Hallenbad City".to_string(),
            store_dir: None,
            model: ModelConfig::default(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            ridge_penalty: 0.5,
            daily_fourier_order: 4,
            interval_width: 0.8,
            trend: true,
        }
    }
}

fn default_timezone() -> String {
    "Europe/Zurich".to_string()
}

impl ForecastConfig {
    /// Parse a configuration from TOML text and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ForecastConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            ForecastError::ConfigError(format!(
                "Failed to read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// The configured reference time zone
    pub fn tz(&self) -> Result<Tz> {
        self.timezone.parse::<Tz>().map_err(|e| {
            ForecastError::ConfigError(format!("Unknown time zone '{}': {}", self.timezone, e))
        })
    }

    /// Check value ranges and the time zone name
    pub fn validate(&self) -> Result<()> {
        self.tz()?;

        if self.max_days == 0 {
            return Err(ForecastError::ConfigError(
                "max_days must be at least 1".to_string(),
            ));
        }
        if self.default_days == 0 || self.default_days > self.max_days {
            return Err(ForecastError::ConfigError(format!(
                "default_days must be within 1..={}",
                self.max_days
            )));
        }
        if self.capacity_cap == 0 {
            return Err(ForecastError::ConfigError(
                "capacity_cap must be positive".to_string(),
            ));
        }
        if self.model.interval_width <= 0.0 || self.model.interval_width >= 1.0 {
            return Err(ForecastError::ConfigError(
                "model.interval_width must be between 0 and 1".to_string(),
            ));
        }
        if !self.model.ridge_penalty.is_finite() || self.model.ridge_penalty < 0.0 {
            return Err(ForecastError::ConfigError(
                "model.ridge_penalty must be non-negative".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = ForecastConfig::from_toml_str("").unwrap();
        assert_eq!(config, ForecastConfig::default());
        assert_eq!(config.tz().unwrap(), chrono_tz::Europe::Zurich);
    }

    #[test]
    fn test_partial_override() {
        let config = ForecastConfig::from_toml_str(
            r#"
            timezone = "Europe/Berlin"
            default_days = 3
            store_dir = "/var/lib/freespace"

            [model]
            interval_width = 0.95
            "#,
        )
        .unwrap();

        assert_eq!(config.timezone, "Europe/Berlin");
        assert_eq!(config.default_days, 3);
        assert_eq!(config.max_days, 14);
        assert_eq!(config.store_dir, Some(PathBuf::from("/var/lib/freespace")));
        assert_eq!(config.model.interval_width, 0.95);
        assert_eq!(config.model.daily_fourier_order, 4);
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(matches!(
            ForecastConfig::from_toml_str(r#"timezone = "Mars/Olympus""#),
            Err(ForecastError::ConfigError(_))
        ));
        assert!(ForecastConfig::from_toml_str("default_days = 20").is_err());
        assert!(ForecastConfig::from_toml_str("[model]\ninterval_width = 1.5").is_err());
        assert!(ForecastConfig::from_toml_str("default_days = \"five\"").is_err());
    }
}
