//! # Freespace Workspace
//!
//! Umbrella crate for the free-space forecasting workspace.
//!
//! - [`forecast`]: grids, frame assembly, the regression model boundary,
//!   aggregation, persistence and the end-to-end pipeline
//! - [`math`]: rounding, clipping and least-squares helpers
//!
//! ```
//! use freespace_workspace::forecast::grid::{regular_period, TimePeriod};
//! use chrono::NaiveDate;
//!
//! let slot = NaiveDate::from_ymd_opt(2024, 5, 6)
//!     .unwrap()
//!     .and_hms_opt(12, 30, 0)
//!     .unwrap();
//! assert_eq!(regular_period(&slot), Some(TimePeriod::Lunch));
//! ```

pub use forecast_math as math;
pub use freespace_forecast as forecast;
