//! Rounding and clipping rules applied to published percentages

/// Round `value` to `decimals` places, halves away from zero.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Clamp `value` into `[lower, upper]`.
///
/// NaN is mapped to `lower` so that a clipped value is always inside the range.
pub fn clip(value: f64, lower: f64, upper: f64) -> f64 {
    if value.is_nan() {
        return lower;
    }
    value.max(lower).min(upper)
}
