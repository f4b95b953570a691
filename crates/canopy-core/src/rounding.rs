//! Decimal rounding helpers.
//!
//! All rounding is half away from zero at the given decimal scale,
//! which is what `f64::round` does at scale 0.

/// Round `value` to `decimals` places, half away from zero.
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Round to 2 decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    round_to(value, 2)
}

/// Round to 4 decimal places.
#[must_use]
pub fn round4(value: f64) -> f64 {
    round_to(value, 4)
}

/// Round to a whole score floored at 0, with no upper cap.
///
/// NaN maps to 0.
#[must_use]
pub fn round_score(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.round().max(0.0)
}

/// Round to an integer score and clamp into `0..=100`.
///
/// NaN maps to 0.
#[must_use]
pub fn clamp_score(value: f64) -> u8 {
    round_score(value).min(100.0) as u8
}
