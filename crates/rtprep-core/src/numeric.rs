//! Rounding, tolerance and count helpers for clinical quantities.
//!
//! Rounding is half-to-even throughout, so reported values agree with the
//! clinical system the manifests were produced from.

/// Round `value` to `decimals` places, ties to even.
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

/// `true` when `a` and `b` differ by strictly less than `tolerance`.
#[must_use]
pub fn within(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() < tolerance
}

/// A file or plan count as stored in a report column, saturating at `u32::MAX`.
#[must_use]
pub fn to_count(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}
