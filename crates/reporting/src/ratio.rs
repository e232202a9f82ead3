//! Zero-guarded arithmetic shared by every aggregator.

/// `numerator / denominator`, or `0.0` when the denominator is zero or the
/// result is not finite.
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    let value = numerator / denominator;
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Percentage change from `previous` to `current`; `None` when `previous`
/// is zero.
pub fn percent_change(previous: f64, current: f64) -> Option<f64> {
    if previous == 0.0 {
        return None;
    }
    let change = (current - previous) / previous * 100.0;
    change.is_finite().then_some(change)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
