//! Zero-guarded arithmetic shared by the aggregators.

/// `numerator / denominator * 100`, or 0 when the denominator is not positive.
pub fn percent(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        let value = numerator / denominator * 100.0;
        if value.is_finite() {
            value
        } else {
            0.0
        }
    } else {
        0.0
    }
}

/// Mean of `values`, 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Nearest-rank percentile of an ascending-sorted slice; 0 when empty.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (p / 100.0 * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}
