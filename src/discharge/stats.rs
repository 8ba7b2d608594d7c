//! Order statistics used by the peak estimators.
//!
//! Percentiles interpolate linearly between the two order statistics that
//! bracket rank `(n - 1) * p / 100`, which is the usual "linear" definition.

use ndarray::Array1;

pub fn percentile(values: &Array1<f64>, p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let rank = (sorted.len() - 1) as f64 * (p.clamp(0.0, 100.0) / 100.0);
    let lo = rank.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    let frac = rank - lo as f64;
    Some(sorted[lo] + frac * (sorted[hi] - sorted[lo]))
}

/// Average of the samples strictly above the `p`-th percentile.
///
/// A flat series has nothing above its percentile; the percentile itself is
/// returned then.
pub fn peak_average(values: &Array1<f64>, p: f64) -> Option<f64> {
    let cut = percentile(values, p)?;
    let (sum, count) = values
        .iter()
        .filter(|v| **v > cut)
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        Some(cut)
    } else {
        Some(sum / count as f64)
    }
}
