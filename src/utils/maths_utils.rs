use argminmax::ArgMinMax;
use std::f64;

/// Largest value in the slice. Returns 0.0 for an empty slice.
#[inline]
pub(crate) fn get_max(vec: &[f64]) -> f64 {
    if vec.is_empty() {
        return 0.0;
    }
    let max_index: usize = vec.argmax();
    vec[max_index]
}

/// Smallest value in the slice. Returns 0.0 for an empty slice.
#[inline]
pub(crate) fn get_min(vec: &[f64]) -> f64 {
    if vec.is_empty() {
        return 0.0;
    }
    let min_index: usize = vec.argmin();
    vec[min_index]
}

// Normalizes a vector of (positive) f64 to 0.0 to 1.0. Guarantees largest value is 1.0
// Smallest output value will be 0.0 iff smallest input value = 0.0
// Name: `Max normalization`, `Max-Abs normalization`, or `L∞ normalization`
#[inline]
pub(crate) fn normalize_max(vec: &[f64]) -> Vec<f64> {
    let max_value = get_max(vec);

    // Nothing to scale against: hand back zeros rather than NaNs
    if max_value <= f64::EPSILON {
        return vec![0.0; vec.len()];
    }

    vec.iter().map(|&x| x / max_value).collect()
}

/// Population mean and standard deviation (divides by N).
#[inline]
pub fn mean_and_stddev(data: &[f64]) -> (f64, f64) {
    let count = data.len();
    if count == 0 {
        return (0.0, 0.0);
    }

    let sum: f64 = data.iter().sum();
    let mean = sum / count as f64;

    let variance: f64 = data
        .iter()
        .map(|value| {
            let diff = mean - *value;
            diff * diff
        })
        .sum::<f64>()
        / count as f64;

    (mean, variance.sqrt())
}

/// Trailing simple mean of the last `period` values. None if there are fewer values.
pub(crate) fn trailing_mean(data: &[f64], period: usize) -> Option<f64> {
    if period == 0 || data.len() < period {
        return None;
    }
    let window = &data[data.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}

/// Centered rolling extreme. Index `i` holds the extreme of `data[i-half..=i+half]`,
/// or None where the window would run off either end.
pub(crate) fn centered_window<F>(data: &[f64], half: usize, pick: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> f64,
{
    let len = data.len();
    (0..len)
        .map(|i| {
            if i < half || i + half >= len {
                None
            } else {
                Some(pick(&data[i - half..=i + half]))
            }
        })
        .collect()
}

/// Rounds to `places` decimal places for flat output records.
#[inline]
pub fn round_dp(val: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (val * factor).round() / factor
}
