//! Sample statistics and percentiles.

use std::cmp::Ordering;

use ndarray::ArrayView1;

use crate::MathError;

/// Relative spread below which a sample is treated as constant.
const CONSTANT_TOLERANCE: f64 = 1e-12;

/// Arithmetic mean.
///
/// # Errors
/// Returns `MathError::EmptyData` for an empty sample.
pub fn mean(data: ArrayView1<'_, f64>) -> Result<f64, MathError> {
    data.mean().ok_or(MathError::EmptyData)
}

/// Sample variance with denominator `n - 1`.
///
/// Uses the two-pass formula.
///
/// # Errors
/// Returns `MathError::InsufficientObservations` with fewer than two values.
pub fn sample_variance(data: ArrayView1<'_, f64>) -> Result<f64, MathError> {
    let n = data.len();
    if n < 2 {
        return Err(MathError::InsufficientObservations { required: 2, actual: n });
    }
    let m = mean(data)?;
    Ok(data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (n as f64 - 1.0))
}

/// Whether every value in the sample is equal up to floating-point noise.
///
/// Spread is measured relative to the largest magnitude in the sample, so a
/// column of identical values such as `0.01` repeated twelve times is
/// constant even though its computed variance may be a tiny positive number.
#[must_use]
pub fn is_effectively_constant(data: ArrayView1<'_, f64>) -> bool {
    if data.is_empty() {
        return true;
    }
    let (min, max, scale) = data.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY, 0.0_f64),
        |(lo, hi, s), &x| (lo.min(x), hi.max(x), s.max(x.abs())),
    );
    max - min <= CONSTANT_TOLERANCE * scale
}

/// Percentile with linear interpolation between order statistics.
///
/// Matches the conventional definition: the rank is `pct / 100 * (n - 1)` and
/// values between two order statistics are interpolated linearly.
///
/// # Arguments
/// * `data` - Sample values (any order)
/// * `pct` - Percentile in [0, 100]
///
/// # Errors
/// Returns an error for an empty sample, a non-finite value or an out-of-range percentile.
pub fn percentile(data: ArrayView1<'_, f64>, pct: f64) -> Result<f64, MathError> {
    if !(0.0..=100.0).contains(&pct) {
        return Err(MathError::InvalidPercentile(pct));
    }
    if data.is_empty() {
        return Err(MathError::EmptyData);
    }
    if data.iter().any(|x| !x.is_finite()) {
        return Err(MathError::NumericalInstability("non-finite value in sample".to_string()));
    }

    let mut sorted: Vec<f64> = data.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;

    Ok(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}
