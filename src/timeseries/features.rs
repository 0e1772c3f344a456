//! Weather smoothing primitives
//!
//! Series are `Array1<f64>` with `NaN` marking a missing sample.

use crate::error::{PrepError, Result};
use ndarray::{s, Array1};
use serde::{Deserialize, Serialize};

/// One week of hourly samples
pub const WEEK_WINDOW: usize = 24 * 7;

/// Parameters of a single smoothed series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmoothingSpec {
    /// Trailing window length in samples
    pub window: usize,
    /// Decimal places kept after rounding
    pub decimals: u32,
}

impl SmoothingSpec {
    pub fn new(window: usize, decimals: u32) -> Self {
        Self { window, decimals }
    }
}

impl Default for SmoothingSpec {
    fn default() -> Self {
        Self::new(WEEK_WINDOW, 1)
    }
}

/// Fill missing samples by linear interpolation.
///
/// Internal gaps lie on the straight line between their valid neighbours,
/// trailing gaps repeat the last valid value and leading gaps stay `NaN`.
pub fn interpolate_linear(series: &Array1<f64>) -> Array1<f64> {
    let mut result = series.clone();
    let mut last_valid: Option<usize> = None;

    for i in 0..result.len() {
        if result[i].is_nan() {
            continue;
        }
        if let Some(prev) = last_valid {
            let gap = i - prev;
            if gap > 1 {
                let (from, to) = (result[prev], result[i]);
                for k in 1..gap {
                    result[prev + k] = from + (to - from) * k as f64 / gap as f64;
                }
            }
        }
        last_valid = Some(i);
    }

    if let Some(last) = last_valid {
        let fill = result[last];
        result.slice_mut(s![last + 1..]).fill(fill);
    }

    result
}

/// Trailing mean over `window` consecutive samples.
///
/// Position `i` is defined only when `i + 1 >= window` and the window holds
/// no missing sample; every other position is `NaN`.
pub fn rolling_mean(series: &Array1<f64>, window: usize) -> Result<Array1<f64>> {
    if window == 0 {
        return Err(PrepError::ConfigError(
            "rolling window must be at least one sample".to_string(),
        ));
    }

    let n = series.len();
    let mut result = Array1::from_elem(n, f64::NAN);

    for i in (window - 1)..n {
        let values = series.slice(s![i + 1 - window..=i]);
        if values.iter().any(|v| v.is_nan()) {
            continue;
        }
        result[i] = values.sum() / window as f64;
    }

    Ok(result)
}

/// Replace each missing sample with the next valid one
pub fn backward_fill(series: &Array1<f64>) -> Array1<f64> {
    let mut result = series.clone();
    let mut next_valid = f64::NAN;

    for v in result.iter_mut().rev() {
        if v.is_nan() {
            *v = next_valid;
        } else {
            next_valid = *v;
        }
    }

    result
}

/// Round to `decimals` places, ties to even.
/// Precisions beyond what an f64 can scale leave the value unchanged.
pub fn round_half_even(value: f64, decimals: u32) -> f64 {
    let factor = match i32::try_from(decimals) {
        Ok(exp) => 10f64.powi(exp),
        Err(_) => return value,
    };
    let scaled = value * factor;
    if !factor.is_finite() || !scaled.is_finite() {
        return value;
    }
    scaled.round_ties_even() / factor
}

/// Interpolate, take the trailing mean, backfill the warm-up rows and round.
///
/// Fails with `InsufficientDataError` when no complete window exists, so the
/// result never carries missing samples.
pub fn smooth(series: &Array1<f64>, spec: &SmoothingSpec) -> Result<Array1<f64>> {
    let interpolated = interpolate_linear(series);
    let rolled = rolling_mean(&interpolated, spec.window)?;

    if rolled.iter().all(|v| v.is_nan()) {
        return Err(PrepError::InsufficientDataError(format!(
            "no complete {}-sample window in a series of {} samples",
            spec.window,
            series.len()
        )));
    }

    let filled = backward_fill(&rolled);
    if filled.iter().any(|v| v.is_nan()) {
        return Err(PrepError::InsufficientDataError(
            "gaps remain after interpolation and backward fill".to_string(),
        ));
    }

    Ok(filled.mapv(|v| round_half_even(v, spec.decimals)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_interpolate_internal_gap() {
        let series = array![1.0, f64::NAN, f64::NAN, 4.0];
        let filled = interpolate_linear(&series);
        assert!((filled[1] - 2.0).abs() < 1e-9);
        assert!((filled[2] - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_interpolate_edges() {
        let series = array![f64::NAN, 2.0, 3.0, f64::NAN, f64::NAN];
        let filled = interpolate_linear(&series);

        // Leading gap has no left neighbour
        assert!(filled[0].is_nan());
        assert_eq!(filled[3], 3.0);
        assert_eq!(filled[4], 3.0);
    }

    #[test]
    fn test_interpolate_all_missing() {
        let series = array![f64::NAN, f64::NAN];
        let filled = interpolate_linear(&series);
        assert!(filled.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_rolling_mean() {
        let series = array![1.0, 2.0, 3.0, 4.0, 5.0];
        let rolled = rolling_mean(&series, 3).unwrap();

        assert!(rolled[0].is_nan());
        assert!(rolled[1].is_nan());
        assert!((rolled[2] - 2.0).abs() < 1e-9);
        assert!((rolled[4] - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_rolling_mean_skips_windows_with_gaps() {
        let series = array![1.0, f64::NAN, 3.0, 4.0, 5.0];
        let rolled = rolling_mean(&series, 2).unwrap();

        assert!(rolled[1].is_nan());
        assert!(rolled[2].is_nan());
        assert!((rolled[3] - 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_rolling_mean_zero_window() {
        let series = array![1.0, 2.0];
        assert!(matches!(
            rolling_mean(&series, 0),
            Err(PrepError::ConfigError(_))
        ));
    }

    #[test]
    fn test_backward_fill() {
        let series = array![f64::NAN, f64::NAN, 7.0, f64::NAN, 9.0];
        let filled = backward_fill(&series);
        assert_eq!(filled.to_vec(), vec![7.0, 7.0, 7.0, 9.0, 9.0]);
    }

    #[test]
    fn test_round_half_even() {
        assert_eq!(round_half_even(2.5, 0), 2.0);
        assert_eq!(round_half_even(3.5, 0), 4.0);
        assert_eq!(round_half_even(1.25, 1), 1.2);
        assert_eq!(round_half_even(-0.5, 0), 0.0);
        assert_eq!(round_half_even(21.37, 1), 21.4);
    }

    #[test]
    fn test_round_half_even_extreme_precision() {
        assert_eq!(round_half_even(21.37, 400), 21.37);
        assert_eq!(round_half_even(21.37, u32::MAX), 21.37);
        assert_eq!(round_half_even(-3.5, 309), -3.5);
    }

    #[test]
    fn test_smooth_extreme_precision_keeps_values() {
        let series = Array1::from_elem(10, 4.25);
        let smoothed = smooth(&series, &SmoothingSpec::new(3, 400)).unwrap();
        assert!(smoothed.iter().all(|&v| v == 4.25));
    }

    #[test]
    fn test_smooth_constant_series() {
        let series = Array1::from_elem(200, 20.0);
        let smoothed = smooth(&series, &SmoothingSpec::new(WEEK_WINDOW, 1)).unwrap();
        assert!(smoothed.iter().all(|&v| v == 20.0));
    }

    #[test]
    fn test_smooth_backfills_warm_up() {
        let series: Array1<f64> = (0..10).map(|i| i as f64).collect();
        let smoothed = smooth(&series, &SmoothingSpec::new(4, 2)).unwrap();

        // First window ends at index 3: mean(0, 1, 2, 3) = 1.5
        for i in 0..4 {
            assert!((smoothed[i] - 1.5).abs() < 1e-9);
        }
        assert!((smoothed[9] - 7.5).abs() < 1e-9);
    }

    #[test]
    fn test_smooth_exact_window_length() {
        let series: Array1<f64> = (0..4).map(|i| i as f64).collect();
        let smoothed = smooth(&series, &SmoothingSpec::new(4, 1)).unwrap();
        // A single window: every row takes its mean
        assert!(smoothed.iter().all(|&v| (v - 1.5).abs() < 1e-9));
    }

    #[test]
    fn test_smooth_short_series() {
        let series = Array1::from_elem(100, 12.0);
        let result = smooth(&series, &SmoothingSpec::default());
        assert!(matches!(result, Err(PrepError::InsufficientDataError(_))));
    }

    #[test]
    fn test_smooth_empty_series() {
        let series: Array1<f64> = Array1::zeros(0);
        let result = smooth(&series, &SmoothingSpec::new(3, 0));
        assert!(matches!(result, Err(PrepError::InsufficientDataError(_))));
    }
}
