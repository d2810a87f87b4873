//! # Descriptive Statistics
//!
//! $$
//! \hat\gamma_1=\frac{m_3}{m_2^{3/2}},\qquad \hat\gamma_2=\frac{m_4}{m_2^2}-3
//! $$
//!
//! Sample moments, linear-interpolated percentiles and drawdown. Accessors
//! degrade to `NaN` (or `0.0` where noted) instead of failing on empty input.

use statrs::statistics::Statistics;

/// Trading periods per year for daily history.
pub const TRADING_DAYS: f64 = 252.0;

/// Arithmetic mean, `NaN` on empty input.
pub fn mean(xs: &[f64]) -> f64 {
  Statistics::mean(xs)
}

/// Sample standard deviation (`n - 1`), `NaN` with fewer than two points.
pub fn std_dev(xs: &[f64]) -> f64 {
  Statistics::std_dev(xs)
}

/// Percentile `p` in `[0, 100]` with linear interpolation between closest ranks.
pub fn percentile(xs: &[f64], p: f64) -> f64 {
  let mut sorted: Vec<f64> = xs.iter().copied().filter(|x| !x.is_nan()).collect();
  if sorted.is_empty() {
    return f64::NAN;
  }
  sorted.sort_by(|a, b| a.total_cmp(b));
  percentile_sorted(&sorted, p)
}

/// Same as [`percentile`] for an already ascending slice.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
  if sorted.is_empty() {
    return f64::NAN;
  }

  let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
  let lo = rank.floor() as usize;
  let hi = rank.ceil() as usize;
  let frac = rank - lo as f64;
  sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

fn central_moments(xs: &[f64]) -> (f64, f64, f64) {
  let n = xs.len() as f64;
  let mean = xs.iter().sum::<f64>() / n;

  let mut m2 = 0.0;
  let mut m3 = 0.0;
  let mut m4 = 0.0;
  for &x in xs {
    let d = x - mean;
    let d2 = d * d;
    m2 += d2;
    m3 += d2 * d;
    m4 += d2 * d2;
  }

  (m2 / n, m3 / n, m4 / n)
}

/// Biased sample skewness. `0.0` for a constant sample.
pub fn skewness(xs: &[f64]) -> f64 {
  if xs.len() < 2 {
    return f64::NAN;
  }

  let (m2, m3, _) = central_moments(xs);
  if m2 <= f64::EPSILON * f64::EPSILON || !m2.is_finite() {
    return 0.0;
  }
  m3 / m2.powf(1.5)
}

/// Biased excess kurtosis. `0.0` for a constant sample.
pub fn excess_kurtosis(xs: &[f64]) -> f64 {
  if xs.len() < 2 {
    return f64::NAN;
  }

  let (m2, _, m4) = central_moments(xs);
  if m2 <= f64::EPSILON * f64::EPSILON || !m2.is_finite() {
    return 0.0;
  }
  m4 / (m2 * m2) - 3.0
}

/// Maximum drawdown `min_t (v_t - max_{s<=t} v_s) / max_{s<=t} v_s`.
///
/// Lies in `[-1, 0]` for non-negative values; `0.0` on empty input.
pub fn max_drawdown(values: &[f64]) -> f64 {
  let mut running_max = f64::NEG_INFINITY;
  let mut worst = 0.0_f64;

  for &v in values.iter().filter(|v| v.is_finite()) {
    running_max = running_max.max(v);
    if running_max > 0.0 {
      let dd = ((v - running_max) / running_max).clamp(-1.0, 0.0);
      worst = worst.min(dd);
    }
  }

  worst
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;

  use super::*;

  #[test]
  fn percentile_matches_linear_interpolation() {
    let xs = [1.0, 2.0, 3.0, 4.0, 5.0];
    assert_abs_diff_eq!(percentile(&xs, 50.0), 3.0);
    assert_abs_diff_eq!(percentile(&xs, 25.0), 2.0);
    assert_abs_diff_eq!(percentile(&xs, 10.0), 1.4, epsilon = 1e-12);
    assert_abs_diff_eq!(percentile(&[5.0, 1.0, 3.0], 100.0), 5.0);
    assert!(percentile(&[], 50.0).is_nan());
  }

  #[test]
  fn moments_of_symmetric_sample() {
    let xs = [-2.0, -1.0, 0.0, 1.0, 2.0];
    assert_abs_diff_eq!(skewness(&xs), 0.0, epsilon = 1e-12);
    // m2 = 2, m4 = 6.8
    assert_abs_diff_eq!(excess_kurtosis(&xs), 6.8 / 4.0 - 3.0, epsilon = 1e-12);
    assert_abs_diff_eq!(std_dev(&xs), 2.5_f64.sqrt(), epsilon = 1e-12);
  }

  #[test]
  fn degenerate_inputs_do_not_panic() {
    assert!(mean(&[]).is_nan());
    assert!(std_dev(&[1.0]).is_nan());
    assert_eq!(skewness(&[3.0, 3.0, 3.0]), 0.0);
    assert_eq!(max_drawdown(&[]), 0.0);
  }

  #[test]
  fn max_drawdown_tracks_running_peak() {
    let values = [100.0, 120.0, 90.0, 130.0, 65.0];
    assert_abs_diff_eq!(max_drawdown(&values), -0.5, epsilon = 1e-12);
    assert_eq!(max_drawdown(&[1.0, 2.0, 3.0]), 0.0);
    assert_abs_diff_eq!(max_drawdown(&[10.0, 0.0]), -1.0);
  }
}
