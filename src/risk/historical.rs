//! # Historical Risk
//!
//! $$
//! \mathrm{VaR}_{95} = Q_{0.05}(r),\qquad \mathrm{CVaR}_{95} = \mathbb E[r \mid r \le \mathrm{VaR}_{95}],\qquad
//! DR = \frac{\sum_i w_i \sigma_i}{\sigma_p}
//! $$
//!
//! Risk measures computed from realized daily returns and value paths.

use serde::Serialize;

use crate::portfolio::data::portfolio_volatility;
use crate::stats::descriptive;
use crate::stats::descriptive::TRADING_DAYS;

/// Confidence level used for the default tail measures.
pub const DEFAULT_CONFIDENCE: f64 = 0.95;

pub fn annualized_return(daily_returns: &[f64]) -> f64 {
  descriptive::mean(daily_returns) * TRADING_DAYS
}

pub fn annualized_volatility(daily_returns: &[f64]) -> f64 {
  descriptive::std_dev(daily_returns) * TRADING_DAYS.sqrt()
}

/// `(annualized_return - risk_free_rate) / annualized_volatility`, `0.0` when
/// volatility is zero or undefined.
pub fn sharpe_ratio(annualized_return: f64, annualized_volatility: f64, risk_free_rate: f64) -> f64 {
  if !annualized_volatility.is_finite() || annualized_volatility <= 0.0 {
    return 0.0;
  }
  (annualized_return - risk_free_rate) / annualized_volatility
}

/// Lower `(1 - confidence)` quantile of the return distribution.
pub fn value_at_risk(returns: &[f64], confidence: f64) -> f64 {
  descriptive::percentile(returns, (1.0 - confidence) * 100.0)
}

/// Mean of the returns at or below [`value_at_risk`].
pub fn conditional_value_at_risk(returns: &[f64], confidence: f64) -> f64 {
  let var = value_at_risk(returns, confidence);
  if var.is_nan() {
    return f64::NAN;
  }
  let tail: Vec<f64> = returns.iter().copied().filter(|r| *r <= var).collect();
  descriptive::mean(&tail)
}

/// Weighted sum of individual volatilities over portfolio volatility.
pub fn diversification_ratio(weights: &[f64], individual_vols: &[f64], portfolio_vol: f64) -> f64 {
  if !portfolio_vol.is_finite() || portfolio_vol <= 0.0 {
    return f64::NAN;
  }
  let weighted: f64 = weights
    .iter()
    .zip(individual_vols)
    .map(|(w, s)| w * s)
    .sum();
  weighted / portfolio_vol
}

/// Diversification ratio implied by volatilities and a correlation matrix.
pub fn model_diversification_ratio(weights: &[f64], sigmas: &[f64], corr: &[Vec<f64>]) -> f64 {
  diversification_ratio(weights, sigmas, portfolio_volatility(weights, sigmas, corr))
}

/// Risk profile of a realized value path.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct HistoricalRisk {
  pub annualized_return: f64,
  pub annualized_volatility: f64,
  pub sharpe_ratio: f64,
  pub max_drawdown: f64,
  pub var_95: f64,
  pub cvar_95: f64,
  pub skewness: f64,
  pub kurtosis: f64,
}

impl HistoricalRisk {
  /// `values` is the value path, `returns` its daily returns.
  pub fn from_path(values: &[f64], returns: &[f64], risk_free_rate: f64) -> Self {
    let annualized_return = annualized_return(returns);
    let annualized_volatility = annualized_volatility(returns);

    Self {
      annualized_return,
      annualized_volatility,
      sharpe_ratio: sharpe_ratio(annualized_return, annualized_volatility, risk_free_rate),
      max_drawdown: descriptive::max_drawdown(values),
      var_95: value_at_risk(returns, DEFAULT_CONFIDENCE),
      cvar_95: conditional_value_at_risk(returns, DEFAULT_CONFIDENCE),
      skewness: descriptive::skewness(returns),
      kurtosis: descriptive::excess_kurtosis(returns),
    }
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use proptest::prelude::*;

  use super::*;
  use crate::portfolio::data::identity_matrix;

  #[test]
  fn var_and_cvar_on_known_sample() {
    let returns: Vec<f64> = (1..=100).map(|i| i as f64 / 1000.0 - 0.05).collect();
    let var = value_at_risk(&returns, 0.95);
    // rank 0.05 * 99 = 4.95 between -0.045 and -0.044
    assert_abs_diff_eq!(var, -0.04405, epsilon = 1e-12);
    let cvar = conditional_value_at_risk(&returns, 0.95);
    assert_abs_diff_eq!(cvar, (-0.049 - 0.048 - 0.047 - 0.046 - 0.045) / 5.0, epsilon = 1e-12);
    assert!(cvar <= var);
  }

  #[test]
  fn sharpe_uses_annualized_inputs() {
    assert_abs_diff_eq!(sharpe_ratio(0.12, 0.2, 0.02), 0.5, epsilon = 1e-12);
    assert_eq!(sharpe_ratio(0.12, 0.0, 0.02), 0.0);
  }

  #[test]
  fn diversification_of_independent_equal_assets() {
    let dr = model_diversification_ratio(&[0.5, 0.5], &[0.2, 0.2], &identity_matrix(2));
    assert_abs_diff_eq!(dr, 2.0_f64.sqrt(), epsilon = 1e-12);

    let perfectly = model_diversification_ratio(&[0.5, 0.5], &[0.2, 0.2], &[vec![1.0, 1.0], vec![1.0, 1.0]]);
    assert_abs_diff_eq!(perfectly, 1.0, epsilon = 1e-12);
  }

  #[test]
  fn from_path_bounds_drawdown() {
    let values = [100.0, 105.0, 95.0, 110.0, 90.0];
    let returns: Vec<f64> = values.windows(2).map(|w| w[1] / w[0] - 1.0).collect();
    let risk = HistoricalRisk::from_path(&values, &returns, 0.0);
    assert!(risk.max_drawdown >= -1.0 && risk.max_drawdown <= 0.0);
    assert_abs_diff_eq!(risk.max_drawdown, 90.0 / 110.0 - 1.0, epsilon = 1e-12);
    assert!(risk.cvar_95 <= risk.var_95);
  }

  fn correlation_strategy() -> impl Strategy<Value = (Vec<f64>, Vec<f64>, Vec<Vec<f64>>)> {
    (2usize..6).prop_flat_map(|n| {
      (
        prop::collection::vec(0.01f64..1.0, n),
        prop::collection::vec(0.05f64..0.6, n),
        prop::collection::vec(-0.99f64..0.99, n * (n - 1) / 2),
      )
        .prop_map(move |(w, s, upper)| {
          let mut corr = identity_matrix(n);
          let mut k = 0;
          for i in 0..n {
            for j in (i + 1)..n {
              corr[i][j] = upper[k];
              corr[j][i] = upper[k];
              k += 1;
            }
          }
          let total: f64 = w.iter().sum();
          (w.iter().map(|x| x / total).collect(), s, corr)
        })
    })
  }

  proptest! {
    #[test]
    fn diversification_ratio_is_at_least_one((weights, sigmas, corr) in correlation_strategy()) {
      let dr = model_diversification_ratio(&weights, &sigmas, &corr);
      prop_assume!(dr.is_finite());
      prop_assert!(dr >= 1.0 - 1e-9);
    }

    #[test]
    fn max_drawdown_is_bounded(values in prop::collection::vec(0.0f64..1e6, 0..200)) {
      let dd = descriptive::max_drawdown(&values);
      prop_assert!((-1.0..=0.0).contains(&dd));
    }
  }
}
