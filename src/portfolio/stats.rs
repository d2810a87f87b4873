//! # Portfolio Statistics
//!
//! $$
//! DR = \frac{\sum_i w_i \sigma_i}{\sigma_P},\qquad
//! \mathrm{CVaR}_{95} = \mathbb E\big[r \mid r \le \mathrm{VaR}_{95}\big]
//! $$
//!
//! Statistics dictionary of a portfolio's historical value path.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

/// Aggregate statistics of a portfolio's historical value path.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PortfolioStats {
  /// Symbols in asset order.
  pub symbols: Vec<String>,
  /// Normalized weights in asset order.
  pub weights: Vec<f64>,
  /// First date of the aligned calendar.
  pub first_date: Option<NaiveDate>,
  /// Last date of the aligned calendar.
  pub last_date: Option<NaiveDate>,
  /// Number of points in the value series.
  pub observations: usize,
  /// Mean of the value series.
  pub mean_value: f64,
  /// Sample standard deviation of the value series.
  pub std_value: f64,
  /// Lowest portfolio value.
  pub min_value: f64,
  /// Highest portfolio value.
  pub max_value: f64,
  /// `last / first - 1` of the value series.
  pub total_return: f64,
  /// Mean daily simple return.
  pub mean_daily_return: f64,
  /// Sample standard deviation of daily simple returns.
  pub std_daily_return: f64,
  /// Mean daily return times 252.
  pub annualized_return: f64,
  /// Daily return deviation times `sqrt(252)`.
  pub annualized_volatility: f64,
  /// Annualized excess return over volatility.
  pub sharpe_ratio: f64,
  /// Worst peak-to-trough decline, in `[-1, 0]`.
  pub max_drawdown: f64,
  /// 5th percentile of daily returns.
  pub var_95: f64,
  /// Mean of the daily returns at or below `var_95`.
  pub cvar_95: f64,
  /// Skewness of daily returns.
  pub skewness: f64,
  /// Excess kurtosis.
  pub kurtosis: f64,
  /// `NaN` when the portfolio volatility is zero.
  pub diversification_ratio: f64,
  /// Mean of the off-diagonal correlations.
  pub mean_pairwise_correlation: f64,
  /// Annualized volatility of each asset, in asset order.
  pub individual_volatilities: Vec<f64>,
  /// Pairwise return correlations, in asset order.
  pub correlation_matrix: Vec<Vec<f64>>,
}

impl PortfolioStats {
  /// Scalar metrics keyed by name.
  pub fn to_map(&self) -> BTreeMap<&'static str, f64> {
    BTreeMap::from([
      ("observations", self.observations as f64),
      ("mean_value", self.mean_value),
      ("std_value", self.std_value),
      ("min_value", self.min_value),
      ("max_value", self.max_value),
      ("total_return", self.total_return),
      ("mean_daily_return", self.mean_daily_return),
      ("std_daily_return", self.std_daily_return),
      ("annualized_return", self.annualized_return),
      ("annualized_volatility", self.annualized_volatility),
      ("sharpe_ratio", self.sharpe_ratio),
      ("max_drawdown", self.max_drawdown),
      ("var_95", self.var_95),
      ("cvar_95", self.cvar_95),
      ("skewness", self.skewness),
      ("kurtosis", self.kurtosis),
      ("diversification_ratio", self.diversification_ratio),
      ("mean_pairwise_correlation", self.mean_pairwise_correlation),
    ])
  }

  /// Largest single weight.
  pub fn max_weight(&self) -> f64 {
    self.weights.iter().copied().fold(0.0, f64::max)
  }
}
