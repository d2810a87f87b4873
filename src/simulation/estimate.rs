//! # Parameter Estimation
//!
//! $$
//! \hat\mu = 252\,\bar r,\qquad \hat\sigma = \sqrt{252}\,s\big(r \mid q_{0.01} \le r \le q_{0.99}\big)
//! $$
//!
//! Annualized drift/volatility per asset with tail trimming, fallback
//! constants and per-symbol overrides, plus the correlation model.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;
use tracing::warn;

use super::config::SimulationConfig;
use super::factor::CorrelationModel;
use super::snapshot::PortfolioSnapshot;
use crate::error::Result;
use crate::error::RiskError;
use crate::portfolio::data::align_return_series;
use crate::portfolio::data::correlation_matrix;
use crate::stats::descriptive;
use crate::stats::descriptive::TRADING_DAYS;

/// Observations required before history is trusted.
pub const MIN_HISTORY: usize = 30;
/// Annualized drift used without enough history.
pub const DEFAULT_DRIFT: f64 = 0.08;
/// Annualized volatility used without enough history.
pub const DEFAULT_VOLATILITY: f64 = 0.15;

const TRIM_LOWER_PCT: f64 = 1.0;
const TRIM_UPPER_PCT: f64 = 99.0;
const NEGLIGIBLE_VOLATILITY: f64 = 1e-8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ParameterSource {
  History,
  Fallback,
  Override,
}

/// Annualized parameters of one asset.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AssetEstimate {
  pub symbol: String,
  pub drift: f64,
  pub volatility: f64,
  pub observations: usize,
  pub drift_source: ParameterSource,
  pub volatility_source: ParameterSource,
}

/// Returns between the 1st and 99th percentiles (inclusive).
pub fn trim_tails(returns: &[f64]) -> Vec<f64> {
  let mut sorted: Vec<f64> = returns.iter().copied().filter(|r| r.is_finite()).collect();
  sorted.sort_by(|a, b| a.total_cmp(b));
  let lo = descriptive::percentile_sorted(&sorted, TRIM_LOWER_PCT);
  let hi = descriptive::percentile_sorted(&sorted, TRIM_UPPER_PCT);
  returns
    .iter()
    .copied()
    .filter(|r| *r >= lo && *r <= hi)
    .collect()
}

fn usable_volatility(returns: &[f64]) -> Option<f64> {
  let vol = descriptive::std_dev(returns) * TRADING_DAYS.sqrt();
  (vol.is_finite() && vol > NEGLIGIBLE_VOLATILITY).then_some(vol)
}

/// Estimate drift and volatility from daily returns.
///
/// Fewer than [`MIN_HISTORY`] finite observations yields the default
/// constants. Drift uses the full history; volatility uses the trimmed
/// history, then the untrimmed one, then [`DEFAULT_VOLATILITY`].
pub fn estimate_asset(symbol: &str, returns: &[f64]) -> AssetEstimate {
  let history: Vec<f64> = returns.iter().copied().filter(|r| r.is_finite()).collect();
  let observations = history.len();

  if observations < MIN_HISTORY {
    warn!(
      symbol,
      observations,
      required = MIN_HISTORY,
      drift = DEFAULT_DRIFT,
      volatility = DEFAULT_VOLATILITY,
      "insufficient return history, using fallback parameters"
    );
    return AssetEstimate {
      symbol: symbol.to_string(),
      drift: DEFAULT_DRIFT,
      volatility: DEFAULT_VOLATILITY,
      observations,
      drift_source: ParameterSource::Fallback,
      volatility_source: ParameterSource::Fallback,
    };
  }

  let trimmed = trim_tails(&history);
  let trimmed = if trimmed.len() < MIN_HISTORY { history.clone() } else { trimmed };

  let drift = descriptive::mean(&history) * TRADING_DAYS;
  let (volatility, volatility_source) = match usable_volatility(&trimmed).or_else(|| usable_volatility(&history)) {
    Some(vol) => (vol, ParameterSource::History),
    None => {
      warn!(symbol, "degenerate return volatility, using fallback volatility");
      (DEFAULT_VOLATILITY, ParameterSource::Fallback)
    }
  };

  AssetEstimate {
    symbol: symbol.to_string(),
    drift,
    volatility,
    observations,
    drift_source: ParameterSource::History,
    volatility_source,
  }
}

fn check_override_keys(kind: &str, map: &Option<BTreeMap<String, f64>>, symbols: &[&str]) -> Result<()> {
  if let Some(map) = map {
    if let Some(unknown) = map.keys().find(|k| !symbols.contains(&k.as_str())) {
      return Err(RiskError::configuration(format!(
        "{kind} override names {unknown}, which is not in the portfolio"
      )));
    }
  }
  Ok(())
}

/// Per-asset estimates with configured overrides applied.
pub fn estimate_assets(snapshot: &PortfolioSnapshot, config: &SimulationConfig) -> Result<Vec<AssetEstimate>> {
  let symbols = snapshot.symbols();
  check_override_keys("drift", &config.drift_override, &symbols)?;
  check_override_keys("volatility", &config.volatility_override, &symbols)?;

  let estimates = snapshot
    .assets
    .iter()
    .map(|asset| {
      let mut est = estimate_asset(&asset.symbol, &asset.returns);
      if let Some(&mu) = config.drift_override.as_ref().and_then(|m| m.get(&asset.symbol)) {
        est.drift = mu;
        est.drift_source = ParameterSource::Override;
      }
      if let Some(&sigma) = config.volatility_override.as_ref().and_then(|m| m.get(&asset.symbol)) {
        est.volatility = sigma;
        est.volatility_source = ParameterSource::Override;
      }
      debug!(
        symbol = %est.symbol,
        drift = est.drift,
        volatility = est.volatility,
        observations = est.observations,
        "asset parameters"
      );
      est
    })
    .collect();

  Ok(estimates)
}

/// Correlation of the histories paired by date (by most recent return when
/// undated), or the configured override.
pub fn estimate_correlation(snapshot: &PortfolioSnapshot, config: &SimulationConfig) -> Result<CorrelationModel> {
  let n = snapshot.len();
  let matrix = match &config.correlation_override {
    Some(m) => {
      if m.len() != n || m.iter().any(|row| row.len() != n) {
        return Err(RiskError::configuration(format!(
          "correlation override must be {n}x{n}"
        )));
      }
      m.clone()
    }
    None => {
      let aligned = snapshot
        .date_aligned_returns()
        .unwrap_or_else(|| align_return_series(&snapshot.returns()));
      correlation_matrix(&aligned)
    }
  };
  Ok(CorrelationModel::validated(matrix))
}
