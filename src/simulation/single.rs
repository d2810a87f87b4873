//! # Single-Asset GBM
//!
//! $$
//! S_{t+1} = S_t \exp\!\Big(\operatorname{clip}\big((\mu - \tfrac{\sigma^2}{2})\Delta t + \sigma\sqrt{\Delta t}\,z_t,\ \pm\ell\big)\Big)
//! $$
//!
//! Log-normal paths for one asset, with per-step log-returns clipped to a
//! symmetric limit `ell`.

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use rand_distr::StandardNormal;
use rayon::prelude::*;
use serde::Deserialize;
use serde::Serialize;
use tracing::info;

use super::config::SimulationConfig;
use super::engine::path_seed;
use super::estimate::estimate_asset;
use super::result::SimulationResult;
use crate::error::Result;
use crate::error::RiskError;
use crate::series::PriceSeries;
use crate::series::ReturnMethod;

pub const DEFAULT_LOG_RETURN_LIMIT: f64 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SingleAssetOptions {
  /// Largest absolute per-step log-return.
  pub log_return_limit: f64,
}

impl Default for SingleAssetOptions {
  fn default() -> Self {
    Self {
      log_return_limit: DEFAULT_LOG_RETURN_LIMIT,
    }
  }
}

/// Simulate log-GBM paths of `series` starting from `config.initial_value`.
///
/// Drift and volatility come from the series' daily returns (with the usual
/// fallbacks) unless overridden for its symbol in `config`.
pub fn simulate_single_asset(
  series: &PriceSeries,
  config: &SimulationConfig,
  options: &SingleAssetOptions,
) -> Result<SimulationResult> {
  config.validate()?;
  let limit = options.log_return_limit;
  if !limit.is_finite() || limit <= 0.0 {
    return Err(RiskError::configuration(format!(
      "log-return limit must be positive, got {limit}"
    )));
  }

  let symbol = series.symbol();
  let est = estimate_asset(symbol, series.returns(ReturnMethod::Simple).values());
  let mu = config
    .drift_override
    .as_ref()
    .and_then(|m| m.get(symbol))
    .copied()
    .unwrap_or(est.drift);
  let sigma = config
    .volatility_override
    .as_ref()
    .and_then(|m| m.get(symbol))
    .copied()
    .unwrap_or(est.volatility);

  let dt = 1.0 / config.steps_per_year() as f64;
  let drift = (mu - config.inflation_rate.unwrap_or(0.0) - 0.5 * sigma * sigma) * dt;
  let diffusion = sigma * dt.sqrt();
  let steps = config.steps();
  let base_seed = config.seed.unwrap_or_else(rand::random);

  let paths: Vec<Vec<f64>> = (0..config.simulations)
    .into_par_iter()
    .map(|p| {
      let mut rng = StdRng::seed_from_u64(path_seed(base_seed, p));
      let mut path = Vec::with_capacity(steps + 1);
      let mut s = config.initial_value;
      path.push(s);
      for _ in 0..steps {
        let z: f64 = rng.sample(StandardNormal);
        let lr = (drift + diffusion * z).clamp(-limit, limit);
        s *= lr.exp();
        path.push(s);
      }
      path
    })
    .collect();

  info!(symbol, mu, sigma, simulations = config.simulations, steps, "single-asset simulation finished");
  Ok(SimulationResult::from_paths(&paths, config.initial_value, config.granularity))
}
