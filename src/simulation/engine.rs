//! # Correlated Monte Carlo Engine
//!
//! $$
//! A^{(i)}_{t+1} = \max\!\Big(0,\ A^{(i)}_t\big(1 + \mu^{(i)}_{step} + (L z_t)_i\big)\Big),\qquad
//! z_t \sim \mathcal N(0, I),\qquad V_t = \sum_i A^{(i)}_t
//! $$
//!
//! Multi-asset portfolio paths with correlated Gaussian shocks and optional
//! periodic rebalancing. Paths run in parallel; path `k` draws from its own
//! stream seeded with `seed + k`, so results do not depend on scheduling.

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use rand_distr::StandardNormal;
use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use super::config::SimulationConfig;
use super::config::StepGranularity;
use super::estimate::estimate_assets;
use super::estimate::estimate_correlation;
use super::estimate::AssetEstimate;
use super::factor::step_covariance_factor;
use super::factor::CorrelationModel;
use super::result::SimulationResult;
use super::snapshot::PortfolioSnapshot;
use crate::error::Result;
use crate::error::RiskError;

const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Seed of the random stream for one path.
pub fn path_seed(base_seed: u64, path: usize) -> u64 {
  base_seed.wrapping_add(path as u64)
}

#[derive(Clone, Debug)]
pub struct CorrelatedMonteCarloEngine {
  config: SimulationConfig,
}

impl CorrelatedMonteCarloEngine {
  pub fn new(config: SimulationConfig) -> Result<Self> {
    config.validate()?;
    Ok(Self { config })
  }

  pub fn config(&self) -> &SimulationConfig {
    &self.config
  }

  /// Estimate parameters and factor the covariance for `snapshot`.
  pub fn prepare(&self, snapshot: &PortfolioSnapshot) -> Result<SimulationPlan> {
    check_weights(&snapshot.weights())?;

    let estimates = estimate_assets(snapshot, &self.config)?;
    let correlation = estimate_correlation(snapshot, &self.config)?;

    let spy = self.config.steps_per_year() as f64;
    let inflation = self.config.inflation_per_step();
    let drift_step: Vec<f64> = estimates.iter().map(|e| e.drift / spy - inflation).collect();
    let sigma_step: Vec<f64> = estimates.iter().map(|e| e.volatility / spy.sqrt()).collect();
    let factor = step_covariance_factor(&sigma_step, correlation.matrix());

    let base_seed = self.config.seed.unwrap_or_else(rand::random);

    Ok(SimulationPlan {
      weights: snapshot.weights(),
      estimates,
      correlation,
      drift_step,
      factor,
      steps: self.config.steps(),
      simulations: self.config.simulations,
      initial_value: self.config.initial_value,
      granularity: self.config.granularity,
      rebalance_every: self.config.rebalance_interval(),
      base_seed,
    })
  }

  /// Simulate every path for `snapshot`.
  pub fn run(&self, snapshot: &PortfolioSnapshot) -> Result<SimulationResult> {
    Ok(self.prepare(snapshot)?.run())
  }
}

fn check_weights(weights: &[f64]) -> Result<()> {
  if weights.is_empty() {
    return Err(RiskError::configuration("portfolio snapshot has no assets"));
  }
  if let Some(w) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
    return Err(RiskError::configuration(format!(
      "invalid weight {w}: weights must be finite and non-negative"
    )));
  }
  let total: f64 = weights.iter().sum();
  if (total - 1.0).abs() > WEIGHT_TOLERANCE {
    return Err(RiskError::configuration(format!("weights sum to {total}, expected 1")));
  }
  Ok(())
}

/// Immutable per-run context shared by every path.
#[derive(Clone, Debug, Serialize)]
pub struct SimulationPlan {
  weights: Vec<f64>,
  estimates: Vec<AssetEstimate>,
  correlation: CorrelationModel,
  drift_step: Vec<f64>,
  /// Rows of the lower Cholesky factor of the per-step covariance.
  factor: Vec<Vec<f64>>,
  steps: usize,
  simulations: usize,
  initial_value: f64,
  granularity: StepGranularity,
  rebalance_every: Option<usize>,
  base_seed: u64,
}

impl SimulationPlan {
  pub fn estimates(&self) -> &[AssetEstimate] {
    &self.estimates
  }

  pub fn correlation(&self) -> &CorrelationModel {
    &self.correlation
  }

  pub fn base_seed(&self) -> u64 {
    self.base_seed
  }

  pub fn steps(&self) -> usize {
    self.steps
  }

  pub fn run(&self) -> SimulationResult {
    let paths: Vec<Vec<f64>> = (0..self.simulations)
      .into_par_iter()
      .map(|p| self.run_path(p, |_, _, _, _| {}))
      .collect();

    let result = SimulationResult::from_paths(&paths, self.initial_value, self.granularity);
    info!(
      simulations = self.simulations,
      steps = self.steps,
      assets = self.weights.len(),
      seed = self.base_seed,
      "correlated simulation finished"
    );
    result
  }

  fn rebalance_due(&self, step: usize) -> bool {
    self.rebalance_every.is_some_and(|k| step % k == 0)
  }

  /// Simulate one path; `on_step(step, assets, value, rebalanced)` sees the
  /// allocation after each step.
  pub(crate) fn run_path<F>(&self, path: usize, mut on_step: F) -> Vec<f64>
  where
    F: FnMut(usize, &[f64], f64, bool),
  {
    let n = self.weights.len();
    let mut rng = StdRng::seed_from_u64(path_seed(self.base_seed, path));
    let mut assets: Vec<f64> = self.weights.iter().map(|w| self.initial_value * w).collect();
    let mut z = vec![0.0; n];

    let mut values = Vec::with_capacity(self.steps + 1);
    values.push(self.initial_value);

    for step in 1..=self.steps {
      for zi in z.iter_mut() {
        *zi = rng.sample(StandardNormal);
      }

      for i in 0..n {
        let shock: f64 = self.factor[i].iter().zip(&z).map(|(l, z)| l * z).sum();
        let mut r = self.drift_step[i] + shock;
        if !r.is_finite() {
          r = 0.0;
        }
        let next = assets[i] * (1.0 + r);
        assets[i] = if next.is_finite() { next.max(0.0) } else { 0.0 };
      }

      let value: f64 = assets.iter().sum();
      let rebalanced = self.rebalance_due(step);
      if rebalanced {
        for (a, w) in assets.iter_mut().zip(&self.weights) {
          *a = value * w;
        }
      }

      on_step(step, &assets, value, rebalanced);
      values.push(value);
    }

    values
  }
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeMap;

  use approx::assert_relative_eq;
  use tracing_test::traced_test;

  use super::*;
  use crate::portfolio::data::identity_matrix;
  use crate::portfolio::data::pearson;
  use crate::simulation::config::Horizon;
  use crate::simulation::config::RebalanceFrequency;
  use crate::simulation::snapshot::AssetSnapshot;
  use crate::stats::descriptive;

  fn history(n: usize, phase: usize) -> Vec<f64> {
    (0..n)
      .map(|i| ((i * 7 + phase * 3) % 11) as f64 / 500.0 - 0.01)
      .collect()
  }

  fn two_assets(w0: f64) -> PortfolioSnapshot {
    PortfolioSnapshot::new(vec![
      AssetSnapshot::new("A".into(), w0, history(120, 0)),
      AssetSnapshot::new("B".into(), 1.0 - w0, history(120, 1)),
    ])
  }

  fn overrides(drift: f64, vol: f64) -> (Option<BTreeMap<String, f64>>, Option<BTreeMap<String, f64>>) {
    let map = |v: f64| Some(BTreeMap::from([("A".to_string(), v), ("B".to_string(), v)]));
    (map(drift), map(vol))
  }

  #[test]
  fn identical_seed_gives_identical_result() {
    let config = SimulationConfig {
      simulations: 200,
      horizon: Horizon::Days(60),
      seed: Some(11),
      rebalance: true,
      ..Default::default()
    };
    let engine = CorrelatedMonteCarloEngine::new(config).unwrap();
    let a = engine.run(&two_assets(0.4)).unwrap();
    let b = engine.run(&two_assets(0.4)).unwrap();
    assert_eq!(a.values(), b.values());
    assert_eq!(a.n_steps(), 60);
    assert_eq!(a.n_simulations(), 200);
    assert!(a.step(0).iter().all(|v| *v == 10_000.0));
  }

  #[test]
  fn zero_drift_and_volatility_keep_initial_value() {
    let (drift, vol) = overrides(0.0, 0.0);
    let config = SimulationConfig {
      simulations: 50,
      initial_value: 100_000.0,
      seed: Some(3),
      drift_override: drift,
      volatility_override: vol,
      ..Default::default()
    };
    let result = CorrelatedMonteCarloEngine::new(config)
      .unwrap()
      .run(&two_assets(0.25))
      .unwrap();
    assert!(result.values().iter().all(|v| *v == 100_000.0));
  }

  #[test]
  fn inflation_reduces_drift_per_step() {
    let (drift, vol) = overrides(0.0, 0.0);
    let config = SimulationConfig {
      simulations: 4,
      initial_value: 1_000.0,
      seed: Some(3),
      inflation_rate: Some(0.0252),
      drift_override: drift,
      volatility_override: vol,
      ..Default::default()
    };
    let result = CorrelatedMonteCarloEngine::new(config)
      .unwrap()
      .run(&two_assets(0.5))
      .unwrap();
    let expected = 1_000.0 * (1.0 - 0.0001_f64).powi(252);
    for v in result.final_values() {
      assert_relative_eq!(v, expected, max_relative = 1e-9);
    }
  }

  #[test]
  fn rebalancing_restores_target_weights() {
    let config = SimulationConfig {
      simulations: 1,
      seed: Some(5),
      rebalance: true,
      rebalance_frequency: RebalanceFrequency::Monthly,
      ..Default::default()
    };
    let plan = CorrelatedMonteCarloEngine::new(config)
      .unwrap()
      .prepare(&two_assets(0.3))
      .unwrap();

    let mut checked = 0;
    plan.run_path(0, |step, assets, value, rebalanced| {
      assert_eq!(rebalanced, step % 21 == 0);
      if rebalanced {
        assert!((assets[0] / value - 0.3).abs() < 1e-6);
        assert!((assets[1] / value - 0.7).abs() < 1e-6);
        checked += 1;
      }
    });
    assert_eq!(checked, 12);
  }

  #[test]
  fn independent_assets_grow_with_drift() {
    let (drift, vol) = overrides(0.10, 0.20);
    let config = SimulationConfig {
      simulations: 10_000,
      initial_value: 100_000.0,
      seed: Some(42),
      drift_override: drift,
      volatility_override: vol,
      correlation_override: Some(identity_matrix(2)),
      ..Default::default()
    };
    let result = CorrelatedMonteCarloEngine::new(config)
      .unwrap()
      .run(&two_assets(0.5))
      .unwrap();
    assert_eq!(result.n_steps(), 252);

    let mean = descriptive::mean(&result.final_values());
    assert!((mean / 110_000.0 - 1.0).abs() < 0.02, "mean final value {mean}");
  }

  #[test]
  fn asset_returns_follow_configured_correlation() {
    let config = SimulationConfig {
      simulations: 20,
      seed: Some(9),
      drift_override: Some(BTreeMap::from([("A".to_string(), 0.0), ("B".to_string(), 0.0)])),
      volatility_override: Some(BTreeMap::from([("A".to_string(), 0.2), ("B".to_string(), 0.3)])),
      correlation_override: Some(vec![vec![1.0, 0.8], vec![0.8, 1.0]]),
      ..Default::default()
    };
    let plan = CorrelatedMonteCarloEngine::new(config)
      .unwrap()
      .prepare(&two_assets(0.5))
      .unwrap();
    assert!(!plan.correlation().substituted());

    let (mut ra, mut rb) = (Vec::new(), Vec::new());
    for path in 0..20 {
      let mut prev = vec![5_000.0, 5_000.0];
      plan.run_path(path, |_, assets, _, rebalanced| {
        assert!(!rebalanced);
        ra.push(assets[0] / prev[0] - 1.0);
        rb.push(assets[1] / prev[1] - 1.0);
        prev = assets.to_vec();
      });
    }
    assert_eq!(ra.len(), 20 * 252);

    let corr = pearson(&ra, &rb);
    assert!((corr - 0.8).abs() < 0.03, "empirical correlation {corr}");
    let ratio = descriptive::std_dev(&rb) / descriptive::std_dev(&ra);
    assert!((ratio - 1.5).abs() < 0.06, "volatility ratio {ratio}");
  }

  #[test]
  fn single_asset_path_is_reproducible_from_draws() {
    let (mu, sigma) = (0.08, 0.2);
    let config = SimulationConfig {
      simulations: 3,
      horizon: Horizon::Days(20),
      initial_value: 500.0,
      seed: Some(7),
      drift_override: Some(BTreeMap::from([("A".to_string(), mu)])),
      volatility_override: Some(BTreeMap::from([("A".to_string(), sigma)])),
      ..Default::default()
    };
    let snapshot = PortfolioSnapshot::new(vec![AssetSnapshot::new("A".into(), 1.0, history(60, 0))]);
    let result = CorrelatedMonteCarloEngine::new(config)
      .unwrap()
      .run(&snapshot)
      .unwrap();

    let mut rng = StdRng::seed_from_u64(path_seed(7, 1));
    let mut v = 500.0;
    let path = result.path(1);
    for t in 1..=20 {
      let z: f64 = rng.sample(StandardNormal);
      v *= 1.0 + mu / 252.0 + sigma / 252.0_f64.sqrt() * z;
      assert_relative_eq!(path[t], v, max_relative = 1e-10);
    }
  }

  #[test]
  #[traced_test]
  fn short_history_runs_with_fallback_volatility() {
    let snapshot = PortfolioSnapshot::new(vec![AssetSnapshot::new("NEW".into(), 1.0, history(12, 0))]);
    let config = SimulationConfig {
      simulations: 20,
      seed: Some(1),
      ..Default::default()
    };
    let plan = CorrelatedMonteCarloEngine::new(config)
      .unwrap()
      .prepare(&snapshot)
      .unwrap();
    assert_eq!(plan.estimates()[0].volatility, 0.15);
    assert_eq!(plan.run().n_simulations(), 20);
    assert!(logs_contain("insufficient return history"));
  }

  #[test]
  fn rejects_unnormalized_weights() {
    let engine = CorrelatedMonteCarloEngine::new(SimulationConfig::default()).unwrap();
    let mut snapshot = two_assets(0.5);
    snapshot.assets[1].weight = 0.8;
    assert!(matches!(engine.prepare(&snapshot), Err(RiskError::Configuration { .. })));
    assert!(engine.prepare(&PortfolioSnapshot::default()).is_err());
  }
}
