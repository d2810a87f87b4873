//! # Simulation Config
//!
//! $$
//! T = \operatorname{round}(h \cdot n_{year}),\qquad \mu_{step} = \frac{\mu - \pi}{n_{year}},\qquad
//! \sigma_{step} = \frac{\sigma}{\sqrt{n_{year}}}
//! $$
//!
//! Engine options, horizon/granularity conversion and rebalance schedule.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::error::Result;
use crate::error::RiskError;

/// Simulation horizon.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Horizon {
  Years(f64),
  /// Trading days; converted to steps of the configured granularity.
  Days(usize),
}

/// Length of one simulation step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepGranularity {
  #[default]
  Daily,
  Monthly,
}

impl StepGranularity {
  pub fn steps_per_year(&self) -> usize {
    match self {
      StepGranularity::Daily => 252,
      StepGranularity::Monthly => 12,
    }
  }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebalanceFrequency {
  PerStep,
  #[default]
  Monthly,
  Quarterly,
  Yearly,
}

impl RebalanceFrequency {
  /// Number of steps between rebalances, at least one.
  pub fn interval(&self, steps_per_year: usize) -> usize {
    let per_year = match self {
      RebalanceFrequency::PerStep => return 1,
      RebalanceFrequency::Monthly => 12.0,
      RebalanceFrequency::Quarterly => 4.0,
      RebalanceFrequency::Yearly => 1.0,
    };
    ((steps_per_year as f64 / per_year).round() as usize).max(1)
  }
}

/// Options recognized by the correlated engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
  /// Length of the projection.
  pub horizon: Horizon,
  /// Daily or monthly steps.
  pub granularity: StepGranularity,
  /// Number of simulated paths.
  pub simulations: usize,
  /// Portfolio value at step 0.
  pub initial_value: f64,
  /// Base seed; `None` draws one at random.
  pub seed: Option<u64>,
  /// Reset holdings to the target weights on the rebalance schedule.
  pub rebalance: bool,
  pub rebalance_frequency: RebalanceFrequency,
  /// Annual inflation subtracted from every asset's drift.
  pub inflation_rate: Option<f64>,
  /// Annualized drift per symbol.
  pub drift_override: Option<BTreeMap<String, f64>>,
  /// Annualized volatility per symbol.
  pub volatility_override: Option<BTreeMap<String, f64>>,
  /// Correlation matrix in portfolio asset order.
  pub correlation_override: Option<Vec<Vec<f64>>>,
}

impl Default for SimulationConfig {
  fn default() -> Self {
    Self {
      horizon: Horizon::Years(1.0),
      granularity: StepGranularity::Daily,
      simulations: 10_000,
      initial_value: 10_000.0,
      seed: None,
      rebalance: false,
      rebalance_frequency: RebalanceFrequency::Monthly,
      inflation_rate: None,
      drift_override: None,
      volatility_override: None,
      correlation_override: None,
    }
  }
}

impl SimulationConfig {
  /// Parse a JSON document; missing fields take their defaults.
  pub fn from_json(json: &str) -> Result<Self> {
    let config: Self = serde_json::from_str(json)?;
    config.validate()?;
    Ok(config)
  }

  pub fn steps_per_year(&self) -> usize {
    self.granularity.steps_per_year()
  }

  /// Number of simulated steps.
  pub fn steps(&self) -> usize {
    let spy = self.steps_per_year() as f64;
    match self.horizon {
      Horizon::Years(years) => (years * spy).round() as usize,
      Horizon::Days(days) => (days as f64 * spy / 252.0).round() as usize,
    }
  }

  /// Steps between rebalances, `None` when rebalancing is disabled.
  pub fn rebalance_interval(&self) -> Option<usize> {
    self
      .rebalance
      .then(|| self.rebalance_frequency.interval(self.steps_per_year()))
  }

  /// Per-step inflation drag.
  pub fn inflation_per_step(&self) -> f64 {
    self.inflation_rate.unwrap_or(0.0) / self.steps_per_year() as f64
  }

  pub fn validate(&self) -> Result<()> {
    if self.simulations == 0 {
      return Err(RiskError::configuration("simulation count must be positive"));
    }
    if let Horizon::Years(years) = self.horizon {
      if !years.is_finite() || years <= 0.0 {
        return Err(RiskError::configuration(format!(
          "horizon must be positive, got {years} years"
        )));
      }
    }
    if self.steps() == 0 {
      return Err(RiskError::configuration("horizon is shorter than one step"));
    }
    if !self.initial_value.is_finite() || self.initial_value <= 0.0 {
      return Err(RiskError::configuration(format!(
        "initial value must be positive, got {}",
        self.initial_value
      )));
    }
    if let Some(rate) = self.inflation_rate {
      if !rate.is_finite() {
        return Err(RiskError::configuration("inflation rate must be finite"));
      }
    }
    if let Some(drifts) = &self.drift_override {
      if let Some((symbol, _)) = drifts.iter().find(|(_, v)| !v.is_finite()) {
        return Err(RiskError::configuration(format!(
          "drift override for {symbol} is not finite"
        )));
      }
    }
    if let Some(vols) = &self.volatility_override {
      if let Some((symbol, v)) = vols.iter().find(|(_, v)| !v.is_finite() || **v < 0.0) {
        return Err(RiskError::configuration(format!(
          "volatility override for {symbol} must be non-negative, got {v}"
        )));
      }
    }
    Ok(())
  }
}
