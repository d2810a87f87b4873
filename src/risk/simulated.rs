//! # Simulated Risk
//!
//! $$
//! P(\text{gain}) = \frac{1}{S}\sum_s \mathbb 1[V^{(s)}_T > V_0],\qquad
//! P_y(\theta) = \frac{1}{S}\sum_s \mathbb 1\Big[\frac{V^{(s)}_{y n}}{V_0} - 1 < \theta\Big]
//! $$
//!
//! Distribution summaries of a [`SimulationResult`].

use std::collections::BTreeMap;

use serde::Serialize;

use crate::simulation::SimulationResult;
use crate::stats::descriptive;

/// Percentiles reported for final values.
pub const SUMMARY_PERCENTILES: [u8; 7] = [5, 10, 25, 50, 75, 90, 95];
/// Cumulative-return thresholds of the loss-probability curve.
pub const LOSS_THRESHOLDS: [f64; 4] = [0.0, -0.10, -0.20, -0.30];

fn fraction(values: &[f64], pred: impl Fn(f64) -> bool) -> f64 {
  if values.is_empty() {
    return f64::NAN;
  }
  values.iter().filter(|v| pred(**v)).count() as f64 / values.len() as f64
}

/// Statistics of the final simulated values.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SimulationSummary {
  pub initial_value: f64,
  pub percentiles: BTreeMap<u8, f64>,
  /// `P(final > initial)`.
  pub probability_of_gain: f64,
  pub target_value: Option<f64>,
  /// `P(final >= target)` when a target was given.
  pub probability_of_target: Option<f64>,
  pub mean_final: f64,
  pub median_final: f64,
  pub std_final: f64,
  pub min_final: f64,
  pub max_final: f64,
  /// Mean final value over the initial value, minus one.
  pub expected_return: f64,
  /// `initial - p5`, in currency units.
  pub var_95: f64,
  /// `initial - mean(finals <= p5)`, in currency units.
  pub cvar_95: f64,
}

impl SimulationSummary {
  pub fn from_result(result: &SimulationResult, target_value: Option<f64>) -> Self {
    let finals = result.final_values();
    let initial = result.initial_value();

    let percentiles: BTreeMap<u8, f64> = SUMMARY_PERCENTILES
      .iter()
      .map(|&p| (p, descriptive::percentile(&finals, p as f64)))
      .collect();
    let p5 = percentiles[&5];
    let tail: Vec<f64> = finals.iter().copied().filter(|v| *v <= p5).collect();
    let mean_final = descriptive::mean(&finals);

    Self {
      initial_value: initial,
      probability_of_gain: fraction(&finals, |v| v > initial),
      target_value,
      probability_of_target: target_value.map(|t| fraction(&finals, |v| v >= t)),
      mean_final,
      median_final: percentiles[&50],
      std_final: descriptive::std_dev(&finals),
      min_final: finals.iter().copied().fold(f64::NAN, f64::min),
      max_final: finals.iter().copied().fold(f64::NAN, f64::max),
      expected_return: mean_final / initial - 1.0,
      var_95: initial - p5,
      cvar_95: initial - descriptive::mean(&tail),
      percentiles,
    }
  }
}

/// One-year returns of every path, per complete simulated year.
///
/// Entry `[y][s]` is `V[(y+1)n] / V[yn] - 1` for path `s`; paths whose value
/// at the start of the year is zero are skipped.
pub fn annual_return_distribution(result: &SimulationResult) -> Vec<Vec<f64>> {
  let n = result.steps_per_year();
  let years = result.n_steps() / n;
  let values = result.values();

  (0..years)
    .map(|y| {
      let (start, end) = (values.row(y * n), values.row((y + 1) * n));
      start
        .iter()
        .zip(end.iter())
        .filter(|(s, _)| **s > 0.0)
        .map(|(s, e)| e / s - 1.0)
        .collect()
    })
    .collect()
}

/// Loss probabilities at the end of one simulated year.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LossProbability {
  pub year: usize,
  /// `(threshold, P(cumulative return < threshold))` for each of [`LOSS_THRESHOLDS`].
  pub probabilities: Vec<(f64, f64)>,
}

/// Probability that the cumulative return at the end of each complete year
/// falls below each loss threshold.
pub fn loss_probability_curve(result: &SimulationResult) -> Vec<LossProbability> {
  let n = result.steps_per_year();
  let years = result.n_steps() / n;
  let initial = result.initial_value();

  (1..=years)
    .map(|year| {
      let cumulative: Vec<f64> = result.step(year * n).iter().map(|v| v / initial - 1.0).collect();
      LossProbability {
        year,
        probabilities: LOSS_THRESHOLDS
          .iter()
          .map(|&th| (th, fraction(&cumulative, |r| r < th)))
          .collect(),
      }
    })
    .collect()
}
