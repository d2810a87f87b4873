//! # Simulation Result
//!
//! $$
//! V \in \mathbb R^{(T+1)\times S},\qquad V_{0,s} = V_0
//! $$
//!
//! Value matrix of a simulation run with per-step and per-path views.

use ndarray::Array2;
use ndarray::ArrayView1;
use ndarray::Axis;
use serde::Serialize;

use super::config::StepGranularity;

/// Simulated portfolio values indexed `[step][simulation]`.
///
/// Row 0 holds the initial value; rows `1..=T` the simulated steps.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SimulationResult {
  values: Array2<f64>,
  initial_value: f64,
  granularity: StepGranularity,
}

impl SimulationResult {
  /// Build from one value path per simulation, each of equal length.
  pub(crate) fn from_paths(paths: &[Vec<f64>], initial_value: f64, granularity: StepGranularity) -> Self {
    let rows = paths.first().map_or(0, |p| p.len());
    let values = Array2::from_shape_fn((rows, paths.len()), |(t, s)| paths[s][t]);
    Self {
      values,
      initial_value,
      granularity,
    }
  }

  pub fn values(&self) -> &Array2<f64> {
    &self.values
  }

  pub fn initial_value(&self) -> f64 {
    self.initial_value
  }

  pub fn granularity(&self) -> StepGranularity {
    self.granularity
  }

  pub fn steps_per_year(&self) -> usize {
    self.granularity.steps_per_year()
  }

  /// Number of simulated steps `T` (excluding the initial row).
  pub fn n_steps(&self) -> usize {
    self.values.nrows().saturating_sub(1)
  }

  pub fn n_simulations(&self) -> usize {
    self.values.ncols()
  }

  /// Values of every path at `step`.
  pub fn step(&self, step: usize) -> ArrayView1<'_, f64> {
    self.values.index_axis(Axis(0), step)
  }

  /// Full value path of one simulation.
  pub fn path(&self, simulation: usize) -> ArrayView1<'_, f64> {
    self.values.index_axis(Axis(1), simulation)
  }

  pub fn final_values(&self) -> Vec<f64> {
    self.step(self.n_steps()).to_vec()
  }
}
