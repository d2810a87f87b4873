//! # Covariance Factor
//!
//! $$
//! \Sigma_{step} = D R D = L L^\top,\qquad D = \operatorname{diag}(\sigma_{step})
//! $$
//!
//! Correlation validation and the lower Cholesky factor used to correlate the
//! per-step shocks.

use nalgebra::DMatrix;
use serde::Serialize;
use tracing::warn;

use crate::error::Result;
use crate::error::RiskError;
use crate::portfolio::data::covariance_matrix;
use crate::portfolio::data::identity_matrix;

/// Symmetric correlation matrix checked for positive definiteness.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CorrelationModel {
  matrix: Vec<Vec<f64>>,
  substituted: bool,
}

impl CorrelationModel {
  /// Accept `matrix` when it is a valid correlation matrix with a Cholesky
  /// factor, otherwise fall back to the identity (independent assets).
  pub fn validated(matrix: Vec<Vec<f64>>) -> Self {
    let n = matrix.len();
    match check_correlation(&matrix).and_then(|_| cholesky_lower(&matrix)) {
      Ok(_) => Self {
        matrix,
        substituted: false,
      },
      Err(err) => {
        warn!(assets = n, %err, "correlation matrix rejected, treating assets as independent");
        Self {
          matrix: identity_matrix(n),
          substituted: true,
        }
      }
    }
  }

  pub fn matrix(&self) -> &[Vec<f64>] {
    &self.matrix
  }

  /// Whether the identity replaced the estimated matrix.
  pub fn substituted(&self) -> bool {
    self.substituted
  }

  pub fn len(&self) -> usize {
    self.matrix.len()
  }

  pub fn is_empty(&self) -> bool {
    self.matrix.is_empty()
  }
}

fn check_correlation(matrix: &[Vec<f64>]) -> Result<()> {
  let n = matrix.len();
  if let Some((i, row)) = matrix.iter().enumerate().find(|(_, row)| row.len() != n) {
    return Err(RiskError::degeneracy(format!("row {i} has {} entries, expected {n}", row.len())));
  }
  for (i, row) in matrix.iter().enumerate() {
    if (row[i] - 1.0).abs() > 1e-9 {
      return Err(RiskError::degeneracy(format!("diagonal entry {i} is {}", row[i])));
    }
    for (j, &rho) in row.iter().enumerate() {
      if !rho.is_finite() || rho.abs() > 1.0 + 1e-12 {
        return Err(RiskError::degeneracy(format!("entry ({i}, {j}) = {rho}")));
      }
      if (rho - matrix[j][i]).abs() > 1e-9 {
        return Err(RiskError::degeneracy(format!("entry ({i}, {j}) is not symmetric")));
      }
    }
  }
  Ok(())
}

/// Lower Cholesky factor of a square matrix with a strictly positive diagonal.
pub fn cholesky_lower(matrix: &[Vec<f64>]) -> Result<DMatrix<f64>> {
  let n = matrix.len();
  let dense = DMatrix::from_fn(n, n, |i, j| matrix[i].get(j).copied().unwrap_or(f64::NAN));
  let not_pd = || RiskError::degeneracy(format!("{n}x{n} matrix is not positive definite"));

  let l = dense.cholesky().map(|c| c.l()).ok_or_else(not_pd)?;
  let usable = l.iter().all(|x| x.is_finite()) && (0..n).all(|i| l[(i, i)] > 0.0);
  if usable {
    Ok(l)
  } else {
    Err(not_pd())
  }
}

/// Rows of the lower factor of `D R D`; falls back to `D` when the product
/// cannot be factored (e.g. a zero volatility).
pub fn step_covariance_factor(sigma_step: &[f64], corr: &[Vec<f64>]) -> Vec<Vec<f64>> {
  let n = sigma_step.len();
  let cov = covariance_matrix(sigma_step, corr);

  match cholesky_lower(&cov) {
    Ok(l) => (0..n).map(|i| (0..=i).map(|j| l[(i, j)]).collect()).collect(),
    Err(_) => (0..n)
      .map(|i| {
        let mut row = vec![0.0; i + 1];
        row[i] = sigma_step[i];
        row
      })
      .collect(),
  }
}
