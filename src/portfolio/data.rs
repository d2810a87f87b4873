//! # Portfolio Data Utilities
//!
//! $$
//! \Sigma_{ij} = \sigma_i \sigma_j \rho_{ij},\qquad \sigma_p = \sqrt{\mathbf w^\top \Sigma \mathbf w}
//! $$
//!
//! Helpers for return alignment and correlation/covariance construction.

fn sample_mean(xs: &[f64]) -> f64 {
  if xs.is_empty() {
    0.0
  } else {
    xs.iter().sum::<f64>() / xs.len() as f64
  }
}

/// Pearson correlation over the common prefix of `x` and `y`.
pub(crate) fn pearson(x: &[f64], y: &[f64]) -> f64 {
  let n = x.len().min(y.len());
  if n < 2 {
    return 0.0;
  }

  let (x, y) = (&x[..n], &y[..n]);
  let mx = sample_mean(x);
  let my = sample_mean(y);

  let mut cov = 0.0;
  let mut sx = 0.0;
  let mut sy = 0.0;

  for i in 0..n {
    let dx = x[i] - mx;
    let dy = y[i] - my;
    cov += dx * dy;
    sx += dx * dx;
    sy += dy * dy;
  }

  let denom = (sx * sy).sqrt();
  if denom < 1e-15 {
    0.0
  } else {
    (cov / denom).clamp(-1.0, 1.0)
  }
}

/// Align multiple return series to common tail length.
pub fn align_return_series(all_returns: &[Vec<f64>]) -> Vec<Vec<f64>> {
  let min_len = all_returns.iter().map(|r| r.len()).min().unwrap_or(0);
  all_returns
    .iter()
    .map(|r| r[r.len().saturating_sub(min_len)..].to_vec())
    .collect()
}

/// Build a Pearson correlation matrix from aligned return series.
pub fn correlation_matrix(aligned_returns: &[Vec<f64>]) -> Vec<Vec<f64>> {
  let n = aligned_returns.len();
  let mut corr = identity_matrix(n);

  for i in 0..n {
    for j in (i + 1)..n {
      let r = pearson(&aligned_returns[i], &aligned_returns[j]);
      corr[i][j] = r;
      corr[j][i] = r;
    }
  }

  corr
}

/// Build covariance matrix from per-asset volatilities and a correlation matrix.
pub fn covariance_matrix(sigmas: &[f64], corr: &[Vec<f64>]) -> Vec<Vec<f64>> {
  let n = sigmas.len();
  let mut cov = vec![vec![0.0; n]; n];

  for i in 0..n {
    for j in 0..n {
      cov[i][j] = sigmas[i] * sigmas[j] * corr_entry(corr, i, j);
    }
  }

  cov
}

/// `sqrt(|w' Sigma w|)` with `Sigma` built from `sigmas` and `corr`.
pub fn portfolio_volatility(weights: &[f64], sigmas: &[f64], corr: &[Vec<f64>]) -> f64 {
  let n = weights.len().min(sigmas.len());
  let mut var = 0.0;
  for i in 0..n {
    for j in 0..n {
      var += weights[i] * weights[j] * sigmas[i] * sigmas[j] * corr_entry(corr, i, j);
    }
  }
  var.abs().sqrt()
}

/// Mean of the strictly upper-triangular entries; `0.0` for fewer than two assets.
pub fn mean_pairwise_correlation(corr: &[Vec<f64>]) -> f64 {
  let n = corr.len();
  let mut acc = 0.0;
  let mut count = 0usize;
  for i in 0..n {
    for j in (i + 1)..n {
      acc += corr_entry(corr, i, j);
      count += 1;
    }
  }
  if count == 0 {
    0.0
  } else {
    acc / count as f64
  }
}

pub fn identity_matrix(n: usize) -> Vec<Vec<f64>> {
  let mut m = vec![vec![0.0; n]; n];
  for (i, row) in m.iter_mut().enumerate() {
    row[i] = 1.0;
  }
  m
}

fn corr_entry(corr: &[Vec<f64>], i: usize, j: usize) -> f64 {
  corr
    .get(i)
    .and_then(|row| row.get(j))
    .copied()
    .unwrap_or(if i == j { 1.0 } else { 0.0 })
}
