//! # Portfolio Snapshot
//!
//! $$
//! \mathcal S = \{(s_i, w_i, (d^{(i)}_t, r^{(i)}_t)_t)\}_{i=1}^{N},\qquad \sum_i w_i = 1
//! $$
//!
//! Engine input detached from the price history it came from.

use chrono::NaiveDate;
use impl_new_derive::ImplNew;
use serde::Serialize;

use crate::series::align::forward_fill_indices;
use crate::series::align::intersect_dates;

/// One asset as seen by the engine: target weight plus daily return history.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AssetSnapshot {
  pub symbol: String,
  pub weight: f64,
  /// Date of each return. Empty when the history is undated.
  pub dates: Vec<NaiveDate>,
  /// Daily simple returns.
  pub returns: Vec<f64>,
}

impl AssetSnapshot {
  /// Undated history; assets are paired by their most recent returns.
  pub fn new(symbol: String, weight: f64, returns: Vec<f64>) -> Self {
    Self {
      symbol,
      weight,
      dates: Vec::new(),
      returns,
    }
  }

  /// History stamped with the date of each return; assets are paired by date.
  pub fn dated(symbol: String, weight: f64, dates: Vec<NaiveDate>, returns: Vec<f64>) -> Self {
    Self {
      symbol,
      weight,
      dates,
      returns,
    }
  }

  pub fn is_dated(&self) -> bool {
    !self.dates.is_empty() && self.dates.len() == self.returns.len()
  }
}

#[derive(ImplNew, Clone, Debug, Default, PartialEq, Serialize)]
pub struct PortfolioSnapshot {
  pub assets: Vec<AssetSnapshot>,
}

impl PortfolioSnapshot {
  pub fn symbols(&self) -> Vec<&str> {
    self.assets.iter().map(|a| a.symbol.as_str()).collect()
  }

  pub fn weights(&self) -> Vec<f64> {
    self.assets.iter().map(|a| a.weight).collect()
  }

  pub fn returns(&self) -> Vec<Vec<f64>> {
    self.assets.iter().map(|a| a.returns.clone()).collect()
  }

  /// Returns on the dates shared by every asset, or `None` unless all
  /// assets are dated.
  pub fn date_aligned_returns(&self) -> Option<Vec<Vec<f64>>> {
    if self.assets.is_empty() || !self.assets.iter().all(AssetSnapshot::is_dated) {
      return None;
    }
    let calendars: Vec<&[NaiveDate]> = self.assets.iter().map(|a| a.dates.as_slice()).collect();
    let common = intersect_dates(&calendars);
    Some(
      self
        .assets
        .iter()
        .map(|a| {
          forward_fill_indices(&a.dates, &common, 0)
            .into_iter()
            .flatten()
            .map(|i| a.returns[i])
            .collect()
        })
        .collect(),
    )
  }

  pub fn len(&self) -> usize {
    self.assets.len()
  }

  pub fn is_empty(&self) -> bool {
    self.assets.is_empty()
  }
}
