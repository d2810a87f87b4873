//! # Data Quality
//!
//! $$
//! x \notin [Q_1 - 1.5\,\mathrm{IQR},\ Q_3 + 1.5\,\mathrm{IQR}] \Rightarrow \text{outlier}
//! $$
//!
//! Inspection of raw adapter output for gaps, outliers and inconsistent bars.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Serialize;

use super::record::StandardizedPriceRecord;
use crate::stats::descriptive::percentile;

/// Findings for one series. Empty maps / `false` flags mean nothing was found.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DataQualityReport {
  /// Non-finite values per field.
  pub missing_values: BTreeMap<&'static str, usize>,
  /// IQR outliers per price field.
  pub outliers: BTreeMap<&'static str, usize>,
  pub duplicate_dates: bool,
  pub non_positive_prices: bool,
  pub logical_errors: Vec<String>,
}

impl DataQualityReport {
  pub fn inspect(records: &[StandardizedPriceRecord]) -> Self {
    let mut report = Self::default();

    let fields: [(&'static str, fn(&StandardizedPriceRecord) -> f64); 5] = [
      ("open", |r| r.open),
      ("high", |r| r.high),
      ("low", |r| r.low),
      ("close", |r| r.close),
      ("volume", |r| r.volume),
    ];

    for (name, get) in fields {
      let values: Vec<f64> = records.iter().map(get).collect();

      let missing = values.iter().filter(|v| !v.is_finite()).count();
      if missing > 0 {
        report.missing_values.insert(name, missing);
      }

      if name == "volume" {
        continue;
      }

      let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
      if finite.iter().any(|v| *v <= 0.0) {
        report.non_positive_prices = true;
      }

      let q1 = percentile(&finite, 25.0);
      let q3 = percentile(&finite, 75.0);
      let iqr = q3 - q1;
      let outliers = finite
        .iter()
        .filter(|&&v| v < q1 - 1.5 * iqr || v > q3 + 1.5 * iqr)
        .count();
      if outliers > 0 {
        report.outliers.insert(name, outliers);
      }
    }

    let mut seen = BTreeSet::new();
    report.duplicate_dates = records.iter().any(|r| !seen.insert(r.date));

    if records.iter().any(|r| r.high < r.low) {
      report.logical_errors.push("high < low".to_string());
    }
    if records.iter().any(|r| r.high < r.close) {
      report.logical_errors.push("high < close".to_string());
    }

    report
  }

  pub fn is_clean(&self) -> bool {
    self.missing_values.is_empty()
      && self.outliers.is_empty()
      && !self.duplicate_dates
      && !self.non_positive_prices
      && self.logical_errors.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  fn bar(day: u32, close: f64) -> StandardizedPriceRecord {
    let date = NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
    StandardizedPriceRecord::new(date, close, close + 1.0, close - 1.0, close, 100.0)
  }

  #[test]
  fn clean_series_has_no_findings() {
    let records: Vec<_> = (1..=10).map(|d| bar(d, 100.0 + d as f64)).collect();
    assert!(DataQualityReport::inspect(&records).is_clean());
  }

  #[test]
  fn flags_outlier_duplicate_and_inverted_bar() {
    let mut records: Vec<_> = (1..=10).map(|d| bar(d, 100.0)).collect();
    records[3].close = 500.0;
    records[3].high = 501.0;
    records.push(bar(10, 100.0));
    records[5].high = 50.0;

    let report = DataQualityReport::inspect(&records);
    assert_eq!(report.outliers.get("close"), Some(&1));
    assert!(report.duplicate_dates);
    assert!(report.logical_errors.contains(&"high < low".to_string()));
    assert!(report.logical_errors.contains(&"high < close".to_string()));
    assert!(!report.is_clean());
  }

  #[test]
  fn flags_missing_and_non_positive_values() {
    let mut records: Vec<_> = (1..=5).map(|d| bar(d, 10.0)).collect();
    records[1].volume = f64::NAN;
    records[2].low = 0.0;

    let report = DataQualityReport::inspect(&records);
    assert_eq!(report.missing_values.get("volume"), Some(&1));
    assert!(report.non_positive_prices);
  }
}
