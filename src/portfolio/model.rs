//! # Portfolio
//!
//! $$
//! V_t = \sum_i w_i C^{(i)}_t,\qquad \sum_i w_i = 1,\ w_i \ge 0
//! $$
//!
//! Weighted collection of date-aligned price series.

use chrono::NaiveDate;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::warn;

use super::data::mean_pairwise_correlation;
use super::stats::PortfolioStats;
use crate::error::Result;
use crate::error::RiskError;
use crate::risk::historical;
use crate::risk::historical::HistoricalRisk;
use crate::series::align::bounded_union;
use crate::series::align::forward_fill_indices;
use crate::series::align::intersect_dates;
use crate::series::align::DEFAULT_MAX_GAP_DAYS;
use crate::series::price_series::DEFAULT_RISK_FREE_RATE;
use crate::series::AlignmentPolicy;
use crate::series::DataQualityReport;
use crate::series::PriceSeries;
use crate::series::ReturnMethod;
use crate::series::ReturnSeries;
use crate::simulation::AssetSnapshot;
use crate::simulation::PortfolioSnapshot;
use crate::stats::descriptive;

/// Deviation of the raw weight sum from one that is logged before renormalizing.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-2;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioConfig {
  pub name: String,
  /// Annual risk-free rate for Sharpe ratios.
  pub risk_free_rate: f64,
  pub alignment: AlignmentPolicy,
}

impl Default for PortfolioConfig {
  fn default() -> Self {
    Self {
      name: "Portfolio".to_string(),
      risk_free_rate: DEFAULT_RISK_FREE_RATE,
      alignment: AlignmentPolicy::Intersection,
    }
  }
}

/// One holding: the aligned series plus findings on the history it came from.
#[derive(Clone, Debug)]
pub struct Asset {
  symbol: String,
  series: PriceSeries,
  weight: f64,
  quality: DataQualityReport,
}

impl Asset {
  pub fn symbol(&self) -> &str {
    &self.symbol
  }

  /// Series restricted to the portfolio calendar.
  pub fn series(&self) -> &PriceSeries {
    &self.series
  }

  pub fn weight(&self) -> f64 {
    self.weight
  }

  /// Data-quality findings recorded when the asset's history was ingested.
  pub fn quality(&self) -> &DataQualityReport {
    &self.quality
  }
}

#[derive(Clone, Debug)]
pub struct Portfolio {
  config: PortfolioConfig,
  assets: Vec<Asset>,
  dates: Vec<NaiveDate>,
  values: Vec<f64>,
  returns: ReturnSeries,
}

impl Portfolio {
  /// Portfolio with the default configuration. `None` weights mean equal weights.
  pub fn new(symbols: Vec<String>, series: Vec<PriceSeries>, weights: Option<Vec<f64>>) -> Result<Self> {
    Self::with_config(symbols, series, weights, PortfolioConfig::default())
  }

  /// Reconcile list lengths, normalize weights and align calendars.
  pub fn with_config(
    symbols: Vec<String>,
    series: Vec<PriceSeries>,
    weights: Option<Vec<f64>>,
    config: PortfolioConfig,
  ) -> Result<Self> {
    let (symbols, series, weights) = reconcile(symbols, series, weights)?;
    let weights = normalize_weights(&weights)?;
    let quality: Vec<DataQualityReport> = series.iter().map(|s| s.quality_report().clone()).collect();
    let (dates, aligned) = align(&series, config.alignment)?;

    let values: Vec<f64> = (0..dates.len())
      .map(|t| {
        aligned
          .iter()
          .zip(&weights)
          .map(|(s, w)| w * s.records()[t].close())
          .sum()
      })
      .collect();
    let returns = ReturnSeries::from_values(&dates, &values, ReturnMethod::Simple);

    let assets = symbols
      .into_iter()
      .zip(aligned)
      .zip(weights)
      .zip(quality)
      .map(|(((symbol, series), weight), quality)| Asset {
        symbol,
        series,
        weight,
        quality,
      })
      .collect();

    debug!(name = %config.name, observations = dates.len(), "portfolio aligned");
    Ok(Self {
      config,
      assets,
      dates,
      values,
      returns,
    })
  }

  pub fn config(&self) -> &PortfolioConfig {
    &self.config
  }

  pub fn name(&self) -> &str {
    &self.config.name
  }

  pub fn assets(&self) -> &[Asset] {
    &self.assets
  }

  pub fn len(&self) -> usize {
    self.assets.len()
  }

  pub fn is_empty(&self) -> bool {
    self.assets.is_empty()
  }

  pub fn symbols(&self) -> Vec<&str> {
    self.assets.iter().map(|a| a.symbol.as_str()).collect()
  }

  pub fn weights(&self) -> Vec<f64> {
    self.assets.iter().map(|a| a.weight).collect()
  }

  /// Common calendar of the aligned assets.
  pub fn dates(&self) -> &[NaiveDate] {
    &self.dates
  }

  /// `sum_i w_i * close_i` per date.
  pub fn value_series(&self) -> &[f64] {
    &self.values
  }

  pub fn returns(&self) -> &ReturnSeries {
    &self.returns
  }

  /// Pairwise return correlations in asset order.
  pub fn correlation_matrix(&self) -> Vec<Vec<f64>> {
    let gap = match self.config.alignment {
      AlignmentPolicy::ForwardFill { max_gap_days } => max_gap_days,
      AlignmentPolicy::Intersection => DEFAULT_MAX_GAP_DAYS,
    };
    let n = self.assets.len();
    let mut corr = vec![vec![0.0; n]; n];
    for i in 0..n {
      corr[i][i] = 1.0;
      for j in (i + 1)..n {
        let r = self.assets[i].series.correlation_with_gap(&self.assets[j].series, gap);
        corr[i][j] = r;
        corr[j][i] = r;
      }
    }
    corr
  }

  /// Aggregate statistics; needs at least two portfolio returns.
  pub fn stats(&self) -> Result<PortfolioStats> {
    let returns = self.returns.values();
    if returns.len() < 2 {
      return Err(RiskError::insufficient_data("portfolio returns", 2, returns.len()));
    }

    let weights = self.weights();
    let risk = HistoricalRisk::from_path(&self.values, returns, self.config.risk_free_rate);
    let individual_vols: Vec<f64> = self
      .assets
      .iter()
      .map(|a| historical::annualized_volatility(a.series.returns(ReturnMethod::Simple).values()))
      .collect();
    let correlation = self.correlation_matrix();

    let total_return = match (self.values.first(), self.values.last()) {
      (Some(&first), Some(&last)) if first > 0.0 => last / first - 1.0,
      _ => f64::NAN,
    };

    Ok(PortfolioStats {
      symbols: self.symbols().iter().map(|s| s.to_string()).collect(),
      weights: weights.clone(),
      first_date: self.dates.first().copied(),
      last_date: self.dates.last().copied(),
      observations: self.values.len(),
      mean_value: descriptive::mean(&self.values),
      std_value: descriptive::std_dev(&self.values),
      min_value: self.values.iter().copied().fold(f64::NAN, f64::min),
      max_value: self.values.iter().copied().fold(f64::NAN, f64::max),
      total_return,
      mean_daily_return: descriptive::mean(returns),
      std_daily_return: descriptive::std_dev(returns),
      annualized_return: risk.annualized_return,
      annualized_volatility: risk.annualized_volatility,
      sharpe_ratio: risk.sharpe_ratio,
      max_drawdown: risk.max_drawdown,
      var_95: risk.var_95,
      cvar_95: risk.cvar_95,
      skewness: risk.skewness,
      kurtosis: risk.kurtosis,
      diversification_ratio: historical::diversification_ratio(
        &weights,
        &individual_vols,
        risk.annualized_volatility,
      ),
      mean_pairwise_correlation: mean_pairwise_correlation(&correlation),
      individual_volatilities: individual_vols,
      correlation_matrix: correlation,
    })
  }

  /// Engine input: weights plus dated daily simple returns.
  pub fn snapshot(&self) -> PortfolioSnapshot {
    PortfolioSnapshot::new(
      self
        .assets
        .iter()
        .map(|a| {
          let returns = a.series.returns(ReturnMethod::Simple);
          AssetSnapshot::dated(
            a.symbol.clone(),
            a.weight,
            returns.dates().to_vec(),
            returns.values().to_vec(),
          )
        })
        .collect(),
    )
  }
}

/// Repair mismatched list lengths, warning on every repair.
fn reconcile(
  mut symbols: Vec<String>,
  mut series: Vec<PriceSeries>,
  weights: Option<Vec<f64>>,
) -> Result<(Vec<String>, Vec<PriceSeries>, Vec<f64>)> {
  let n = symbols.len().min(series.len());
  if symbols.len() != series.len() {
    warn!(
      symbols = symbols.len(),
      series = series.len(),
      kept = n,
      "symbol and series counts differ, truncating to the shorter list"
    );
    symbols.truncate(n);
    series.truncate(n);
  }
  if n == 0 {
    return Err(RiskError::configuration("portfolio has no assets"));
  }

  let equal = 1.0 / n as f64;
  let weights = match weights {
    None => vec![equal; n],
    Some(mut w) => {
      if w.len() > n {
        warn!(weights = w.len(), assets = n, "more weights than assets, truncating");
        w.truncate(n);
      } else if w.len() < n {
        warn!(weights = w.len(), assets = n, "fewer weights than assets, padding with equal weight");
        w.resize(n, equal);
      }
      w
    }
  };

  Ok((symbols, series, weights))
}

/// Scale long-only weights to sum to one.
pub fn normalize_weights(weights: &[f64]) -> Result<Vec<f64>> {
  if let Some(w) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
    return Err(RiskError::configuration(format!(
      "portfolios are long-only: weights must be finite and non-negative, got {w}"
    )));
  }
  let total: f64 = weights.iter().sum();
  if total <= 0.0 {
    return Err(RiskError::configuration("all weights are zero"));
  }
  if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
    warn!(total, "weights do not sum to 1, renormalizing");
  }
  Ok(weights.iter().map(|w| w / total).collect())
}

/// Common calendar and every series reindexed onto it.
fn align(series: &[PriceSeries], policy: AlignmentPolicy) -> Result<(Vec<NaiveDate>, Vec<PriceSeries>)> {
  let calendars: Vec<Vec<NaiveDate>> = series.iter().map(|s| s.dates()).collect();
  let refs: Vec<&[NaiveDate]> = calendars.iter().map(|c| c.as_slice()).collect();
  let no_overlap = || RiskError::DataAlignment { assets: series.len() };

  match policy {
    AlignmentPolicy::Intersection => {
      let dates = intersect_dates(&refs);
      if dates.is_empty() {
        return Err(no_overlap());
      }
      let aligned = series.iter().map(|s| s.restrict_to(&dates)).collect();
      Ok((dates, aligned))
    }
    AlignmentPolicy::ForwardFill { max_gap_days } => {
      let candidates = bounded_union(&refs);
      let fills: Vec<Vec<Option<usize>>> = refs
        .iter()
        .map(|cal| forward_fill_indices(cal, &candidates, max_gap_days))
        .collect();
      let dates: Vec<NaiveDate> = candidates
        .iter()
        .enumerate()
        .filter(|(k, _)| fills.iter().all(|f| f[*k].is_some()))
        .map(|(_, d)| *d)
        .collect();
      if dates.is_empty() {
        return Err(no_overlap());
      }
      let aligned = series
        .iter()
        .map(|s| s.reindex_forward_filled(&dates, max_gap_days))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(no_overlap)?;
      Ok((dates, aligned))
    }
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use chrono::Days;
  use proptest::prelude::*;
  use tracing_test::traced_test;

  use super::*;
  use crate::ingest::SourceKind;
  use crate::portfolio::data::pearson;
  use crate::series::align::paired_on_intersection;
  use crate::series::price_series::tests::business_days;
  use crate::series::price_series::tests::series_from_returns;
  use crate::series::StandardizedPriceRecord;
  use crate::simulation::CorrelatedMonteCarloEngine;
  use crate::simulation::SimulationConfig;

  fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
  }

  fn wave(n: usize, k: usize) -> Vec<f64> {
    (0..n).map(|i| ((i * k) % 13) as f64 / 400.0 - 0.015).collect()
  }

  fn three() -> (Vec<String>, Vec<PriceSeries>) {
    let symbols = vec!["A".to_string(), "B".to_string(), "C".to_string()];
    let series = vec![
      series_from_returns("A", start(), &wave(80, 3)),
      series_from_returns("B", start(), &wave(80, 5)),
      series_from_returns("C", start(), &wave(80, 7)),
    ];
    (symbols, series)
  }

  #[test]
  fn default_weights_are_equal() {
    let (symbols, series) = three();
    let p = Portfolio::new(symbols, series, None).unwrap();
    for w in p.weights() {
      assert_abs_diff_eq!(w, 1.0 / 3.0, epsilon = 1e-12);
    }
    assert_eq!(p.dates().len(), 81);
    assert_eq!(p.returns().len(), 80);
  }

  #[test]
  #[traced_test]
  fn mismatched_lengths_are_reconciled_with_warning() {
    let (mut symbols, series) = three();
    symbols.truncate(2);
    let p = Portfolio::new(symbols, series, Some(vec![0.2, 0.3, 0.5, 0.9])).unwrap();
    assert_eq!(p.len(), 2);
    assert_abs_diff_eq!(p.weights()[0], 0.4, epsilon = 1e-12);
    assert!(logs_contain("symbol and series counts differ"));
    assert!(logs_contain("more weights than assets"));

    let (symbols, series) = three();
    let padded = Portfolio::new(symbols, series, Some(vec![1.0 / 3.0])).unwrap();
    assert_eq!(padded.len(), 3);
    assert!(logs_contain("fewer weights than assets"));
  }

  #[test]
  fn invalid_weights_fail_fast() {
    let (symbols, series) = three();
    let err = Portfolio::new(symbols.clone(), series.clone(), Some(vec![0.0, 0.0, 0.0])).unwrap_err();
    assert!(matches!(err, RiskError::Configuration { .. }));
    let short = Portfolio::new(symbols, series, Some(vec![0.5, -0.1, 0.6])).unwrap_err();
    assert!(short.to_string().contains("long-only"));
    assert!(Portfolio::new(Vec::new(), Vec::new(), None).is_err());
  }

  #[test]
  fn disjoint_calendars_fail_alignment() {
    let a = series_from_returns("A", start(), &wave(10, 3));
    let b = series_from_returns("B", start() + Days::new(60), &wave(10, 5));
    let err = Portfolio::new(vec!["A".into(), "B".into()], vec![a, b], None).unwrap_err();
    assert!(matches!(err, RiskError::DataAlignment { assets: 2 }));
  }

  #[test]
  fn forward_fill_bridges_calendar_gaps() {
    let dates = business_days(start(), 30);
    let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
    let a = PriceSeries::from_closes("A", &dates, &closes).unwrap();
    // B trades every other day
    let b_dates: Vec<NaiveDate> = dates.iter().copied().step_by(2).collect();
    let b_closes: Vec<f64> = closes.iter().copied().step_by(2).collect();
    let b = PriceSeries::from_closes("B", &b_dates, &b_closes).unwrap();

    let symbols = vec!["A".to_string(), "B".to_string()];
    let intersected = Portfolio::new(symbols.clone(), vec![a.clone(), b.clone()], None).unwrap();
    assert_eq!(intersected.dates().len(), 15);

    let config = PortfolioConfig {
      alignment: AlignmentPolicy::ForwardFill { max_gap_days: 3 },
      ..Default::default()
    };
    let filled = Portfolio::with_config(symbols, vec![a, b], None, config).unwrap();
    assert_eq!(filled.dates().len(), 29);
    assert_eq!(filled.assets()[1].series().closes()[1], 100.0);
  }

  #[test]
  fn value_series_and_stats() {
    let (symbols, series) = three();
    let p = Portfolio::new(symbols, series, Some(vec![2.0, 1.0, 1.0])).unwrap();
    let first = p.value_series()[0];
    assert_abs_diff_eq!(first, 100.0, epsilon = 1e-9);

    let stats = p.stats().unwrap();
    assert_eq!(stats.observations, 81);
    assert!(stats.max_drawdown <= 0.0 && stats.max_drawdown >= -1.0);
    assert!(stats.cvar_95 <= stats.var_95);
    assert_eq!(stats.correlation_matrix.len(), 3);
    assert_eq!(stats.correlation_matrix[1][1], 1.0);
    assert_eq!(stats.correlation_matrix[0][2], stats.correlation_matrix[2][0]);
    assert!(stats.diversification_ratio.is_finite());

    let snapshot = p.snapshot();
    assert_eq!(snapshot.weights(), p.weights());
    assert_eq!(snapshot.assets[0].returns.len(), 80);
  }

  #[test]
  fn engine_correlation_pairs_returns_by_date_after_zero_close() {
    let a = series_from_returns("A", start(), &wave(59, 3));
    let base = series_from_returns("B", start(), &wave(59, 5));
    let mut closes = base.closes();
    closes[1] = 0.0;
    let b = PriceSeries::from_closes("B", &base.dates(), &closes).unwrap();

    let p = Portfolio::new(vec!["A".into(), "B".into()], vec![a.clone(), b.clone()], None).unwrap();
    let snapshot = p.snapshot();
    assert_eq!(snapshot.assets[0].returns.len(), 59);
    // no return can be based on the zero close
    assert_eq!(snapshot.assets[1].returns.len(), 58);

    let ra = a.returns(ReturnMethod::Simple);
    let rb = b.returns(ReturnMethod::Simple);
    let (xs, ys) = paired_on_intersection(ra.dates(), ra.values(), rb.dates(), rb.values());
    assert_eq!(xs.len(), 58);
    let expected = pearson(&xs, &ys);

    let engine = CorrelatedMonteCarloEngine::new(SimulationConfig::default()).unwrap();
    let plan = engine.prepare(&snapshot).unwrap();
    assert!(!plan.correlation().substituted());
    assert_abs_diff_eq!(plan.correlation().matrix()[0][1], expected, epsilon = 1e-12);
    assert_abs_diff_eq!(p.correlation_matrix()[0][1], expected, epsilon = 1e-12);
  }

  #[test]
  fn value_dispersion_matches_hand_computation() {
    let dates = business_days(start(), 4);
    let a = PriceSeries::from_closes("A", &dates, &[100.0, 110.0, 90.0, 100.0]).unwrap();
    let b = PriceSeries::from_closes("B", &dates, &[50.0, 50.0, 60.0, 70.0]).unwrap();
    let p = Portfolio::new(vec!["A".into(), "B".into()], vec![a, b], None).unwrap();
    assert_eq!(p.value_series(), &[75.0, 80.0, 75.0, 85.0]);

    let stats = p.stats().unwrap();
    assert_abs_diff_eq!(stats.mean_value, 78.75, epsilon = 1e-12);
    // squared deviations 14.0625 + 1.5625 + 14.0625 + 39.0625 over n - 1
    assert_abs_diff_eq!(stats.std_value, (68.75_f64 / 3.0).sqrt(), epsilon = 1e-12);
    assert_eq!(stats.min_value, 75.0);
    assert_eq!(stats.max_value, 85.0);
    assert_eq!(stats.to_map()["std_value"], stats.std_value);
  }

  #[test]
  fn ingestion_findings_reach_the_asset() {
    let dates = business_days(start(), 30);
    let mut raw: Vec<StandardizedPriceRecord> = dates
      .iter()
      .enumerate()
      .map(|(i, &d)| {
        let c = 100.0 + (i % 4) as f64;
        StandardizedPriceRecord::new(d, c, c, c, c, 500.0)
      })
      .collect();
    raw.insert(3, raw[2]);
    let a = PriceSeries::from_standardized("A", SourceKind::Yahoo, &raw).unwrap();
    let b = series_from_returns("B", start(), &wave(29, 5));

    let p = Portfolio::new(vec!["A".into(), "B".into()], vec![a, b], None).unwrap();
    assert!(p.assets()[0].quality().duplicate_dates);
    assert!(!p.assets()[1].quality().duplicate_dates);
    let md = p.report(&Default::default()).unwrap();
    assert!(md.contains("  - duplicate dates"));
  }

  #[test]
  fn stats_need_two_returns() {
    let a = PriceSeries::from_closes("A", &[start(), start() + Days::new(1)], &[1.0, 2.0]).unwrap();
    let p = Portfolio::new(vec!["A".into()], vec![a], None).unwrap();
    assert!(matches!(p.stats(), Err(RiskError::InsufficientData { .. })));
  }

  proptest! {
    #[test]
    fn weights_sum_to_one(raw in prop::collection::vec(0.0f64..10.0, 3)) {
      prop_assume!(raw.iter().sum::<f64>() > 1e-6);
      let (symbols, series) = three();
      let p = Portfolio::new(symbols, series, Some(raw)).unwrap();
      prop_assert!((p.weights().iter().sum::<f64>() - 1.0).abs() < 1e-6);
    }
  }
}
