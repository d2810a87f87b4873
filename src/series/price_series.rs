//! # Price Series
//!
//! $$
//! r_t = \frac{C_t}{C_{t-1}} - 1,\qquad \sigma_{ann} = \sqrt{252}\,\hat\sigma(r),\qquad
//! SR = \sqrt{252}\,\frac{\bar r - r_f/252}{\hat\sigma(r)}
//! $$
//!
//! Per-symbol daily OHLCV history with statistics cached at construction.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::warn;

use super::align::forward_fill_indices;
use super::align::paired_forward_filled;
use super::align::paired_on_intersection;
use super::align::DEFAULT_MAX_GAP_DAYS;
use super::quality::DataQualityReport;
use super::record::PriceRecord;
use super::record::StandardizedPriceRecord;
use crate::error::Result;
use crate::error::RiskError;
use crate::ingest::SourceKind;
use crate::portfolio::data::pearson;
use crate::stats::descriptive;
use crate::stats::descriptive::TRADING_DAYS;

/// Default annual risk-free rate for cached Sharpe ratios.
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.02;
/// Minimum shared dates before correlation falls back to forward filling.
pub const MIN_COMMON_DATES: usize = 10;

/// Return convention.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReturnMethod {
  #[default]
  Simple,
  Log,
}

/// Returns stamped with the date of the later price.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReturnSeries {
  dates: Vec<NaiveDate>,
  values: Vec<f64>,
}

impl ReturnSeries {
  /// Build returns from dated values; pairs with a non-positive base are skipped.
  pub fn from_values(dates: &[NaiveDate], values: &[f64], method: ReturnMethod) -> Self {
    let mut out = Self::default();
    for i in 1..values.len().min(dates.len()) {
      let (prev, cur) = (values[i - 1], values[i]);
      let r = match method {
        ReturnMethod::Simple if prev > 0.0 => cur / prev - 1.0,
        ReturnMethod::Log if prev > 0.0 && cur > 0.0 => (cur / prev).ln(),
        _ => continue,
      };
      if r.is_finite() {
        out.dates.push(dates[i]);
        out.values.push(r);
      }
    }
    out
  }

  pub fn dates(&self) -> &[NaiveDate] {
    &self.dates
  }

  pub fn values(&self) -> &[f64] {
    &self.values
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  /// Trailing slice of at most `window` returns (`None` = full history).
  pub fn tail(&self, window: Option<usize>) -> &[f64] {
    let n = window.unwrap_or(self.values.len()).min(self.values.len());
    &self.values[self.values.len() - n..]
  }
}

/// Statistics cached when a series is built.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct SeriesStats {
  pub mean_close: f64,
  pub std_close: f64,
  pub mean_volume: f64,
  pub std_volume: f64,
  /// Full-history annualized volatility of simple returns.
  pub annualized_volatility: f64,
  /// Full-history Sharpe ratio at [`DEFAULT_RISK_FREE_RATE`].
  pub sharpe_ratio: f64,
  pub max_drawdown: f64,
  pub skewness: f64,
  /// Excess kurtosis.
  pub kurtosis: f64,
}

/// Summary of a single series, mirroring the per-asset section of a report.
#[derive(Clone, Debug, Serialize)]
pub struct SeriesSummary {
  pub symbol: String,
  pub first_date: Option<NaiveDate>,
  pub last_date: Option<NaiveDate>,
  pub observations: usize,
  pub mean_price: f64,
  pub std_price: f64,
  pub min_price: f64,
  pub max_price: f64,
  pub current_price: f64,
  pub mean_volume: f64,
  pub volatility_30d: f64,
  pub volatility_annualized: f64,
  pub sharpe_ratio: f64,
  pub max_drawdown: f64,
  /// Total return over the history, as a fraction.
  pub total_return: f64,
  pub mean_daily_return: f64,
  pub std_daily_return: f64,
  pub skewness: f64,
  pub kurtosis: f64,
}

/// Ordered daily OHLCV history of one symbol.
#[derive(Clone, Debug)]
pub struct PriceSeries {
  symbol: String,
  source: SourceKind,
  records: Vec<PriceRecord>,
  simple: ReturnSeries,
  log: ReturnSeries,
  stats: SeriesStats,
  quality: DataQualityReport,
}

impl PriceSeries {
  /// Build a series from validated records; dates must be strictly increasing.
  pub fn new(symbol: impl Into<String>, source: SourceKind, records: Vec<PriceRecord>) -> Result<Self> {
    let symbol = symbol.into();
    for pair in records.windows(2) {
      if pair[1].date() <= pair[0].date() {
        return Err(RiskError::invalid_record(
          &symbol,
          pair[1].date(),
          format!("date does not follow {}", pair[0].date()),
        ));
      }
    }
    let raw: Vec<StandardizedPriceRecord> = records.iter().map(|&r| r.into()).collect();
    let quality = DataQualityReport::inspect(&raw);
    Ok(Self::build(symbol, source, records, quality))
  }

  /// Validate adapter output and build a series from it.
  ///
  /// The quality report is taken on `raw` as delivered. Repeated dates keep
  /// their first bar.
  pub fn from_standardized(
    symbol: impl Into<String>,
    source: SourceKind,
    raw: &[StandardizedPriceRecord],
  ) -> Result<Self> {
    let symbol = symbol.into();
    let quality = DataQualityReport::inspect(raw);
    let mut records = raw
      .iter()
      .map(|r| PriceRecord::validate(&symbol, r))
      .collect::<Result<Vec<_>>>()?;

    let delivered = records.len();
    records.dedup_by_key(|r| r.date());
    if records.len() < delivered {
      warn!(symbol = %symbol, dropped = delivered - records.len(), "dropping bars with repeated dates");
    }

    let mut series = Self::new(symbol, source, records)?;
    series.quality = quality;
    Ok(series)
  }

  /// Flat bars (`open = high = low = close`, no volume) from a close series.
  pub fn from_closes(symbol: impl Into<String>, dates: &[NaiveDate], closes: &[f64]) -> Result<Self> {
    let symbol = symbol.into();
    if dates.len() != closes.len() {
      return Err(RiskError::configuration(format!(
        "{symbol}: {} dates but {} closes",
        dates.len(),
        closes.len()
      )));
    }
    let raw: Vec<StandardizedPriceRecord> = dates
      .iter()
      .zip(closes)
      .map(|(&d, &c)| StandardizedPriceRecord::new(d, c, c, c, c, 0.0))
      .collect();
    Self::from_standardized(symbol, SourceKind::Custom("closes".into()), &raw)
  }

  fn build(symbol: String, source: SourceKind, records: Vec<PriceRecord>, quality: DataQualityReport) -> Self {
    let dates: Vec<NaiveDate> = records.iter().map(|r| r.date()).collect();
    let closes: Vec<f64> = records.iter().map(|r| r.close()).collect();
    let volumes: Vec<f64> = records.iter().map(|r| r.volume()).collect();

    let simple = ReturnSeries::from_values(&dates, &closes, ReturnMethod::Simple);
    let log = ReturnSeries::from_values(&dates, &closes, ReturnMethod::Log);

    let stats = SeriesStats {
      mean_close: descriptive::mean(&closes),
      std_close: descriptive::std_dev(&closes),
      mean_volume: descriptive::mean(&volumes),
      std_volume: descriptive::std_dev(&volumes),
      annualized_volatility: annualized_volatility(simple.values()),
      sharpe_ratio: sharpe(simple.values(), DEFAULT_RISK_FREE_RATE),
      max_drawdown: descriptive::max_drawdown(&closes),
      skewness: descriptive::skewness(simple.values()),
      kurtosis: descriptive::excess_kurtosis(simple.values()),
    };

    Self {
      symbol,
      source,
      records,
      simple,
      log,
      stats,
      quality,
    }
  }

  pub fn symbol(&self) -> &str {
    &self.symbol
  }

  pub fn source(&self) -> &SourceKind {
    &self.source
  }

  pub fn records(&self) -> &[PriceRecord] {
    &self.records
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  pub fn dates(&self) -> Vec<NaiveDate> {
    self.records.iter().map(|r| r.date()).collect()
  }

  pub fn closes(&self) -> Vec<f64> {
    self.records.iter().map(|r| r.close()).collect()
  }

  pub fn first_date(&self) -> Option<NaiveDate> {
    self.records.first().map(|r| r.date())
  }

  pub fn last_date(&self) -> Option<NaiveDate> {
    self.records.last().map(|r| r.date())
  }

  pub fn stats(&self) -> &SeriesStats {
    &self.stats
  }

  /// Cached return series.
  pub fn returns(&self, method: ReturnMethod) -> &ReturnSeries {
    match method {
      ReturnMethod::Simple => &self.simple,
      ReturnMethod::Log => &self.log,
    }
  }

  /// Standard deviation of the trailing `window` simple returns.
  pub fn volatility(&self, window: Option<usize>, annualized: bool) -> f64 {
    let vol = descriptive::std_dev(self.simple.tail(window));
    if annualized {
      vol * TRADING_DAYS.sqrt()
    } else {
      vol
    }
  }

  /// Annualized Sharpe ratio over the trailing `window` simple returns.
  pub fn sharpe_ratio(&self, risk_free_rate: f64, window: Option<usize>) -> f64 {
    sharpe(self.simple.tail(window), risk_free_rate)
  }

  pub fn max_drawdown(&self) -> f64 {
    self.stats.max_drawdown
  }

  pub fn skewness(&self) -> f64 {
    self.stats.skewness
  }

  pub fn kurtosis(&self) -> f64 {
    self.stats.kurtosis
  }

  /// Return correlation using the default forward-fill tolerance.
  pub fn correlation_with(&self, other: &PriceSeries) -> f64 {
    self.correlation_with_gap(other, DEFAULT_MAX_GAP_DAYS)
  }

  /// Pearson correlation of simple returns aligned by date.
  ///
  /// Uses the date intersection when it holds at least [`MIN_COMMON_DATES`]
  /// points, otherwise forward fills across calendars for at most
  /// `max_gap_days`. Returns `0.0` when fewer than two aligned points remain.
  pub fn correlation_with_gap(&self, other: &PriceSeries, max_gap_days: u32) -> f64 {
    let (a, b) = (&self.simple, &other.simple);
    let (xs, ys) = paired_on_intersection(a.dates(), a.values(), b.dates(), b.values());

    let (xs, ys) = if xs.len() >= MIN_COMMON_DATES {
      (xs, ys)
    } else {
      let (fx, fy) = paired_forward_filled(a.dates(), a.values(), b.dates(), b.values(), max_gap_days);
      if fx.len() >= MIN_COMMON_DATES {
        (fx, fy)
      } else {
        (xs, ys)
      }
    };

    if xs.len() < 2 {
      return 0.0;
    }
    let r = pearson(&xs, &ys);
    if r.is_finite() {
      r
    } else {
      0.0
    }
  }

  /// Series restricted to `dates`; dates missing from this series are dropped.
  pub fn restrict_to(&self, dates: &[NaiveDate]) -> PriceSeries {
    let records = forward_fill_indices(&self.dates(), dates, 0)
      .into_iter()
      .flatten()
      .map(|i| self.records[i])
      .collect();
    Self::build(self.symbol.clone(), self.source.clone(), records, self.quality.clone())
  }

  /// Series reindexed onto `dates`, carrying closes forward at most
  /// `max_gap_days`. `None` if any target date cannot be filled.
  pub fn reindex_forward_filled(&self, dates: &[NaiveDate], max_gap_days: u32) -> Option<PriceSeries> {
    let own = self.dates();
    let records = forward_fill_indices(&own, dates, max_gap_days)
      .into_iter()
      .zip(dates)
      .map(|(idx, &d)| {
        idx.map(|i| {
          let rec = self.records[i];
          if rec.date() == d {
            rec
          } else {
            rec.carried_forward(d)
          }
        })
      })
      .collect::<Option<Vec<_>>>()?;
    Some(Self::build(
      self.symbol.clone(),
      self.source.clone(),
      records,
      self.quality.clone(),
    ))
  }

  pub fn summary(&self) -> SeriesSummary {
    let closes = self.closes();
    let returns = self.simple.values();
    let total_return = match (closes.first(), closes.last()) {
      (Some(&first), Some(&last)) if first > 0.0 => last / first - 1.0,
      _ => f64::NAN,
    };

    SeriesSummary {
      symbol: self.symbol.clone(),
      first_date: self.first_date(),
      last_date: self.last_date(),
      observations: self.len(),
      mean_price: self.stats.mean_close,
      std_price: self.stats.std_close,
      min_price: closes.iter().copied().fold(f64::NAN, f64::min),
      max_price: closes.iter().copied().fold(f64::NAN, f64::max),
      current_price: closes.last().copied().unwrap_or(f64::NAN),
      mean_volume: self.stats.mean_volume,
      volatility_30d: self.volatility(Some(30), true),
      volatility_annualized: self.stats.annualized_volatility,
      sharpe_ratio: self.sharpe_ratio(DEFAULT_RISK_FREE_RATE, Some(30)),
      max_drawdown: self.stats.max_drawdown,
      total_return,
      mean_daily_return: descriptive::mean(returns),
      std_daily_return: descriptive::std_dev(returns),
      skewness: self.stats.skewness,
      kurtosis: self.stats.kurtosis,
    }
  }

  /// Findings on the history this series was built from. Derived series
  /// (`restrict_to`, `reindex_forward_filled`) keep their parent's report.
  pub fn quality_report(&self) -> &DataQualityReport {
    &self.quality
  }
}

/// `sqrt(252)` times the sample standard deviation; `NaN` on short input.
pub(crate) fn annualized_volatility(returns: &[f64]) -> f64 {
  descriptive::std_dev(returns) * TRADING_DAYS.sqrt()
}

/// Annualized Sharpe ratio; `0.0` when volatility is zero or undefined.
pub(crate) fn sharpe(returns: &[f64], risk_free_rate: f64) -> f64 {
  let vol = descriptive::std_dev(returns);
  if !vol.is_finite() || vol <= 0.0 {
    return 0.0;
  }
  let excess = descriptive::mean(returns) - risk_free_rate / TRADING_DAYS;
  excess / vol * TRADING_DAYS.sqrt()
}
