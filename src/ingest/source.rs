//! # Price Sources
//!
//! $$
//! \text{source}:\ (\text{symbol}, [d_0, d_1]) \mapsto \{\text{StandardizedPriceRecord}\}
//! $$
//!
//! Capability boundary for market-data adapters. Concrete adapters live outside
//! the crate and are injected; the crate never performs network I/O itself.

use std::fmt::Display;

use chrono::NaiveDate;
use impl_new_derive::ImplNew;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::warn;

use super::cache::CacheKey;
use super::cache::PriceCache;
use crate::error::Result;
use crate::error::RiskError;
use crate::series::PriceSeries;
use crate::series::StandardizedPriceRecord;

/// Closed set of supported data vendors.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
  #[default]
  Yahoo,
  Fred,
  Stooq,
  AlphaVantage,
  /// User-supplied data tagged with a free-form name.
  Custom(String),
}

impl Display for SourceKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      SourceKind::Yahoo => write!(f, "yahoo"),
      SourceKind::Fred => write!(f, "fred"),
      SourceKind::Stooq => write!(f, "stooq"),
      SourceKind::AlphaVantage => write!(f, "alphavantage"),
      SourceKind::Custom(name) => write!(f, "custom:{name}"),
    }
  }
}

/// Request for the daily history of one symbol.
#[derive(ImplNew, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PriceRequest {
  pub symbol: String,
  pub start: Option<NaiveDate>,
  pub end: Option<NaiveDate>,
}

impl PriceRequest {
  /// Canonical parameter string used in cache keys.
  pub fn params(&self) -> String {
    let fmt = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_default();
    format!("{}..{}", fmt(self.start), fmt(self.end))
  }
}

/// Market-data adapter contract.
pub trait PriceSource {
  fn kind(&self) -> SourceKind;

  /// Daily records in ascending date order.
  fn fetch(&self, request: &PriceRequest) -> anyhow::Result<Vec<StandardizedPriceRecord>>;
}

/// Fetch a request and turn the records into a validated series.
pub fn load_series<S: PriceSource + ?Sized>(source: &S, request: &PriceRequest) -> Result<PriceSeries> {
  let records = source.fetch(request).map_err(|cause| RiskError::Source {
    source_name: source.kind().to_string(),
    cause,
  })?;
  series_from_records(source.kind(), &request.symbol, &records)
}

fn series_from_records(
  kind: SourceKind,
  symbol: &str,
  records: &[StandardizedPriceRecord],
) -> Result<PriceSeries> {
  let series = PriceSeries::from_standardized(symbol, kind.clone(), records)?;
  let quality = series.quality_report();
  if !quality.is_clean() {
    warn!(symbol, source = %kind, ?quality, "price history has data-quality findings");
  }
  Ok(series)
}

/// Source decorated with an injected cache.
pub struct CachedSource<S, C> {
  source: S,
  cache: C,
}

impl<S: PriceSource, C: PriceCache> CachedSource<S, C> {
  pub fn new(source: S, cache: C) -> Self {
    Self { source, cache }
  }

  pub fn cache(&self) -> &C {
    &self.cache
  }

  pub fn cache_mut(&mut self) -> &mut C {
    &mut self.cache
  }

  /// Serve from the cache when fresh, otherwise fetch and store.
  pub fn load(&mut self, request: &PriceRequest) -> Result<PriceSeries> {
    let key = CacheKey::new(self.source.kind(), request.symbol.clone(), request.params());

    if let Some(records) = self.cache.get(&key) {
      debug!(symbol = %request.symbol, "price cache hit");
      return series_from_records(self.source.kind(), &request.symbol, &records);
    }

    let records = self.source.fetch(request).map_err(|cause| RiskError::Source {
      source_name: self.source.kind().to_string(),
      cause,
    })?;
    let series = series_from_records(self.source.kind(), &request.symbol, &records)?;
    self.cache.put(key, records);
    Ok(series)
  }
}
