//! # Price Records
//!
//! $$
//! L_t \le \min(O_t, C_t) \le \max(O_t, C_t) \le H_t,\qquad V_t \ge 0
//! $$
//!
//! Raw records handed over by data adapters and their validated counterpart.

use chrono::NaiveDate;
use impl_new_derive::ImplNew;
use serde::Deserialize;
use serde::Serialize;

use crate::error::Result;
use crate::error::RiskError;

/// Record as produced by an external adapter, before validation.
///
/// Deserializes from lower-case or capitalized column names; unknown columns
/// such as `Adj Close` are ignored.
#[derive(ImplNew, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StandardizedPriceRecord {
  #[serde(alias = "Date")]
  pub date: NaiveDate,
  #[serde(alias = "Open")]
  pub open: f64,
  #[serde(alias = "High")]
  pub high: f64,
  #[serde(alias = "Low")]
  pub low: f64,
  #[serde(alias = "Close")]
  pub close: f64,
  #[serde(alias = "Volume")]
  pub volume: f64,
}

/// Validated daily OHLCV bar.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PriceRecord {
  date: NaiveDate,
  open: f64,
  high: f64,
  low: f64,
  close: f64,
  volume: f64,
}

impl PriceRecord {
  /// Validate a raw record against the OHLCV invariants.
  pub fn validate(symbol: &str, raw: &StandardizedPriceRecord) -> Result<Self> {
    let fields = [
      ("open", raw.open),
      ("high", raw.high),
      ("low", raw.low),
      ("close", raw.close),
      ("volume", raw.volume),
    ];
    for (name, value) in fields {
      if !value.is_finite() {
        return Err(RiskError::invalid_record(
          symbol,
          raw.date,
          format!("{name} is not finite"),
        ));
      }
      if value < 0.0 {
        return Err(RiskError::invalid_record(
          symbol,
          raw.date,
          format!("{name} is negative ({value})"),
        ));
      }
    }

    if raw.high < raw.open.max(raw.close).max(raw.low) {
      return Err(RiskError::invalid_record(
        symbol,
        raw.date,
        format!("high {} below open/close/low", raw.high),
      ));
    }
    if raw.low > raw.open.min(raw.close).min(raw.high) {
      return Err(RiskError::invalid_record(
        symbol,
        raw.date,
        format!("low {} above open/close/high", raw.low),
      ));
    }

    Ok(Self {
      date: raw.date,
      open: raw.open,
      high: raw.high,
      low: raw.low,
      close: raw.close,
      volume: raw.volume,
    })
  }

  /// Bar carrying `close` forward to `date` with no traded volume.
  pub(crate) fn carried_forward(&self, date: NaiveDate) -> Self {
    Self {
      date,
      open: self.close,
      high: self.close,
      low: self.close,
      close: self.close,
      volume: 0.0,
    }
  }

  pub fn date(&self) -> NaiveDate {
    self.date
  }

  pub fn open(&self) -> f64 {
    self.open
  }

  pub fn high(&self) -> f64 {
    self.high
  }

  pub fn low(&self) -> f64 {
    self.low
  }

  pub fn close(&self) -> f64 {
    self.close
  }

  pub fn volume(&self) -> f64 {
    self.volume
  }
}

impl From<PriceRecord> for StandardizedPriceRecord {
  fn from(r: PriceRecord) -> Self {
    Self {
      date: r.date,
      open: r.open,
      high: r.high,
      low: r.low,
      close: r.close,
      volume: r.volume,
    }
  }
}
