//! # Error
//!
//! $$
//! \text{Result}\langle T\rangle = T \ \Vert\ \text{RiskError}
//! $$
//!
//! Error taxonomy shared by ingestion, portfolio construction and simulation.

use chrono::NaiveDate;
use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, RiskError>;

#[derive(Error, Debug)]
pub enum RiskError {
  /// Invalid or mismatched weights, non-positive horizon or simulation count.
  #[error("configuration error: {message}")]
  Configuration { message: String },

  /// Too few observations to estimate a statistic.
  #[error("insufficient data for {context}: need at least {required} observations, got {available}")]
  InsufficientData {
    context: String,
    required: usize,
    available: usize,
  },

  /// Covariance or correlation matrix failed the positive-definiteness check.
  #[error("numerical degeneracy: {message}")]
  NumericalDegeneracy { message: String },

  /// No trading dates shared by every portfolio asset.
  #[error("no overlapping trading dates across {assets} assets")]
  DataAlignment { assets: usize },

  /// An OHLCV record violated the ingestion invariants.
  #[error("invalid record for {symbol} on {date}: {reason}")]
  InvalidRecord {
    symbol: String,
    date: NaiveDate,
    reason: String,
  },

  /// Failure reported by an injected price source.
  #[error("price source {source_name} failed")]
  Source {
    source_name: String,
    #[source]
    cause: anyhow::Error,
  },

  /// Engine configuration could not be parsed.
  #[error("failed to parse simulation config")]
  Config(#[from] serde_json::Error),

  /// The report writer rejected output.
  #[error("failed to write report")]
  Render(#[from] std::fmt::Error),
}

impl RiskError {
  pub fn configuration(message: impl Into<String>) -> Self {
    Self::Configuration {
      message: message.into(),
    }
  }

  pub fn insufficient_data(context: impl Into<String>, required: usize, available: usize) -> Self {
    Self::InsufficientData {
      context: context.into(),
      required,
      available,
    }
  }

  pub fn degeneracy(message: impl Into<String>) -> Self {
    Self::NumericalDegeneracy {
      message: message.into(),
    }
  }

  pub fn invalid_record(symbol: &str, date: NaiveDate, reason: impl Into<String>) -> Self {
    Self::InvalidRecord {
      symbol: symbol.to_string(),
      date,
      reason: reason.into(),
    }
  }
}
