//! # CSV Source
//!
//! $$
//! \texttt{Date,Open,High,Low,Close[,Adj Close],Volume}
//! $$
//!
//! Local-file adapter: one `<SYMBOL>.csv` per symbol in a directory. Columns
//! are matched by header name, so exports with extra columns (Yahoo's
//! `Adj Close`) read correctly.

use std::path::PathBuf;

use anyhow::Context;
use csv::ReaderBuilder;
use csv::Trim;

use super::source::PriceRequest;
use super::source::PriceSource;
use super::source::SourceKind;
use crate::series::StandardizedPriceRecord;

#[derive(Clone, Debug)]
pub struct CsvSource {
  dir: PathBuf,
}

impl CsvSource {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  pub fn path_for(&self, symbol: &str) -> PathBuf {
    self.dir.join(format!("{symbol}.csv"))
  }
}

impl PriceSource for CsvSource {
  fn kind(&self) -> SourceKind {
    SourceKind::Custom("csv".into())
  }

  fn fetch(&self, request: &PriceRequest) -> anyhow::Result<Vec<StandardizedPriceRecord>> {
    let path = self.path_for(&request.symbol);
    let mut reader = ReaderBuilder::new()
      .has_headers(true)
      .trim(Trim::All)
      .from_path(&path)
      .with_context(|| format!("cannot open {}", path.display()))?;

    let mut records = Vec::new();
    for row in reader.deserialize::<StandardizedPriceRecord>() {
      let record = row.with_context(|| format!("reading {}", path.display()))?;
      let after_start = request.start.map_or(true, |s| record.date >= s);
      let before_end = request.end.map_or(true, |e| record.date <= e);
      if after_start && before_end {
        records.push(record);
      }
    }

    records.sort_by_key(|r| r.date);
    Ok(records)
  }
}

#[cfg(test)]
mod tests {
  use std::fs::File;
  use std::io::Write;

  use chrono::NaiveDate;

  use super::*;
  use crate::error::RiskError;
  use crate::ingest::load_series;

  fn write_csv(dir: &std::path::Path, symbol: &str, body: &str) {
    let mut f = File::create(dir.join(format!("{symbol}.csv"))).unwrap();
    f.write_all(body.as_bytes()).unwrap();
  }

  #[test]
  fn reads_and_filters_by_date() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(
      dir.path(),
      "AAA",
      "date,open,high,low,close,volume\n\
       2024-01-03,11,12,10,11.5,900\n\
       2024-01-02,10,11,9.5,10.5,1000\n\
       2024-01-04,11.5,12.5,11,12,800\n",
    );
    let source = CsvSource::new(dir.path());

    let all = source.fetch(&PriceRequest::new("AAA".into(), None, None)).unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());

    let start = NaiveDate::from_ymd_opt(2024, 1, 3);
    let series = load_series(&source, &PriceRequest::new("AAA".into(), start, None)).unwrap();
    assert_eq!(series.closes(), vec![11.5, 12.0]);
    assert_eq!(series.source().to_string(), "custom:csv");
  }

  #[test]
  fn malformed_rows_and_missing_files_are_source_errors() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(dir.path(), "BAD", "date,open,high,low,close,volume\n2024-01-02,10,11,9,oops,1\n");
    let source = CsvSource::new(dir.path());

    let bad = load_series(&source, &PriceRequest::new("BAD".into(), None, None)).unwrap_err();
    assert!(matches!(bad, RiskError::Source { .. }));
    let missing = load_series(&source, &PriceRequest::new("NONE".into(), None, None)).unwrap_err();
    assert!(matches!(missing, RiskError::Source { .. }));
  }

  #[test]
  fn inconsistent_bar_is_rejected_at_validation() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(dir.path(), "HL", "date,open,high,low,close,volume\n2024-01-02,10,9,11,10,1\n");
    let err = load_series(&CsvSource::new(dir.path()), &PriceRequest::new("HL".into(), None, None)).unwrap_err();
    assert!(matches!(err, RiskError::InvalidRecord { .. }));
  }

  #[test]
  fn columns_are_matched_by_header_name() {
    let dir = tempfile::tempdir().unwrap();
    write_csv(
      dir.path(),
      "SPY",
      "Date,Open,High,Low,Close,Adj Close,Volume\n\
       2024-01-02,10,11,9,10.5,10.2,123456\n\
       \"2024-01-03\",10.5,11.5,10,11,10.7,\"99000\"\n",
    );
    let records = CsvSource::new(dir.path())
      .fetch(&PriceRequest::new("SPY".into(), None, None))
      .unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].close, 10.5);
    assert_eq!(records[0].volume, 123456.0);
    assert_eq!(records[1].volume, 99000.0);

    write_csv(dir.path(), "ODD", "volume,close,low,high,open,date\n500,10,9,11,10,2024-01-02\n");
    let reordered = CsvSource::new(dir.path())
      .fetch(&PriceRequest::new("ODD".into(), None, None))
      .unwrap();
    assert_eq!(reordered[0].volume, 500.0);
    assert_eq!(reordered[0].open, 10.0);
  }
}
