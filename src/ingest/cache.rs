//! # Price Cache
//!
//! $$
//! \text{fresh}(k) \iff t_{now} - t_{put}(k) < \tau
//! $$
//!
//! Injected cache collaborator keyed by source, symbol and request parameters.

use std::collections::HashMap;
use std::time::Duration;
use std::time::Instant;

use impl_new_derive::ImplNew;

use super::source::SourceKind;
use crate::series::StandardizedPriceRecord;

#[derive(ImplNew, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
  pub source: SourceKind,
  pub symbol: String,
  pub params: String,
}

/// Storage for fetched price history.
pub trait PriceCache {
  fn get(&self, key: &CacheKey) -> Option<Vec<StandardizedPriceRecord>>;
  fn put(&mut self, key: CacheKey, records: Vec<StandardizedPriceRecord>);
  fn invalidate(&mut self, key: &CacheKey);
  fn clear(&mut self);
}

/// In-process cache with optional time-to-live.
#[derive(Debug, Default)]
pub struct MemoryCache {
  ttl: Option<Duration>,
  entries: HashMap<CacheKey, (Instant, Vec<StandardizedPriceRecord>)>,
}

impl MemoryCache {
  /// Entries older than `ttl` are treated as missing.
  pub fn with_ttl(ttl: Duration) -> Self {
    Self {
      ttl: Some(ttl),
      entries: HashMap::new(),
    }
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Drop every expired entry.
  pub fn evict_expired(&mut self) {
    if let Some(ttl) = self.ttl {
      self.entries.retain(|_, (at, _)| at.elapsed() < ttl);
    }
  }
}

impl PriceCache for MemoryCache {
  fn get(&self, key: &CacheKey) -> Option<Vec<StandardizedPriceRecord>> {
    let (at, records) = self.entries.get(key)?;
    match self.ttl {
      Some(ttl) if at.elapsed() >= ttl => None,
      _ => Some(records.clone()),
    }
  }

  fn put(&mut self, key: CacheKey, records: Vec<StandardizedPriceRecord>) {
    self.entries.insert(key, (Instant::now(), records));
  }

  fn invalidate(&mut self, key: &CacheKey) {
    self.entries.remove(key);
  }

  fn clear(&mut self) {
    self.entries.clear();
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  fn key(symbol: &str) -> CacheKey {
    CacheKey::new(SourceKind::Stooq, symbol.to_string(), "..".to_string())
  }

  fn records() -> Vec<StandardizedPriceRecord> {
    let date = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
    vec![StandardizedPriceRecord::new(date, 1.0, 1.0, 1.0, 1.0, 0.0)]
  }

  #[test]
  fn put_get_invalidate() {
    let mut cache = MemoryCache::default();
    cache.put(key("A"), records());
    cache.put(key("B"), records());
    assert_eq!(cache.get(&key("A")).unwrap().len(), 1);

    cache.invalidate(&key("A"));
    assert!(cache.get(&key("A")).is_none());
    assert_eq!(cache.len(), 1);
  }

  #[test]
  fn zero_ttl_expires_immediately() {
    let mut cache = MemoryCache::with_ttl(Duration::ZERO);
    cache.put(key("A"), records());
    assert!(cache.get(&key("A")).is_none());
    cache.evict_expired();
    assert!(cache.is_empty());
  }
}
