//! # Ingest
//!
//! $$
//! \text{adapter} \xrightarrow{\ \text{validate}\ } \text{PriceSeries}
//! $$
//!
//! Boundary between external market-data adapters and the analytics core.

pub mod cache;
pub mod csv;
pub mod source;

pub use cache::CacheKey;
pub use cache::MemoryCache;
pub use cache::PriceCache;
pub use self::csv::CsvSource;
pub use source::load_series;
pub use source::CachedSource;
pub use source::PriceRequest;
pub use source::PriceSource;
pub use source::SourceKind;
