//! # Series
//!
//! $$
//! \{(d_t, O_t, H_t, L_t, C_t, V_t)\}_{t=1}^{T},\quad d_1 < d_2 < \dots < d_T
//! $$
//!
//! Validated OHLCV history, calendar alignment and data-quality inspection.

pub mod align;
pub mod price_series;
pub mod quality;
pub mod record;

pub use align::AlignmentPolicy;
pub use price_series::PriceSeries;
pub use price_series::ReturnMethod;
pub use price_series::ReturnSeries;
pub use price_series::SeriesStats;
pub use price_series::SeriesSummary;
pub use quality::DataQualityReport;
pub use record::PriceRecord;
pub use record::StandardizedPriceRecord;
