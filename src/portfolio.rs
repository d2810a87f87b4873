//! # Portfolio
//!
//! $$
//! \sigma_p^2 = \mathbf{w}^\top \Sigma \mathbf{w}
//! $$
//!
//! Weighted, date-aligned portfolios, their statistics and reports.

pub mod data;
pub mod model;
pub mod report;
pub mod stats;

pub use data::correlation_matrix;
pub use data::covariance_matrix;
pub use model::normalize_weights;
pub use model::Asset;
pub use model::Portfolio;
pub use model::PortfolioConfig;
pub use report::warnings;
pub use report::ReportOptions;
pub use stats::PortfolioStats;
