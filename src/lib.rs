//! # stochastic-portfolio
//!
//! $$
//! V_T = \sum_i A^{(i)}_T,\qquad
//! A^{(i)}_{t+1} = A^{(i)}_t\big(1 + \mu^{(i)}_{step} + (L z_t)_i\big)
//! $$
//!
//! Portfolio risk analytics and correlated Monte Carlo projection.
//!
//! Daily OHLCV history enters through [`ingest`] and becomes a
//! [`series::PriceSeries`]. Several series form a [`portfolio::Portfolio`],
//! whose [`portfolio::Portfolio::snapshot`] feeds the
//! [`simulation::CorrelatedMonteCarloEngine`]. The resulting
//! [`simulation::SimulationResult`] is summarized by [`risk`].

pub mod error;
pub mod ingest;
pub mod portfolio;
pub mod risk;
pub mod series;
pub mod simulation;
pub mod stats;

pub use error::Result;
pub use error::RiskError;
pub use portfolio::Portfolio;
pub use portfolio::PortfolioConfig;
pub use portfolio::PortfolioStats;
pub use risk::SimulationSummary;
pub use series::PriceSeries;
pub use simulation::CorrelatedMonteCarloEngine;
pub use simulation::SimulationConfig;
pub use simulation::SimulationResult;
