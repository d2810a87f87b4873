//! # Risk
//!
//! $$
//! \mathrm{VaR}_\alpha = -Q_{1-\alpha},\qquad \mathrm{CVaR}_\alpha = -\mathbb E[X \mid X \le Q_{1-\alpha}]
//! $$
//!
//! Risk analytics over realized history and simulated outcomes.

pub mod historical;
pub mod simulated;

pub use historical::HistoricalRisk;
pub use simulated::annual_return_distribution;
pub use simulated::loss_probability_curve;
pub use simulated::LossProbability;
pub use simulated::SimulationSummary;
