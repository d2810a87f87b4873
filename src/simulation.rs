//! # Simulation
//!
//! $$
//! \mathbf A_{t+1} = \mathbf A_t \odot (1 + \boldsymbol\mu_{step} + L\mathbf z_t),\qquad LL^\top = D R D
//! $$
//!
//! Correlated multi-asset Monte Carlo and the single-asset GBM variant.

pub mod config;
pub mod engine;
pub mod estimate;
pub mod factor;
pub mod result;
pub mod single;
pub mod snapshot;

pub use config::Horizon;
pub use config::RebalanceFrequency;
pub use config::SimulationConfig;
pub use config::StepGranularity;
pub use engine::CorrelatedMonteCarloEngine;
pub use engine::SimulationPlan;
pub use estimate::AssetEstimate;
pub use factor::CorrelationModel;
pub use result::SimulationResult;
pub use single::simulate_single_asset;
pub use single::SingleAssetOptions;
pub use snapshot::AssetSnapshot;
pub use snapshot::PortfolioSnapshot;
