#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/tailrisk/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod engine;
pub mod fitting;
pub mod portfolio;
pub mod sampling;
pub mod stats;

// Re-export main types
pub use engine::{
    CellMethod, PortfolioVar, SimulationLimits, SimulationMethod, SimulationRequest,
    SimulationResult, SweepCell, SweepConfig, VarError, VarWorker, WorkerError, compute_var,
    compute_var_with_limits, parametric_sweep, parametric_var, portfolio_parametric_sweep,
    portfolio_parametric_var, run_sweep,
};
pub use fitting::{DfGrid, FitError, FitObjective, StudentTFit, StudentTFitter};
pub use portfolio::{AlignedReturns, PortfolioError, PortfolioSpec};
