#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/tailrisk/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export main types from sub-crates
pub use tailrisk_data as data;
pub use tailrisk_output as output;
pub use tailrisk_risk as risk;

pub use tailrisk_data::{PriceFile, ReturnSeries};
pub use tailrisk_output::{ReportBuilder, VarReport};
pub use tailrisk_risk::{
    PortfolioSpec, SimulationMethod, SimulationRequest, SimulationResult, SweepConfig, VarError,
    VarWorker, compute_var,
};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_reexports_resolve() {
        let config = risk::SweepConfig::default();
        assert_eq!(config.methods.len(), SimulationMethod::ALL.len());
    }
}
