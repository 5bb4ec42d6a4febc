//! Value-at-Risk engine
//!
//! Two families of estimate:
//!
//! - [`parametric`]: closed-form Normal VaR `z(c) · σ · √T` for a single
//!   instrument or a weighted portfolio. The mean return is omitted at daily
//!   frequency.
//! - [`monte_carlo`]: simulated cumulative `T`-day log returns under a Normal,
//!   Student-t or bootstrap regime, reported as the negated left-tail
//!   quantile.
//!
//! [`worker`] moves simulations off the caller's task and [`sweep`] walks a
//! grid of methods, confidence levels and horizons.

pub mod monte_carlo;
pub mod parametric;
pub mod sweep;
pub mod worker;

pub use monte_carlo::{
    SimulationLimits, SimulationRequest, SimulationResult, compute_var, compute_var_with_limits,
};
pub use parametric::{PortfolioVar, parametric_var, portfolio_parametric_var};
pub use sweep::{
    CellMethod, SweepCell, SweepConfig, parametric_sweep, portfolio_parametric_sweep, run_sweep,
};
pub use worker::{VarWorker, WorkerError};

use crate::{fitting::FitError, portfolio::PortfolioError};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur while estimating VaR
#[derive(Debug, Error)]
pub enum VarError {
    /// Request parameters out of range
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Not enough finite observations for the estimate
    #[error("Insufficient data: need at least {required} finite observations, got {actual}")]
    InsufficientData {
        /// Required number of observations
        required: usize,
        /// Finite observations available
        actual: usize,
    },

    /// Zero volatility, so a volatility-scaled VaR is undefined
    #[error("Degenerate variance: return series has zero volatility")]
    DegenerateVariance,

    /// Portfolio aggregation error
    #[error("Portfolio error: {0}")]
    Portfolio(#[from] PortfolioError),

    /// Distribution fitting error
    #[error("Fit error: {0}")]
    Fit(#[from] FitError),
}

/// Monte Carlo regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationMethod {
    /// Gaussian daily draws with the pool's mean and volatility
    Normal,
    /// Variance-matched Student-t daily draws with fitted ν
    #[serde(alias = "t_mc")]
    StudentT,
    /// Daily draws resampled with replacement from the pool
    Bootstrap,
}

impl SimulationMethod {
    /// Every regime, in reporting order.
    pub const ALL: [Self; 3] = [Self::Normal, Self::StudentT, Self::Bootstrap];

    /// Wire name of the regime
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::StudentT => "student_t",
            Self::Bootstrap => "bootstrap",
        }
    }
}

impl fmt::Display for SimulationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reject confidence levels outside the open unit interval.
pub(crate) fn check_confidence(confidence: f64) -> Result<(), VarError> {
    if confidence > 0.0 && confidence < 1.0 {
        Ok(())
    } else {
        Err(VarError::InvalidRequest(format!(
            "confidence must be in (0, 1), got {}",
            confidence
        )))
    }
}

/// Reject a zero-day holding period.
pub(crate) fn check_horizon(horizon: u32) -> Result<(), VarError> {
    if horizon >= 1 {
        Ok(())
    } else {
        Err(VarError::InvalidRequest("horizon must be at least 1".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("\"normal\"", SimulationMethod::Normal)]
    #[case("\"student_t\"", SimulationMethod::StudentT)]
    #[case("\"t_mc\"", SimulationMethod::StudentT)]
    #[case("\"bootstrap\"", SimulationMethod::Bootstrap)]
    fn test_method_wire_names(#[case] json: &str, #[case] expected: SimulationMethod) {
        let parsed: SimulationMethod = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_method_serializes_canonical_name() {
        let json = serde_json::to_string(&SimulationMethod::StudentT).unwrap();
        assert_eq!(json, "\"student_t\"");
        assert_eq!(SimulationMethod::StudentT.to_string(), "student_t");
    }

    #[test]
    fn test_unknown_method_rejected() {
        assert!(serde_json::from_str::<SimulationMethod>("\"garch\"").is_err());
    }

    #[rstest]
    #[case(0.0)]
    #[case(1.0)]
    #[case(-0.5)]
    #[case(f64::NAN)]
    fn test_confidence_bounds(#[case] confidence: f64) {
        assert!(matches!(
            check_confidence(confidence),
            Err(VarError::InvalidRequest(_))
        ));
    }
}
