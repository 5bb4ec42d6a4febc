//! Closed-form Normal VaR.

use super::{VarError, check_confidence, check_horizon};
use crate::portfolio::{
    PortfolioError, PortfolioSpec, align_returns, correlation_matrix, portfolio_variance,
};
use crate::stats::{finite_values, rolling_sigma, z_from_confidence};
use ndarray::{Array1, Array2};
use std::collections::HashMap;
use tailrisk_data::ReturnSeries;
use tracing::debug;

/// Single-instrument Normal VaR, `z(c) · rolling_sigma(window) · √horizon`.
///
/// Needs at least two finite returns and a non-zero volatility.
pub fn parametric_var(
    returns: &[f64],
    window: usize,
    confidence: f64,
    horizon: u32,
) -> Result<f64, VarError> {
    check_confidence(confidence)?;
    check_horizon(horizon)?;
    check_window(window)?;

    let sigma = window_sigma(returns, window)?;
    let var = z_from_confidence(confidence) * sigma * f64::from(horizon).sqrt();

    debug!(sigma, confidence, horizon, var, "parametric var");
    Ok(var)
}

/// Closed-form portfolio estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioVar {
    /// Value-at-Risk as a positive loss fraction
    pub var: f64,
    /// Daily portfolio volatility σ_p
    pub sigma: f64,
    /// Per-instrument trailing volatilities, in [`PortfolioSpec::ids`] order
    pub sigmas: Array1<f64>,
    /// Correlation matrix estimated on the aligned window
    pub correlation: Array2<f64>,
    /// Aligned rows used for the correlation
    pub observations: usize,
}

/// Portfolio Normal VaR, `z(c) · σ_p · √horizon`.
///
/// Each instrument's σ is its own trailing-window volatility. Correlations
/// come from the trailing `window` dates on which every member has a finite
/// return. `series` may hold instruments outside the portfolio; they are
/// ignored.
pub fn portfolio_parametric_var(
    spec: &PortfolioSpec,
    series: &[ReturnSeries],
    window: usize,
    confidence: f64,
    horizon: u32,
) -> Result<PortfolioVar, VarError> {
    check_confidence(confidence)?;
    check_horizon(horizon)?;
    check_window(window)?;

    let by_id: HashMap<&str, &ReturnSeries> =
        series.iter().map(|s| (s.instrument(), s)).collect();
    let members = spec
        .ids()
        .iter()
        .map(|id| {
            by_id
                .get(id.as_str())
                .copied()
                .ok_or_else(|| PortfolioError::UnknownInstrument(id.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let sigmas = members
        .iter()
        .map(|s| window_sigma(&s.values(), window))
        .collect::<Result<Array1<f64>, _>>()?;

    let aligned = align_returns(&members)?.finite_rows().trailing(window);
    let correlation = correlation_matrix(aligned.values())?;
    let variance = portfolio_variance(spec.weights(), &sigmas, &correlation)?;
    let sigma = variance.sqrt();
    if sigma == 0.0 {
        return Err(VarError::DegenerateVariance);
    }

    let var = z_from_confidence(confidence) * sigma * f64::from(horizon).sqrt();
    debug!(
        instruments = spec.ids().len(),
        rows = aligned.nrows(),
        sigma,
        var,
        "portfolio parametric var"
    );

    Ok(PortfolioVar {
        var,
        sigma,
        sigmas,
        correlation,
        observations: aligned.nrows(),
    })
}

pub(crate) fn check_window(window: usize) -> Result<(), VarError> {
    if window >= 2 {
        Ok(())
    } else {
        Err(VarError::InvalidRequest(format!(
            "window must be at least 2, got {}",
            window
        )))
    }
}

/// Trailing volatility, with insufficient and constant histories as errors.
pub(crate) fn window_sigma(returns: &[f64], window: usize) -> Result<f64, VarError> {
    let finite = finite_values(returns).len();
    if finite < 2 {
        return Err(VarError::InsufficientData {
            required: 2,
            actual: finite,
        });
    }

    let sigma = rolling_sigma(returns, window);
    if sigma == 0.0 {
        return Err(VarError::DegenerateVariance);
    }
    Ok(sigma)
}
