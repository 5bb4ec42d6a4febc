//! Monte Carlo VaR.
//!
//! Each trial sums `horizon` independent daily draws into a cumulative log
//! return. The reported VaR is the negated `1 − confidence` quantile of the
//! trials, floored at zero.

use super::{SimulationMethod, VarError, check_confidence, check_horizon};
use crate::fitting::{DfGrid, FitObjective, StudentTFitter};
use crate::sampling;
use crate::stats::{empirical_quantile_in_place, finite_values, mean, std};
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

/// Upper bounds on the work a single request may ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationLimits {
    /// Maximum number of trials
    pub max_simulations: usize,
    /// Maximum holding period in days
    pub max_horizon: u32,
    /// Maximum `simulations × horizon` daily draws
    pub max_draws: usize,
}

impl Default for SimulationLimits {
    fn default() -> Self {
        Self {
            max_simulations: 2_000_000,
            max_horizon: 2_500,
            max_draws: 60_000_000,
        }
    }
}

/// One Monte Carlo VaR computation.
///
/// Serializes with camelCase field names. `zeroDrift` defaults to `true`
/// and `fitObjective` to `unit_scale` when absent from JSON. `null` entries
/// in `returns` read as missing observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRequest {
    /// Daily log returns, oldest first
    #[serde(deserialize_with = "nullable_values")]
    pub returns: Vec<f64>,
    /// Confidence level in (0, 1)
    pub confidence: f64,
    /// Holding period in trading days
    pub horizon: u32,
    /// Number of simulated trials
    pub simulation_count: usize,
    /// Simulation regime
    pub method: SimulationMethod,
    /// Upper bound of the ν grid, required for [`SimulationMethod::StudentT`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub df_max: Option<u32>,
    /// Remove the pool mean: μ = 0 for the parametric regimes and a
    /// mean-centred pool for bootstrap
    #[serde(default = "zero_drift_default")]
    pub zero_drift: bool,
    /// Likelihood objective for the Student-t ν fit
    #[serde(default)]
    pub fit_objective: FitObjective,
    /// Trailing number of finite returns forming the pool; all if absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<usize>,
}

impl SimulationRequest {
    /// Request over the whole `returns` history, without a ν bound.
    pub fn new(
        returns: Vec<f64>,
        confidence: f64,
        horizon: u32,
        simulation_count: usize,
        method: SimulationMethod,
        zero_drift: bool,
    ) -> Self {
        Self {
            returns,
            confidence,
            horizon,
            simulation_count,
            method,
            df_max: None,
            zero_drift,
            fit_objective: FitObjective::default(),
            window: None,
        }
    }

    /// Set the upper bound of the ν grid.
    pub fn with_df_max(mut self, df_max: u32) -> Self {
        self.df_max = Some(df_max);
        self
    }

    /// Fit ν with `objective` instead of the default.
    pub fn with_fit_objective(mut self, objective: FitObjective) -> Self {
        self.fit_objective = objective;
        self
    }

    /// Restrict the pool to the trailing `window` finite returns.
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = Some(window);
        self
    }

    /// Check parameters against `limits` without looking at the data.
    pub fn validate(&self, limits: &SimulationLimits) -> Result<(), VarError> {
        check_confidence(self.confidence)?;
        check_horizon(self.horizon)?;

        if self.simulation_count < 1 {
            return Err(invalid("simulationCount must be at least 1".into()));
        }
        if self.simulation_count > limits.max_simulations {
            return Err(invalid(format!(
                "simulationCount too large (max {})",
                limits.max_simulations
            )));
        }
        if self.horizon > limits.max_horizon {
            return Err(invalid(format!(
                "horizon too large (max {})",
                limits.max_horizon
            )));
        }
        let draws = self.simulation_count.saturating_mul(self.horizon as usize);
        if draws > limits.max_draws {
            return Err(invalid(format!(
                "simulationCount * horizon too large (max {})",
                limits.max_draws
            )));
        }
        if self.window.is_some_and(|w| w < 2) {
            return Err(invalid("window must be at least 2".into()));
        }
        if self.method == SimulationMethod::StudentT {
            let df_max = self
                .df_max
                .ok_or_else(|| invalid("dfMax is required for student_t".into()))?;
            DfGrid::new(df_max)?;
        }

        Ok(())
    }

    /// Finite returns the simulation draws from.
    pub fn pool(&self) -> Vec<f64> {
        let finite = finite_values(&self.returns);
        match self.window {
            Some(w) => finite[finite.len().saturating_sub(w)..].to_vec(),
            None => finite,
        }
    }
}

/// Outcome of a simulation.
///
/// `var` is `NaN` when the pool cannot support the regime (fewer than two
/// finite returns, or zero volatility for the parametric regimes); it
/// serializes as `null`. Parameters that do not apply are left out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Value-at-Risk as a non-negative loss fraction
    #[serde(deserialize_with = "nullable_value")]
    pub var: f64,
    /// Daily drift used by the simulation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mu: Option<f64>,
    /// Daily volatility of the pool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sigma: Option<f64>,
    /// Fitted Student-t degrees of freedom
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nu: Option<u32>,
}

impl SimulationResult {
    const fn undefined() -> Self {
        Self {
            var: f64::NAN,
            mu: None,
            sigma: None,
            nu: None,
        }
    }
}

/// Run `request` under the default [`SimulationLimits`].
pub fn compute_var<R: Rng + ?Sized>(
    request: &SimulationRequest,
    rng: &mut R,
) -> Result<SimulationResult, VarError> {
    compute_var_with_limits(request, &SimulationLimits::default(), rng)
}

/// Run `request`, drawing every variate from `rng`.
///
/// Parameter errors are returned before any data is inspected. Data that
/// cannot support an estimate yields `var = NaN` instead of an error.
pub fn compute_var_with_limits<R: Rng + ?Sized>(
    request: &SimulationRequest,
    limits: &SimulationLimits,
    rng: &mut R,
) -> Result<SimulationResult, VarError> {
    request.validate(limits)?;

    let pool = request.pool();
    if pool.len() < 2 {
        debug!(
            observations = pool.len(),
            "too few finite returns, var undefined"
        );
        return Ok(SimulationResult::undefined());
    }

    let mu = if request.zero_drift { 0.0 } else { mean(&pool) };
    let sigma = std(&pool);
    let degenerate = !(sigma > 0.0 && sigma.is_finite());
    let horizon = request.horizon as usize;
    let trials = request.simulation_count;

    let result = match request.method {
        SimulationMethod::Normal => {
            let var = if degenerate {
                f64::NAN
            } else {
                let totals = simulate(trials, horizon, rng, |rng| {
                    mu + sigma * sampling::standard_normal(rng)
                });
                loss_quantile(totals, request.confidence)
            };
            SimulationResult {
                var,
                mu: Some(mu),
                sigma: Some(sigma),
                nu: None,
            }
        }
        SimulationMethod::StudentT => {
            let grid = DfGrid::new(request.df_max.unwrap_or_default())?;
            let fit = StudentTFitter::new(grid)
                .with_objective(request.fit_objective)
                .fit(&pool, mu, sigma);
            let var = if degenerate {
                f64::NAN
            } else {
                let nu = f64::from(fit.nu);
                let scale = if nu > 2.0 {
                    sigma * ((nu - 2.0) / nu).sqrt()
                } else {
                    sigma
                };
                let totals = simulate(trials, horizon, rng, |rng| {
                    mu + scale * sampling::student_t(nu, rng)
                });
                loss_quantile(totals, request.confidence)
            };
            SimulationResult {
                var,
                mu: Some(mu),
                sigma: Some(sigma),
                nu: Some(fit.nu),
            }
        }
        SimulationMethod::Bootstrap => {
            let shift = if request.zero_drift { mean(&pool) } else { 0.0 };
            let totals = simulate(trials, horizon, rng, |rng| {
                pool[rng.gen_range(0..pool.len())] - shift
            });
            SimulationResult {
                var: loss_quantile(totals, request.confidence),
                mu: None,
                sigma: None,
                nu: None,
            }
        }
    };

    debug!(
        method = %request.method,
        pool = pool.len(),
        trials,
        horizon,
        var = result.var,
        "monte carlo var"
    );
    Ok(result)
}

/// Sum `horizon` daily draws for each of `trials` trials.
fn simulate<R, F>(trials: usize, horizon: usize, rng: &mut R, mut draw: F) -> Vec<f64>
where
    R: Rng + ?Sized,
    F: FnMut(&mut R) -> f64,
{
    let mut totals = Vec::with_capacity(trials);
    for _ in 0..trials {
        let mut total = 0.0;
        for _ in 0..horizon {
            total += draw(rng);
        }
        totals.push(total);
    }
    totals
}

/// `max(0, −quantile(totals, 1 − confidence))`, `NaN` passed through.
fn loss_quantile(mut totals: Vec<f64>, confidence: f64) -> f64 {
    let loss = -empirical_quantile_in_place(&mut totals, 1.0 - confidence);
    if loss.is_nan() || loss > 0.0 {
        loss
    } else {
        0.0
    }
}

fn invalid(message: String) -> VarError {
    VarError::InvalidRequest(message)
}

const fn zero_drift_default() -> bool {
    true
}

fn nullable_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

fn nullable_values<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
    Ok(Vec::<Option<f64>>::deserialize(deserializer)?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}
