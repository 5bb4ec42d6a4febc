//! Method × confidence × horizon sweeps.

use super::parametric::{check_window, parametric_var, portfolio_parametric_var, window_sigma};
use super::{
    SimulationMethod, SimulationRequest, SimulationResult, VarError, VarWorker, check_confidence,
    check_horizon,
};
use crate::fitting::{DfGrid, FitObjective};
use crate::portfolio::PortfolioSpec;
use serde::{Deserialize, Serialize};
use tailrisk_data::ReturnSeries;
use tracing::{info, warn};

/// Parameters of a VaR sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Trailing estimation window in trading days
    pub window: usize,
    /// Confidence levels, each in (0, 1)
    pub confidences: Vec<f64>,
    /// Holding periods in trading days
    pub horizons: Vec<u32>,
    /// Monte Carlo trials per cell
    pub simulation_count: usize,
    /// Monte Carlo regimes to run
    pub methods: Vec<SimulationMethod>,
    /// Upper bound of the ν grid; required when `methods` has `student_t`
    pub df_max: Option<u32>,
    /// Remove the pool mean before simulating
    pub zero_drift: bool,
    /// Likelihood objective for the Student-t ν fit
    pub fit_objective: FitObjective,
    /// Base seed for reproducible sweeps
    pub seed: Option<u64>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            window: 252,
            confidences: vec![0.95, 0.99],
            horizons: vec![1, 5, 10],
            simulation_count: 200_000,
            methods: SimulationMethod::ALL.to_vec(),
            df_max: None,
            zero_drift: true,
            fit_objective: FitObjective::UnitScale,
            seed: None,
        }
    }
}

impl SweepConfig {
    /// Check the grid before any cell is computed.
    pub fn validate(&self) -> Result<(), VarError> {
        check_window(self.window)?;
        if self.confidences.is_empty() || self.horizons.is_empty() {
            return Err(VarError::InvalidRequest(
                "sweep needs at least one confidence and one horizon".into(),
            ));
        }
        for &c in &self.confidences {
            check_confidence(c)?;
        }
        for &h in &self.horizons {
            check_horizon(h)?;
        }
        if self.simulation_count < 1 {
            return Err(VarError::InvalidRequest(
                "simulation_count must be at least 1".into(),
            ));
        }
        if self.methods.contains(&SimulationMethod::StudentT) {
            let df_max = self.df_max.ok_or_else(|| {
                VarError::InvalidRequest("df_max is required for student_t".into())
            })?;
            DfGrid::new(df_max)?;
        }
        Ok(())
    }

    /// Number of Monte Carlo cells
    pub fn simulation_cells(&self) -> usize {
        self.methods.len() * self.confidences.len() * self.horizons.len()
    }

    fn request(
        &self,
        returns: &[f64],
        method: SimulationMethod,
        confidence: f64,
        horizon: u32,
    ) -> SimulationRequest {
        let request = SimulationRequest::new(
            returns.to_vec(),
            confidence,
            horizon,
            self.simulation_count,
            method,
            self.zero_drift,
        )
        .with_window(self.window)
        .with_fit_objective(self.fit_objective);
        match self.df_max {
            Some(df_max) => request.with_df_max(df_max),
            None => request,
        }
    }

    fn grid(&self) -> impl Iterator<Item = (f64, u32)> + '_ {
        self.confidences
            .iter()
            .flat_map(|&c| self.horizons.iter().map(move |&h| (c, h)))
    }
}

/// How a sweep cell was estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellMethod {
    /// Closed-form Normal VaR
    Parametric,
    /// Monte Carlo under the given regime
    MonteCarlo(SimulationMethod),
}

impl CellMethod {
    /// Short label used in reports
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Parametric => "parametric",
            Self::MonteCarlo(SimulationMethod::Normal) => "mc_normal",
            Self::MonteCarlo(SimulationMethod::StudentT) => "mc_student_t",
            Self::MonteCarlo(SimulationMethod::Bootstrap) => "mc_bootstrap",
        }
    }
}

/// One (method, confidence, horizon) estimate.
///
/// A failed estimate keeps its message so the remaining cells still report.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepCell {
    /// Estimation method
    pub method: CellMethod,
    /// Confidence level
    pub confidence: f64,
    /// Holding period in trading days
    pub horizon: u32,
    /// Estimate or failure message
    pub outcome: Result<SimulationResult, String>,
}

/// Run every Monte Carlo cell of `config` through `worker`, one at a time.
///
/// Each cell is awaited before the next is issued. `on_progress` sees every
/// finished cell. Only an invalid `config` fails the whole sweep.
pub async fn run_sweep<F>(
    worker: &VarWorker,
    returns: &[f64],
    config: &SweepConfig,
    mut on_progress: F,
) -> Result<Vec<SweepCell>, VarError>
where
    F: FnMut(&SweepCell),
{
    config.validate()?;

    let total = config.simulation_cells();
    let mut cells = Vec::with_capacity(total);
    for &method in &config.methods {
        for (confidence, horizon) in config.grid() {
            let request = config.request(returns, method, confidence, horizon);
            let outcome = worker.submit(request).await.map_err(|e| e.to_string());
            if let Err(message) = &outcome {
                warn!(%method, confidence, horizon, error = %message, "sweep cell failed");
            }

            let cell = SweepCell {
                method: CellMethod::MonteCarlo(method),
                confidence,
                horizon,
                outcome,
            };
            on_progress(&cell);
            cells.push(cell);
            info!(done = cells.len(), total, "sweep progress");
        }
    }

    Ok(cells)
}

/// Closed-form Normal cells for every (confidence, horizon) of `config`.
pub fn parametric_sweep(returns: &[f64], config: &SweepConfig) -> Vec<SweepCell> {
    config
        .grid()
        .map(|(confidence, horizon)| {
            let outcome = window_sigma(returns, config.window).and_then(|sigma| {
                parametric_var(returns, config.window, confidence, horizon).map(|var| {
                    SimulationResult {
                        var,
                        mu: None,
                        sigma: Some(sigma),
                        nu: None,
                    }
                })
            });
            parametric_cell(confidence, horizon, outcome)
        })
        .collect()
}

/// Closed-form Normal portfolio cells for every (confidence, horizon) of `config`.
pub fn portfolio_parametric_sweep(
    spec: &PortfolioSpec,
    series: &[ReturnSeries],
    config: &SweepConfig,
) -> Vec<SweepCell> {
    config
        .grid()
        .map(|(confidence, horizon)| {
            let outcome = portfolio_parametric_var(spec, series, config.window, confidence, horizon)
                .map(|p| SimulationResult {
                    var: p.var,
                    mu: None,
                    sigma: Some(p.sigma),
                    nu: None,
                });
            parametric_cell(confidence, horizon, outcome)
        })
        .collect()
}

fn parametric_cell(
    confidence: f64,
    horizon: u32,
    outcome: Result<SimulationResult, VarError>,
) -> SweepCell {
    if let Err(e) = &outcome {
        warn!(confidence, horizon, error = %e, "parametric cell failed");
    }
    SweepCell {
        method: CellMethod::Parametric,
        confidence,
        horizon,
        outcome: outcome.map_err(|e| e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn returns() -> Vec<f64> {
        vec![
            0.01, -0.02, 0.015, -0.01, 0.005, 0.012, -0.007, 0.003, -0.015, 0.009, 0.002, -0.004,
        ]
    }

    fn small_config() -> SweepConfig {
        SweepConfig {
            window: 10,
            simulation_count: 2_000,
            df_max: Some(30),
            seed: Some(5),
            ..SweepConfig::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = SweepConfig::default();
        assert_eq!(config.window, 252);
        assert_eq!(config.simulation_cells(), 18);
        assert_eq!(config.df_max, None);
        assert!(matches!(config.validate(), Err(VarError::InvalidRequest(_))));
    }

    #[test]
    fn test_validate_without_student_t_needs_no_df_max() {
        let config = SweepConfig {
            methods: vec![SimulationMethod::Normal, SimulationMethod::Bootstrap],
            ..SweepConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_sweep_visits_every_cell_in_order() {
        let config = small_config();
        let worker = VarWorker::new(config.seed);
        let mut seen = 0;

        let cells = run_sweep(&worker, &returns(), &config, |_| seen += 1)
            .await
            .unwrap();

        assert_eq!(cells.len(), 18);
        assert_eq!(seen, 18);
        assert_eq!(cells[0].method, CellMethod::MonteCarlo(SimulationMethod::Normal));
        assert_eq!((cells[0].confidence, cells[0].horizon), (0.95, 1));
        assert_eq!((cells[5].confidence, cells[5].horizon), (0.99, 10));
        assert_eq!(cells[17].method, CellMethod::MonteCarlo(SimulationMethod::Bootstrap));
        assert!(cells.iter().all(|c| c.outcome.is_ok()));
    }

    #[tokio::test]
    async fn test_failed_cell_does_not_stop_sweep() {
        // The draw budget rejects only the longest horizon
        let config = SweepConfig {
            horizons: vec![1, 2_000],
            methods: vec![SimulationMethod::Normal],
            simulation_count: 40_000,
            ..small_config()
        };
        let worker = VarWorker::new(Some(1));

        let cells = run_sweep(&worker, &returns(), &config, |_| {}).await.unwrap();

        assert_eq!(cells.len(), 4);
        assert!(cells[0].outcome.is_ok());
        assert!(cells[1].outcome.is_err());
        assert!(cells[2].outcome.is_ok());
        assert!(cells[3].outcome.is_err());
    }

    #[test]
    fn test_parametric_sweep() {
        let config = small_config();
        let cells = parametric_sweep(&returns(), &config);

        assert_eq!(cells.len(), 6);
        let first = cells[0].outcome.as_ref().unwrap();
        let sigma = first.sigma.unwrap();
        assert_abs_diff_eq!(first.var, 1.645 * sigma, epsilon = 1e-15);
        assert!(cells.iter().all(|c| c.method == CellMethod::Parametric));
    }

    #[test]
    fn test_parametric_sweep_keeps_failures() {
        let cells = parametric_sweep(&[0.01], &small_config());
        assert!(cells.iter().all(|c| c.outcome.is_err()));
    }

    #[test]
    fn test_requests_carry_sweep_settings() {
        let config = SweepConfig {
            fit_objective: FitObjective::VarianceMatched,
            zero_drift: false,
            ..small_config()
        };
        let request = config.request(&returns(), SimulationMethod::StudentT, 0.99, 5);

        assert_eq!(request.fit_objective, FitObjective::VarianceMatched);
        assert!(!request.zero_drift);
        assert_eq!(request.df_max, Some(30));
        assert_eq!(request.window, Some(10));
    }

    #[test]
    fn test_labels() {
        assert_eq!(CellMethod::Parametric.label(), "parametric");
        assert_eq!(
            CellMethod::MonteCarlo(SimulationMethod::StudentT).label(),
            "mc_student_t"
        );
    }
}
