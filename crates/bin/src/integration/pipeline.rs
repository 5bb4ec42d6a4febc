//! Sweep pipeline for single instruments and portfolios.

use crate::config::AppConfig;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::time::Duration;
use tailrisk::data::{PriceFile, ReturnSeries};
use tailrisk::output::{ReportBuilder, VarReport};
use tailrisk::risk::portfolio::{align_returns, portfolio_returns};
use tailrisk::risk::{
    PortfolioError, PortfolioSpec, SimulationMethod, SweepCell, SweepConfig, VarError, VarWorker,
    parametric_sweep, portfolio_parametric_sweep, run_sweep,
};
use tracing::info;

type PipelineResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Fill `df_max` from the command line and make sure the sweep is runnable.
pub(crate) fn resolve_sweep(
    config: &AppConfig,
    df_max: Option<u32>,
) -> Result<SweepConfig, VarError> {
    let mut sweep = config.sweep.clone();
    if df_max.is_some() {
        sweep.df_max = df_max;
    }
    if sweep.df_max.is_none() && sweep.methods.contains(&SimulationMethod::StudentT) {
        return Err(VarError::InvalidRequest(
            "student_t needs a degrees-of-freedom bound: set sweep.df_max or pass --df-max".into(),
        ));
    }
    sweep.validate()?;
    Ok(sweep)
}

/// VaR report for one instrument of `prices`.
pub(crate) async fn single_report(
    prices: &PriceFile,
    instrument: &str,
    app: &AppConfig,
    sweep: &SweepConfig,
    show_progress: bool,
) -> PipelineResult<VarReport> {
    let series = prices.series(instrument)?;
    let returns = series.values();
    info!(instrument, observations = returns.len(), "loaded return series");

    let mut cells = parametric_sweep(&returns, sweep);
    cells.extend(simulate(&returns, app, sweep, show_progress).await?);

    Ok(ReportBuilder::new()
        .subject(instrument)
        .window(sweep.window)
        .observations(series.len())
        .period(series.date_range())
        .cells(&cells)
        .build()?)
}

/// VaR report for a weighted portfolio of instruments in `prices`.
///
/// `instruments` defaults to every instrument in the file. Monte Carlo cells
/// are simulated on the weighted return series over the common dates.
pub(crate) async fn portfolio_report(
    prices: &PriceFile,
    instruments: Option<Vec<String>>,
    weights: Option<&BTreeMap<String, f64>>,
    app: &AppConfig,
    sweep: &SweepConfig,
    show_progress: bool,
) -> PipelineResult<VarReport> {
    let ids = match instruments {
        Some(ids) => ids,
        None => match weights {
            Some(w) => w.keys().cloned().collect(),
            None => prices.instrument_ids(),
        },
    };
    let spec = PortfolioSpec::new(ids, weights)?;
    let series = spec
        .ids()
        .iter()
        .map(|id| prices.series(id))
        .collect::<Result<Vec<ReturnSeries>, _>>()?;

    let members: Vec<&ReturnSeries> = series.iter().collect();
    let aligned = align_returns(&members)?.finite_rows();
    if aligned.nrows() < 2 {
        return Err(PortfolioError::InsufficientOverlap {
            required: 2,
            actual: aligned.nrows(),
        }
        .into());
    }
    let combined = portfolio_returns(&aligned, spec.weights())?.to_vec();
    info!(
        instruments = spec.ids().len(),
        rows = combined.len(),
        "built weighted portfolio series"
    );

    let mut cells = portfolio_parametric_sweep(&spec, &series, sweep);
    cells.extend(simulate(&combined, app, sweep, show_progress).await?);

    let period = aligned
        .dates()
        .first()
        .zip(aligned.dates().last())
        .map(|(a, b)| (*a, *b));

    Ok(ReportBuilder::new()
        .subject(portfolio_subject(&spec))
        .window(sweep.window)
        .observations(aligned.nrows())
        .period(period)
        .cells(&cells)
        .build()?)
}

/// Parse `A=0.6,B=0.4` into raw weights.
pub(crate) fn parse_weights(raw: &str) -> Result<BTreeMap<String, f64>, PortfolioError> {
    let mut weights = BTreeMap::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (id, value) = part.split_once('=').ok_or_else(|| {
            PortfolioError::InvalidWeights(format!("expected ID=WEIGHT, got '{}'", part))
        })?;
        let value: f64 = value.trim().parse().map_err(|_| {
            PortfolioError::InvalidWeights(format!("weight for {} is not a number", id.trim()))
        })?;
        if weights.insert(id.trim().to_string(), value).is_some() {
            return Err(PortfolioError::DuplicateInstrument(id.trim().to_string()));
        }
    }
    Ok(weights)
}

fn portfolio_subject(spec: &PortfolioSpec) -> String {
    let members: Vec<String> = spec
        .ids()
        .iter()
        .zip(spec.weights())
        .map(|(id, w)| format!("{} {:.1}%", id, w * 100.0))
        .collect();
    format!("Portfolio ({})", members.join(", "))
}

async fn simulate(
    returns: &[f64],
    app: &AppConfig,
    sweep: &SweepConfig,
    show_progress: bool,
) -> PipelineResult<Vec<SweepCell>> {
    let worker = VarWorker::new(sweep.seed).with_limits(app.limits);

    let pb = if show_progress {
        ProgressBar::new(sweep.simulation_cells() as u64)
    } else {
        ProgressBar::hidden()
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("█▓░"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Simulating...");

    let cells = run_sweep(&worker, returns, sweep, |cell| {
        pb.set_message(format!(
            "{} c={} T={}",
            cell.method.label(),
            cell.confidence,
            cell.horizon
        ));
        pb.inc(1);
    })
    .await?;

    pb.finish_with_message("Done");
    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const PRICES: &str = r#"{
        "instruments": {
            "AAA": [
                {"date": "2024-01-02", "price": 100.0},
                {"date": "2024-01-03", "price": 101.0},
                {"date": "2024-01-04", "price": 99.5},
                {"date": "2024-01-05", "price": 100.2},
                {"date": "2024-01-08", "price": 98.9},
                {"date": "2024-01-09", "price": 99.7}
            ],
            "BBB": [
                {"date": "2024-01-02", "price": 50.0},
                {"date": "2024-01-03", "price": 50.4},
                {"date": "2024-01-04", "price": 49.9},
                {"date": "2024-01-05", "price": 50.6},
                {"date": "2024-01-08", "price": 50.1},
                {"date": "2024-01-09", "price": 50.3}
            ]
        }
    }"#;

    fn test_config() -> AppConfig {
        let mut app = AppConfig::default();
        app.sweep.window = 5;
        app.sweep.simulation_count = 500;
        app.sweep.confidences = vec![0.95];
        app.sweep.horizons = vec![1, 5];
        app.sweep.seed = Some(3);
        app
    }

    #[test]
    fn test_parse_weights() {
        let w = parse_weights("AAA=0.6, BBB=0.4").unwrap();
        assert_eq!(w.get("AAA"), Some(&0.6));
        assert_eq!(w.get("BBB"), Some(&0.4));
    }

    #[rstest]
    #[case("AAA")]
    #[case("AAA=x")]
    #[case("AAA=1,AAA=2")]
    fn test_parse_weights_rejects(#[case] raw: &str) {
        assert!(parse_weights(raw).is_err());
    }

    #[test]
    fn test_student_t_requires_df_max() {
        let app = test_config();
        assert!(resolve_sweep(&app, None).is_err());
        assert_eq!(resolve_sweep(&app, Some(30)).unwrap().df_max, Some(30));
    }

    #[tokio::test]
    async fn test_single_report_has_every_cell() {
        let app = test_config();
        let sweep = resolve_sweep(&app, Some(20)).unwrap();
        let prices = PriceFile::from_json_str(PRICES).unwrap();

        let report = single_report(&prices, "AAA", &app, &sweep, false)
            .await
            .unwrap();

        // 2 parametric cells plus 3 methods x 2 horizons
        assert_eq!(report.rows.len(), 8);
        assert_eq!(report.observations, 5);
        assert_eq!(report.failures().count(), 0);
    }

    #[tokio::test]
    async fn test_portfolio_report_defaults_to_all_instruments() {
        let app = test_config();
        let sweep = resolve_sweep(&app, Some(20)).unwrap();
        let prices = PriceFile::from_json_str(PRICES).unwrap();

        let report = portfolio_report(&prices, None, None, &app, &sweep, false)
            .await
            .unwrap();

        assert_eq!(report.subject, "Portfolio (AAA 50.0%, BBB 50.0%)");
        assert_eq!(report.rows.len(), 8);
    }
}
