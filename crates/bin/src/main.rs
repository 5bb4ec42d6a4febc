//! tailrisk CLI binary.
//!
//! Provides command-line access to the VaR engine: sweeps over a single
//! instrument or a weighted portfolio loaded from a JSON price file, and a
//! one-shot wire request mode.

mod config;
mod integration;

use clap::{Parser, Subcommand};
use config::AppConfig;
use integration::pipeline::{parse_weights, portfolio_report, resolve_sweep, single_report};
use std::io::Read;
use std::path::PathBuf;
use std::process;
use tailrisk::data::PriceFile;
use tailrisk::output::VarReport;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tailrisk")]
#[command(about = "tailrisk: parametric and Monte Carlo Value-at-Risk", long_about = None)]
#[command(version = tailrisk::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// VaR sweep for one instrument
    Single {
        /// JSON price file
        #[arg(long)]
        prices: PathBuf,

        /// Instrument id in the price file
        #[arg(long)]
        instrument: String,

        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Upper bound of the Student-t degrees-of-freedom grid
        #[arg(long)]
        df_max: Option<u32>,

        /// Output format (json or text)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// VaR sweep for a weighted portfolio
    Portfolio {
        /// JSON price file
        #[arg(long)]
        prices: PathBuf,

        /// Comma-separated instrument ids (default: weighted ids, else every instrument)
        #[arg(long, value_delimiter = ',')]
        instruments: Option<Vec<String>>,

        /// Weights as ID=WEIGHT pairs, e.g. A=0.6,B=0.4 (default: equal weights)
        #[arg(long)]
        weights: Option<String>,

        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Upper bound of the Student-t degrees-of-freedom grid
        #[arg(long)]
        df_max: Option<u32>,

        /// Output format (json or text)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Answer one JSON simulation request
    Request {
        /// Request file (default: stdin)
        #[arg(long)]
        file: Option<PathBuf>,

        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    init_logging();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Single {
            prices,
            instrument,
            config,
            df_max,
            format,
        } => {
            let app = AppConfig::load(config.as_deref())?;
            let sweep = resolve_sweep(&app, df_max)?;
            let prices = PriceFile::from_path(&prices)?;
            let is_json = is_json(&format);

            let report = single_report(&prices, &instrument, &app, &sweep, !is_json).await?;
            print_report(&report, is_json)?;
        }
        Commands::Portfolio {
            prices,
            instruments,
            weights,
            config,
            df_max,
            format,
        } => {
            let app = AppConfig::load(config.as_deref())?;
            let sweep = resolve_sweep(&app, df_max)?;
            let prices = PriceFile::from_path(&prices)?;
            let weights = weights.as_deref().map(parse_weights).transpose()?;
            let is_json = is_json(&format);

            let report = portfolio_report(
                &prices,
                instruments,
                weights.as_ref(),
                &app,
                &sweep,
                !is_json,
            )
            .await?;
            print_report(&report, is_json)?;
        }
        Commands::Request { file, config } => {
            let app = AppConfig::load(config.as_deref())?;
            let body = match file {
                Some(path) => std::fs::read_to_string(path)?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };

            let response = integration::request::respond(&body, app.limits, app.sweep.seed).await;
            println!("{}", response);
        }
    }

    Ok(())
}

fn is_json(format: &str) -> bool {
    format.to_lowercase() == "json"
}

fn print_report(report: &VarReport, is_json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if is_json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.to_text_table());
    }
    Ok(())
}
