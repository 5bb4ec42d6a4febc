//! VaR report generation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tailrisk_risk::SweepCell;
use thiserror::Error;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// A required builder field was not set.
    #[error("Missing report field: {0}")]
    MissingField(&'static str),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One estimate in a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    /// Estimation method label, e.g. `parametric` or `mc_student_t`
    pub method: String,
    /// Confidence level
    pub confidence: f64,
    /// Holding period in trading days
    pub horizon: u32,
    /// VaR as a loss fraction; absent when undefined or failed
    pub var: Option<f64>,
    /// Simulation drift
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mu: Option<f64>,
    /// Daily volatility
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sigma: Option<f64>,
    /// Fitted Student-t degrees of freedom
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nu: Option<u32>,
    /// Failure message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&SweepCell> for ReportRow {
    fn from(cell: &SweepCell) -> Self {
        let mut row = Self {
            method: cell.method.label().to_string(),
            confidence: cell.confidence,
            horizon: cell.horizon,
            var: None,
            mu: None,
            sigma: None,
            nu: None,
            error: None,
        };
        match &cell.outcome {
            Ok(result) => {
                row.var = result.var.is_finite().then_some(result.var);
                row.mu = result.mu;
                row.sigma = result.sigma;
                row.nu = result.nu;
            }
            Err(message) => row.error = Some(message.clone()),
        }
        row
    }
}

/// VaR estimates for one instrument or portfolio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarReport {
    /// Instrument id or portfolio description
    pub subject: String,

    /// Report generation timestamp
    pub generated_at: DateTime<Utc>,

    /// Estimation window in trading days
    pub window: usize,

    /// Return observations available
    pub observations: usize,

    /// First and last return date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<(NaiveDate, NaiveDate)>,

    /// Estimates in the order they were produced
    pub rows: Vec<ReportRow>,
}

impl VarReport {
    /// Create a report stamped with the current time.
    pub fn new(subject: String, window: usize, observations: usize, rows: Vec<ReportRow>) -> Self {
        Self {
            subject,
            generated_at: Utc::now(),
            window,
            observations,
            period: None,
            rows,
        }
    }

    /// Rows that failed
    pub fn failures(&self) -> impl Iterator<Item = &ReportRow> {
        self.rows.iter().filter(|r| r.error.is_some())
    }

    /// Convert report to JSON string.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the JSON rendering to `path`.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ReportError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Render as a fixed-width text table.
    pub fn to_text_table(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("\nValue-at-Risk: {}\n", self.subject));
        if let Some((start, end)) = self.period {
            output.push_str(&format!("Period: {} to {}\n", start, end));
        }
        output.push_str(&format!(
            "Window: {} days, {} observations\n",
            self.window, self.observations
        ));
        output.push_str(&"=".repeat(80));
        output.push('\n');

        output.push_str(&format!(
            "{:<14} {:>10} {:>8} {:>10} {:>10} {:>6}  {}\n",
            "Method", "Conf", "Horizon", "VaR", "Sigma", "Nu", "Note"
        ));
        output.push_str(&"-".repeat(80));
        output.push('\n');

        for row in &self.rows {
            let var = row
                .var
                .map_or_else(|| "n/a".to_string(), |v| format!("{:.2}%", v * 100.0));
            let sigma = row
                .sigma
                .map_or_else(|| "-".to_string(), |s| format!("{:.2}%", s * 100.0));
            let nu = row.nu.map_or_else(|| "-".to_string(), |n| n.to_string());
            output.push_str(&format!(
                "{:<14} {:>9.1}% {:>8} {:>10} {:>10} {:>6}  {}\n",
                row.method,
                row.confidence * 100.0,
                row.horizon,
                var,
                sigma,
                nu,
                row.error.as_deref().unwrap_or("")
            ));
        }

        output.push_str(&"=".repeat(80));
        output.push('\n');
        output
    }
}

/// Builder for creating reports.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    subject: Option<String>,
    window: Option<usize>,
    observations: usize,
    period: Option<(NaiveDate, NaiveDate)>,
    rows: Vec<ReportRow>,
}

impl ReportBuilder {
    /// Create a new report builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the subject.
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Set the estimation window.
    pub const fn window(mut self, window: usize) -> Self {
        self.window = Some(window);
        self
    }

    /// Set the number of return observations.
    pub const fn observations(mut self, observations: usize) -> Self {
        self.observations = observations;
        self
    }

    /// Set the covered date range.
    pub const fn period(mut self, period: Option<(NaiveDate, NaiveDate)>) -> Self {
        self.period = period;
        self
    }

    /// Append rows for sweep cells.
    pub fn cells<'a>(mut self, cells: impl IntoIterator<Item = &'a SweepCell>) -> Self {
        self.rows.extend(cells.into_iter().map(ReportRow::from));
        self
    }

    /// Append one row.
    pub fn row(mut self, row: ReportRow) -> Self {
        self.rows.push(row);
        self
    }

    /// Build the report.
    pub fn build(self) -> Result<VarReport, ReportError> {
        let subject = self.subject.ok_or(ReportError::MissingField("subject"))?;
        let window = self.window.ok_or(ReportError::MissingField("window"))?;

        let mut report = VarReport::new(subject, window, self.observations, self.rows);
        report.period = self.period;
        Ok(report)
    }
}
