//! Glue between price files, the VaR engine and reports.
//!
//! `pipeline` turns a price file into return series, runs the closed-form and
//! Monte Carlo sweeps and assembles a report. `request` answers a single wire
//! request.

pub(crate) mod pipeline;
pub(crate) mod request;
