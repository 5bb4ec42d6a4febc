//! Dated log-return series.
//!
//! A [`ReturnSeries`] is the immutable input to every estimator in the
//! engine: one instrument, one observation per trading date, dates strictly
//! increasing. Non-finite returns are allowed here and filtered by the
//! estimators that consume the series.

use crate::error::{DataError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single dated log return, `ln(price_t / price_{t-1})`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnObservation {
    /// Trading date of the closing price the return ends on
    pub date: NaiveDate,
    /// Log return over the preceding period
    pub log_return: f64,
}

impl ReturnObservation {
    /// Create a new observation.
    pub const fn new(date: NaiveDate, log_return: f64) -> Self {
        Self { date, log_return }
    }
}

/// Ordered log-return history for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    instrument: String,
    observations: Vec<ReturnObservation>,
}

impl ReturnSeries {
    /// Create a series from observations that are already ordered.
    ///
    /// # Errors
    /// Returns [`DataError::UnorderedDates`] if any date does not strictly
    /// follow its predecessor.
    pub fn new(
        instrument: impl Into<String>,
        observations: Vec<ReturnObservation>,
    ) -> Result<Self> {
        let instrument = instrument.into();
        for pair in observations.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(DataError::UnorderedDates {
                    instrument,
                    date: pair[1].date.to_string(),
                    previous: pair[0].date.to_string(),
                });
            }
        }
        Ok(Self {
            instrument,
            observations,
        })
    }

    /// Build a log-return series from a raw price history.
    ///
    /// Prices may arrive in any order. When a date appears more than once the
    /// last price given for it wins. The first date has no return and is
    /// dropped, so `n` distinct dates yield `n - 1` observations.
    ///
    /// # Errors
    /// Returns [`DataError::InsufficientPrices`] when fewer than two distinct
    /// dates remain.
    pub fn from_prices<I>(instrument: impl Into<String>, prices: I) -> Result<Self>
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        let instrument = instrument.into();

        let mut by_date = BTreeMap::new();
        for (date, price) in prices {
            by_date.insert(date, price);
        }

        if by_date.len() < 2 {
            return Err(DataError::InsufficientPrices {
                instrument,
                required: 2,
                actual: by_date.len(),
            });
        }

        let points: Vec<(NaiveDate, f64)> = by_date.into_iter().collect();
        let observations = points
            .windows(2)
            .map(|pair| ReturnObservation::new(pair[1].0, (pair[1].1 / pair[0].1).ln()))
            .collect();

        Ok(Self {
            instrument,
            observations,
        })
    }

    /// Instrument identifier
    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    /// All observations, oldest first
    pub fn observations(&self) -> &[ReturnObservation] {
        &self.observations
    }

    /// Number of observations
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Whether the series holds no observations
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Log returns in date order, including non-finite values.
    pub fn values(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.log_return).collect()
    }

    /// The trailing `window` observations, or the whole series if shorter.
    pub fn trailing(&self, window: usize) -> &[ReturnObservation] {
        let start = self.observations.len().saturating_sub(window);
        &self.observations[start..]
    }

    /// Log returns of the trailing `window` observations.
    pub fn trailing_values(&self, window: usize) -> Vec<f64> {
        self.trailing(window).iter().map(|o| o.log_return).collect()
    }

    /// First and last observation dates, if any.
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.observations.first(), self.observations.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date)),
            _ => None,
        }
    }
}
