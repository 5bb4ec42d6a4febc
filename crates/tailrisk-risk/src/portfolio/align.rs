//! Date alignment of return series.

use super::PortfolioError;
use chrono::NaiveDate;
use ndarray::{Array1, Array2, Axis};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tailrisk_data::ReturnSeries;

/// Returns of several instruments on their common dates.
///
/// Rows are dates in ascending order, columns follow `ids`.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedReturns {
    ids: Vec<String>,
    dates: Vec<NaiveDate>,
    values: Array2<f64>,
}

/// Align series on the intersection of their dates.
///
/// Columns keep the order of `series`. Values are copied as-is, so rows may
/// still contain non-finite returns; see [`AlignedReturns::finite_rows`].
pub fn align_returns(series: &[&ReturnSeries]) -> Result<AlignedReturns, PortfolioError> {
    let mut seen = HashSet::new();
    for s in series {
        if !seen.insert(s.instrument()) {
            return Err(PortfolioError::DuplicateInstrument(s.instrument().to_string()));
        }
    }

    let indexed: Vec<BTreeMap<NaiveDate, f64>> = series
        .iter()
        .map(|s| {
            s.observations()
                .iter()
                .map(|o| (o.date, o.log_return))
                .collect()
        })
        .collect();

    let mut common: BTreeSet<NaiveDate> = indexed
        .first()
        .map(|m| m.keys().copied().collect())
        .unwrap_or_default();
    for index in indexed.iter().skip(1) {
        common.retain(|d| index.contains_key(d));
    }

    let dates: Vec<NaiveDate> = common.into_iter().collect();
    let mut values = Array2::<f64>::zeros((dates.len(), series.len()));
    for (col, index) in indexed.iter().enumerate() {
        for (row, date) in dates.iter().enumerate() {
            values[[row, col]] = index.get(date).copied().unwrap_or(f64::NAN);
        }
    }

    Ok(AlignedReturns {
        ids: series.iter().map(|s| s.instrument().to_string()).collect(),
        dates,
        values,
    })
}

impl AlignedReturns {
    /// Instrument ids, one per column
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Row dates, ascending
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// The `rows x instruments` return matrix
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of aligned dates
    pub fn nrows(&self) -> usize {
        self.dates.len()
    }

    /// Drop every row holding a non-finite value in any column.
    pub fn finite_rows(&self) -> Self {
        let keep: Vec<usize> = self
            .values
            .axis_iter(Axis(0))
            .enumerate()
            .filter(|(_, row)| row.iter().all(|v| v.is_finite()))
            .map(|(i, _)| i)
            .collect();

        Self {
            ids: self.ids.clone(),
            dates: keep.iter().map(|&i| self.dates[i]).collect(),
            values: self.values.select(Axis(0), &keep),
        }
    }

    /// The trailing `window` rows, or all rows if fewer.
    pub fn trailing(&self, window: usize) -> Self {
        let start = self.nrows().saturating_sub(window);
        let keep: Vec<usize> = (start..self.nrows()).collect();

        Self {
            ids: self.ids.clone(),
            dates: self.dates[start..].to_vec(),
            values: self.values.select(Axis(0), &keep),
        }
    }

    /// Returns of one instrument, in date order.
    pub fn column(&self, id: &str) -> Option<Array1<f64>> {
        self.ids
            .iter()
            .position(|i| i == id)
            .map(|idx| self.values.column(idx).to_owned())
    }
}
