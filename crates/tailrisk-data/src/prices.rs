//! JSON price files.
//!
//! The command-line front end reads price histories from a single JSON
//! document:
//!
//! ```json
//! { "instruments": { "AAA": [ { "date": "2024-01-02", "price": 101.5 } ] } }
//! ```

use crate::error::{DataError, Result};
use crate::series::ReturnSeries;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// A dated closing price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Trading date
    pub date: NaiveDate,
    /// Closing price
    pub price: f64,
}

/// Price histories keyed by instrument identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceFile {
    /// Raw price points per instrument, in any order
    pub instruments: BTreeMap<String, Vec<PricePoint>>,
}

impl PriceFile {
    /// Parse a price file from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a price file from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Instrument identifiers in sorted order.
    pub fn instrument_ids(&self) -> Vec<String> {
        self.instruments.keys().cloned().collect()
    }

    /// Log-return series for one instrument.
    pub fn series(&self, instrument: &str) -> Result<ReturnSeries> {
        let points = self
            .instruments
            .get(instrument)
            .ok_or_else(|| DataError::UnknownInstrument(instrument.to_string()))?;

        ReturnSeries::from_prices(instrument, points.iter().map(|p| (p.date, p.price)))
    }

    /// Log-return series for every instrument in the file.
    pub fn all_series(&self) -> Result<Vec<ReturnSeries>> {
        self.instruments.keys().map(|id| self.series(id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "instruments": {
            "BBB": [
                { "date": "2024-01-03", "price": 20.0 },
                { "date": "2024-01-02", "price": 21.0 }
            ],
            "AAA": [
                { "date": "2024-01-02", "price": 100.0 },
                { "date": "2024-01-03", "price": 101.0 },
                { "date": "2024-01-04", "price": 102.0 }
            ]
        }
    }"#;

    #[test]
    fn test_parse_price_file() {
        let file = PriceFile::from_json_str(SAMPLE).unwrap();
        assert_eq!(file.instrument_ids(), vec!["AAA".to_string(), "BBB".to_string()]);

        let aaa = file.series("AAA").unwrap();
        assert_eq!(aaa.len(), 2);

        let bbb = file.series("BBB").unwrap();
        assert!(bbb.values()[0] < 0.0);
    }

    #[test]
    fn test_unknown_instrument() {
        let file = PriceFile::from_json_str(SAMPLE).unwrap();
        assert!(matches!(
            file.series("ZZZ"),
            Err(DataError::UnknownInstrument(_))
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            PriceFile::from_json_str("{ \"instruments\": 3 }"),
            Err(DataError::Serialization(_))
        ));
    }
}
