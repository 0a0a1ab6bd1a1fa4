//! File I/O for raw price series, action logs and adjusted output.
//!
//! - CSV prices: `date,close[,adj_close]`
//! - CSV actions: `date,action,value`
//! - Parquet bars: `date`, `close` and optional `adj_close` columns
//!
//! Retrieval from market-data vendors is out of scope; these readers only
//! consume files that some other tool has already written.

pub mod csv_io;
pub mod parquet;

pub use csv_io::{read_actions_csv, read_prices_csv, write_adjusted_csv};
pub use parquet::{read_prices_parquet, write_adjusted_parquet};

use std::path::Path;
use thiserror::Error;

use crate::adjuster::AdjustError;
use crate::domain::{PriceObservation, PriceSeries};

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("parquet I/O error: {0}")]
    ParquetError(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error(transparent)]
    Series(#[from] AdjustError),
}

/// A raw close series, plus the vendor's adjusted close when the file has one.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceFile {
    pub series: PriceSeries,
    pub reference: Option<Vec<PriceObservation>>,
}

/// Read a price file, choosing the format from the extension.
///
/// `.parquet` goes through Polars; everything else is read as CSV.
pub fn read_prices(path: &Path) -> Result<PriceFile, DataError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("parquet") => read_prices_parquet(path),
        _ => read_prices_csv(path),
    }
}

/// Sort rows by date and split off the reference column.
///
/// Duplicate dates survive sorting and are rejected by `PriceSeries::new`.
fn into_price_file(
    mut rows: Vec<(PriceObservation, Option<f64>)>,
) -> Result<PriceFile, DataError> {
    rows.sort_by_key(|(obs, _)| obs.date);

    let reference: Vec<PriceObservation> = rows
        .iter()
        .filter_map(|(obs, adj)| adj.map(|close| PriceObservation::new(obs.date, close)))
        .collect();
    let series = PriceSeries::new(rows.into_iter().map(|(obs, _)| obs).collect())?;

    Ok(PriceFile {
        series,
        reference: (!reference.is_empty()).then_some(reference),
    })
}
