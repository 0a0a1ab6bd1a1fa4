//! Parquet price input and adjusted-series output via Polars.
//!
//! Input files need a `date` column (Date) and a `close` column (f64). An
//! `adj_close` column, when present, is returned as the reference series.
//! This matches the daily bar files written by common OHLCV caches, so a
//! cached symbol can be reconciled without conversion.

use chrono::NaiveDate;
use polars::prelude::*;
use std::fs;
use std::path::Path;

use super::{into_price_file, DataError, PriceFile};
use crate::domain::{AdjustedSeries, PriceObservation};

fn epoch() -> NaiveDate {
    NaiveDate::default()
}

/// Load a Parquet price file.
pub fn read_prices_parquet(path: &Path) -> Result<PriceFile, DataError> {
    let file = fs::File::open(path).map_err(|source| DataError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| DataError::ParquetError(format!("read: {e}")))?;

    dataframe_to_rows(&df).and_then(into_price_file)
}

/// Write an adjusted series to Parquet.
///
/// Writes to `{path}.tmp` first and renames into place.
pub fn write_adjusted_parquet(path: &Path, adjusted: &AdjustedSeries) -> Result<(), DataError> {
    let mut df = adjusted_to_dataframe(adjusted)?;
    let tmp_path = path.with_extension("parquet.tmp");

    let file = fs::File::create(&tmp_path).map_err(|source| DataError::Io {
        path: tmp_path.display().to_string(),
        source,
    })?;
    ParquetWriter::new(file)
        .finish(&mut df)
        .map_err(|e| DataError::ParquetError(format!("write parquet: {e}")))?;

    fs::rename(&tmp_path, path).map_err(|source| {
        let _ = fs::remove_file(&tmp_path);
        DataError::Io {
            path: path.display().to_string(),
            source,
        }
    })
}

fn days_since_epoch(date: NaiveDate) -> i32 {
    (date - epoch()).num_days() as i32
}

fn adjusted_to_dataframe(adjusted: &AdjustedSeries) -> Result<DataFrame, DataError> {
    let points = &adjusted.points;
    let dates: Vec<i32> = points.iter().map(|p| days_since_epoch(p.date)).collect();
    let closes: Vec<f64> = points.iter().map(|p| p.raw_close).collect();
    let splits: Vec<f64> = points.iter().map(|p| p.split_factor).collect();
    let dividends: Vec<f64> = points.iter().map(|p| p.dividend_correction).collect();
    let adjusted_closes: Vec<f64> = points.iter().map(|p| p.adjusted_close).collect();

    DataFrame::new(vec![
        Column::new("date".into(), dates)
            .cast(&DataType::Date)
            .map_err(|e| DataError::ParquetError(format!("date cast: {e}")))?,
        Column::new("close".into(), closes),
        Column::new("split_factor".into(), splits),
        Column::new("dividend_correction".into(), dividends),
        Column::new("adjusted_close".into(), adjusted_closes),
    ])
    .map_err(|e| DataError::ParquetError(format!("dataframe creation: {e}")))
}

fn dataframe_to_rows(df: &DataFrame) -> Result<Vec<(PriceObservation, Option<f64>)>, DataError> {
    let map_err = |e: PolarsError| DataError::ParquetError(format!("column read: {e}"));

    for col_name in ["date", "close"] {
        if df.column(col_name).is_err() {
            return Err(DataError::ValidationError(format!(
                "missing column '{col_name}'"
            )));
        }
    }

    let date_ca = df
        .column("date")
        .map_err(map_err)?
        .date()
        .map_err(|e| DataError::ParquetError(format!("date column type: {e}")))?;
    let close_ca = df
        .column("close")
        .map_err(map_err)?
        .f64()
        .map_err(|e| DataError::ParquetError(format!("close column type: {e}")))?;
    let adj_ca = match df.column("adj_close") {
        Ok(column) => Some(
            column
                .f64()
                .map_err(|e| DataError::ParquetError(format!("adj_close column type: {e}")))?,
        ),
        Err(_) => None,
    };

    (0..df.height())
        .map(|i| {
            let days = date_ca
                .get(i)
                .ok_or_else(|| DataError::ValidationError(format!("null date at row {i}")))?;
            let close = close_ca
                .get(i)
                .ok_or_else(|| DataError::ValidationError(format!("null close at row {i}")))?;
            let date = epoch() + chrono::Duration::days(days as i64);
            let reference = adj_ca.and_then(|ca| ca.get(i));
            Ok((PriceObservation::new(date, close), reference))
        })
        .collect()
}
