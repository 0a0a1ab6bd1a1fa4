//! CSV readers and writer.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

use super::{into_price_file, DataError, PriceFile};
use crate::domain::{AdjustedSeries, PriceObservation, RawAction};

#[derive(Debug, Deserialize)]
struct PriceRow {
    date: NaiveDate,
    close: f64,
    #[serde(default)]
    adj_close: Option<f64>,
}

#[derive(Debug, Serialize)]
struct AdjustedRow {
    date: NaiveDate,
    close: f64,
    split_factor: f64,
    dividend_correction: f64,
    adjusted_close: f64,
}

/// Read `date,close[,adj_close]` rows. Rows may be in any order.
pub fn read_prices_csv(path: &Path) -> Result<PriceFile, DataError> {
    read_prices(csv::Reader::from_path(path)?)
}

pub fn read_prices<R: io::Read>(mut reader: csv::Reader<R>) -> Result<PriceFile, DataError> {
    let rows = reader
        .deserialize::<PriceRow>()
        .map(|row| row.map(|r| (PriceObservation::new(r.date, r.close), r.adj_close)))
        .collect::<Result<Vec<_>, csv::Error>>()?;
    into_price_file(rows)
}

/// Read `date,action,value` rows (`kind` is accepted for `action`).
///
/// Values stay as text; parsing happens in the ledger.
pub fn read_actions_csv(path: &Path) -> Result<Vec<RawAction>, DataError> {
    read_actions(csv::Reader::from_path(path)?)
}

pub fn read_actions<R: io::Read>(mut reader: csv::Reader<R>) -> Result<Vec<RawAction>, DataError> {
    Ok(reader
        .deserialize::<RawAction>()
        .collect::<Result<Vec<_>, csv::Error>>()?)
}

/// Write one row per adjusted point, with both corrections alongside.
pub fn write_adjusted_csv(path: &Path, adjusted: &AdjustedSeries) -> Result<(), DataError> {
    write_adjusted(csv::Writer::from_path(path)?, adjusted)
}

pub fn write_adjusted<W: io::Write>(
    mut writer: csv::Writer<W>,
    adjusted: &AdjustedSeries,
) -> Result<(), DataError> {
    for point in &adjusted.points {
        writer.serialize(AdjustedRow {
            date: point.date,
            close: point.raw_close,
            split_factor: point.split_factor,
            dividend_correction: point.dividend_correction,
            adjusted_close: point.adjusted_close,
        })?;
    }
    writer.flush().map_err(|source| DataError::Io {
        path: "adjusted CSV".to_string(),
        source,
    })?;
    Ok(())
}
