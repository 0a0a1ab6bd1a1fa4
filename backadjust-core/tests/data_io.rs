//! Integration tests for the file pipeline: read, adjust, reconcile, write.

use backadjust_core::data::{self, read_actions_csv, write_adjusted_csv, write_adjusted_parquet};
use backadjust_core::domain::{PriceObservation, PriceSeries};
use backadjust_core::reconcile::compare;
use backadjust_core::{AdjustConfig, PriceAdjuster};
use chrono::NaiveDate;
use std::fs;
use std::path::Path;

const PRICES: &str = "\
date,close,adj_close
2024-01-02,100.0,47.5
2024-01-03,100.0,47.5
2024-01-04,50.0,47.5
2024-01-05,50.0,50.0
2024-01-08,51.0,51.0
";

const ACTIONS: &str = "\
date,action,value
2024-01-05,DIVIDEND,2.5
2024-01-04,SPLIT,2:1
";

fn write(path: &Path, content: &str) {
    fs::write(path, content).unwrap();
}

#[test]
fn csv_files_adjust_to_the_vendor_reference() {
    let dir = tempfile::tempdir().unwrap();
    let prices_path = dir.path().join("prices.csv");
    let actions_path = dir.path().join("actions.csv");
    write(&prices_path, PRICES);
    write(&actions_path, ACTIONS);

    let file = data::read_prices(&prices_path).unwrap();
    let actions = read_actions_csv(&actions_path).unwrap();
    assert_eq!(file.series.len(), 5);
    assert_eq!(actions.len(), 2);

    let adjusted = PriceAdjuster::new(AdjustConfig::default())
        .adjust(&file.series, &actions)
        .unwrap();
    let report = compare(&adjusted, file.reference.as_deref().unwrap()).unwrap();
    assert_eq!(report.compared, 5);
    assert!(report.within(1e-9), "{report:?}");
}

#[test]
fn adjusted_series_writes_to_csv_and_parquet() {
    let dir = tempfile::tempdir().unwrap();
    let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
    let prices = PriceSeries::from_pairs([(d(2), 10.0), (d(3), 11.0), (d(4), 12.0)]).unwrap();
    let adjusted = PriceAdjuster::new(AdjustConfig::default())
        .adjust(&prices, &[])
        .unwrap();

    let csv_path = dir.path().join("out.csv");
    write_adjusted_csv(&csv_path, &adjusted).unwrap();
    let text = fs::read_to_string(&csv_path).unwrap();
    assert_eq!(text.lines().count(), 4);

    let parquet_path = dir.path().join("out.parquet");
    write_adjusted_parquet(&parquet_path, &adjusted).unwrap();
    assert!(parquet_path.exists());
}

#[test]
fn csv_reference_compares_against_itself() {
    let dir = tempfile::tempdir().unwrap();
    let prices_path = dir.path().join("prices.csv");
    write(
        &prices_path,
        "date,close\n2024-01-02,10.0\n2024-01-03,10.5\n",
    );

    let file = data::read_prices(&prices_path).unwrap();
    assert!(file.reference.is_none());

    let adjusted = PriceAdjuster::new(AdjustConfig::default())
        .adjust(&file.series, &[])
        .unwrap();
    let reference: Vec<PriceObservation> = file.series.observations().to_vec();
    assert_eq!(compare(&adjusted, &reference).unwrap().max_abs_error, 0.0);
}

#[test]
fn missing_price_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(data::read_prices(&dir.path().join("absent.csv")).is_err());
    assert!(data::read_prices(&dir.path().join("absent.parquet")).is_err());
}
