//! Reconciliation against a reference adjusted series (e.g., a vendor feed).
//!
//! [`compare`] aligns a reconstructed series with a reference by date and
//! summarizes the disagreement. [`sweep`] runs every configuration variant
//! over the same inputs and ranks them by mean absolute error, which is how
//! competing dividend hypotheses are compared without picking a winner in
//! code.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;
use tracing::info;

use crate::adjuster::{AdjustError, PriceAdjuster};
use crate::config::AdjustConfig;
use crate::domain::{AdjustedSeries, PriceObservation, PriceSeries, RawAction};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReconcileError {
    #[error("reference series has no finite values on the adjusted series' dates")]
    NoOverlap,

    #[error(transparent)]
    Adjust(#[from] AdjustError),
}

/// Disagreement between an adjusted series and a reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciliationReport {
    pub policy: String,
    /// Dates present in both series.
    pub compared: usize,
    /// Adjusted dates with no reference value.
    pub missing_in_reference: usize,
    /// Reference values that are NaN or infinite; skipped like missing dates.
    pub non_finite_reference: usize,
    pub max_abs_error: f64,
    pub mean_abs_error: f64,
    /// Relative to the reference value; dates with a zero reference are skipped.
    pub max_rel_error: f64,
    pub worst_date: Option<NaiveDate>,
}

impl ReconciliationReport {
    /// True when every compared date is within `abs_tolerance`.
    pub fn within(&self, abs_tolerance: f64) -> bool {
        self.max_abs_error <= abs_tolerance
    }
}

/// Compare `adjusted` with `reference` on their common dates.
///
/// NaN or infinite reference values (vendor gaps) are counted and skipped.
pub fn compare(
    adjusted: &AdjustedSeries,
    reference: &[PriceObservation],
) -> Result<ReconciliationReport, ReconcileError> {
    let by_date: HashMap<NaiveDate, f64> = reference.iter().map(|o| (o.date, o.close)).collect();

    let mut compared = 0usize;
    let mut missing = 0usize;
    let mut non_finite = 0usize;
    let mut sum_abs = 0.0;
    let mut max_abs = 0.0;
    let mut max_rel = 0.0;
    let mut worst_date = None;

    for point in &adjusted.points {
        let Some(&expected) = by_date.get(&point.date) else {
            missing += 1;
            continue;
        };
        if !expected.is_finite() {
            non_finite += 1;
            continue;
        }
        compared += 1;

        let abs_err = (point.adjusted_close - expected).abs();
        sum_abs += abs_err;
        if abs_err > max_abs || worst_date.is_none() {
            max_abs = abs_err;
            worst_date = Some(point.date);
        }
        if expected != 0.0 {
            max_rel = f64::max(max_rel, abs_err / expected.abs());
        }
    }

    if compared == 0 {
        return Err(ReconcileError::NoOverlap);
    }

    Ok(ReconciliationReport {
        policy: adjusted.policy.clone(),
        compared,
        missing_in_reference: missing,
        non_finite_reference: non_finite,
        max_abs_error: max_abs,
        mean_abs_error: sum_abs / compared as f64,
        max_rel_error: max_rel,
        worst_date,
    })
}

/// Outcome of one configuration variant in a sweep.
#[derive(Debug, Clone)]
pub struct VariantOutcome {
    pub config: AdjustConfig,
    pub result: Result<ReconciliationReport, ReconcileError>,
}

/// Adjust with every configuration variant and compare each with `reference`.
///
/// Successful variants come first, best (lowest mean absolute error) first;
/// failed variants follow in variant order.
pub fn sweep(
    prices: &PriceSeries,
    actions: &[RawAction],
    reference: &[PriceObservation],
) -> Vec<VariantOutcome> {
    let mut outcomes: Vec<VariantOutcome> = AdjustConfig::variants()
        .into_par_iter()
        .map(|config| {
            let result = PriceAdjuster::new(config)
                .adjust(prices, actions)
                .map_err(ReconcileError::from)
                .and_then(|adjusted| compare(&adjusted, reference));
            VariantOutcome { config, result }
        })
        .collect();

    outcomes.sort_by(|a, b| match (&a.result, &b.result) {
        (Ok(x), Ok(y)) => x.mean_abs_error.total_cmp(&y.mean_abs_error),
        (Ok(_), Err(_)) => std::cmp::Ordering::Less,
        (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
        (Err(_), Err(_)) => std::cmp::Ordering::Equal,
    });

    if let Some(best) = outcomes.first() {
        if let Ok(report) = &best.result {
            info!(
                variant = %best.config.label(),
                mean_abs_error = report.mean_abs_error,
                "closest variant to reference"
            );
        }
    }

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjuster::adjust;
    use crate::factor::BoundaryMode;
    use crate::policy::PolicyKind;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn flat(n: u32, close: f64) -> PriceSeries {
        PriceSeries::from_pairs((1..=n).map(|d| (day(d), close))).unwrap()
    }

    fn reference(values: &[f64]) -> Vec<PriceObservation> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| PriceObservation::new(day(i as u32 + 1), v))
            .collect()
    }

    #[test]
    fn identical_series_has_zero_error() {
        let prices = flat(3, 10.0);
        let adjusted = adjust(&prices, &[], PolicyKind::PriceRatio).unwrap();
        let report = compare(&adjusted, prices.observations()).unwrap();
        assert_eq!(report.compared, 3);
        assert_eq!(report.max_abs_error, 0.0);
        assert!(report.within(0.0));
    }

    #[test]
    fn reports_worst_date_and_missing_reference() {
        let prices = flat(4, 10.0);
        let adjusted = adjust(&prices, &[], PolicyKind::PriceRatio).unwrap();
        let reference = vec![
            PriceObservation::new(day(1), 10.0),
            PriceObservation::new(day(2), 8.0),
            PriceObservation::new(day(3), 9.0),
        ];
        let report = compare(&adjusted, &reference).unwrap();
        assert_eq!(report.compared, 3);
        assert_eq!(report.missing_in_reference, 1);
        assert_eq!(report.max_abs_error, 2.0);
        assert_eq!(report.worst_date, Some(day(2)));
        assert_eq!(report.max_rel_error, 0.25);
        assert!((report.mean_abs_error - 1.0).abs() < 1e-12);
    }

    #[test]
    fn non_finite_reference_values_are_skipped() {
        let adjusted = adjust(&flat(3, 10.0), &[], PolicyKind::PriceRatio).unwrap();

        let report = compare(&adjusted, &reference(&[10.0, f64::NAN, 10.0])).unwrap();
        assert_eq!(report.compared, 2);
        assert_eq!(report.non_finite_reference, 1);
        assert_eq!(report.mean_abs_error, 0.0);

        let report = compare(&adjusted, &reference(&[10.0, 10.0, f64::INFINITY])).unwrap();
        assert_eq!(report.non_finite_reference, 1);
        assert!(report.within(0.0));
    }

    #[test]
    fn leading_nan_does_not_hide_later_errors() {
        let prices = PriceSeries::from_pairs([(day(1), 10.0), (day(2), 10.0), (day(3), 99.0)])
            .unwrap();
        let adjusted = adjust(&prices, &[], PolicyKind::PriceRatio).unwrap();

        let report = compare(&adjusted, &reference(&[f64::NAN, 10.0, 10.0])).unwrap();
        assert_eq!(report.compared, 2);
        assert_eq!(report.max_abs_error, 89.0);
        assert_eq!(report.worst_date, Some(day(3)));
        assert!((report.mean_abs_error - 44.5).abs() < 1e-12);
        assert!(!report.within(1.0));
    }

    #[test]
    fn all_nan_reference_is_no_overlap() {
        let adjusted = adjust(&flat(2, 10.0), &[], PolicyKind::PriceRatio).unwrap();
        assert_eq!(
            compare(&adjusted, &reference(&[f64::NAN, f64::NAN])).unwrap_err(),
            ReconcileError::NoOverlap
        );
    }

    #[test]
    fn disjoint_reference_is_no_overlap() {
        let adjusted = adjust(&flat(2, 10.0), &[], PolicyKind::PriceRatio).unwrap();
        let reference = vec![PriceObservation::new(day(20), 10.0)];
        assert_eq!(
            compare(&adjusted, &reference).unwrap_err(),
            ReconcileError::NoOverlap
        );
    }

    #[test]
    fn sweep_ranks_matching_variant_first() {
        // reference built with the pre-event boundary: ex-date also corrected
        let prices = flat(4, 100.0);
        let actions = vec![RawAction::new("2024-01-03", "DIVIDEND", "5")];
        let reference = reference(&[95.0, 95.0, 95.0, 100.0]);

        let outcomes = sweep(&prices, &actions, &reference);
        assert_eq!(outcomes.len(), AdjustConfig::variants().len());

        let best = &outcomes[0];
        let report = best.result.as_ref().unwrap();
        assert_eq!(report.max_abs_error, 0.0);
        assert_eq!(best.config.boundary, BoundaryMode::PreEvent);
    }

    #[test]
    fn sweep_puts_failed_variants_last() {
        // dividend on the first date: previous-close lookups fail
        let prices = flat(3, 100.0);
        let actions = vec![RawAction::new("2024-01-01", "DIVIDEND", "1")];
        let outcomes = sweep(&prices, &actions, prices.observations());

        let first_err = outcomes.iter().position(|o| o.result.is_err()).unwrap();
        assert!(outcomes[first_err..].iter().all(|o| o.result.is_err()));
        assert!(outcomes[..first_err].iter().all(|o| o.result.is_ok()));
    }
}
