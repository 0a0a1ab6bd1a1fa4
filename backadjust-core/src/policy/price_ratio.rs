//! Price-ratio dividend policy: factor (P − D) / P.
//!
//! P is the reference close (see [`PriceLookup`]), D the dividend amount.
//! The factor is the fraction of value left after the cash leaves the
//! company, applied to every earlier price. Requires D < P.

use crate::adjuster::AdjustError;
use crate::domain::{CorporateAction, CorrectionShape};

use super::{AdjustmentPolicy, PriceLookup};

/// Multiplicative (P − D) / P dividend correction. Pinned default.
#[derive(Debug, Clone, Copy, Default)]
pub struct PriceRatioDividendPolicy;

impl AdjustmentPolicy for PriceRatioDividendPolicy {
    fn name(&self) -> &str {
        "price_ratio"
    }

    fn dividend_shape(&self) -> CorrectionShape {
        CorrectionShape::Multiplicative
    }

    fn dividend_increment(
        &self,
        event: &CorporateAction,
        lookup: &PriceLookup<'_>,
    ) -> Result<f64, AdjustError> {
        let close = lookup.reference_close(event)?;
        Ok((close - lookup.amount(event)) / close)
    }

    fn combine(&self, raw_close: f64, split_factor: f64, dividend_correction: f64) -> f64 {
        raw_close * split_factor * dividend_correction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PriceSeries;
    use crate::policy::LookupConvention;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn increment_is_remaining_fraction() {
        let series = PriceSeries::from_pairs([(day(1), 100.0), (day(2), 100.0)]).unwrap();
        let lookup = PriceLookup::new(&series, LookupConvention::PreviousClose, None);
        let div = CorporateAction::dividend(day(2), 5.0).unwrap();
        let inc = PriceRatioDividendPolicy
            .dividend_increment(&div, &lookup)
            .unwrap();
        assert_eq!(inc, 0.95);
    }

    #[test]
    fn dividend_above_price_gives_non_positive_increment() {
        let series = PriceSeries::from_pairs([(day(1), 4.0), (day(2), 4.0)]).unwrap();
        let lookup = PriceLookup::new(&series, LookupConvention::PreviousClose, None);
        let div = CorporateAction::dividend(day(2), 5.0).unwrap();
        let inc = PriceRatioDividendPolicy
            .dividend_increment(&div, &lookup)
            .unwrap();
        assert!(inc <= 0.0);
    }

    #[test]
    fn combine_is_product() {
        assert_eq!(PriceRatioDividendPolicy.combine(80.0, 0.5, 0.95), 38.0);
    }

    #[test]
    fn split_increment_is_old_over_new() {
        let split = CorporateAction::split(day(3), 2.0, 1.0).unwrap();
        assert_eq!(PriceRatioDividendPolicy.split_increment(&split), 0.5);
    }
}
