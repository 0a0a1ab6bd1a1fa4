//! Subtractive dividend policy: subtract accumulated future dividends.
//!
//! Walking back from the latest date, every dividend passed is added to a
//! running total, and that total is subtracted from each earlier
//! (split-scaled) close. No price lookup is needed.
//!
//! Once the dividends paid after a date exceed its close, the adjusted close
//! goes negative. That is a property of the hypothesis and is reported as is.

use crate::adjuster::AdjustError;
use crate::domain::{CorporateAction, CorrectionShape};

use super::{AdjustmentPolicy, PriceLookup};

/// Additive dividend correction: `raw × split − Σ future dividends`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubtractiveDividendPolicy;

impl AdjustmentPolicy for SubtractiveDividendPolicy {
    fn name(&self) -> &str {
        "subtractive"
    }

    fn dividend_shape(&self) -> CorrectionShape {
        CorrectionShape::Additive
    }

    fn dividend_increment(
        &self,
        event: &CorporateAction,
        lookup: &PriceLookup<'_>,
    ) -> Result<f64, AdjustError> {
        Ok(lookup.amount(event))
    }

    fn combine(&self, raw_close: f64, split_factor: f64, dividend_correction: f64) -> f64 {
        raw_close * split_factor - dividend_correction
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
    fn increment_is_amount_without_price_lookup() {
        // empty series: a lookup would fail, the amount alone must not
        let series = PriceSeries::default();
        let lookup = PriceLookup::new(&series, LookupConvention::SameDayClose, None);
        let div = CorporateAction::dividend(day(2), 0.75).unwrap();
        assert_eq!(
            SubtractiveDividendPolicy
                .dividend_increment(&div, &lookup)
                .unwrap(),
            0.75
        );
    }

    #[test]
    fn combine_can_go_negative() {
        assert_eq!(SubtractiveDividendPolicy.combine(10.0, 1.0, 15.0), -5.0);
    }

    #[test]
    fn shape_is_additive() {
        assert_eq!(
            SubtractiveDividendPolicy.dividend_shape(),
            CorrectionShape::Additive
        );
    }
}
