//! Inverse price-ratio dividend policy: factor P / (P + D).
//!
//! Treats the reference close as the ex-dividend price and asks what share
//! of the cum-dividend value (P + D) it represents. Always in (0, 1] for
//! a positive close.

use crate::adjuster::AdjustError;
use crate::domain::{CorporateAction, CorrectionShape};

use super::{AdjustmentPolicy, PriceLookup};

/// Multiplicative P / (P + D) dividend correction.
#[derive(Debug, Clone, Copy, Default)]
pub struct InversePriceRatioDividendPolicy;

impl AdjustmentPolicy for InversePriceRatioDividendPolicy {
    fn name(&self) -> &str {
        "inverse_price_ratio"
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
        Ok(close / (close + lookup.amount(event)))
    }

    fn combine(&self, raw_close: f64, split_factor: f64, dividend_correction: f64) -> f64 {
        raw_close * split_factor * dividend_correction
    }
}
