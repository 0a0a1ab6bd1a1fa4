//! Adjustment policies: competing hypotheses for how events correct history.
//!
//! Every policy shares the split rule (an N:K split scales earlier prices by
//! K/N) and differs in how a cash dividend is turned into a correction.
//!
//! ## Concrete implementations
//!
//! - [`PriceRatioDividendPolicy`]: factor (P − D) / P (default)
//! - [`InversePriceRatioDividendPolicy`]: factor P / (P + D)
//! - [`SubtractiveDividendPolicy`]: subtract accumulated future dividends
//!
//! None of these is treated as the correct one. They are selected by
//! [`PolicyKind`] so the alternatives stay available for comparison.

pub mod inverse_price_ratio;
pub mod price_ratio;
pub mod subtractive;

pub use inverse_price_ratio::InversePriceRatioDividendPolicy;
pub use price_ratio::PriceRatioDividendPolicy;
pub use subtractive::SubtractiveDividendPolicy;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::adjuster::AdjustError;
use crate::config::ConfigError;
use crate::domain::{CorporateAction, CorrectionShape, PriceSeries};
use crate::factor::CumulativeSchedule;

/// Trait for adjustment policies.
///
/// Policies are stateless; one instance can serve concurrent adjustments.
pub trait AdjustmentPolicy: Send + Sync {
    /// Stable identifier (e.g., "price_ratio").
    fn name(&self) -> &str;

    /// Shape of the dividend correction this policy produces.
    fn dividend_shape(&self) -> CorrectionShape;

    /// Increment for one split: K/N for an N:K split.
    fn split_increment(&self, event: &CorporateAction) -> f64 {
        1.0 / event.raw_value()
    }

    /// Increment for one dividend. Price lookups go through `lookup`.
    fn dividend_increment(
        &self,
        event: &CorporateAction,
        lookup: &PriceLookup<'_>,
    ) -> Result<f64, AdjustError>;

    /// Adjusted close from the raw close and both corrections.
    fn combine(&self, raw_close: f64, split_factor: f64, dividend_correction: f64) -> f64;
}

/// Which raw close a dividend formula uses as P.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupConvention {
    /// Last observation strictly before the ex-date.
    #[default]
    PreviousClose,
    /// Observation on the ex-date itself.
    SameDayClose,
}

impl LookupConvention {
    pub const ALL: [LookupConvention; 2] =
        [LookupConvention::PreviousClose, LookupConvention::SameDayClose];

    pub fn as_str(&self) -> &'static str {
        match self {
            LookupConvention::PreviousClose => "previous_close",
            LookupConvention::SameDayClose => "same_day_close",
        }
    }
}

/// Whether dividend amounts are restated in post-split terms before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DividendScaling {
    /// Use the amount as reported.
    #[default]
    Unscaled,
    /// Multiply the amount by the split factor in effect on the ex-date.
    SplitAdjusted,
}

impl DividendScaling {
    pub const ALL: [DividendScaling; 2] =
        [DividendScaling::Unscaled, DividendScaling::SplitAdjusted];

    pub fn as_str(&self) -> &'static str {
        match self {
            DividendScaling::Unscaled => "unscaled",
            DividendScaling::SplitAdjusted => "split_adjusted",
        }
    }
}

/// Resolves the prices and amounts a dividend formula needs.
///
/// Bound to one raw series for the duration of a single adjustment.
#[derive(Debug, Clone, Copy)]
pub struct PriceLookup<'a> {
    prices: &'a PriceSeries,
    convention: LookupConvention,
    split_schedule: Option<&'a CumulativeSchedule>,
}

impl<'a> PriceLookup<'a> {
    /// `split_schedule` is only consulted when amounts are split-scaled.
    pub fn new(
        prices: &'a PriceSeries,
        convention: LookupConvention,
        split_schedule: Option<&'a CumulativeSchedule>,
    ) -> Self {
        Self {
            prices,
            convention,
            split_schedule,
        }
    }

    /// The close P for `event` under the configured convention.
    pub fn reference_close(&self, event: &CorporateAction) -> Result<f64, AdjustError> {
        let close = match self.convention {
            LookupConvention::PreviousClose => {
                self.prices.observation_before(event.date()).map(|o| o.close)
            }
            LookupConvention::SameDayClose => self.prices.close_on(event.date()),
        };
        close.ok_or(AdjustError::MissingActionPrice {
            date: event.date(),
            kind: event.kind(),
            convention: self.convention,
        })
    }

    /// The dividend amount D, split-scaled when configured.
    pub fn amount(&self, event: &CorporateAction) -> f64 {
        match self.split_schedule {
            Some(schedule) => event.raw_value() * schedule.value_at(event.date()),
            None => event.raw_value(),
        }
    }
}

/// Closed set of available policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    #[default]
    PriceRatio,
    InversePriceRatio,
    Subtractive,
}

impl PolicyKind {
    pub const ALL: [PolicyKind; 3] = [
        PolicyKind::PriceRatio,
        PolicyKind::InversePriceRatio,
        PolicyKind::Subtractive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyKind::PriceRatio => "price_ratio",
            PolicyKind::InversePriceRatio => "inverse_price_ratio",
            PolicyKind::Subtractive => "subtractive",
        }
    }

    /// Create the runtime policy object.
    pub fn build(self) -> Box<dyn AdjustmentPolicy> {
        match self {
            PolicyKind::PriceRatio => Box::new(PriceRatioDividendPolicy),
            PolicyKind::InversePriceRatio => Box::new(InversePriceRatioDividendPolicy),
            PolicyKind::Subtractive => Box::new(SubtractiveDividendPolicy),
        }
    }
}

macro_rules! named_variants {
    ($($ty:ident => $field:literal),* $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }

            impl FromStr for $ty {
                type Err = ConfigError;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    $ty::ALL
                        .into_iter()
                        .find(|v| v.as_str() == s.trim())
                        .ok_or_else(|| ConfigError::UnknownVariant {
                            field: $field,
                            value: s.to_string(),
                        })
                }
            }
        )*
    };
}

named_variants! {
    PolicyKind => "policy",
    LookupConvention => "lookup",
    DividendScaling => "dividend_scaling",
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factor::{BoundaryMode, FactorSeriesBuilder};
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn prices() -> PriceSeries {
        PriceSeries::from_pairs([(day(2), 50.0), (day(3), 52.0), (day(5), 48.0)]).unwrap()
    }

    #[test]
    fn previous_close_uses_prior_observation() {
        let series = prices();
        let lookup = PriceLookup::new(&series, LookupConvention::PreviousClose, None);
        let div = CorporateAction::dividend(day(5), 1.0).unwrap();
        assert_eq!(lookup.reference_close(&div).unwrap(), 52.0);

        // ex-date on a non-trading day still finds the last close
        let gap = CorporateAction::dividend(day(4), 1.0).unwrap();
        assert_eq!(lookup.reference_close(&gap).unwrap(), 52.0);
    }

    #[test]
    fn previous_close_missing_on_first_date() {
        let series = prices();
        let lookup = PriceLookup::new(&series, LookupConvention::PreviousClose, None);
        let div = CorporateAction::dividend(day(2), 1.0).unwrap();
        assert!(matches!(
            lookup.reference_close(&div),
            Err(AdjustError::MissingActionPrice { .. })
        ));
    }

    #[test]
    fn same_day_close_requires_exact_date() {
        let series = prices();
        let lookup = PriceLookup::new(&series, LookupConvention::SameDayClose, None);
        let on = CorporateAction::dividend(day(3), 1.0).unwrap();
        let off = CorporateAction::dividend(day(4), 1.0).unwrap();
        assert_eq!(lookup.reference_close(&on).unwrap(), 52.0);
        assert!(lookup.reference_close(&off).is_err());
    }

    #[test]
    fn split_scaled_amount_uses_later_splits_only() {
        let series = prices();
        let splits = [CorporateAction::split(day(4), 2.0, 1.0).unwrap()];
        let schedule = FactorSeriesBuilder::multiplicative(BoundaryMode::PostEvent)
            .schedule(&splits, |e| Ok::<_, AdjustError>(1.0 / e.raw_value()))
            .unwrap();
        let lookup = PriceLookup::new(&series, LookupConvention::PreviousClose, Some(&schedule));

        let before = CorporateAction::dividend(day(3), 1.0).unwrap();
        let after = CorporateAction::dividend(day(5), 1.0).unwrap();
        assert_eq!(lookup.amount(&before), 0.5);
        assert_eq!(lookup.amount(&after), 1.0);
    }

    #[test]
    fn policy_kind_roundtrips_through_names() {
        for kind in PolicyKind::ALL {
            assert_eq!(kind.as_str().parse::<PolicyKind>().unwrap(), kind);
            assert_eq!(kind.build().name(), kind.as_str());
        }
        assert!("dividend_magic".parse::<PolicyKind>().is_err());
    }

    #[test]
    fn default_policy_is_price_ratio() {
        assert_eq!(PolicyKind::default(), PolicyKind::PriceRatio);
    }
}
