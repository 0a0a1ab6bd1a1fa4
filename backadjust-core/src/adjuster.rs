//! Price adjuster: raw closes + action log to an adjusted close series.
//!
//! Pipeline for one instrument:
//! 1. Normalize the action log into a date-sorted ledger.
//! 2. Check every event against the price domain.
//! 3. Build the split curve (always multiplicative).
//! 4. Build the dividend curve in the policy's shape, with price lookups
//!    bound to the raw series.
//! 5. Combine raw close, split factor and dividend correction per date.
//!
//! Output covers exactly the raw series' dates. Nothing is interpolated,
//! extrapolated, truncated or clipped.

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::AdjustConfig;
use crate::domain::{
    ActionKind, AdjustedPrice, AdjustedSeries, CorporateAction, CorrectionShape, PriceSeries,
    RawAction,
};
use crate::factor::{CumulativeSchedule, FactorSeriesBuilder};
use crate::ledger::{CorporateActionLedger, MalformedActionError};
use crate::policy::{
    AdjustmentPolicy, DividendScaling, LookupConvention, PolicyKind, PriceLookup,
};

/// Errors from adjusting a price series.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AdjustError {
    #[error(transparent)]
    MalformedAction(#[from] MalformedActionError),

    #[error("{kind} on {date}: no raw close for lookup '{convention}'")]
    MissingActionPrice {
        date: NaiveDate,
        kind: ActionKind,
        convention: LookupConvention,
    },

    #[error("{kind} on {date} lies outside the price series ({})", describe_range(.first, .last))]
    DomainMismatch {
        date: NaiveDate,
        kind: ActionKind,
        first: Option<NaiveDate>,
        last: Option<NaiveDate>,
    },

    #[error("{kind} on {date}: invalid {shape:?} correction {value}")]
    InvalidIncrement {
        date: NaiveDate,
        kind: ActionKind,
        shape: CorrectionShape,
        value: f64,
    },

    #[error("price dates not strictly ascending at row {index}: {date} follows {previous}")]
    UnorderedPrices {
        index: usize,
        previous: NaiveDate,
        date: NaiveDate,
    },
}

fn describe_range(first: &Option<NaiveDate>, last: &Option<NaiveDate>) -> String {
    match (first, last) {
        (Some(first), Some(last)) => format!("{first} to {last}"),
        _ => "empty".to_string(),
    }
}

/// Adjusts raw closes with one policy and one set of conventions.
///
/// Holds no per-call state; a single adjuster can be shared across threads.
pub struct PriceAdjuster {
    config: AdjustConfig,
    policy: Box<dyn AdjustmentPolicy>,
}

impl PriceAdjuster {
    pub fn new(config: AdjustConfig) -> Self {
        Self {
            config,
            policy: config.policy.build(),
        }
    }

    /// Use a policy outside the built-in set. `config.policy` is ignored.
    pub fn with_policy(policy: Box<dyn AdjustmentPolicy>, config: AdjustConfig) -> Self {
        Self { config, policy }
    }

    pub fn config(&self) -> &AdjustConfig {
        &self.config
    }

    pub fn policy(&self) -> &dyn AdjustmentPolicy {
        self.policy.as_ref()
    }

    /// Adjust `prices` for the raw action log `actions`.
    pub fn adjust(
        &self,
        prices: &PriceSeries,
        actions: &[RawAction],
    ) -> Result<AdjustedSeries, AdjustError> {
        let ledger = CorporateActionLedger::normalize(actions)?;
        self.adjust_ledger(prices, &ledger)
    }

    /// Adjust `prices` for an already-normalized ledger.
    pub fn adjust_ledger(
        &self,
        prices: &PriceSeries,
        ledger: &CorporateActionLedger,
    ) -> Result<AdjustedSeries, AdjustError> {
        let splits = events_in_domain(prices, ledger.split_events())?;
        let dividends = events_in_domain(prices, ledger.dividend_events())?;
        let domain = prices.dates();
        let boundary = self.config.boundary;

        let split_schedule =
            FactorSeriesBuilder::multiplicative(boundary).schedule(&splits, |event| {
                let increment = self.policy.split_increment(event);
                checked(event, CorrectionShape::Multiplicative, increment)
            })?;
        check_cumulative(&split_schedule, ActionKind::Split)?;
        let split_curve = split_schedule.reindex(&domain);

        let scaling = match self.config.dividend_scaling {
            DividendScaling::Unscaled => None,
            DividendScaling::SplitAdjusted => Some(&split_schedule),
        };
        let lookup = PriceLookup::new(prices, self.config.lookup, scaling);
        let shape = self.policy.dividend_shape();
        let dividend_schedule =
            FactorSeriesBuilder::new(shape, boundary).schedule(&dividends, |event| {
                let increment = self.policy.dividend_increment(event, &lookup)?;
                checked(event, shape, increment)
            })?;
        check_cumulative(&dividend_schedule, ActionKind::Dividend)?;
        let dividend_curve = dividend_schedule.reindex(&domain);

        let points: Vec<AdjustedPrice> = prices
            .observations()
            .iter()
            .zip(split_curve.points())
            .zip(dividend_curve.points())
            .map(|((obs, split), dividend)| AdjustedPrice {
                date: obs.date,
                raw_close: obs.close,
                split_factor: split.value,
                dividend_correction: dividend.value,
                adjusted_close: self.policy.combine(obs.close, split.value, dividend.value),
            })
            .collect();

        debug!(
            policy = self.policy.name(),
            boundary = %boundary,
            observations = points.len(),
            splits = splits.len(),
            dividends = dividends.len(),
            split_total = split_schedule.total(),
            "adjusted price series"
        );

        Ok(AdjustedSeries::new(self.policy.name(), points))
    }
}

/// Adjust with one of the built-in policies and default conventions.
pub fn adjust(
    prices: &PriceSeries,
    actions: &[RawAction],
    policy: PolicyKind,
) -> Result<AdjustedSeries, AdjustError> {
    PriceAdjuster::new(AdjustConfig::with_policy(policy)).adjust(prices, actions)
}

/// Keep events inside the price range; drop or reject the rest.
///
/// - any event against an empty series: `DomainMismatch`
/// - event before the first price date: governs no domain date, dropped
/// - event after the last price date: `DomainMismatch`
///
/// The two out-of-range cases are not symmetric. An event after the last
/// date would still produce a factor for every date (the fold itself handles
/// it), but it would restate the whole series for a split or dividend the
/// series never shows, which means the price file and the action log cover
/// different periods. That is reported instead of silently applied. An
/// earlier event changes nothing, so dropping it is lossless.
fn events_in_domain(
    prices: &PriceSeries,
    events: Vec<CorporateAction>,
) -> Result<Vec<CorporateAction>, AdjustError> {
    let (first, last) = (prices.first_date(), prices.last_date());
    let mut kept = Vec::with_capacity(events.len());

    for event in events {
        match (first, last) {
            (Some(first), Some(last)) if event.date() <= last => {
                if event.date() < first {
                    warn!(
                        kind = %event.kind(),
                        date = %event.date(),
                        first = %first,
                        "corporate action predates price series; ignored"
                    );
                } else {
                    kept.push(event);
                }
            }
            _ => {
                return Err(AdjustError::DomainMismatch {
                    date: event.date(),
                    kind: event.kind(),
                    first,
                    last,
                })
            }
        }
    }

    Ok(kept)
}

fn checked(
    event: &CorporateAction,
    shape: CorrectionShape,
    value: f64,
) -> Result<f64, AdjustError> {
    if shape.accepts(value) {
        Ok(value)
    } else {
        Err(AdjustError::InvalidIncrement {
            date: event.date(),
            kind: event.kind(),
            shape,
            value,
        })
    }
}

/// Reject a schedule whose composed value left the shape's valid range.
fn check_cumulative(schedule: &CumulativeSchedule, kind: ActionKind) -> Result<(), AdjustError> {
    match schedule.first_rejected_step() {
        Some(step) => Err(AdjustError::InvalidIncrement {
            date: step.date,
            kind,
            shape: schedule.shape(),
            value: step.value,
        }),
        None => Ok(()),
    }
}
