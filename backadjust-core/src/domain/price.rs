//! Raw close observations and the adjusted series derived from them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::adjuster::AdjustError;

/// One raw, unadjusted close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub date: NaiveDate,
    pub close: f64,
}

impl PriceObservation {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}

/// Raw close series with strictly ascending dates.
///
/// Gaps between dates are allowed; duplicates and out-of-order rows are not.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PriceSeries {
    observations: Vec<PriceObservation>,
}

impl PriceSeries {
    pub fn new(observations: Vec<PriceObservation>) -> Result<Self, AdjustError> {
        if let Some(index) = observations
            .windows(2)
            .position(|w| w[1].date <= w[0].date)
        {
            return Err(AdjustError::UnorderedPrices {
                index: index + 1,
                previous: observations[index].date,
                date: observations[index + 1].date,
            });
        }
        Ok(Self { observations })
    }

    pub fn from_pairs(
        pairs: impl IntoIterator<Item = (NaiveDate, f64)>,
    ) -> Result<Self, AdjustError> {
        Self::new(
            pairs
                .into_iter()
                .map(|(date, close)| PriceObservation::new(date, close))
                .collect(),
        )
    }

    pub fn observations(&self) -> &[PriceObservation] {
        &self.observations
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.observations.iter().map(|o| o.date).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.close).collect()
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.observations.first().map(|o| o.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.observations.last().map(|o| o.date)
    }

    /// Close observed exactly on `date`.
    pub fn close_on(&self, date: NaiveDate) -> Option<f64> {
        self.observations
            .binary_search_by_key(&date, |o| o.date)
            .ok()
            .map(|i| self.observations[i].close)
    }

    /// Last observation strictly before `date`.
    pub fn observation_before(&self, date: NaiveDate) -> Option<PriceObservation> {
        let idx = self.observations.partition_point(|o| o.date < date);
        idx.checked_sub(1).map(|i| self.observations[i])
    }
}

/// One adjusted close with the corrections that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdjustedPrice {
    pub date: NaiveDate,
    pub raw_close: f64,
    pub split_factor: f64,
    /// Multiplicative factor or accumulated cash amount, depending on policy.
    pub dividend_correction: f64,
    pub adjusted_close: f64,
}

/// Adjusted series over exactly the raw series' date domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustedSeries {
    pub policy: String,
    pub points: Vec<AdjustedPrice>,
}

impl AdjustedSeries {
    pub fn new(policy: impl Into<String>, points: Vec<AdjustedPrice>) -> Self {
        Self {
            policy: policy.into(),
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.adjusted_close).collect()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&AdjustedPrice> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| &self.points[i])
    }

    /// Points whose adjusted close went below zero.
    ///
    /// Only the subtractive dividend policy can produce these; they are
    /// reported as-is, never clipped.
    pub fn negative_points(&self) -> impl Iterator<Item = &AdjustedPrice> {
        self.points.iter().filter(|p| p.adjusted_close < 0.0)
    }
}
