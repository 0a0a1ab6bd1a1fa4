//! Factor series builder: sparse event increments to a dense correction curve.
//!
//! Two steps, both pure:
//!
//! 1. **Reverse-cumulative fold.** Events are sorted by date (stable), same-date
//!    increments are composed, then folded from the most recent event back to
//!    the oldest. Each event date is assigned the running value *including* its
//!    own increment: the correction for any price dated before that event.
//!    The oldest event therefore carries the composition of every increment.
//!
//! 2. **Step-function reindex.** Each domain date takes the cumulative value of
//!    its governing event, the nearest event after it. Dates with no governing
//!    event get the neutral value.
//!
//! Whether an event's own date is governed by that event is fixed by
//! [`BoundaryMode`]. Feeds disagree on this, so it is a parameter rather than
//! an artifact of how the fill happens to be written.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::ConfigError;
use crate::domain::{CorporateAction, CorrectionShape, CurvePoint, FactorCurve};

/// Which side of the correction an event's own date falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryMode {
    /// The event date already trades in post-event terms: it gets the value
    /// of the *next* event (neutral if none). Only strictly earlier dates
    /// carry this event's correction.
    #[default]
    PostEvent,
    /// The event date still carries the pre-event cumulative value, as a
    /// backward fill keyed on the event date would produce.
    PreEvent,
}

impl BoundaryMode {
    pub const ALL: [BoundaryMode; 2] = [BoundaryMode::PostEvent, BoundaryMode::PreEvent];

    /// Whether an event dated `event` corrects a price dated `date`.
    pub fn governs(self, event: NaiveDate, date: NaiveDate) -> bool {
        match self {
            BoundaryMode::PostEvent => date < event,
            BoundaryMode::PreEvent => date <= event,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BoundaryMode::PostEvent => "post_event",
            BoundaryMode::PreEvent => "pre_event",
        }
    }
}

impl fmt::Display for BoundaryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BoundaryMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BoundaryMode::ALL
            .into_iter()
            .find(|m| m.as_str() == s.trim())
            .ok_or_else(|| ConfigError::UnknownVariant {
                field: "boundary",
                value: s.to_string(),
            })
    }
}

/// Reverse-cumulative values, one step per distinct event date, ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct CumulativeSchedule {
    shape: CorrectionShape,
    boundary: BoundaryMode,
    steps: Vec<CurvePoint>,
}

impl CumulativeSchedule {
    /// Fold date-sorted `(date, increment)` pairs.
    ///
    /// Same-date increments are composed before folding, in input order.
    fn from_sorted(
        shape: CorrectionShape,
        boundary: BoundaryMode,
        increments: &[(NaiveDate, f64)],
    ) -> Self {
        let grouped = increments
            .iter()
            .fold(Vec::<CurvePoint>::new(), |mut acc, &(date, increment)| {
                match acc.last_mut() {
                    Some(last) if last.date == date => {
                        last.value = shape.compose(last.value, increment)
                    }
                    _ => acc.push(CurvePoint {
                        date,
                        value: increment,
                    }),
                }
                acc
            });

        let mut steps: Vec<CurvePoint> = grouped
            .iter()
            .rev()
            .scan(shape.neutral(), |running, point| {
                *running = shape.compose(*running, point.value);
                Some(CurvePoint {
                    date: point.date,
                    value: *running,
                })
            })
            .collect();
        steps.reverse();

        Self {
            shape,
            boundary,
            steps,
        }
    }

    pub fn shape(&self) -> CorrectionShape {
        self.shape
    }

    pub fn boundary(&self) -> BoundaryMode {
        self.boundary
    }

    /// One point per distinct event date, ascending.
    pub fn steps(&self) -> &[CurvePoint] {
        &self.steps
    }

    /// Composition of every increment: the value before the earliest event.
    pub fn total(&self) -> f64 {
        self.steps
            .first()
            .map_or(self.shape.neutral(), |step| step.value)
    }

    /// First cumulative step the shape does not accept.
    ///
    /// Every increment can be valid while their composition is not: a long
    /// run of large splits underflows the product to 0.0, and additive sums
    /// can overflow to infinity.
    pub fn first_rejected_step(&self) -> Option<CurvePoint> {
        self.steps
            .iter()
            .find(|step| !self.shape.accepts(step.value))
            .copied()
    }

    /// Value for an arbitrary date, inside or outside any price domain.
    pub fn value_at(&self, date: NaiveDate) -> f64 {
        let idx = self
            .steps
            .partition_point(|step| !self.boundary.governs(step.date, date));
        self.steps
            .get(idx)
            .map_or(self.shape.neutral(), |step| step.value)
    }

    /// Dense curve over `domain`, which must be sorted ascending.
    ///
    /// Single forward pass: the cursor only advances as domain dates pass
    /// event dates.
    pub fn reindex(&self, domain: &[NaiveDate]) -> FactorCurve {
        debug_assert!(domain.windows(2).all(|w| w[0] <= w[1]));

        let neutral = self.shape.neutral();
        let mut cursor = 0;
        let points = domain
            .iter()
            .map(|&date| {
                while cursor < self.steps.len()
                    && !self.boundary.governs(self.steps[cursor].date, date)
                {
                    cursor += 1;
                }
                CurvePoint {
                    date,
                    value: self.steps.get(cursor).map_or(neutral, |step| step.value),
                }
            })
            .collect();

        FactorCurve::new(self.shape, points)
    }
}

/// Builds factor curves for one correction shape and boundary convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FactorSeriesBuilder {
    shape: CorrectionShape,
    boundary: BoundaryMode,
}

impl FactorSeriesBuilder {
    pub fn new(shape: CorrectionShape, boundary: BoundaryMode) -> Self {
        Self { shape, boundary }
    }

    pub fn multiplicative(boundary: BoundaryMode) -> Self {
        Self::new(CorrectionShape::Multiplicative, boundary)
    }

    /// Sort, map to increments, and fold. The first failing increment aborts.
    pub fn schedule<E, F>(
        &self,
        events: &[CorporateAction],
        mut increment: F,
    ) -> Result<CumulativeSchedule, E>
    where
        F: FnMut(&CorporateAction) -> Result<f64, E>,
    {
        let mut sorted: Vec<&CorporateAction> = events.iter().collect();
        sorted.sort_by_key(|e| e.date());

        let increments = sorted
            .into_iter()
            .map(|event| increment(event).map(|value| (event.date(), value)))
            .collect::<Result<Vec<_>, E>>()?;

        Ok(CumulativeSchedule::from_sorted(
            self.shape,
            self.boundary,
            &increments,
        ))
    }

    /// Full build: schedule, then reindex onto `domain`.
    pub fn build<E, F>(
        &self,
        events: &[CorporateAction],
        domain: &[NaiveDate],
        increment: F,
    ) -> Result<FactorCurve, E>
    where
        F: FnMut(&CorporateAction) -> Result<f64, E>,
    {
        Ok(self.schedule(events, increment)?.reindex(domain))
    }
}
