//! Factor curves: dense per-date corrections over a price domain.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How increments compose and which value is neutral.
///
/// Split curves and the two ratio dividend policies are multiplicative
/// (neutral 1.0, same-date increments multiply). The subtractive dividend
/// policy accumulates cash amounts instead (neutral 0.0, increments add).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionShape {
    Multiplicative,
    Additive,
}

impl CorrectionShape {
    /// The value that leaves a price unchanged.
    pub fn neutral(self) -> f64 {
        match self {
            CorrectionShape::Multiplicative => 1.0,
            CorrectionShape::Additive => 0.0,
        }
    }

    /// Compose two increments.
    pub fn compose(self, a: f64, b: f64) -> f64 {
        match self {
            CorrectionShape::Multiplicative => a * b,
            CorrectionShape::Additive => a + b,
        }
    }

    /// Whether an increment, or a composed value, is usable for this shape.
    ///
    /// Multiplicative values must be finite and strictly positive; additive
    /// values only need to be finite. Passing for every increment does not
    /// guarantee the composition passes, so cumulative values are checked too.
    pub fn accepts(self, increment: f64) -> bool {
        match self {
            CorrectionShape::Multiplicative => increment.is_finite() && increment > 0.0,
            CorrectionShape::Additive => increment.is_finite(),
        }
    }
}

/// One `(date, value)` point of a curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Dense curve: exactly one point per domain date, in domain order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorCurve {
    shape: CorrectionShape,
    points: Vec<CurvePoint>,
}

impl FactorCurve {
    pub(crate) fn new(shape: CorrectionShape, points: Vec<CurvePoint>) -> Self {
        Self { shape, points }
    }

    /// All-neutral curve over `domain`.
    pub fn neutral(shape: CorrectionShape, domain: &[NaiveDate]) -> Self {
        let points = domain
            .iter()
            .map(|&date| CurvePoint {
                date,
                value: shape.neutral(),
            })
            .collect();
        Self { shape, points }
    }

    pub fn shape(&self) -> CorrectionShape {
        self.shape
    }

    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.value)
    }

    /// Value on a domain date, `None` if the date is not part of the domain.
    pub fn value_at(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| self.points[i].value)
    }

    /// True when every point carries the neutral value.
    pub fn is_neutral(&self) -> bool {
        let neutral = self.shape.neutral();
        self.points.iter().all(|p| p.value == neutral)
    }
}
