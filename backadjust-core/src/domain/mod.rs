//! Domain types for back-adjustment

pub mod action;
pub mod curve;
pub mod price;

pub use action::{ActionKind, CorporateAction, RawAction};
pub use curve::{CorrectionShape, CurvePoint, FactorCurve};
pub use price::{AdjustedPrice, AdjustedSeries, PriceObservation, PriceSeries};
