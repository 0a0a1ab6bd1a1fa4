//! Backadjust Core: split- and dividend-adjusted close series.
//!
//! This crate turns a raw close series and a corporate-action log into a
//! back-adjusted close series:
//! - Action ledger: parse and validate the raw action log
//! - Factor builder: reverse-cumulative fold plus step-function reindex
//! - Adjustment policies: interchangeable dividend hypotheses
//! - Price adjuster: combines both correction curves with the raw closes
//! - Reconciliation against a vendor-adjusted reference series
//! - Parallel multi-symbol batches, run fingerprints, CSV/Parquet I/O

pub mod adjuster;
pub mod batch;
pub mod config;
pub mod data;
pub mod domain;
pub mod factor;
pub mod fingerprint;
pub mod ledger;
pub mod policy;
pub mod reconcile;

pub use adjuster::{adjust, AdjustError, PriceAdjuster};
pub use config::{AdjustConfig, ConfigError};
pub use factor::{BoundaryMode, CumulativeSchedule, FactorSeriesBuilder};
pub use ledger::{CorporateActionLedger, MalformedActionError};
pub use policy::{AdjustmentPolicy, DividendScaling, LookupConvention, PolicyKind};
