//! Run fingerprinting: deterministic identification of an adjustment run.
//!
//! - `config_hash`: the adjustment configuration alone.
//! - `prices_hash`: the raw close series.
//! - `actions_hash`: the raw action log, in feed order.
//! - `run_hash()`: all three combined. Identical inputs and configuration
//!   always produce the same adjusted series, so equal run hashes mean
//!   equal outputs.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::AdjustConfig;
use crate::domain::{PriceSeries, RawAction};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdjustmentFingerprint {
    pub config_hash: String,
    pub prices_hash: String,
    pub actions_hash: String,
}

impl AdjustmentFingerprint {
    pub fn compute(
        config: &AdjustConfig,
        prices: &PriceSeries,
        actions: &[RawAction],
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            config_hash: hash_json(config)?,
            prices_hash: hash_json(prices)?,
            actions_hash: hash_json(actions)?,
        })
    }

    /// Combined BLAKE3 hash over the three component hashes.
    pub fn run_hash(&self) -> String {
        let canonical = json!({
            "actions_hash": &self.actions_hash,
            "config_hash": &self.config_hash,
            "prices_hash": &self.prices_hash,
        });
        blake3::hash(canonical.to_string().as_bytes())
            .to_hex()
            .to_string()
    }
}

fn hash_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let bytes = serde_json::to_vec(value)?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}
