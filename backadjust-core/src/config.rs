//! Adjustment configuration, loadable from TOML.
//!
//! ```toml
//! [adjustment]
//! policy = "price_ratio"          # price_ratio | inverse_price_ratio | subtractive
//! boundary = "post_event"         # post_event | pre_event
//! lookup = "previous_close"       # previous_close | same_day_close
//! dividend_scaling = "unscaled"   # unscaled | split_adjusted
//! ```
//!
//! Every key is optional; missing keys take the defaults shown.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::factor::BoundaryMode;
use crate::policy::{DividendScaling, LookupConvention, PolicyKind};

/// Errors from loading or parsing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("unknown {field} '{value}'")]
    UnknownVariant { field: &'static str, value: String },
}

/// Every choice that changes the adjusted series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdjustConfig {
    pub policy: PolicyKind,
    pub boundary: BoundaryMode,
    pub lookup: LookupConvention,
    pub dividend_scaling: DividendScaling,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    adjustment: AdjustConfig,
}

impl AdjustConfig {
    /// Default configuration with a different policy.
    pub fn with_policy(policy: PolicyKind) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        Ok(file.adjustment)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(&ConfigFile { adjustment: *self })?)
    }

    /// Every combination of policy, boundary, lookup and dividend scaling.
    pub fn variants() -> Vec<AdjustConfig> {
        let mut variants = Vec::new();
        for policy in PolicyKind::ALL {
            for boundary in BoundaryMode::ALL {
                for lookup in LookupConvention::ALL {
                    for dividend_scaling in DividendScaling::ALL {
                        variants.push(AdjustConfig {
                            policy,
                            boundary,
                            lookup,
                            dividend_scaling,
                        });
                    }
                }
            }
        }
        variants
    }

    /// Short label, e.g. `price_ratio/post_event/previous_close/unscaled`.
    pub fn label(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.policy, self.boundary, self.lookup, self.dividend_scaling
        )
    }
}
