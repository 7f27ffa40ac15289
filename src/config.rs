/*!
 * Pool Configuration
 * JSON-described pool layouts, loaded from the environment or defaults
 */

use crate::core::limits::{
    CONFIG_PATH_ENV, DEFAULT_FIXED_BLOCK, DEFAULT_FIXED_TOTAL, DEFAULT_TIERS,
};
use crate::core::types::Size;
use crate::memory::{FixedBlockPool, OwnerMatch, PoolError, PoolResult, TierSpec, VariableBlockPool};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Configuration loading errors
#[derive(Error, Debug, Diagnostic)]
pub enum ConfigError {
    #[error("Failed to read config file {path}")]
    #[diagnostic(
        code(config::io),
        help("Check that the path in HEAP_POOLS_CONFIG exists and is readable.")
    )]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse pool config")]
    #[diagnostic(code(config::parse))]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Pool(#[from] PoolError),
}

/// Fixed pool layout
///
/// `capacity` wins when both it and `total_size` are given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixedPoolConfig {
    #[serde(default)]
    pub capacity: Option<usize>,
    #[serde(default)]
    pub total_size: Option<Size>,
    pub block_size: Size,
}

impl Default for FixedPoolConfig {
    fn default() -> Self {
        Self {
            capacity: None,
            total_size: Some(DEFAULT_FIXED_TOTAL),
            block_size: DEFAULT_FIXED_BLOCK,
        }
    }
}

/// Variable pool layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariablePoolConfig {
    pub tiers: Vec<TierSpec>,
}

impl Default for VariablePoolConfig {
    fn default() -> Self {
        Self {
            tiers: DEFAULT_TIERS
                .iter()
                .map(|&(name, block_size, capacity)| TierSpec::new(name, block_size, capacity))
                .collect(),
        }
    }
}

/// Layout for both pools
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolsConfig {
    pub fixed: FixedPoolConfig,
    pub variable: VariablePoolConfig,
    pub owner_match: OwnerMatch,
}

impl PoolsConfig {
    /// Load from the file named by `HEAP_POOLS_CONFIG`, or fall back to defaults
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::from_path(path),
            None => {
                info!("No {} set, using default pool layout", CONFIG_PATH_ENV);
                Ok(Self::default())
            }
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&text)?;
        info!(path = %path.display(), "Loaded pool config");
        Ok(config)
    }

    /// Parse and validate a JSON document
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the layout without building pools
    pub fn validate(&self) -> PoolResult<()> {
        self.build_fixed()?;
        self.build_variable()?;
        Ok(())
    }

    pub fn build_fixed(&self) -> PoolResult<FixedBlockPool> {
        let fixed = &self.fixed;
        let pool = match (fixed.capacity, fixed.total_size) {
            (Some(capacity), _) => FixedBlockPool::new(capacity, fixed.block_size)?,
            (None, Some(total)) => FixedBlockPool::from_total_size(total, fixed.block_size)?,
            (None, None) => {
                return Err(PoolError::configuration(
                    "fixed pool needs either capacity or total_size",
                ))
            }
        };
        Ok(pool.with_owner_match(self.owner_match))
    }

    pub fn build_variable(&self) -> PoolResult<VariableBlockPool> {
        Ok(VariableBlockPool::new(self.variable.tiers.clone())?.with_owner_match(self.owner_match))
    }
}
