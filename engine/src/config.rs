//! # Engine Configuration
//!
//! Deployment-time parameters: the initial global vesting start and the cap
//! for each allocation category. Loaded from JSON so the same file can be
//! shared with reporting tooling.
//!
//! ```json
//! {
//!   "global_vesting_start": "2026-01-01T00:00:00Z",
//!   "categories": [
//!     { "category": "team", "max_allocation": 150000000 },
//!     ...
//!   ]
//! }
//! ```
//!
//! Every category must appear exactly once.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{default_cap, DEFAULT_GLOBAL_VESTING_START_TS};
use crate::types::AllocationCategory;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The JSON is malformed or does not match the schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A category is listed more than once.
    #[error("duplicate category in config: {0}")]
    DuplicateCategory(AllocationCategory),

    /// A category is missing.
    #[error("missing category in config: {0}")]
    MissingCategory(AllocationCategory),
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Cap for a single category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub category: AllocationCategory,
    pub max_allocation: u64,
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Default start for schedules created without one.
    pub global_vesting_start: DateTime<Utc>,
    /// One entry per [`AllocationCategory`].
    pub categories: Vec<CategoryConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            global_vesting_start: DateTime::from_timestamp(DEFAULT_GLOBAL_VESTING_START_TS, 0)
                .unwrap_or_default(),
            categories: AllocationCategory::ALL
                .iter()
                .map(|c| CategoryConfig {
                    category: *c,
                    max_allocation: default_cap(*c),
                })
                .collect(),
        }
    }
}

impl EngineConfig {
    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Every category exactly once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for entry in &self.categories {
            if !seen.insert(entry.category) {
                return Err(ConfigError::DuplicateCategory(entry.category));
            }
        }
        if let Some(missing) = AllocationCategory::ALL
            .iter()
            .find(|c| !seen.contains(*c))
        {
            return Err(ConfigError::MissingCategory(*missing));
        }
        Ok(())
    }

    /// `(category, cap)` pairs for [`crate::category::CategoryLedger::new`].
    pub fn caps(&self) -> impl Iterator<Item = (AllocationCategory, u64)> + '_ {
        self.categories.iter().map(|c| (c.category, c.max_allocation))
    }

    /// Cap configured for `category`, if present.
    pub fn cap_for(&self, category: AllocationCategory) -> Option<u64> {
        self.categories
            .iter()
            .find(|c| c.category == category)
            .map(|c| c.max_allocation)
    }
}
