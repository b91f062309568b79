//! Configuration loading and typed config structures for the progression
//! core.
//!
//! The canonical configuration lives in `quest-config.yaml` shipped with
//! the app. This module defines strongly-typed structs that mirror the
//! YAML structure and provides a loader that reads and validates the
//! file. Every field has a default matching the reference behavior, so an
//! absent file or empty document yields a working configuration.

use std::path::Path;

use serde::Deserialize;

use crate::quota::DEFAULT_DAILY_LIMIT;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A field value fails a sanity check.
    #[error("invalid config: {reason}")]
    Invalid {
        /// What is wrong with the value.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level progression configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QuestConfig {
    /// Grading attempt limits and timeouts.
    #[serde(default)]
    pub grading: GradingConfig,

    /// Family account policy.
    #[serde(default)]
    pub family: FamilyConfig,
}

/// Grading-related tuning.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GradingConfig {
    /// Voice-grading attempts allowed per calendar day. Advisory,
    /// device-local.
    #[serde(default = "default_daily_limit")]
    pub daily_limit: u32,

    /// Deadline for one grading call in milliseconds. A call that runs
    /// past this resolves as unavailable and degrades to a forced rank C.
    #[serde(default = "default_grading_timeout_ms")]
    pub timeout_ms: u64,
}

/// Family account policy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FamilyConfig {
    /// Maximum heroes per parent account. A soft quota enforced in the
    /// store at creation time.
    #[serde(default = "default_child_cap")]
    pub child_cap: u32,
}

const fn default_daily_limit() -> u32 {
    DEFAULT_DAILY_LIMIT
}

const fn default_grading_timeout_ms() -> u64 {
    15_000
}

const fn default_child_cap() -> u32 {
    2
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            daily_limit: default_daily_limit(),
            timeout_ms: default_grading_timeout_ms(),
        }
    }
}

impl Default for FamilyConfig {
    fn default() -> Self {
        Self {
            child_cap: default_child_cap(),
        }
    }
}

impl Default for QuestConfig {
    fn default() -> Self {
        Self {
            grading: GradingConfig::default(),
            family: FamilyConfig::default(),
        }
    }
}

impl QuestConfig {
    /// Load configuration from a YAML file, falling back to defaults for
    /// absent fields.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, parsed, or
    /// fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml(&raw)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Sanity-check field values.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.grading.daily_limit == 0 {
            return Err(ConfigError::Invalid {
                reason: "grading.daily_limit must be at least 1".to_owned(),
            });
        }
        if self.grading.timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                reason: "grading.timeout_ms must be at least 1".to_owned(),
            });
        }
        if self.family.child_cap == 0 {
            return Err(ConfigError::Invalid {
                reason: "family.child_cap must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}
