//! Engine configuration.
//!
//! [`EngineConfig`] holds the knobs a host can tune: output compression,
//! the default merge name, whether separators are on by default and how
//! many split ranges may be composed at once. Every field has a default,
//! so a partial JSON document is a valid configuration.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Result, WeaveError};

/// Default name of a merge output, before the extension is appended.
pub const DEFAULT_MERGE_NAME: &str = "merged";

/// Compression level for serialized outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    /// No compression - streams are written as copied.
    None,
    /// Compress streams.
    #[default]
    Standard,
    /// Drop unreachable objects, then compress streams.
    Maximum,
}

impl FromStr for CompressionLevel {
    type Err = WeaveError;

    /// Parse compression level from "none", "standard" or "maximum".
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "standard" => Ok(Self::Standard),
            "maximum" => Ok(Self::Maximum),
            _ => Err(WeaveError::invalid_config(format!(
                "Invalid compression level: {s}. Must be one of: none, standard, maximum"
            ))),
        }
    }
}

/// Settings shared by every composition in a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Compression applied when outputs are serialized.
    pub compression: CompressionLevel,

    /// Merge output name used when the caller gives none.
    pub default_merge_name: String,

    /// Whether merges insert a blank page between sources unless told otherwise.
    pub insert_separators: bool,

    /// Maximum number of split ranges composed concurrently (None = auto-detect).
    pub jobs: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            compression: CompressionLevel::default(),
            default_merge_name: DEFAULT_MERGE_NAME.to_string(),
            insert_separators: false,
            jobs: None,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON, filling missing fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the JSON is malformed or fails validation.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Jobs count is zero
    /// - Default merge name is blank
    pub fn validate(&self) -> Result<()> {
        if let Some(jobs) = self.jobs
            && jobs == 0
        {
            return Err(WeaveError::invalid_config(
                "Number of jobs must be at least 1",
            ));
        }

        if self.default_merge_name.trim().is_empty() {
            return Err(WeaveError::invalid_config(
                "Default merge name cannot be empty",
            ));
        }

        Ok(())
    }

    /// Get the effective number of concurrent range compositions.
    ///
    /// Returns the configured job count, or the number of CPU cores if auto-detect.
    pub fn effective_jobs(&self) -> usize {
        self.jobs.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}
