//! Input configuration
//!
//! The seven knobs the selector consumes, loadable from JSON or from
//! `RIFFLE_*` environment variables.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

use crate::error::{Result, YielderError};

/// Default base seed for per-source shuffling
pub const DEFAULT_FILE_RANDOM_SEED: i64 = 301;
/// Default shuffle buffer capacity per source
pub const DEFAULT_FILE_BUFFER_SIZE: i64 = 10_000;
/// Default number of concurrent readers per source
pub const DEFAULT_FILE_PARALLELISM: i64 = 16;

/// Caller intent for reading one training input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Single pattern, or comma-separated patterns when weights are given
    pub file_pattern: String,
    /// One weight per comma-separated pattern; empty means a single source
    pub input_source_weights: Vec<f32>,
    /// 0 lets every source pick its own seed
    pub file_random_seed: i64,
    pub file_buffer_size: i64,
    pub file_parallelism: i64,
    /// Read records in exact on-disk order (single source only)
    pub require_sequential_order: bool,
    /// Read multi-source inputs one source after another instead of mixing
    pub use_chaining: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            file_pattern: String::new(),
            input_source_weights: Vec::new(),
            file_random_seed: DEFAULT_FILE_RANDOM_SEED,
            file_buffer_size: DEFAULT_FILE_BUFFER_SIZE,
            file_parallelism: DEFAULT_FILE_PARALLELISM,
            require_sequential_order: false,
            use_chaining: false,
        }
    }
}

impl InputConfig {
    /// Create a configuration for `file_pattern` with default tuning
    pub fn new(file_pattern: impl Into<String>) -> Self {
        Self {
            file_pattern: file_pattern.into(),
            ..Default::default()
        }
    }

    pub fn with_weights(mut self, weights: Vec<f32>) -> Self {
        self.input_source_weights = weights;
        self
    }

    pub fn with_seed(mut self, seed: i64) -> Self {
        self.file_random_seed = seed;
        self
    }

    pub fn with_buffer(mut self, file_buffer_size: i64, file_parallelism: i64) -> Self {
        self.file_buffer_size = file_buffer_size;
        self.file_parallelism = file_parallelism;
        self
    }

    pub fn sequential(mut self, require_sequential_order: bool) -> Self {
        self.require_sequential_order = require_sequential_order;
        self
    }

    pub fn chaining(mut self, use_chaining: bool) -> Self {
        self.use_chaining = use_chaining;
        self
    }

    /// Parse a JSON document; omitted fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| YielderError::configuration(format!("invalid JSON config: {}", e)))
    }

    /// Read a JSON config file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| YielderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Load from `RIFFLE_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from any key/value lookup using the environment variable names
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file_pattern = lookup("RIFFLE_FILE_PATTERN")
            .ok_or_else(|| YielderError::configuration("RIFFLE_FILE_PATTERN is not set"))?;
        let mut config = Self::new(file_pattern);

        if let Some(raw) = lookup("RIFFLE_SOURCE_WEIGHTS") {
            config.input_source_weights = parse_weights(&raw)?;
        }
        if let Some(raw) = lookup("RIFFLE_RANDOM_SEED") {
            config.file_random_seed = parse_value("RIFFLE_RANDOM_SEED", &raw)?;
        }
        if let Some(raw) = lookup("RIFFLE_BUFFER_SIZE") {
            config.file_buffer_size = parse_value("RIFFLE_BUFFER_SIZE", &raw)?;
        }
        if let Some(raw) = lookup("RIFFLE_PARALLELISM") {
            config.file_parallelism = parse_value("RIFFLE_PARALLELISM", &raw)?;
        }
        if let Some(raw) = lookup("RIFFLE_SEQUENTIAL") {
            config.require_sequential_order = parse_flag("RIFFLE_SEQUENTIAL", &raw)?;
        }
        if let Some(raw) = lookup("RIFFLE_CHAINING") {
            config.use_chaining = parse_flag("RIFFLE_CHAINING", &raw)?;
        }

        Ok(config)
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| YielderError::configuration(format!("{}={:?}: {}", key, raw, e)))
}

fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(YielderError::configuration(format!(
            "{}={:?} is not a boolean",
            key, raw
        ))),
    }
}

/// Comma-separated floats; blank means no weights
fn parse_weights(raw: &str) -> Result<Vec<f32>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    raw.split(',')
        .map(|w| parse_value("RIFFLE_SOURCE_WEIGHTS", w))
        .collect()
}
