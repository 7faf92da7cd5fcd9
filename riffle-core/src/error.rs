//! Error types for Riffle
//!
//! Covers configuration, pattern resolution, record framing and
//! yielder lifecycle failures.

use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for all yielder operations
#[derive(Debug, Error)]
pub enum YielderError {
    // ========== Configuration Errors ==========

    /// Caller supplied an input configuration that can never be satisfied
    #[error("Invalid input configuration: {reason}")]
    Configuration { reason: String },

    /// Yielder options rejected by a strategy constructor
    #[error("Invalid yielder options: {reason}")]
    InvalidOptions { reason: String },

    /// Source weights rejected by the mixing strategy
    #[error("Invalid source weights: {reason}")]
    InvalidWeights { reason: String },

    // ========== Pattern Errors ==========

    /// Pattern could not be parsed
    #[error("Invalid file pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Pattern parsed but matched nothing
    #[error("No files matched pattern {pattern:?}")]
    NoFilesMatched { pattern: String },

    // ========== Record Errors ==========

    /// Reading a record file failed
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Record framing is truncated or fails its checksum
    #[error("Corrupt record in {path} at offset {offset}: {reason}")]
    CorruptRecord {
        path: String,
        offset: u64,
        reason: String,
    },

    /// A full pass over the source produced no records
    #[error("Source {pattern:?} produced no records in a full pass")]
    EmptySource { pattern: String },

    // ========== Runtime Errors ==========

    /// Background reading for a source failed; the yielder cannot continue
    #[error("Source {source_id} failed: {reason}")]
    SourceFailed { source_id: usize, reason: String },

    /// Epoch-limited yielder has handed out all of its records
    #[error("Data exhausted for current epoch")]
    DataExhausted,

    /// Yielder was closed
    #[error("Yielder closed")]
    Closed,

    /// Internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl YielderError {
    /// Shorthand for a configuration error
    pub fn configuration(reason: impl Into<String>) -> Self {
        YielderError::Configuration {
            reason: reason.into(),
        }
    }

    /// Returns true if the input itself is malformed and retrying is pointless
    pub fn is_fatal(&self) -> bool {
        matches!(self, YielderError::Configuration { .. })
    }

    /// Returns true if this error indicates data corruption
    pub fn is_corruption(&self) -> bool {
        matches!(self, YielderError::CorruptRecord { .. })
    }
}

/// Result type alias for yielder operations
pub type Result<T> = std::result::Result<T, YielderError>;
