//! Per-source yielder options

use serde::{Deserialize, Serialize};

/// Configuration of one pooled-random source
///
/// Built once per source by the selector and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicYielderOptions {
    /// Source pattern, `[format:]glob[,glob...]`
    pub file_pattern: String,
    /// Shuffle seed; 0 lets the yielder pick one from OS entropy
    pub seed: i64,
    /// Shuffle buffer capacity in records
    pub bufsize: i64,
    /// Number of concurrent file readers
    pub parallelism: i64,
    /// Index of this source among its siblings
    pub source_id: usize,
}

impl BasicYielderOptions {
    /// Create options for a single source with id 0
    pub fn new(file_pattern: impl Into<String>, seed: i64, bufsize: i64, parallelism: i64) -> Self {
        Self {
            file_pattern: file_pattern.into(),
            seed,
            bufsize,
            parallelism,
            source_id: 0,
        }
    }

    pub fn with_source_id(mut self, source_id: usize) -> Self {
        self.source_id = source_id;
        self
    }
}
