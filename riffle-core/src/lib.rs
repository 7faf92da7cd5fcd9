//! Riffle Core - record yielders for training input pipelines
//!
//! This crate provides:
//! - Selection of a reading strategy from caller intent
//! - Deterministic, decorrelated per-source seeding
//! - Sequential, pooled-random, chained and weighted-mix yielders
//! - Record file framing and pattern resolution

pub mod error;
pub mod metrics;
pub mod record;
pub mod runtime;
pub mod yielder;
#[cfg(feature = "python")]
pub mod python_api;

pub use error::{Result, YielderError};
pub use record::Record;
pub use runtime::YielderRuntime;
pub use yielder::{
    construct_yielder, construct_yielder_from_config, plan_yielder, InputConfig, RecordYielder,
    YielderKind, YielderPlan,
};

/// Default shuffle buffer capacity, in records
pub const DEFAULT_FILE_BUFFER_SIZE: i64 = yielder::config::DEFAULT_FILE_BUFFER_SIZE;

/// Default number of concurrent readers per source
pub const DEFAULT_FILE_PARALLELISM: i64 = yielder::config::DEFAULT_FILE_PARALLELISM;
