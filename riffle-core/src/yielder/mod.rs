//! Record yielders
//!
//! Four interchangeable reading strategies behind one trait, plus the
//! selector that picks among them from the input configuration.

pub mod backpressure;
pub mod basic;
pub mod chain;
pub mod config;
pub mod options;
pub mod selector;
pub mod sequential;
pub mod stream;
pub mod weighted_mix;

use std::fmt;

use crate::error::Result;
use crate::record::Record;

pub use backpressure::BackpressureController;
pub use basic::BasicYielder;
pub use chain::ChainYielder;
pub use config::InputConfig;
pub use options::BasicYielderOptions;
pub use selector::{
    construct_yielder, construct_yielder_from_config, derive_source_seed, plan_yielder,
    split_file_patterns, YielderPlan, SEED_MODULUS,
};
pub use sequential::SequentialYielder;
pub use weighted_mix::WeightedMixYielder;

/// A source of records
///
/// Consumers only rely on this trait, never on the strategy behind it.
/// Implementations accept concurrent `yield_record` calls from any
/// number of threads.
pub trait RecordYielder: Send + Sync {
    /// Block until the next record is available
    fn yield_record(&self) -> Result<Record>;

    /// 1-based pass over the data currently being produced
    fn current_epoch(&self) -> u64;

    /// Strategy backing this yielder
    fn kind(&self) -> YielderKind;

    /// Stop background work; later calls to `yield_record` fail with `Closed`
    fn close(&self);
}

/// The reading strategies a selector can choose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum YielderKind {
    /// Strict on-disk order over one source
    Sequential,
    /// Pooled-random reading over one source
    Basic,
    /// Sources read one after another
    Chain,
    /// Sources sampled in proportion to their weights
    WeightedMix,
}

impl fmt::Display for YielderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            YielderKind::Sequential => "sequential",
            YielderKind::Basic => "basic",
            YielderKind::Chain => "chain",
            YielderKind::WeightedMix => "weighted_mix",
        };
        f.write_str(name)
    }
}
