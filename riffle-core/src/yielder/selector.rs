//! Yielder selection
//!
//! Turns caller intent into exactly one reading strategy. Selection is
//! pure: `plan_yielder` only validates and derives per-source options,
//! and `YielderPlan::build` is the single place that touches files.

use std::sync::Arc;
use tracing::info;

use super::basic::BasicYielder;
use super::chain::ChainYielder;
use super::config::InputConfig;
use super::options::BasicYielderOptions;
use super::sequential::SequentialYielder;
use super::weighted_mix::WeightedMixYielder;
use super::{RecordYielder, YielderKind};
use crate::error::{Result, YielderError};
use crate::record::split_format_prefix;
use crate::runtime::YielderRuntime;

/// Derived seeds stay below this bound (fits a 32-bit seed domain)
pub const SEED_MODULUS: i64 = i32::MAX as i64 - 1;

/// Seed for source `source_id` derived from the base seed
///
/// A base of 0 means every source picks its own seed, so 0 is passed
/// through. Otherwise `(base + source_id) mod SEED_MODULUS`, with a
/// result of 0 bumped to 1 so it cannot be mistaken for "pick randomly".
pub fn derive_source_seed(file_random_seed: i64, source_id: usize) -> i64 {
    if file_random_seed == 0 {
        return 0;
    }
    let sum = i128::from(file_random_seed) + source_id as i128;
    match sum.rem_euclid(i128::from(SEED_MODULUS)) as i64 {
        0 => 1,
        seed => seed,
    }
}

/// Split `file_pattern` into one pattern per source
///
/// Without weights the pattern is a single source and is never split.
/// A format prefix on the first pattern carries over to every later
/// pattern that does not name its own format.
pub fn split_file_patterns(file_pattern: &str, input_source_weights: &[f32]) -> Result<Vec<String>> {
    if input_source_weights.is_empty() {
        info!("Input source weights are empty, falling back to legacy single-source behavior");
        return Ok(vec![file_pattern.to_string()]);
    }

    let mut patterns: Vec<String> = file_pattern.split(',').map(String::from).collect();
    if patterns.len() != input_source_weights.len() {
        return Err(YielderError::configuration(format!(
            "there must be exactly one input source weight per comma-separated \
             file pattern, got {} patterns and {} weights",
            patterns.len(),
            input_source_weights.len()
        )));
    }

    let leading = split_format_prefix(&patterns[0]).map(|(format, _)| format);
    if let Some(format) = leading {
        for pattern in &mut patterns[1..] {
            if split_format_prefix(pattern).is_none() {
                *pattern = format!("{}:{}", format.prefix(), pattern);
            }
        }
    }
    Ok(patterns)
}

/// The strategy chosen for an input, before anything is opened
#[derive(Debug, Clone, PartialEq)]
pub enum YielderPlan {
    Sequential {
        file_pattern: String,
    },
    Basic(BasicYielderOptions),
    Chain(Vec<BasicYielderOptions>),
    WeightedMix {
        /// Base seed for the source-selection stream
        seed: i64,
        options: Vec<BasicYielderOptions>,
        /// Weights as passed by the caller
        weights: Vec<f32>,
    },
}

impl YielderPlan {
    pub fn kind(&self) -> YielderKind {
        match self {
            YielderPlan::Sequential { .. } => YielderKind::Sequential,
            YielderPlan::Basic(_) => YielderKind::Basic,
            YielderPlan::Chain(_) => YielderKind::Chain,
            YielderPlan::WeightedMix { .. } => YielderKind::WeightedMix,
        }
    }

    /// Per-source options, empty for the sequential strategy
    pub fn source_options(&self) -> &[BasicYielderOptions] {
        match self {
            YielderPlan::Sequential { .. } => &[],
            YielderPlan::Basic(options) => std::slice::from_ref(options),
            YielderPlan::Chain(options) | YielderPlan::WeightedMix { options, .. } => options,
        }
    }

    /// Construct the planned yielder
    ///
    /// Errors from the strategy constructors are returned unchanged.
    pub fn build(self, runtime: &Arc<YielderRuntime>) -> Result<Box<dyn RecordYielder>> {
        let yielder: Box<dyn RecordYielder> = match self {
            YielderPlan::Sequential { file_pattern } => {
                Box::new(SequentialYielder::new(&file_pattern)?)
            }
            YielderPlan::Basic(options) => Box::new(BasicYielder::new(runtime, options)?),
            YielderPlan::Chain(options) => Box::new(ChainYielder::new(runtime, options)?),
            YielderPlan::WeightedMix {
                seed,
                options,
                weights,
            } => {
                let yielders = options
                    .into_iter()
                    .map(|opts| {
                        BasicYielder::new(runtime, opts)
                            .map(|y| Box::new(y) as Box<dyn RecordYielder>)
                    })
                    .collect::<Result<Vec<_>>>()?;
                Box::new(WeightedMixYielder::new(seed, yielders, weights)?)
            }
        };
        Ok(yielder)
    }
}

/// Choose a strategy and derive per-source options for `config`
pub fn plan_yielder(config: &InputConfig) -> Result<YielderPlan> {
    let mut patterns = split_file_patterns(&config.file_pattern, &config.input_source_weights)?;

    if config.require_sequential_order {
        if patterns.len() != 1 {
            return Err(YielderError::configuration(
                "require_sequential_order does not support record mixing or chaining",
            ));
        }
        let file_pattern = patterns.swap_remove(0);
        info!(pattern = %file_pattern, "Selected sequential yielder");
        return Ok(YielderPlan::Sequential { file_pattern });
    }

    let mut options: Vec<BasicYielderOptions> = patterns
        .into_iter()
        .enumerate()
        .map(|(i, file_pattern)| BasicYielderOptions {
            file_pattern,
            seed: derive_source_seed(config.file_random_seed, i),
            bufsize: config.file_buffer_size,
            parallelism: config.file_parallelism,
            source_id: i,
        })
        .collect();

    let plan = if options.len() == 1 {
        YielderPlan::Basic(options.swap_remove(0))
    } else if config.use_chaining {
        info!(
            weights = ?config.input_source_weights,
            "Chaining reads sources in declaration order; source weights are not used"
        );
        YielderPlan::Chain(options)
    } else {
        YielderPlan::WeightedMix {
            seed: config.file_random_seed,
            options,
            weights: config.input_source_weights.clone(),
        }
    };

    info!(
        strategy = %plan.kind(),
        sources = plan.source_options().len(),
        "Selected record yielder"
    );
    Ok(plan)
}

/// Build the yielder for `config` on the shared runtime
pub fn construct_yielder_from_config(config: &InputConfig) -> Result<Box<dyn RecordYielder>> {
    let plan = plan_yielder(config)?;
    plan.build(&YielderRuntime::shared()?)
}

/// Build exactly one yielder from the raw selector inputs
///
/// Fails with `YielderError::Configuration` on a weight/pattern count
/// mismatch or when strict order is requested for several sources.
#[allow(clippy::too_many_arguments)]
pub fn construct_yielder(
    file_pattern: &str,
    input_source_weights: &[f32],
    file_random_seed: i64,
    file_buffer_size: i64,
    file_parallelism: i64,
    require_sequential_order: bool,
    use_chaining: bool,
) -> Result<Box<dyn RecordYielder>> {
    construct_yielder_from_config(&InputConfig {
        file_pattern: file_pattern.to_string(),
        input_source_weights: input_source_weights.to_vec(),
        file_random_seed,
        file_buffer_size,
        file_parallelism,
        require_sequential_order,
        use_chaining,
    })
}
