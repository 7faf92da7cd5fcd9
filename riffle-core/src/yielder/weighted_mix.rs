//! Weighted mixing yielder
//!
//! Every request picks a source with probability proportional to its weight
//! and pulls the next record from it. The draw is the only serialized step;
//! pulling from the chosen source happens outside the sampling lock.

use parking_lot::Mutex;
use rand::distr::{weighted::WeightedIndex, Distribution};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use super::stream::{self, SOURCE_PICKS};
use super::{RecordYielder, YielderKind};
use crate::error::{Result, YielderError};
use crate::record::Record;

struct Sampler {
    rng: StdRng,
    index: WeightedIndex<f32>,
}

/// Interleaves several sources in proportion to their weights
pub struct WeightedMixYielder {
    yielders: Vec<Box<dyn RecordYielder>>,
    sampler: Mutex<Sampler>,
}

impl WeightedMixYielder {
    /// Mix `yielders` by `weights` (one per yielder, need not sum to 1)
    ///
    /// A `seed` of 0 seeds the source-selection stream from OS entropy.
    /// Any other seed gets a stream of its own, distinct from the streams
    /// of a source yielder seeded with the same value.
    pub fn new(seed: i64, yielders: Vec<Box<dyn RecordYielder>>, weights: Vec<f32>) -> Result<Self> {
        if yielders.is_empty() {
            return Err(YielderError::InvalidWeights {
                reason: "at least one source is required".into(),
            });
        }
        if yielders.len() != weights.len() {
            return Err(YielderError::InvalidWeights {
                reason: format!(
                    "{} sources but {} weights",
                    yielders.len(),
                    weights.len()
                ),
            });
        }
        if let Some(bad) = weights.iter().find(|w| !w.is_finite()) {
            return Err(YielderError::InvalidWeights {
                reason: format!("weight {} is not finite", bad),
            });
        }

        let index = WeightedIndex::new(&weights).map_err(|e| YielderError::InvalidWeights {
            reason: e.to_string(),
        })?;
        let rng = if seed == 0 {
            StdRng::from_os_rng()
        } else {
            stream::stream_rng(seed as u64, SOURCE_PICKS)
        };

        debug!(sources = yielders.len(), ?weights, "Weighted mix ready");

        Ok(Self {
            yielders,
            sampler: Mutex::new(Sampler { rng, index }),
        })
    }

    fn pick_source(&self) -> usize {
        let mut sampler = self.sampler.lock();
        let Sampler { rng, index } = &mut *sampler;
        index.sample(rng)
    }
}

impl RecordYielder for WeightedMixYielder {
    fn yield_record(&self) -> Result<Record> {
        let source = self.pick_source();
        self.yielders[source].yield_record()
    }

    /// Lowest epoch among the mixed sources
    fn current_epoch(&self) -> u64 {
        self.yielders
            .iter()
            .map(|y| y.current_epoch())
            .min()
            .unwrap_or(1)
    }

    fn kind(&self) -> YielderKind {
        YielderKind::WeightedMix
    }

    fn close(&self) {
        for yielder in &self.yielders {
            yielder.close();
        }
    }
}
