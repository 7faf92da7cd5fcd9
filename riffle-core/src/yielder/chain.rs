//! Chained yielder
//!
//! Reads each source for one full epoch, in declaration order, then wraps
//! around to the first source. Only one source is open at a time.

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

use super::basic::BasicYielder;
use super::options::BasicYielderOptions;
use super::{RecordYielder, YielderKind};
use crate::error::{Result, YielderError};
use crate::record::{FilePattern, Record};
use crate::runtime::YielderRuntime;

struct ChainState {
    active: Arc<BasicYielder>,
    index: usize,
    /// Bumped every time `active` is replaced
    generation: u64,
    epoch: u64,
    closed: bool,
}

/// Concatenates the record streams of several sources
pub struct ChainYielder {
    runtime: Arc<YielderRuntime>,
    options: Vec<BasicYielderOptions>,
    state: Mutex<ChainState>,
}

impl ChainYielder {
    /// Validate every source up front and open the first one
    pub fn new(runtime: &Arc<YielderRuntime>, options: Vec<BasicYielderOptions>) -> Result<Self> {
        let Some(first) = options.first() else {
            return Err(YielderError::InvalidOptions {
                reason: "chaining requires at least one source".into(),
            });
        };

        for opts in &options[1..] {
            FilePattern::parse(&opts.file_pattern)?.resolve()?;
        }
        let active = BasicYielder::with_epoch_limit(runtime, first.clone(), Some(1))?;

        Ok(Self {
            runtime: runtime.clone(),
            options,
            state: Mutex::new(ChainState {
                active: Arc::new(active),
                index: 0,
                generation: 0,
                epoch: 1,
                closed: false,
            }),
        })
    }

    /// Replace the exhausted child unless another consumer already did
    ///
    /// The next child is opened without holding the chain lock; a consumer
    /// that loses the race drops the child it opened.
    fn advance(&self, exhausted_generation: u64) -> Result<()> {
        let next = {
            let state = self.state.lock();
            if state.closed || state.generation != exhausted_generation {
                return Ok(());
            }
            (state.index + 1) % self.options.len()
        };

        let active =
            BasicYielder::with_epoch_limit(&self.runtime, self.options[next].clone(), Some(1))?;

        let mut state = self.state.lock();
        if state.closed || state.generation != exhausted_generation {
            return Ok(());
        }
        if next == 0 {
            state.epoch += 1;
        }
        state.index = next;
        state.generation += 1;
        state.active = Arc::new(active);

        debug!(source_id = next, epoch = state.epoch, "Chain advanced to next source");
        Ok(())
    }
}

impl RecordYielder for ChainYielder {
    fn yield_record(&self) -> Result<Record> {
        loop {
            let (active, generation, epoch) = {
                let state = self.state.lock();
                if state.closed {
                    return Err(YielderError::Closed);
                }
                (state.active.clone(), state.generation, state.epoch)
            };

            match active.yield_record() {
                Ok(mut record) => {
                    record.epoch = epoch;
                    return Ok(record);
                }
                Err(YielderError::DataExhausted) => self.advance(generation)?,
                Err(e) => return Err(e),
            }
        }
    }

    fn current_epoch(&self) -> u64 {
        self.state.lock().epoch
    }

    fn kind(&self) -> YielderKind {
        YielderKind::Chain
    }

    fn close(&self) {
        let active = {
            let mut state = self.state.lock();
            state.closed = true;
            state.active.clone()
        };
        active.close();
    }
}
