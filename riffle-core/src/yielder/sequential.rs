//! Strict-order yielder
//!
//! Reads the files of a single source in sorted order, and the records of
//! each file in on-disk order. No shuffling and no background work: every
//! read happens on the calling thread under one lock.

use bytes::Bytes;
use parking_lot::Mutex;
use std::path::PathBuf;
use tracing::debug;

use super::{RecordYielder, YielderKind};
use crate::error::{Result, YielderError};
use crate::metrics::standard;
use crate::record::{FilePattern, Record, RecordIter};

struct SequentialState {
    files: Vec<PathBuf>,
    next_file: usize,
    current: Option<RecordIter>,
    epoch: u64,
    yielded_in_epoch: u64,
    closed: bool,
}

/// Yields the records of one source in exact file order, forever
pub struct SequentialYielder {
    pattern: FilePattern,
    state: Mutex<SequentialState>,
}

impl SequentialYielder {
    /// Resolve `file_pattern` and position at its first record
    pub fn new(file_pattern: &str) -> Result<Self> {
        let pattern = FilePattern::parse(file_pattern)?;
        let files = pattern.resolve()?;
        debug!(
            pattern = pattern.as_str(),
            files = files.len(),
            "Sequential yielder resolved source"
        );

        Ok(Self {
            pattern,
            state: Mutex::new(SequentialState {
                files,
                next_file: 0,
                current: None,
                epoch: 1,
                yielded_in_epoch: 0,
                closed: false,
            }),
        })
    }
}

impl RecordYielder for SequentialYielder {
    fn yield_record(&self) -> Result<Record> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        loop {
            if state.closed {
                return Err(YielderError::Closed);
            }

            if let Some(records) = state.current.as_mut() {
                match records.next() {
                    Some(Ok(data)) => {
                        state.yielded_in_epoch += 1;
                        standard::RECORDS_YIELDED.inc();
                        return Ok(Record::new(data, 0, state.epoch));
                    }
                    Some(Err(e)) => {
                        // Skip the rest of a corrupt file on the next call
                        state.current = None;
                        return Err(e);
                    }
                    None => state.current = None,
                }
            }

            if state.next_file >= state.files.len() {
                if state.yielded_in_epoch == 0 {
                    return Err(YielderError::EmptySource {
                        pattern: self.pattern.as_str().to_string(),
                    });
                }
                state.files = self.pattern.resolve()?;
                state.next_file = 0;
                state.epoch += 1;
                state.yielded_in_epoch = 0;
                debug!(
                    pattern = self.pattern.as_str(),
                    epoch = state.epoch,
                    "Sequential yielder starting new epoch"
                );
            }

            let path = state.files[state.next_file].clone();
            state.next_file += 1;

            let data = std::fs::read(&path).map_err(|source| YielderError::Io {
                path: path.clone(),
                source,
            })?;
            standard::FILES_READ.inc();
            standard::BYTES_READ.inc_by(data.len() as u64);

            state.current = Some(
                self.pattern
                    .format()
                    .records(Bytes::from(data), path.display().to_string()),
            );
        }
    }

    fn current_epoch(&self) -> u64 {
        self.state.lock().epoch
    }

    fn kind(&self) -> YielderKind {
        YielderKind::Sequential
    }

    fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        state.current = None;
    }
}
