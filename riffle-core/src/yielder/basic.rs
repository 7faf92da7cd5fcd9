//! Pooled-random yielder
//!
//! A driver task on the yielder runtime walks the source's files once per
//! epoch in a seeded shuffled order, fanning them out to `parallelism`
//! reader tasks. Readers feed a bounded shuffle buffer; consumers take a
//! uniformly random buffered record once the buffer is full.

use bytes::Bytes;
use parking_lot::{Condvar, Mutex};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info};

use super::backpressure::{BackpressureController, BackpressurePermit};
use super::options::BasicYielderOptions;
use super::stream::{self, BUFFER_PICKS};
use super::{RecordYielder, YielderKind};
use crate::error::{Result, YielderError};
use crate::metrics::standard;
use crate::record::{FilePattern, Record, RecordFormat};
use crate::runtime::YielderRuntime;

struct BufferState {
    buffer: Vec<(Record, BackpressurePermit)>,
    rng: StdRng,
    producer_done: bool,
    closed: bool,
    failure: Option<String>,
}

/// State shared between consumers and the background readers
struct Shared {
    source_id: usize,
    bufsize: usize,
    state: Mutex<BufferState>,
    ready: Condvar,
    epoch: AtomicU64,
    slots: BackpressureController,
}

impl Shared {
    fn new(source_id: usize, bufsize: usize, seed: u64) -> Self {
        Self {
            source_id,
            bufsize,
            state: Mutex::new(BufferState {
                buffer: Vec::with_capacity(bufsize),
                rng: stream::stream_rng(seed, BUFFER_PICKS),
                producer_done: false,
                closed: false,
                failure: None,
            }),
            ready: Condvar::new(),
            epoch: AtomicU64::new(1),
            slots: BackpressureController::new(bufsize),
        }
    }

    fn push(&self, record: Record, permit: BackpressurePermit) {
        self.state.lock().buffer.push((record, permit));
        self.ready.notify_one();
    }

    fn finish(&self) {
        self.state.lock().producer_done = true;
        self.ready.notify_all();
    }

    fn fail(&self, reason: String) {
        self.state.lock().failure.get_or_insert(reason);
        self.ready.notify_all();
    }
}

/// Pooled-random yielder over one source
pub struct BasicYielder {
    shared: Arc<Shared>,
    driver: Mutex<Option<JoinHandle<()>>>,
    _runtime: Arc<YielderRuntime>,
}

fn positive(value: i64, name: &str) -> Result<usize> {
    usize::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| YielderError::InvalidOptions {
            reason: format!("{} must be positive, got {}", name, value),
        })
}

impl BasicYielder {
    /// Create a yielder that reads its source forever
    pub fn new(runtime: &Arc<YielderRuntime>, options: BasicYielderOptions) -> Result<Self> {
        Self::with_epoch_limit(runtime, options, None)
    }

    /// Create a yielder that stops after `epoch_limit` passes
    ///
    /// Once the last pass is read and the buffer drained, `yield_record`
    /// returns `DataExhausted`.
    pub fn with_epoch_limit(
        runtime: &Arc<YielderRuntime>,
        options: BasicYielderOptions,
        epoch_limit: Option<u64>,
    ) -> Result<Self> {
        let bufsize = positive(options.bufsize, "bufsize")?;
        let parallelism = positive(options.parallelism, "parallelism")?;
        if epoch_limit == Some(0) {
            return Err(YielderError::InvalidOptions {
                reason: "epoch limit must be at least 1".into(),
            });
        }

        let pattern = FilePattern::parse(&options.file_pattern)?;
        let files = pattern.resolve()?;

        let seed = if options.seed == 0 {
            rand::random::<u64>()
        } else {
            options.seed as u64
        };

        let shared = Arc::new(Shared::new(options.source_id, bufsize, seed));

        info!(
            source_id = options.source_id,
            pattern = %options.file_pattern,
            files = files.len(),
            bufsize,
            parallelism,
            "Starting basic yielder"
        );

        let driver = Driver {
            shared: shared.clone(),
            pattern,
            parallelism,
            seed,
            epoch_limit,
        };
        let handle = runtime.spawn_io(driver.run(files));
        standard::ACTIVE_YIELDERS.inc();

        Ok(Self {
            shared,
            driver: Mutex::new(Some(handle)),
            _runtime: runtime.clone(),
        })
    }
}

impl RecordYielder for BasicYielder {
    fn yield_record(&self) -> Result<Record> {
        let mut state = self.shared.state.lock();
        let mut waiting_since: Option<Instant> = None;

        loop {
            if state.closed {
                return Err(YielderError::Closed);
            }
            if let Some(reason) = &state.failure {
                return Err(YielderError::SourceFailed {
                    source_id: self.shared.source_id,
                    reason: reason.clone(),
                });
            }

            let len = state.buffer.len();
            if len > 0 && (len >= self.shared.bufsize || state.producer_done) {
                let idx = state.rng.random_range(0..len);
                let (record, permit) = state.buffer.swap_remove(idx);
                drop(state);
                drop(permit);

                if let Some(start) = waiting_since {
                    standard::YIELD_WAIT.observe(start.elapsed().as_secs_f64());
                }
                standard::RECORDS_YIELDED.inc();
                return Ok(record);
            }

            if state.producer_done {
                return Err(YielderError::DataExhausted);
            }

            waiting_since.get_or_insert_with(Instant::now);
            self.shared.ready.wait(&mut state);
        }
    }

    fn current_epoch(&self) -> u64 {
        self.shared.epoch.load(Ordering::Acquire)
    }

    fn kind(&self) -> YielderKind {
        YielderKind::Basic
    }

    fn close(&self) {
        {
            let mut state = self.shared.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            state.buffer.clear();
        }
        self.shared.slots.close();
        self.shared.ready.notify_all();

        if let Some(handle) = self.driver.lock().take() {
            handle.abort();
        }
        debug!(source_id = self.shared.source_id, "Basic yielder closed");
    }
}

impl Drop for BasicYielder {
    fn drop(&mut self) {
        self.close();
        standard::ACTIVE_YIELDERS.dec();
    }
}

/// Background task producing one source's epochs
struct Driver {
    shared: Arc<Shared>,
    pattern: FilePattern,
    parallelism: usize,
    seed: u64,
    epoch_limit: Option<u64>,
}

impl Driver {
    async fn run(self, mut files: Vec<PathBuf>) {
        let mut epoch = 1u64;

        loop {
            self.shared.epoch.store(epoch, Ordering::Release);

            let mut rng: StdRng = stream::stream_rng(self.seed, epoch);
            files.shuffle(&mut rng);
            debug!(
                source_id = self.shared.source_id,
                epoch,
                files = files.len(),
                "Starting epoch"
            );

            let produced = match self.read_epoch(&files, epoch).await {
                Ok(produced) => produced,
                Err(e) => return self.abandon(e),
            };
            if self.shared.slots.is_closed() {
                return;
            }
            if produced == 0 {
                return self.abandon(YielderError::EmptySource {
                    pattern: self.pattern.as_str().to_string(),
                });
            }

            debug!(
                source_id = self.shared.source_id,
                epoch, produced, "Finished epoch"
            );
            if self.epoch_limit.is_some_and(|limit| epoch >= limit) {
                self.shared.finish();
                return;
            }

            epoch += 1;
            files = match self.pattern.resolve() {
                Ok(files) => files,
                Err(e) => return self.abandon(e),
            };
        }
    }

    fn abandon(&self, err: YielderError) {
        if self.shared.slots.is_closed() {
            return;
        }
        error!(
            source_id = self.shared.source_id,
            pattern = self.pattern.as_str(),
            "Record reading failed: {}",
            err
        );
        self.shared.fail(err.to_string());
    }

    /// Read every file once, returning the number of records buffered
    ///
    /// The first reader error aborts the remaining readers.
    async fn read_epoch(&self, files: &[PathBuf], epoch: u64) -> Result<u64> {
        let queue = Arc::new(Mutex::new(files.iter().cloned().collect::<VecDeque<_>>()));
        let produced = Arc::new(AtomicU64::new(0));

        let mut readers = JoinSet::new();
        for _ in 0..self.parallelism.min(files.len()).max(1) {
            readers.spawn(read_files(
                self.shared.clone(),
                queue.clone(),
                self.pattern.format(),
                epoch,
                produced.clone(),
            ));
        }

        while let Some(joined) = readers.join_next().await {
            if let Err(e) = joined.map_err(|e| YielderError::Internal {
                message: format!("reader task failed: {}", e),
            })? {
                readers.abort_all();
                return Err(e);
            }
        }

        Ok(produced.load(Ordering::Relaxed))
    }
}

async fn read_files(
    shared: Arc<Shared>,
    queue: Arc<Mutex<VecDeque<PathBuf>>>,
    format: RecordFormat,
    epoch: u64,
    produced: Arc<AtomicU64>,
) -> Result<()> {
    loop {
        let next = queue.lock().pop_front();
        let Some(path) = next else {
            return Ok(());
        };
        if shared.slots.is_closed() {
            return Ok(());
        }

        let data = tokio::fs::read(&path)
            .await
            .map_err(|source| YielderError::Io {
                path: path.clone(),
                source,
            })?;
        standard::FILES_READ.inc();
        standard::BYTES_READ.inc_by(data.len() as u64);

        for payload in format.records(Bytes::from(data), path.display().to_string()) {
            let payload = payload?;
            let Some(permit) = shared.slots.acquire().await else {
                return Ok(());
            };
            produced.fetch_add(1, Ordering::Relaxed);
            shared.push(Record::new(payload, shared.source_id, epoch), permit);
        }
    }
}
