//! Tokio runtime for background record reading
//!
//! Basic yielders spawn their prefetch driver and reader tasks here, so
//! file I/O never runs on the consumer's thread.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::runtime::{Builder, Runtime};

use crate::error::{Result, YielderError};

/// Configuration for the yielder runtime
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Number of worker threads for reader tasks
    pub io_threads: usize,
    /// Upper bound on threads used for blocking file reads
    pub max_blocking_threads: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        let cpus = num_cpus::get();
        Self {
            io_threads: cpus.max(2),
            max_blocking_threads: (cpus * 4).max(16),
        }
    }
}

/// Runtime hosting the background work of every yielder built on it
pub struct YielderRuntime {
    runtime: Runtime,
}

static SHARED: Mutex<Option<Arc<YielderRuntime>>> = parking_lot::const_mutex(None);

impl YielderRuntime {
    /// Create a new runtime with the given configuration
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(config.io_threads.max(1))
            .max_blocking_threads(config.max_blocking_threads.max(1))
            .thread_name("riffle-io")
            .enable_all()
            .build()
            .map_err(|e| YielderError::Internal {
                message: format!("Failed to create I/O runtime: {}", e),
            })?;

        Ok(Self { runtime })
    }

    /// Process-wide runtime, created on first use and never torn down
    pub fn shared() -> Result<Arc<YielderRuntime>> {
        let mut shared = SHARED.lock();
        if let Some(runtime) = shared.as_ref() {
            return Ok(runtime.clone());
        }
        let runtime = Arc::new(YielderRuntime::new(RuntimeConfig::default())?);
        *shared = Some(runtime.clone());
        Ok(runtime)
    }

    /// Spawn an I/O-bound task
    pub fn spawn_io<F>(&self, future: F) -> tokio::task::JoinHandle<F::Output>
    where
        F: std::future::Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.runtime.spawn(future)
    }

    /// Run a future to completion, blocking the calling thread
    ///
    /// Must not be called from inside the runtime.
    pub fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}
