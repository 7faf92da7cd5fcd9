//! Backpressure control for prefetching readers
//!
//! Every buffered record holds a permit, so readers stall once the
//! shuffle buffer is full and resume as consumers take records.

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Slot accounting for one shuffle buffer
#[derive(Clone)]
pub struct BackpressureController {
    /// Semaphore limiting buffered records
    semaphore: Arc<Semaphore>,
}

impl BackpressureController {
    /// Create a controller with `capacity` slots
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
        }
    }

    /// Acquire a slot, waiting for one to free up
    ///
    /// Returns `None` once the controller has been closed.
    pub async fn acquire(&self) -> Option<BackpressurePermit> {
        let permit = self.semaphore.clone().acquire_owned().await.ok()?;
        Some(BackpressurePermit { _permit: permit })
    }

    /// Wake every waiting reader and refuse further acquisitions
    pub fn close(&self) {
        self.semaphore.close();
    }

    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }
}

/// Slot held by one buffered record, released on drop
pub struct BackpressurePermit {
    _permit: OwnedSemaphorePermit,
}
