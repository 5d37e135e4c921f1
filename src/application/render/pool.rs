use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use metrics::{counter, gauge};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::warn;

use crate::infra::telemetry::{RENDER_IN_FLIGHT, RENDER_REJECTED_TOTAL};

use super::RenderError;

/// Admission control in front of the renderer: at most `concurrency` renders
/// run and at most `queue_depth` more wait for a slot.
#[derive(Debug, Clone)]
pub struct RenderPool {
    slots: Arc<Semaphore>,
    admitted: Arc<AtomicUsize>,
    capacity: usize,
}

impl RenderPool {
    pub fn new(concurrency: usize, queue_depth: usize) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            slots: Arc::new(Semaphore::new(concurrency)),
            admitted: Arc::new(AtomicUsize::new(0)),
            capacity: concurrency.saturating_add(queue_depth),
        }
    }

    pub fn admitted(&self) -> usize {
        self.admitted.load(Ordering::Acquire)
    }

    /// Reserve a place in the pool or fail immediately when it is full.
    pub fn try_admit(&self) -> Result<Admission, RenderError> {
        let mut current = self.admitted.load(Ordering::Acquire);
        loop {
            if current >= self.capacity {
                counter!(RENDER_REJECTED_TOTAL).increment(1);
                warn!(
                    target = "application::render::pool",
                    op = "render_pool::try_admit",
                    result = "rejected",
                    capacity = self.capacity,
                    "Render pool saturated"
                );
                return Err(RenderError::Saturated {
                    capacity: self.capacity,
                });
            }
            match self.admitted.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(observed) => current = observed,
            }
        }

        gauge!(RENDER_IN_FLIGHT).increment(1.0);
        Ok(Admission {
            slots: Arc::clone(&self.slots),
            admitted: Arc::clone(&self.admitted),
        })
    }
}

/// A request counted against pool capacity. Dropping it frees the place.
#[derive(Debug)]
pub struct Admission {
    slots: Arc<Semaphore>,
    admitted: Arc<AtomicUsize>,
}

impl Admission {
    /// Wait for a running slot. The admission stays held until the returned
    /// slot is dropped.
    pub async fn acquire(self) -> Result<RunningSlot, RenderError> {
        let permit = Arc::clone(&self.slots)
            .acquire_owned()
            .await
            .map_err(|_| RenderError::PoolClosed)?;
        Ok(RunningSlot {
            _permit: permit,
            _admission: self,
        })
    }
}

impl Drop for Admission {
    fn drop(&mut self) {
        self.admitted.fetch_sub(1, Ordering::AcqRel);
        gauge!(RENDER_IN_FLIGHT).decrement(1.0);
    }
}

/// Permission to run one renderer process.
#[derive(Debug)]
pub struct RunningSlot {
    _permit: OwnedSemaphorePermit,
    _admission: Admission,
}
