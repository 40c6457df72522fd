//! Pool of fixed-capacity batches over one persistent buffer.

use strata_core::{Pool, PoolHandle};
use tracing::debug;

use super::batch::{Batch, BatchState};
use crate::config::BatchingConfig;
use crate::error::{StrataError, StrataResult};

/// Counters describing pool occupancy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Batches created so far.
    pub allocated: usize,
    /// Batches on the available stack.
    pub available: usize,
    /// Batches currently assigned.
    pub in_use: usize,
    /// Hard ceiling.
    pub ceiling: usize,
}

/// Hands out and recycles [`Batch`]es.
///
/// Every batch's byte offset is derived from its pool slot, so the whole
/// pool maps onto one buffer of [`BatchPool::buffer_size_bytes`] bytes
/// allocated up front.
///
/// # Thread Safety
///
/// Single-threaded. Callers must serialize access.
#[derive(Debug)]
pub struct BatchPool {
    pool: Pool<Batch>,
    batch_capacity: usize,
}

impl BatchPool {
    /// Creates a pool and pre-warms `initial_pool_size` batches.
    #[must_use]
    pub fn new(config: &BatchingConfig) -> Self {
        let capacity = config.batch_capacity;
        debug!(
            initial = config.initial_pool_size,
            ceiling = config.max_pool_size,
            capacity,
            "batch pool created"
        );
        Self {
            pool: Pool::new(config.initial_pool_size, config.max_pool_size, |index| {
                Batch::new(index, capacity)
            }),
            batch_capacity: capacity,
        }
    }

    /// Instances per batch.
    #[must_use]
    pub const fn batch_capacity(&self) -> usize {
        self.batch_capacity
    }

    /// Size of the persistent buffer needed for the pool at its ceiling.
    #[must_use]
    pub fn buffer_size_bytes(&self) -> u64 {
        (self.pool.ceiling() * Batch::bytes_for(self.batch_capacity)) as u64
    }

    /// Acquires a batch, growing the pool up to its ceiling.
    ///
    /// Returns `None` when exhausted.
    pub fn get_batch(&mut self) -> Option<PoolHandle> {
        let before = self.pool.allocated_count();
        let capacity = self.batch_capacity;
        let handle = self.pool.acquire_with(|index| Batch::new(index, capacity))?;

        if self.pool.allocated_count() > before {
            debug!(allocated = self.pool.allocated_count(), ceiling = self.pool.ceiling(), "batch pool grew");
        }
        if let Some(batch) = self.pool.get_mut(handle) {
            batch.set_state(BatchState::InUse);
        }
        Some(handle)
    }

    /// Resets a batch and pushes it back on the available stack.
    ///
    /// # Errors
    ///
    /// Returns [`StrataError::InvalidPoolHandle`] if the batch is not in use.
    pub fn return_batch(&mut self, handle: PoolHandle) -> StrataResult<()> {
        if !self.pool.is_in_use(handle) {
            return Err(StrataError::InvalidPoolHandle(handle.index()));
        }
        if let Some(batch) = self.pool.get_mut(handle) {
            batch.set_state(BatchState::Available);
        }
        self.pool.release(handle);
        Ok(())
    }

    /// Returns the batch behind `handle`.
    #[must_use]
    pub fn get(&self, handle: PoolHandle) -> Option<&Batch> {
        self.pool.get(handle)
    }

    /// Returns the batch behind `handle` mutably.
    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut Batch> {
        self.pool.get_mut(handle)
    }

    /// Current occupancy.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            allocated: self.pool.allocated_count(),
            available: self.pool.available_count(),
            in_use: self.pool.in_use_count(),
            ceiling: self.pool.ceiling(),
        }
    }
}
