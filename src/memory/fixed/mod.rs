/*!
 * Fixed Block Size Pool
 *
 * A pool of identical slots, all created free at construction.
 *
 * ## Allocation
 *
 * - **First fit**: slots are scanned in ascending index order and the lowest
 *   free one is taken, so freed low slots are reused first
 * - **No external fragmentation**: every slot has the same size; only the
 *   occupancy ratio matters
 * - **Generational ids**: each allocation bumps the slot's generation, so a
 *   handle kept past its free is rejected instead of hitting the new owner
 */

mod allocator;
mod owner_ops;

use super::owner::{OwnerMatch, OwnerTable};
use super::slot::Slot;
use super::traits::{Deallocator, OwnerCleanup, PoolInfo};
use super::types::{BlockId, BlockInfo, FixedPoolSummary, OwnerUsage, PoolError, PoolResult};
use crate::core::types::Size;
use tracing::info;
use uuid::Uuid;

/// Fixed block size pool
#[derive(Debug, Clone)]
pub struct FixedBlockPool {
    pool_id: Uuid,
    block_size: Size,
    slots: Vec<Slot>,
    used: usize,
    owners: OwnerTable,
}

impl FixedBlockPool {
    /// Create a pool of `capacity` free blocks of `block_size` bytes each
    pub fn new(capacity: usize, block_size: Size) -> PoolResult<Self> {
        if capacity == 0 {
            return Err(PoolError::configuration("fixed pool capacity must be non-zero"));
        }
        if block_size == 0 {
            return Err(PoolError::configuration("fixed pool block size must be non-zero"));
        }
        if capacity.checked_mul(block_size).is_none() {
            return Err(PoolError::configuration("fixed pool size in bytes overflows"));
        }

        let pool_id = Uuid::new_v4();
        info!(
            pool = %pool_id,
            capacity,
            block_size,
            "Fixed block pool initialized"
        );

        Ok(Self {
            pool_id,
            block_size,
            slots: vec![Slot::default(); capacity],
            used: 0,
            owners: OwnerTable::new(OwnerMatch::Exact),
        })
    }

    /// Create a pool that carves `total` bytes into `block_size` blocks,
    /// discarding any remainder
    pub fn from_total_size(total: Size, block_size: Size) -> PoolResult<Self> {
        if block_size == 0 {
            return Err(PoolError::configuration("fixed pool block size must be non-zero"));
        }
        let capacity = total / block_size;
        if capacity == 0 {
            return Err(PoolError::configuration(format!(
                "total size {} is smaller than block size {}",
                total, block_size
            )));
        }
        Self::new(capacity, block_size)
    }

    /// Use `mode` when comparing owner labels
    pub fn with_owner_match(mut self, mode: OwnerMatch) -> Self {
        self.owners = OwnerTable::new(mode);
        self
    }

    pub fn pool_id(&self) -> Uuid {
        self.pool_id
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn block_size(&self) -> Size {
        self.block_size
    }

    pub fn used(&self) -> usize {
        self.used
    }

    pub fn available(&self) -> usize {
        self.capacity() - self.used
    }
}

impl Deallocator for FixedBlockPool {
    fn free(&mut self, id: BlockId) -> PoolResult<()> {
        FixedBlockPool::free(self, id)
    }

    fn free_owned(&mut self, id: BlockId, owner: &str) -> PoolResult<()> {
        FixedBlockPool::free_owned(self, id, owner)
    }

    fn is_allocated(&self, id: BlockId) -> bool {
        FixedBlockPool::is_allocated(self, id)
    }
}

impl PoolInfo for FixedBlockPool {
    type Summary = FixedPoolSummary;

    fn list_blocks(&self) -> Vec<BlockInfo> {
        FixedBlockPool::list_blocks(self)
    }

    fn summary(&self) -> FixedPoolSummary {
        FixedBlockPool::summary(self)
    }

    fn owner_match(&self) -> OwnerMatch {
        self.owners.mode()
    }
}

impl OwnerCleanup for FixedBlockPool {
    fn free_by_owner(&mut self, owner: &str) -> usize {
        FixedBlockPool::free_by_owner(self, owner)
    }

    fn owner_usage(&self, owner: &str) -> OwnerUsage {
        FixedBlockPool::owner_usage(self, owner)
    }

    fn owner_blocks(&self, owner: &str) -> Vec<BlockInfo> {
        FixedBlockPool::owner_blocks(self, owner)
    }
}
