/*!
 * Fixed Pool Allocation
 * First-fit allocation and id-based deallocation
 */

use super::FixedBlockPool;
use crate::core::types::Size;
use crate::memory::types::{BlockId, MemoryPressure, PoolError, PoolResult};
use tracing::{error, info, warn};

impl FixedBlockPool {
    /// Allocate the lowest free block for `owner`
    pub fn allocate(&mut self, owner: &str) -> PoolResult<BlockId> {
        let Some(index) = self.slots.iter().position(|s| !s.is_allocated()) else {
            error!(
                pool = %self.pool_id,
                owner,
                capacity = self.capacity(),
                "OOM: fixed pool has no free block"
            );
            return Err(PoolError::OutOfMemory {
                owner: owner.to_owned(),
                requested: self.block_size,
            });
        };

        let id = self.claim(index, owner);
        self.log_allocation(id, owner);
        Ok(id)
    }

    /// Allocate enough blocks to hold `bytes` (at least one), all or nothing
    pub fn allocate_bytes(&mut self, owner: &str, bytes: Size) -> PoolResult<Vec<BlockId>> {
        let needed = bytes.div_ceil(self.block_size).max(1);
        if needed > self.available() {
            error!(
                pool = %self.pool_id,
                owner,
                bytes,
                needed,
                available = self.available(),
                "OOM: not enough free blocks"
            );
            return Err(PoolError::OutOfMemory {
                owner: owner.to_owned(),
                requested: bytes,
            });
        }

        let free: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.is_allocated())
            .map(|(i, _)| i)
            .take(needed)
            .collect();

        let ids: Vec<BlockId> = free.into_iter().map(|i| self.claim(i, owner)).collect();
        let level = MemoryPressure::classify(self.used, self.capacity());
        if level >= MemoryPressure::High {
            warn!(
                pool = %self.pool_id,
                owner,
                bytes,
                blocks = ids.len(),
                used = self.used,
                capacity = self.capacity(),
                "Memory pressure {}: allocated block run",
                level
            );
        } else {
            info!(
                pool = %self.pool_id,
                owner,
                bytes,
                blocks = ids.len(),
                "Allocated block run"
            );
        }
        Ok(ids)
    }

    /// Free a block by id
    pub fn free(&mut self, id: BlockId) -> PoolResult<()> {
        self.validate(id)?;
        self.release(id);
        Ok(())
    }

    /// Free a block by id, only if `owner` holds it
    pub fn free_owned(&mut self, id: BlockId, owner: &str) -> PoolResult<()> {
        self.validate(id)?;
        let actual = self.slots[id.slot()].owner().unwrap_or_default();
        if !self.owners.mode().matches(actual, owner) {
            warn!(
                pool = %self.pool_id,
                block = %id,
                claimed = owner,
                actual,
                "Rejected free by non-owner"
            );
            return Err(PoolError::NotOwner {
                id,
                claimed: owner.to_owned(),
                actual: actual.to_owned(),
            });
        }
        self.release(id);
        Ok(())
    }

    /// Check if an id names a live allocation
    pub fn is_allocated(&self, id: BlockId) -> bool {
        self.slots
            .get(id.slot())
            .is_some_and(|s| s.validate(id).is_ok())
    }

    fn validate(&self, id: BlockId) -> PoolResult<()> {
        let result = match self.slots.get(id.slot()) {
            Some(slot) => slot.validate(id),
            None => Err(PoolError::NotFound(id)),
        };
        if let Err(ref err) = result {
            warn!(pool = %self.pool_id, block = %id, error = %err, "Invalid free");
        }
        result
    }

    fn claim(&mut self, index: usize, owner: &str) -> BlockId {
        let id = self.slots[index].claim(index, owner, self.block_size);
        self.used += 1;
        self.owners.record_allocation(owner, self.block_size);
        id
    }

    /// Release a validated block
    pub(super) fn release(&mut self, id: BlockId) {
        if let Some(owner) = self.slots[id.slot()].release() {
            self.used -= 1;
            self.owners.record_free(&owner, self.block_size);
            info!(
                pool = %self.pool_id,
                block = %id,
                owner = %owner,
                available = self.available(),
                "Freed block"
            );
        }
    }

    fn log_allocation(&self, id: BlockId, owner: &str) {
        let level = MemoryPressure::classify(self.used, self.capacity());
        if level >= MemoryPressure::High {
            warn!(
                pool = %self.pool_id,
                block = %id,
                owner,
                used = self.used,
                capacity = self.capacity(),
                "Memory pressure {}: allocated block",
                level
            );
        } else {
            info!(
                pool = %self.pool_id,
                block = %id,
                owner,
                "Allocated block"
            );
        }
    }
}
