/*!
 * Variable Pool Allocation
 * Tiered best-fit matching, spanning requests, and deallocation
 */

use super::VariableBlockPool;
use crate::core::types::Size;
use crate::memory::types::{BlockId, MemoryPressure, PoolError, PoolResult};
use tracing::{debug, error, info, warn};

impl VariableBlockPool {
    /// Allocate one block of at least `requested` bytes for `owner`
    pub fn allocate(&mut self, owner: &str, requested: Size) -> PoolResult<BlockId> {
        let largest = self.largest_block_size();
        if requested > largest {
            warn!(
                pool = %self.pool_id,
                owner,
                requested,
                largest,
                "Request exceeds largest tier"
            );
            return Err(PoolError::SizeTooLarge { requested, largest });
        }

        let Some(index) = self.find_tier(requested) else {
            error!(
                pool = %self.pool_id,
                owner,
                requested,
                "OOM: every tier large enough is full"
            );
            return Err(PoolError::OutOfMemory {
                owner: owner.to_owned(),
                requested,
            });
        };

        Ok(self.place(index, owner, requested))
    }

    /// Allocate `bytes` as a run of blocks: whole blocks from the largest tier
    /// down while they fit, then the remainder best-fit. All or nothing.
    pub fn allocate_spanning(&mut self, owner: &str, bytes: Size) -> PoolResult<Vec<BlockId>> {
        let mut free: Vec<usize> = self.tiers.iter().map(|t| t.available()).collect();
        let mut plan = Vec::new();
        let mut remaining = bytes;

        for (index, tier) in self.tiers.iter().enumerate().rev() {
            while remaining >= tier.block_size && free[index] > 0 {
                plan.push((index, tier.block_size));
                free[index] -= 1;
                remaining -= tier.block_size;
            }
        }

        if remaining > 0 || plan.is_empty() {
            let fit = self
                .tiers
                .iter()
                .enumerate()
                .find(|(index, tier)| tier.block_size >= remaining && free[*index] > 0);
            match fit {
                Some((index, _)) => plan.push((index, remaining)),
                None => {
                    error!(
                        pool = %self.pool_id,
                        owner,
                        bytes,
                        unplaced = remaining,
                        "OOM: spanning request does not fit"
                    );
                    return Err(PoolError::OutOfMemory {
                        owner: owner.to_owned(),
                        requested: bytes,
                    });
                }
            }
        }

        let ids: Vec<BlockId> = plan
            .into_iter()
            .map(|(index, requested)| self.place(index, owner, requested))
            .collect();
        info!(
            pool = %self.pool_id,
            owner,
            bytes,
            blocks = ids.len(),
            "Allocated spanning run"
        );
        Ok(ids)
    }

    /// Free a block by id
    pub fn free(&mut self, id: BlockId) -> PoolResult<()> {
        let index = self.validate(id)?;
        self.release(index, id);
        Ok(())
    }

    /// Free a block by id, only if `owner` holds it
    pub fn free_owned(&mut self, id: BlockId, owner: &str) -> PoolResult<()> {
        let index = self.validate(id)?;
        let actual = self.tiers[index]
            .slot(id)
            .and_then(|s| s.owner())
            .unwrap_or_default();
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
        self.release(index, id);
        Ok(())
    }

    /// Check if an id names a live allocation
    pub fn is_allocated(&self, id: BlockId) -> bool {
        self.tier_of(id)
            .and_then(|index| self.tiers[index].slot(id))
            .is_some_and(|s| s.validate(id).is_ok())
    }

    /// Smallest tier covering `requested` that has room, falling through to
    /// larger tiers when tighter ones are full
    fn find_tier(&self, requested: Size) -> Option<usize> {
        let first = self.tiers.iter().position(|t| t.block_size >= requested)?;
        let index = self.tiers[first..]
            .iter()
            .position(|t| t.has_room())
            .map(|offset| first + offset)?;

        if index != first {
            debug!(
                pool = %self.pool_id,
                requested,
                best_fit = %self.tiers[first].name,
                placed = %self.tiers[index].name,
                "Best-fit tier full, falling through"
            );
        }
        Some(index)
    }

    fn place(&mut self, index: usize, owner: &str, requested: Size) -> BlockId {
        let tier = &mut self.tiers[index];
        let id = tier.claim(owner, requested);
        let block_size = tier.block_size;
        self.owners.record_allocation(owner, block_size);

        let tier = &self.tiers[index];
        let level = MemoryPressure::classify(tier.used, tier.capacity);
        if level >= MemoryPressure::High {
            warn!(
                pool = %self.pool_id,
                block = %id,
                owner,
                tier = %tier.name,
                requested,
                used = tier.used,
                capacity = tier.capacity,
                "Memory pressure {}: allocated block",
                level
            );
        } else {
            info!(
                pool = %self.pool_id,
                block = %id,
                owner,
                tier = %tier.name,
                requested,
                wasted = block_size - requested,
                "Allocated block"
            );
        }
        id
    }

    /// Locate and check `id`, returning its tier index
    fn validate(&self, id: BlockId) -> PoolResult<usize> {
        let result = match self.tier_of(id) {
            Some(index) => match self.tiers[index].slot(id) {
                Some(slot) => slot.validate(id).map(|()| index),
                None => Err(PoolError::NotFound(id)),
            },
            None => Err(PoolError::NotFound(id)),
        };
        if let Err(ref err) = result {
            warn!(pool = %self.pool_id, block = %id, error = %err, "Invalid free");
        }
        result
    }

    /// Release a validated block
    pub(super) fn release(&mut self, index: usize, id: BlockId) {
        let tier = &mut self.tiers[index];
        let block_size = tier.block_size;
        let Some(owner) = tier.slot_mut(id).and_then(|s| s.release()) else {
            return;
        };
        tier.used -= 1;
        let tier_name = tier.name.clone();
        self.owners.record_free(&owner, block_size);
        info!(
            pool = %self.pool_id,
            block = %id,
            owner = %owner,
            tier = %tier_name,
            "Freed block"
        );
    }
}
