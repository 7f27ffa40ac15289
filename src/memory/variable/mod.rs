/*!
 * Variable Block Size Pool
 *
 * A pool split into size tiers, each with its own block size and slot count.
 *
 * ## Allocation
 *
 * - **Best fit by tier**: a request goes to the smallest tier whose block size
 *   covers it; if that tier is full the next larger tier with room is used
 * - **O(tiers)**: one linear pass over a fixed, ascending tier list
 * - **Internal fragmentation**: requested and slot sizes are both tracked, so
 *   the waste from placing a small request in a large slot is visible in
 *   the summary
 * - **Spanning requests**: requests bigger than any tier can be split across
 *   several blocks, largest tier first
 */

mod allocator;
mod owner_ops;
mod tier;

pub use tier::TierSpec;

use super::owner::{OwnerMatch, OwnerTable};
use super::traits::{Deallocator, OwnerCleanup, PoolInfo};
use super::types::{BlockId, BlockInfo, OwnerUsage, PoolResult, VariablePoolSummary};
use crate::core::types::Size;
use tier::Tier;
use tracing::info;
use uuid::Uuid;

/// Variable block size pool
#[derive(Debug, Clone)]
pub struct VariableBlockPool {
    pool_id: Uuid,
    // Ascending by block size, never reordered
    tiers: Vec<Tier>,
    owners: OwnerTable,
}

impl VariableBlockPool {
    /// Create a pool from tiers listed in ascending block size
    pub fn new(specs: Vec<TierSpec>) -> PoolResult<Self> {
        tier::validate_tiers(&specs)?;

        let mut offset = 0;
        let mut tiers = Vec::with_capacity(specs.len());
        for spec in specs {
            let capacity = spec.capacity;
            tiers.push(Tier::new(spec, offset));
            offset += capacity;
        }

        let pool_id = Uuid::new_v4();
        info!(
            pool = %pool_id,
            tiers = tiers.len(),
            slots = offset,
            largest_block = tiers.last().map_or(0, |t| t.block_size),
            "Variable block pool initialized"
        );

        Ok(Self {
            pool_id,
            tiers,
            owners: OwnerTable::new(OwnerMatch::Exact),
        })
    }

    /// Use `mode` when comparing owner labels
    pub fn with_owner_match(mut self, mode: OwnerMatch) -> Self {
        self.owners = OwnerTable::new(mode);
        self
    }

    pub fn pool_id(&self) -> Uuid {
        self.pool_id
    }

    /// Tiers as configured
    pub fn tiers(&self) -> Vec<TierSpec> {
        self.tiers
            .iter()
            .map(|t| TierSpec::new(t.name.clone(), t.block_size, t.capacity))
            .collect()
    }

    pub fn largest_block_size(&self) -> Size {
        self.tiers.last().map_or(0, |t| t.block_size)
    }

    /// Tier index holding a pool-wide slot index
    fn tier_of(&self, id: BlockId) -> Option<usize> {
        self.tiers.iter().position(|t| t.contains(id.slot()))
    }
}

impl Deallocator for VariableBlockPool {
    fn free(&mut self, id: BlockId) -> PoolResult<()> {
        VariableBlockPool::free(self, id)
    }

    fn free_owned(&mut self, id: BlockId, owner: &str) -> PoolResult<()> {
        VariableBlockPool::free_owned(self, id, owner)
    }

    fn is_allocated(&self, id: BlockId) -> bool {
        VariableBlockPool::is_allocated(self, id)
    }
}

impl PoolInfo for VariableBlockPool {
    type Summary = VariablePoolSummary;

    fn list_blocks(&self) -> Vec<BlockInfo> {
        VariableBlockPool::list_blocks(self)
    }

    fn summary(&self) -> VariablePoolSummary {
        VariableBlockPool::summary(self)
    }

    fn owner_match(&self) -> OwnerMatch {
        self.owners.mode()
    }
}

impl OwnerCleanup for VariableBlockPool {
    fn free_by_owner(&mut self, owner: &str) -> usize {
        VariableBlockPool::free_by_owner(self, owner)
    }

    fn owner_usage(&self, owner: &str) -> OwnerUsage {
        VariableBlockPool::owner_usage(self, owner)
    }

    fn owner_blocks(&self, owner: &str) -> Vec<BlockInfo> {
        VariableBlockPool::owner_blocks(self, owner)
    }
}
