/*!
 * Fixed Pool Owner Operations
 * Owner-wide cleanup and pool snapshots
 */

use super::FixedBlockPool;
use crate::memory::types::{BlockId, BlockInfo, FixedPoolSummary, OwnerUsage};
use tracing::info;

impl FixedBlockPool {
    /// Free every block held by `owner`
    pub fn free_by_owner(&mut self, owner: &str) -> usize {
        let mode = self.owners.mode();
        let held: Vec<BlockId> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.owner().is_some_and(|o| mode.matches(o, owner)))
            .map(|(i, s)| BlockId::new(i, s.generation()))
            .collect();

        for id in &held {
            self.release(*id);
        }

        if !held.is_empty() {
            self.owners.forget(owner);
            info!(
                pool = %self.pool_id,
                owner,
                freed = held.len(),
                available = self.available(),
                "Released all blocks for owner"
            );
        }
        held.len()
    }

    /// In-use blocks held by `owner`
    pub fn owner_blocks(&self, owner: &str) -> Vec<BlockInfo> {
        let mode = self.owners.mode();
        self.list_blocks()
            .into_iter()
            .filter(|b| b.owner.as_deref().is_some_and(|o| mode.matches(o, owner)))
            .collect()
    }

    pub fn owner_usage(&self, owner: &str) -> OwnerUsage {
        let blocks = self.owner_blocks(owner).len();
        self.owners.usage(owner, blocks, blocks * self.block_size)
    }

    /// Every slot in ascending id order
    pub fn list_blocks(&self) -> Vec<BlockInfo> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, s)| BlockInfo {
                id: BlockId::new(i, s.generation()),
                owner: s.owner().map(str::to_owned),
                size: self.block_size,
                requested: None,
                in_use: s.is_allocated(),
                tier: None,
            })
            .collect()
    }

    pub fn summary(&self) -> FixedPoolSummary {
        FixedPoolSummary {
            capacity: self.capacity(),
            block_size: self.block_size,
            used: self.used,
            free: self.available(),
            owners: self.owners.mode().count(self.slots.iter().filter_map(|s| s.owner())),
        }
    }
}
