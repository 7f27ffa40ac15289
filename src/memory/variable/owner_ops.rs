/*!
 * Variable Pool Owner Operations
 * Owner-wide cleanup across tiers and pool snapshots
 */

use super::VariableBlockPool;
use crate::core::types::Size;
use crate::memory::types::{BlockId, BlockInfo, OwnerUsage, VariablePoolSummary};
use tracing::info;

impl VariableBlockPool {
    /// Free every block held by `owner`, across all tiers
    pub fn free_by_owner(&mut self, owner: &str) -> usize {
        let mode = self.owners.mode();
        let mut held: Vec<(usize, BlockId)> = Vec::new();
        for (index, tier) in self.tiers.iter().enumerate() {
            for (local, slot) in tier.slots.iter().enumerate() {
                if slot.owner().is_some_and(|o| mode.matches(o, owner)) {
                    held.push((index, BlockId::new(tier.offset + local, slot.generation())));
                }
            }
        }

        for (index, id) in &held {
            self.release(*index, *id);
        }

        if !held.is_empty() {
            self.owners.forget(owner);
            info!(
                pool = %self.pool_id,
                owner,
                freed = held.len(),
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
        let blocks = self.owner_blocks(owner);
        let bytes: Size = blocks.iter().map(|b| b.size).sum();
        self.owners.usage(owner, blocks.len(), bytes)
    }

    /// Every created slot, ordered by id
    pub fn list_blocks(&self) -> Vec<BlockInfo> {
        self.tiers
            .iter()
            .flat_map(|tier| {
                tier.slots.iter().enumerate().map(move |(local, s)| BlockInfo {
                    id: BlockId::new(tier.offset + local, s.generation()),
                    owner: s.owner().map(str::to_owned),
                    size: tier.block_size,
                    requested: s.is_allocated().then(|| s.requested()),
                    in_use: s.is_allocated(),
                    tier: Some(tier.name.clone()),
                })
            })
            .collect()
    }

    pub fn summary(&self) -> VariablePoolSummary {
        let mut requested_bytes = 0;
        let mut reserved_bytes = 0;
        for tier in &self.tiers {
            for slot in tier.slots.iter().filter(|s| s.is_allocated()) {
                requested_bytes += slot.requested();
                reserved_bytes += tier.block_size;
            }
        }

        let owners = self.owners.mode().count(
            self.tiers
                .iter()
                .flat_map(|t| t.slots.iter().filter_map(|s| s.owner())),
        );

        VariablePoolSummary {
            tiers: self.tiers.iter().map(|t| t.summary()).collect(),
            requested_bytes,
            reserved_bytes,
            owners,
        }
    }
}
