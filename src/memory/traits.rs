/*!
 * Pool Traits
 * The contract both pools share with drivers and the reporting layer
 */

use super::owner::OwnerMatch;
use super::types::*;
use crate::core::types::Size;

/// Returning blocks to a pool
pub trait Deallocator {
    /// Free a block by id
    fn free(&mut self, id: BlockId) -> PoolResult<()>;

    /// Free a block by id, only if `owner` holds it
    fn free_owned(&mut self, id: BlockId, owner: &str) -> PoolResult<()>;

    /// Check whether `id` names a live allocation
    fn is_allocated(&self, id: BlockId) -> bool;
}

/// Read-only view of a pool's state
pub trait PoolInfo {
    type Summary;

    /// Every known block, ordered by id
    fn list_blocks(&self) -> Vec<BlockInfo>;

    /// Occupancy counts and owner mapping
    fn summary(&self) -> Self::Summary;

    /// How owner labels are compared in this pool
    fn owner_match(&self) -> OwnerMatch;
}

/// Owner-scoped operations
pub trait OwnerCleanup: PoolInfo {
    /// Free every block held by `owner`, returning how many were freed
    fn free_by_owner(&mut self, owner: &str) -> usize;

    /// Usage history for `owner`
    fn owner_usage(&self, owner: &str) -> OwnerUsage;

    /// In-use blocks held by `owner`, ordered by id
    fn owner_blocks(&self, owner: &str) -> Vec<BlockInfo> {
        let mode = self.owner_match();
        self.list_blocks()
            .into_iter()
            .filter(|b| b.owner.as_deref().is_some_and(|o| mode.matches(o, owner)))
            .collect()
    }

    /// Bytes of slot space held by `owner`
    fn owner_bytes(&self, owner: &str) -> Size {
        self.owner_blocks(owner).iter().map(|b| b.size).sum()
    }
}

/// Pool trait combining all interfaces
pub trait BlockPool: Deallocator + PoolInfo + OwnerCleanup {}

/// Implement BlockPool for types that implement all required traits
impl<T> BlockPool for T where T: Deallocator + PoolInfo + OwnerCleanup {}
