/*!
 * Block Slot
 * Per-slot bookkeeping shared by both pools
 */

use super::types::{BlockId, PoolError, PoolResult};
use crate::core::types::{Generation, Size, SlotIndex};

/// One block record
///
/// A slot is in use exactly when it has an owner, so a freed slot can never
/// keep a stale owner around.
#[derive(Debug, Clone, Default)]
pub(crate) struct Slot {
    generation: Generation,
    owner: Option<String>,
    requested: Size,
}

impl Slot {
    pub fn is_allocated(&self) -> bool {
        self.owner.is_some()
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn requested(&self) -> Size {
        self.requested
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Mark the slot in use and return the id for this allocation
    pub fn claim(&mut self, index: SlotIndex, owner: &str, requested: Size) -> BlockId {
        debug_assert!(!self.is_allocated());
        // Skip 0 on wrap so it stays "never issued"
        self.generation = self.generation.wrapping_add(1).max(1);
        self.owner = Some(owner.to_owned());
        self.requested = requested;
        BlockId::new(index, self.generation)
    }

    /// Return the slot to the free state, handing back the previous owner
    pub fn release(&mut self) -> Option<String> {
        self.requested = 0;
        self.owner.take()
    }

    /// Check that `id` names the live allocation in this slot
    pub fn validate(&self, id: BlockId) -> PoolResult<()> {
        if id.generation() == 0 || id.generation() != self.generation {
            return Err(PoolError::NotFound(id));
        }
        if !self.is_allocated() {
            return Err(PoolError::DoubleFree(id));
        }
        Ok(())
    }
}
