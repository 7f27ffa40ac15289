/*!
 * Size Tiers
 * Tier layout and per-tier slot storage
 */

use crate::core::types::{Size, SlotIndex};
use crate::memory::slot::Slot;
use crate::memory::types::{BlockId, PoolError, PoolResult, TierSummary};
use serde::{Deserialize, Serialize};

/// One size class as supplied at construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierSpec {
    pub name: String,
    pub block_size: Size,
    pub capacity: usize,
}

impl TierSpec {
    pub fn new(name: impl Into<String>, block_size: Size, capacity: usize) -> Self {
        Self {
            name: name.into(),
            block_size,
            capacity,
        }
    }
}

/// Check that tiers are non-empty, non-zero and strictly ascending
pub(super) fn validate_tiers(specs: &[TierSpec]) -> PoolResult<()> {
    if specs.is_empty() {
        return Err(PoolError::configuration("variable pool needs at least one tier"));
    }
    for spec in specs {
        if spec.block_size == 0 {
            return Err(PoolError::configuration(format!(
                "tier \"{}\" has zero block size",
                spec.name
            )));
        }
        if spec.capacity == 0 {
            return Err(PoolError::configuration(format!(
                "tier \"{}\" has zero capacity",
                spec.name
            )));
        }
    }
    let mut slots: usize = 0;
    let mut bytes: Size = 0;
    for spec in specs {
        slots = slots
            .checked_add(spec.capacity)
            .ok_or_else(|| PoolError::configuration("total tier capacity overflows"))?;
        bytes = spec
            .capacity
            .checked_mul(spec.block_size)
            .and_then(|tier_bytes| bytes.checked_add(tier_bytes))
            .ok_or_else(|| PoolError::configuration("total tier size in bytes overflows"))?;
    }
    for pair in specs.windows(2) {
        if pair[1].block_size <= pair[0].block_size {
            return Err(PoolError::configuration(format!(
                "tier \"{}\" ({} bytes) must be larger than tier \"{}\" ({} bytes)",
                pair[1].name, pair[1].block_size, pair[0].name, pair[0].block_size
            )));
        }
    }
    Ok(())
}

/// A size class and the slots created in it so far
///
/// Slots are created lazily up to `capacity`. Pool-wide slot indices are
/// `offset + local index`, so ids stay unique across tiers and sort in
/// tier order.
#[derive(Debug, Clone)]
pub(super) struct Tier {
    pub name: String,
    pub block_size: Size,
    pub capacity: usize,
    pub offset: SlotIndex,
    pub slots: Vec<Slot>,
    pub used: usize,
}

impl Tier {
    pub fn new(spec: TierSpec, offset: SlotIndex) -> Self {
        Self {
            name: spec.name,
            block_size: spec.block_size,
            capacity: spec.capacity,
            offset,
            slots: Vec::new(),
            used: 0,
        }
    }

    pub fn has_room(&self) -> bool {
        self.used < self.capacity
    }

    pub fn available(&self) -> usize {
        self.capacity - self.used
    }

    /// Whether a pool-wide slot index falls in this tier
    pub fn contains(&self, slot: SlotIndex) -> bool {
        slot >= self.offset && slot - self.offset < self.capacity
    }

    /// Slot a pool-wide id refers to, if it has been created
    pub fn slot(&self, id: BlockId) -> Option<&Slot> {
        self.slots.get(id.slot() - self.offset)
    }

    pub fn slot_mut(&mut self, id: BlockId) -> Option<&mut Slot> {
        self.slots.get_mut(id.slot() - self.offset)
    }

    /// Take the lowest free slot, creating one if every existing slot is busy
    pub fn claim(&mut self, owner: &str, requested: Size) -> BlockId {
        debug_assert!(self.has_room());
        let local = match self.slots.iter().position(|s| !s.is_allocated()) {
            Some(local) => local,
            None => {
                self.slots.push(Slot::default());
                self.slots.len() - 1
            }
        };
        self.used += 1;
        self.slots[local].claim(self.offset + local, owner, requested)
    }

    pub fn summary(&self) -> TierSummary {
        TierSummary {
            name: self.name.clone(),
            block_size: self.block_size,
            capacity: self.capacity,
            used: self.used,
            free: self.available(),
        }
    }
}
