/*!
 * Memory Types
 * Errors, block handles, and snapshots shared by both pools
 */

use crate::core::limits::{PRESSURE_CRITICAL, PRESSURE_HIGH, PRESSURE_MEDIUM};
use crate::core::types::{Generation, Size, SlotIndex};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Pool operation result
pub type PoolResult<T> = Result<T, PoolError>;

/// Pool errors
///
/// Every mutating operation that returns one of these has left the pool
/// exactly as it was before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum PoolError {
    #[error("Invalid pool configuration: {0}")]
    #[diagnostic(
        code(pool::configuration),
        help("Capacities and block sizes must be non-zero and tiers strictly ascending by block size.")
    )]
    Configuration(String),

    #[error("Out of memory: \"{owner}\" requested {requested} bytes, no qualifying block is free")]
    #[diagnostic(
        code(pool::out_of_memory),
        help("Free blocks held by other owners and retry.")
    )]
    OutOfMemory { owner: String, requested: Size },

    #[error("Requested {requested} bytes exceeds the largest block size of {largest} bytes")]
    #[diagnostic(
        code(pool::size_too_large),
        help("Request at most the largest tier's block size, or use a spanning allocation.")
    )]
    SizeTooLarge { requested: Size, largest: Size },

    #[error("Block {0} not found")]
    #[diagnostic(
        code(pool::not_found),
        help("The id was never issued by this pool or its block has since been freed and reused.")
    )]
    NotFound(BlockId),

    #[error("Block {0} is already free")]
    #[diagnostic(code(pool::double_free))]
    DoubleFree(BlockId),

    #[error("Block {id} belongs to \"{actual}\", not \"{claimed}\"")]
    #[diagnostic(code(pool::not_owner))]
    NotOwner {
        id: BlockId,
        claimed: String,
        actual: String,
    },
}

impl PoolError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

/// Handle to an allocated block
///
/// Pairs the slot index with the slot's generation at allocation time, so a
/// handle kept past its `free` no longer matches once the slot is reused.
/// Generation 0 is never issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId {
    slot: SlotIndex,
    generation: Generation,
}

impl BlockId {
    pub(crate) fn new(slot: SlotIndex, generation: Generation) -> Self {
        Self { slot, generation }
    }

    /// Build a handle from its raw parts
    pub fn from_raw(slot: SlotIndex, generation: Generation) -> Self {
        Self::new(slot, generation)
    }

    pub fn slot(&self) -> SlotIndex {
        self.slot
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.slot, self.generation)
    }
}

/// Snapshot of one block, as returned by `list_blocks`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    /// Last id issued for this slot (generation 0 if never allocated)
    pub id: BlockId,
    pub owner: Option<String>,
    /// Slot size in bytes
    pub size: Size,
    /// Bytes actually requested, tracked by the variable pool only
    pub requested: Option<Size>,
    pub in_use: bool,
    /// Tier name, variable pool only
    pub tier: Option<String>,
}

/// Owner to held-block-count mapping, ordered by owner
pub type OwnerCounts = BTreeMap<String, usize>;

/// Fixed pool summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedPoolSummary {
    pub capacity: usize,
    pub block_size: Size,
    pub used: usize,
    pub free: usize,
    pub owners: OwnerCounts,
}

impl FixedPoolSummary {
    pub fn total_bytes(&self) -> Size {
        self.capacity.saturating_mul(self.block_size)
    }

    pub fn used_bytes(&self) -> Size {
        self.used.saturating_mul(self.block_size)
    }

    pub fn pressure(&self) -> MemoryPressure {
        MemoryPressure::classify(self.used, self.capacity)
    }
}

/// Occupancy of one tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierSummary {
    pub name: String,
    pub block_size: Size,
    pub capacity: usize,
    pub used: usize,
    pub free: usize,
}

impl TierSummary {
    pub fn pressure(&self) -> MemoryPressure {
        MemoryPressure::classify(self.used, self.capacity)
    }
}

/// Variable pool summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariablePoolSummary {
    pub tiers: Vec<TierSummary>,
    /// Sum of requested sizes over in-use blocks
    pub requested_bytes: Size,
    /// Sum of tier slot sizes over in-use blocks
    pub reserved_bytes: Size,
    pub owners: OwnerCounts,
}

impl VariablePoolSummary {
    pub fn capacity(&self) -> usize {
        self.tiers
            .iter()
            .fold(0, |acc: usize, t| acc.saturating_add(t.capacity))
    }

    pub fn used(&self) -> usize {
        self.tiers.iter().map(|t| t.used).sum()
    }

    pub fn free(&self) -> usize {
        self.tiers
            .iter()
            .fold(0, |acc: usize, t| acc.saturating_add(t.free))
    }

    /// Saturates rather than overflowing for summaries built by hand
    pub fn total_bytes(&self) -> Size {
        self.tiers.iter().fold(0, |acc: Size, t| {
            acc.saturating_add(t.capacity.saturating_mul(t.block_size))
        })
    }

    /// Bytes lost to placing requests in larger slots
    pub fn internal_fragmentation(&self) -> Size {
        self.reserved_bytes.saturating_sub(self.requested_bytes)
    }

    /// Highest pressure of any tier
    pub fn pressure(&self) -> MemoryPressure {
        self.tiers
            .iter()
            .map(TierSummary::pressure)
            .max()
            .unwrap_or(MemoryPressure::Low)
    }
}

/// Per-owner usage, including history that `summary()` leaves out
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerUsage {
    pub blocks: usize,
    pub bytes: Size,
    pub peak_bytes: Size,
    pub allocation_count: usize,
}

/// Memory pressure levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MemoryPressure {
    Low,
    Medium,
    High,
    Critical,
}

impl MemoryPressure {
    /// Classify occupancy of `used` out of `capacity` slots
    pub fn classify(used: usize, capacity: usize) -> Self {
        if capacity == 0 {
            return MemoryPressure::Low;
        }
        let ratio = used as f64 / capacity as f64;
        if ratio >= PRESSURE_CRITICAL {
            MemoryPressure::Critical
        } else if ratio >= PRESSURE_HIGH {
            MemoryPressure::High
        } else if ratio >= PRESSURE_MEDIUM {
            MemoryPressure::Medium
        } else {
            MemoryPressure::Low
        }
    }
}

impl fmt::Display for MemoryPressure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MemoryPressure::Low => write!(f, "LOW"),
            MemoryPressure::Medium => write!(f, "MEDIUM"),
            MemoryPressure::High => write!(f, "HIGH"),
            MemoryPressure::Critical => write!(f, "CRITICAL"),
        }
    }
}
