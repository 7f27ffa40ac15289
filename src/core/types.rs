/*!
 * Core Types
 * Common types used across the pools
 */

/// Size type for block and request sizes, in bytes
pub type Size = usize;

/// Slot index within a pool
pub type SlotIndex = usize;

/// Per-slot generation counter, bumped on every allocation
pub type Generation = u32;
