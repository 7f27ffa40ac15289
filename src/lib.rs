/*!
 * Heap Pools Library
 * Simulated fixed-size and tiered variable-size block pools
 */

pub mod config;
pub mod core;
pub mod memory;
pub mod monitoring;
pub mod reporting;

// Re-exports
pub use config::{ConfigError, PoolsConfig};
pub use memory::{
    BlockId, BlockInfo, BlockPool, Deallocator, FixedBlockPool, FixedPoolSummary, MemoryPressure,
    OwnerCleanup, OwnerMatch, OwnerUsage, PoolError, PoolInfo, PoolResult, TierSpec,
    TierSummary, VariableBlockPool, VariablePoolSummary,
};
pub use monitoring::init_tracing;
