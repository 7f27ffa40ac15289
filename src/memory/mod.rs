/*!
 * Memory Module
 * Simulated heap pools: fixed-size blocks and tiered variable-size blocks
 */

pub mod fixed;
pub mod owner;
pub(crate) mod slot;
pub mod traits;
pub mod types;
pub mod variable;

// Re-export for convenience
pub use fixed::FixedBlockPool;
pub use owner::OwnerMatch;
pub use traits::*;
pub use types::*;
pub use variable::{TierSpec, VariableBlockPool};
