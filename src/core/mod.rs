/*!
 * Core Module
 * Fundamental types and limits shared by both pools
 */

pub mod limits;
pub mod types;

// Re-export for convenience
pub use types::*;
