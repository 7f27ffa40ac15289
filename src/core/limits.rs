/*!
 * Limits and Constants
 *
 * Thresholds, environment variable names, and the defaults the demo driver
 * runs with when no configuration file is supplied.
 */

use super::types::Size;

// =============================================================================
// SIZE UNITS
// =============================================================================

pub const KIB: Size = 1024;
pub const MIB: Size = 1024 * KIB;
pub const GIB: Size = 1024 * MIB;

// =============================================================================
// MEMORY PRESSURE
// =============================================================================

/// Occupancy ratio at which pressure is reported as medium
pub const PRESSURE_MEDIUM: f64 = 0.60;

/// Occupancy ratio at which allocations start logging warnings
pub const PRESSURE_HIGH: f64 = 0.80;

/// Occupancy ratio considered critical
pub const PRESSURE_CRITICAL: f64 = 0.95;

// =============================================================================
// ENVIRONMENT
// =============================================================================

/// Path to a JSON pool configuration file
pub const CONFIG_PATH_ENV: &str = "HEAP_POOLS_CONFIG";

/// Enables JSON trace output when set to `1` or `true`
pub const TRACE_JSON_ENV: &str = "HEAP_POOLS_TRACE_JSON";

// =============================================================================
// DEFAULT DEMO LAYOUT
// =============================================================================

/// Fixed pool: total simulated memory (4KB)
pub const DEFAULT_FIXED_TOTAL: Size = 4 * KIB;

/// Fixed pool: block size (1KB), giving four slots
pub const DEFAULT_FIXED_BLOCK: Size = KIB;

/// Variable pool tiers as (name, block size, slot count), ascending by size.
/// The GB tier alone covers 16GB of simulated memory.
pub const DEFAULT_TIERS: [(&str, Size, usize); 3] = [
    ("KB", 4 * KIB, 16),
    ("MB", 2 * MIB, 32),
    ("GB", 2 * GIB, 8),
];
