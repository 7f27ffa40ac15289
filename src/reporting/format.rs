/*!
 * Size Formatting
 */

use crate::core::types::Size;

const SUFFIXES: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Render a byte count with the largest whole binary unit, e.g. `4096` as `4 KB`.
/// Truncates rather than rounds.
pub fn human_readable_size(size: Size) -> String {
    let mut size = size;
    let mut unit = 0;
    while size >= 1024 && unit < SUFFIXES.len() - 1 {
        size /= 1024;
        unit += 1;
    }
    format!("{} {}", size, SUFFIXES[unit])
}
