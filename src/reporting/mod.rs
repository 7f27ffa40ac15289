/*!
 * Reporting
 * Read-only rendering of pool snapshots
 */

mod format;
mod table;

pub use format::human_readable_size;
pub use table::{
    render_fixed_summary, render_fixed_table, render_owner_report, render_variable_summary,
    render_variable_table,
};
