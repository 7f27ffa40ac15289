/*!
 * Report Rendering
 * Text tables over pool snapshots; never touches allocator state
 */

use super::format::human_readable_size;
use crate::memory::{BlockInfo, FixedPoolSummary, OwnerUsage, VariablePoolSummary};
use std::fmt::Write;

const IN_USE: &str = "■";
const FREE: &str = "▢";

fn owner_cell(block: &BlockInfo) -> &str {
    block.owner.as_deref().unwrap_or("-")
}

fn use_cell(block: &BlockInfo) -> &'static str {
    if block.in_use {
        IN_USE
    } else {
        FREE
    }
}

/// Block table for a fixed pool
pub fn render_fixed_table(blocks: &[BlockInfo]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Fixed Block Memory Pool Table:");
    let _ = writeln!(out, "{:<6} {:<15} {:<4}", "ID", "OWNER", "USE");
    let _ = writeln!(out, "{}", "-".repeat(26));
    for block in blocks {
        let _ = writeln!(
            out,
            "{:<6} {:<15} {:<4}",
            block.id.slot(),
            owner_cell(block),
            use_cell(block)
        );
    }
    out
}

/// Block table for a variable pool
pub fn render_variable_table(blocks: &[BlockInfo]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Variable Block Memory Pool Table:");
    let _ = writeln!(
        out,
        "{:<8} {:<6} {:<15} {:<8} {:<8} {:<4}",
        "ID", "TIER", "OWNER", "SIZE", "REQ", "USE"
    );
    let _ = writeln!(out, "{}", "-".repeat(54));
    for block in blocks {
        let requested = block
            .requested
            .map_or_else(|| "-".to_string(), human_readable_size);
        let _ = writeln!(
            out,
            "{:<8} {:<6} {:<15} {:<8} {:<8} {:<4}",
            block.id.to_string(),
            block.tier.as_deref().unwrap_or("-"),
            owner_cell(block),
            human_readable_size(block.size),
            requested,
            use_cell(block)
        );
    }
    out
}

pub fn render_fixed_summary(summary: &FixedPoolSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Fixed Block Size Memory Pool Summary:");
    let _ = writeln!(out, "{}", "-".repeat(30));
    let _ = writeln!(out, "Free memory:     {}/{} blocks", summary.free, summary.capacity);
    let _ = writeln!(out, "Total Memory:    {}", human_readable_size(summary.total_bytes()));
    let _ = writeln!(out, "BlockSize:       {}", human_readable_size(summary.block_size));
    let _ = writeln!(out, "Pressure:        {}", summary.pressure());
    write_owners(&mut out, summary.owners.iter());
    out
}

pub fn render_variable_summary(summary: &VariablePoolSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Variable Block Size Memory Pool Summary:");
    let _ = writeln!(out, "{}", "-".repeat(30));
    for tier in &summary.tiers {
        let _ = writeln!(
            out,
            "Tier {:<6} {:>8} x {:<4} used {}/{}",
            tier.name,
            human_readable_size(tier.block_size),
            tier.capacity,
            tier.used,
            tier.capacity
        );
    }
    let _ = writeln!(out, "Total Memory:    {}", human_readable_size(summary.total_bytes()));
    let _ = writeln!(out, "Reserved:        {}", human_readable_size(summary.reserved_bytes));
    let _ = writeln!(out, "Requested:       {}", human_readable_size(summary.requested_bytes));
    let _ = writeln!(
        out,
        "Fragmentation:   {}",
        human_readable_size(summary.internal_fragmentation())
    );
    let _ = writeln!(out, "Pressure:        {}", summary.pressure());
    write_owners(&mut out, summary.owners.iter());
    out
}

/// Blocks and totals held by one owner
pub fn render_owner_report(owner: &str, blocks: &[BlockInfo], usage: &OwnerUsage) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Total memory belonging to \"{}\":", owner);
    let _ = writeln!(out, "{:<8} {:<15}", "ID", "SIZE");
    let _ = writeln!(out, "{}", "-".repeat(30));
    for block in blocks {
        let _ = writeln!(
            out,
            "{:<8} {:<15}",
            block.id.to_string(),
            human_readable_size(block.size)
        );
    }
    let _ = writeln!(
        out,
        "Total = {} consisting of {} block(s), peak {} over {} allocation(s)",
        human_readable_size(usage.bytes),
        usage.blocks,
        human_readable_size(usage.peak_bytes),
        usage.allocation_count
    );
    out
}

fn write_owners<'a>(out: &mut String, owners: impl Iterator<Item = (&'a String, &'a usize)>) {
    for (owner, count) in owners {
        let _ = writeln!(out, "  {:<15} {} block(s)", owner, count);
    }
}
