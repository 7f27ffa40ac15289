/*!
 * Heap Pools - Demo Driver
 *
 * Runs a short allocation script against both pools and prints the
 * resulting block tables and summaries.
 */

use heap_pools::core::limits::GIB;
use heap_pools::reporting::{
    render_fixed_summary, render_fixed_table, render_owner_report, render_variable_summary,
    render_variable_table,
};
use heap_pools::{init_tracing, FixedBlockPool, PoolsConfig, VariableBlockPool};
use tracing::{info, warn};

fn main() -> miette::Result<()> {
    init_tracing();

    let config = PoolsConfig::load()?;

    println!("*** Fixed Block Size Memory Pool Demo ***");
    let mut fixed = config.build_fixed()?;
    run_fixed_demo(&mut fixed)?;

    println!("*** Variable Block Size Memory Pool Demo ***");
    let mut variable = config.build_variable()?;
    run_variable_demo(&mut variable)?;

    info!("Demo complete");
    Ok(())
}

fn run_fixed_demo(pool: &mut FixedBlockPool) -> miette::Result<()> {
    let block = pool.block_size();
    pool.allocate_bytes("initGuest", block)?;
    let lidar = pool.allocate_bytes("lidarReader", 2 * block)?;

    // A different owner may not release lidarReader's block
    if let Some(&id) = lidar.last() {
        if let Err(err) = pool.free_owned(id, "radarReader") {
            warn!(error = %err, "Demo free rejected as expected");
        }
    }

    println!("{}", render_fixed_table(&pool.list_blocks()));
    println!("{}", render_fixed_summary(&pool.summary()));
    println!(
        "{}",
        render_owner_report(
            "lidarReader",
            &pool.owner_blocks("lidarReader"),
            &pool.owner_usage("lidarReader")
        )
    );
    Ok(())
}

fn run_variable_demo(pool: &mut VariableBlockPool) -> miette::Result<()> {
    let guest = pool.allocate_spanning("initGuest", 10 * GIB)?;
    let sensor_size = pool
        .tiers()
        .get(1)
        .map_or(pool.largest_block_size(), |t| t.block_size);
    pool.allocate("sensorReader", sensor_size)?;
    println!("{}", render_variable_table(&pool.list_blocks()));

    if let Some(&first) = guest.first() {
        pool.free_owned(first, "initGuest")?;
    }
    println!("{}", render_variable_table(&pool.list_blocks()));
    println!("{}", render_variable_summary(&pool.summary()));
    println!(
        "{}",
        render_owner_report(
            "sensorReader",
            &pool.owner_blocks("sensorReader"),
            &pool.owner_usage("sensorReader")
        )
    );
    Ok(())
}
