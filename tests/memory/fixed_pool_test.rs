/*!
 * Fixed Pool Tests
 * Construction, first-fit allocation, frees, and summaries
 */

use heap_pools::memory::{
    BlockId, BlockPool, FixedBlockPool, MemoryPressure, OwnerMatch, PoolError,
};
use pretty_assertions::assert_eq;
use std::io;
use std::sync::{Arc, Mutex};

/// Collects formatted trace output
#[derive(Clone, Default)]
struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl CapturedLog {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

fn capture<F: FnOnce()>(f: F) -> String {
    let log = CapturedLog::default();
    let writer = log.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    log.text()
}

#[test]
fn test_rejects_zero_capacity_or_block_size() {
    assert!(matches!(
        FixedBlockPool::new(0, 1024),
        Err(PoolError::Configuration(_))
    ));
    assert!(matches!(
        FixedBlockPool::new(4, 0),
        Err(PoolError::Configuration(_))
    ));
    assert!(matches!(
        FixedBlockPool::from_total_size(512, 1024),
        Err(PoolError::Configuration(_))
    ));
}

#[test]
fn test_rejects_size_that_overflows() {
    assert!(matches!(
        FixedBlockPool::new(usize::MAX, 2),
        Err(PoolError::Configuration(_))
    ));
}

#[test]
fn test_from_total_size_discards_remainder() {
    let pool = FixedBlockPool::from_total_size(4096 + 100, 1024).unwrap();
    assert_eq!(pool.capacity(), 4);
    assert_eq!(pool.block_size(), 1024);
}

#[test]
fn test_initial_state_all_free() {
    let pool = FixedBlockPool::new(4, 1024).unwrap();
    let summary = pool.summary();

    assert_eq!(summary.capacity, 4);
    assert_eq!(summary.used, 0);
    assert_eq!(summary.free, 4);
    assert!(summary.owners.is_empty());

    let blocks = pool.list_blocks();
    assert_eq!(blocks.len(), 4);
    assert!(blocks.iter().all(|b| !b.in_use && b.owner.is_none()));
    assert_eq!(
        blocks.iter().map(|b| b.id.slot()).collect::<Vec<_>>(),
        vec![0, 1, 2, 3]
    );
}

#[test]
fn test_first_fit_reuses_lowest_slot() {
    let mut pool = FixedBlockPool::new(4, 1024).unwrap();
    let a = pool.allocate("a").unwrap();
    let b = pool.allocate("b").unwrap();
    let c = pool.allocate("c").unwrap();
    assert_eq!((a.slot(), b.slot(), c.slot()), (0, 1, 2));

    pool.free(b).unwrap();
    let d = pool.allocate("d").unwrap();
    assert_eq!(d.slot(), 1);
    assert_ne!(d, b);
}

#[test]
fn test_out_of_memory_when_full() {
    let mut pool = FixedBlockPool::new(3, 64).unwrap();
    for _ in 0..3 {
        pool.allocate("worker").unwrap();
    }
    let before = pool.summary();

    let result = pool.allocate("late");
    assert_eq!(
        result,
        Err(PoolError::OutOfMemory {
            owner: "late".to_string(),
            requested: 64,
        })
    );
    assert_eq!(pool.summary(), before);
}

#[test]
fn test_free_unknown_id_is_not_found() {
    let mut pool = FixedBlockPool::new(2, 64).unwrap();
    pool.allocate("a").unwrap();

    let out_of_range = BlockId::from_raw(7, 1);
    assert_eq!(pool.free(out_of_range), Err(PoolError::NotFound(out_of_range)));

    let never_issued = BlockId::from_raw(1, 1);
    assert_eq!(pool.free(never_issued), Err(PoolError::NotFound(never_issued)));

    let generation_zero = BlockId::from_raw(0, 0);
    assert_eq!(
        pool.free(generation_zero),
        Err(PoolError::NotFound(generation_zero))
    );
    assert_eq!(pool.summary().used, 1);
}

#[test]
fn test_double_free_is_reported() {
    let mut pool = FixedBlockPool::new(2, 64).unwrap();
    let id = pool.allocate("a").unwrap();
    pool.free(id).unwrap();

    let before = pool.summary();
    assert_eq!(pool.free(id), Err(PoolError::DoubleFree(id)));
    assert_eq!(pool.summary(), before);
}

#[test]
fn test_free_clears_owner() {
    let mut pool = FixedBlockPool::new(2, 64).unwrap();
    let id = pool.allocate("a").unwrap();
    pool.free(id).unwrap();

    let block = &pool.list_blocks()[id.slot()];
    assert!(!block.in_use);
    assert_eq!(block.owner, None);
}

#[test]
fn test_free_by_owner() {
    let mut pool = FixedBlockPool::new(5, 64).unwrap();
    pool.allocate("x").unwrap();
    pool.allocate("y").unwrap();
    pool.allocate("x").unwrap();
    pool.allocate("x").unwrap();

    assert_eq!(pool.free_by_owner("x"), 3);
    let summary = pool.summary();
    assert_eq!(summary.owners.get("x"), None);
    assert_eq!(summary.owners.get("y"), Some(&1));
    assert_eq!(summary.used, 1);

    assert_eq!(pool.free_by_owner("x"), 0);
    assert_eq!(pool.free_by_owner("nobody"), 0);
}

#[test]
fn test_free_owned_rejects_other_owner() {
    let mut pool = FixedBlockPool::new(2, 64).unwrap();
    let id = pool.allocate("lidarReader").unwrap();

    assert_eq!(
        pool.free_owned(id, "radarReader"),
        Err(PoolError::NotOwner {
            id,
            claimed: "radarReader".to_string(),
            actual: "lidarReader".to_string(),
        })
    );
    assert!(pool.is_allocated(id));

    pool.free_owned(id, "lidarReader").unwrap();
    assert!(!pool.is_allocated(id));
}

#[test]
fn test_allocate_bytes_rounds_up_and_is_atomic() {
    let mut pool = FixedBlockPool::new(4, 1024).unwrap();

    let ids = pool.allocate_bytes("initGuest", 1500).unwrap();
    assert_eq!(ids.len(), 2);

    let tiny = pool.allocate_bytes("scratch", 0).unwrap();
    assert_eq!(tiny.len(), 1);

    let before = pool.summary();
    assert!(matches!(
        pool.allocate_bytes("lidarReader", 2048),
        Err(PoolError::OutOfMemory { .. })
    ));
    assert_eq!(pool.summary(), before);
}

#[test]
fn test_owner_usage_and_blocks() {
    let mut pool = FixedBlockPool::new(4, 1024).unwrap();
    let ids = pool.allocate_bytes("lidarReader", 2048).unwrap();
    pool.allocate("initGuest").unwrap();
    pool.free(ids[0]).unwrap();

    let blocks = pool.owner_blocks("lidarReader");
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].id, ids[1]);

    let usage = pool.owner_usage("lidarReader");
    assert_eq!(usage.blocks, 1);
    assert_eq!(usage.bytes, 1024);
    assert_eq!(usage.peak_bytes, 2048);
    assert_eq!(usage.allocation_count, 2);
}

#[test]
fn test_case_insensitive_owner_match() {
    let mut pool = FixedBlockPool::new(3, 64)
        .unwrap()
        .with_owner_match(OwnerMatch::CaseInsensitive);
    pool.allocate("Sensor").unwrap();
    pool.allocate("SENSOR").unwrap();

    assert_eq!(pool.summary().owners.get("sensor"), Some(&2));
    assert_eq!(pool.free_by_owner("sensor"), 2);
}

#[test]
fn test_exact_owner_match_by_default() {
    let mut pool = FixedBlockPool::new(2, 64).unwrap();
    pool.allocate("Sensor").unwrap();
    assert_eq!(pool.free_by_owner("sensor"), 0);
}

#[test]
fn test_pressure_rises_with_occupancy() {
    let mut pool = FixedBlockPool::new(5, 64).unwrap();
    assert_eq!(pool.summary().pressure(), MemoryPressure::Low);
    for _ in 0..4 {
        pool.allocate("a").unwrap();
    }
    assert_eq!(pool.summary().pressure(), MemoryPressure::High);
    pool.allocate("a").unwrap();
    assert_eq!(pool.summary().pressure(), MemoryPressure::Critical);
}

#[test]
fn test_allocate_bytes_warns_under_pressure() {
    let mut pool = FixedBlockPool::new(5, 64).unwrap();

    let quiet = capture(|| {
        pool.allocate_bytes("a", 64).unwrap();
    });
    assert!(!quiet.contains("Memory pressure"));

    let loud = capture(|| {
        pool.allocate_bytes("a", 3 * 64).unwrap();
    });
    assert!(loud.contains("WARN"));
    assert!(loud.contains("Memory pressure HIGH: allocated block run"));
}

#[test]
fn test_allocate_then_free_restores_summary() {
    let mut pool = FixedBlockPool::new(4, 1024).unwrap();
    pool.allocate("initGuest").unwrap();
    pool.allocate_bytes("lidarReader", 2048).unwrap();

    let before = pool.summary();
    let id = pool.allocate("scratchOwner").unwrap();
    assert_ne!(pool.summary(), before);
    pool.free(id).unwrap();
    assert_eq!(pool.summary(), before);

    let run = pool.allocate_bytes("initGuest", 1).unwrap();
    for id in run {
        pool.free(id).unwrap();
    }
    assert_eq!(pool.summary(), before);
}

#[test]
fn test_usable_through_trait() {
    fn drain<P: BlockPool>(pool: &mut P, owner: &str) -> usize {
        pool.free_by_owner(owner)
    }

    let mut pool = FixedBlockPool::new(2, 64).unwrap();
    pool.allocate("a").unwrap();
    assert_eq!(drain(&mut pool, "a"), 1);
}
