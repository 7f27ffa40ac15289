/*!
 * Variable Pool Tests
 * Tier validation, best-fit matching with fall-through, and reporting
 */

use heap_pools::core::limits::{GIB, KIB, MIB};
use heap_pools::memory::{BlockId, PoolError, TierSpec, VariableBlockPool};
use pretty_assertions::assert_eq;

fn small_medium_large() -> VariableBlockPool {
    VariableBlockPool::new(vec![
        TierSpec::new("S", 1, 1),
        TierSpec::new("M", 4, 1),
        TierSpec::new("L", 16, 1),
    ])
    .unwrap()
}

fn tier_of(pool: &VariableBlockPool, id: BlockId) -> String {
    pool.list_blocks()
        .into_iter()
        .find(|b| b.id == id)
        .and_then(|b| b.tier)
        .unwrap()
}

#[test]
fn test_rejects_bad_tiers() {
    assert!(matches!(
        VariableBlockPool::new(vec![]),
        Err(PoolError::Configuration(_))
    ));
    assert!(matches!(
        VariableBlockPool::new(vec![TierSpec::new("S", 0, 1)]),
        Err(PoolError::Configuration(_))
    ));
    assert!(matches!(
        VariableBlockPool::new(vec![TierSpec::new("S", 8, 0)]),
        Err(PoolError::Configuration(_))
    ));
    assert!(matches!(
        VariableBlockPool::new(vec![TierSpec::new("L", 16, 1), TierSpec::new("S", 1, 1)]),
        Err(PoolError::Configuration(_))
    ));
}

#[test]
fn test_rejects_layouts_that_overflow() {
    assert!(matches!(
        VariableBlockPool::new(vec![
            TierSpec::new("S", 1, usize::MAX),
            TierSpec::new("L", 2, 1),
        ]),
        Err(PoolError::Configuration(_))
    ));
    assert!(matches!(
        VariableBlockPool::new(vec![TierSpec::new("GB", 2 * GIB, 1 << 40)]),
        Err(PoolError::Configuration(_))
    ));
}

#[test]
fn test_large_lazy_tier_reports_without_overflow() {
    let mut pool = VariableBlockPool::new(vec![TierSpec::new("GB", 2 * GIB, 1 << 30)]).unwrap();
    pool.allocate("a", GIB).unwrap();

    let summary = pool.summary();
    assert_eq!(summary.total_bytes(), (1 << 30) * 2 * GIB);
    assert_eq!(summary.used(), 1);
}

#[test]
fn test_fall_through_to_larger_tiers() {
    let mut pool = small_medium_large();

    let first = pool.allocate("a", 1).unwrap();
    let second = pool.allocate("a", 1).unwrap();
    let third = pool.allocate("a", 1).unwrap();

    assert_eq!(tier_of(&pool, first), "S");
    assert_eq!(tier_of(&pool, second), "M");
    assert_eq!(tier_of(&pool, third), "L");

    assert_eq!(
        pool.allocate("a", 1),
        Err(PoolError::OutOfMemory {
            owner: "a".to_string(),
            requested: 1,
        })
    );
}

#[test]
fn test_smallest_qualifying_tier_is_chosen() {
    let mut pool = small_medium_large();
    let id = pool.allocate("a", 3).unwrap();
    assert_eq!(tier_of(&pool, id), "M");

    let id = pool.allocate("b", 4).unwrap();
    assert_eq!(tier_of(&pool, id), "L");

    // S has room but is too small
    assert!(matches!(
        pool.allocate("c", 2),
        Err(PoolError::OutOfMemory { .. })
    ));
}

#[test]
fn test_size_too_large() {
    let mut pool = small_medium_large();
    let before = pool.summary();
    assert_eq!(
        pool.allocate("a", 100),
        Err(PoolError::SizeTooLarge {
            requested: 100,
            largest: 16,
        })
    );
    assert_eq!(pool.summary(), before);
    assert!(pool.list_blocks().is_empty());
}

#[test]
fn test_slots_created_on_first_use() {
    let mut pool = VariableBlockPool::new(vec![
        TierSpec::new("KB", 4 * KIB, 4),
        TierSpec::new("MB", 2 * MIB, 4),
    ])
    .unwrap();
    assert!(pool.list_blocks().is_empty());

    pool.allocate("a", 10).unwrap();
    pool.allocate("a", MIB).unwrap();
    let blocks = pool.list_blocks();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].tier.as_deref(), Some("KB"));
    assert_eq!(blocks[1].tier.as_deref(), Some("MB"));
    assert!(blocks[0].id < blocks[1].id);
}

#[test]
fn test_summary_tracks_requested_and_reserved_bytes() {
    let mut pool = VariableBlockPool::new(vec![
        TierSpec::new("KB", 4 * KIB, 1),
        TierSpec::new("MB", 2 * MIB, 2),
    ])
    .unwrap();
    pool.allocate("a", KIB).unwrap();
    // KB tier full, falls through to MB
    pool.allocate("b", KIB).unwrap();

    let summary = pool.summary();
    assert_eq!(summary.requested_bytes, 2 * KIB);
    assert_eq!(summary.reserved_bytes, 4 * KIB + 2 * MIB);
    assert_eq!(summary.internal_fragmentation(), 2 * KIB + 2 * MIB);
    assert_eq!(summary.tiers[0].used, 1);
    assert_eq!(summary.tiers[0].free, 0);
    assert_eq!(summary.tiers[1].used, 1);
    assert_eq!(summary.tiers[1].free, 1);
    assert_eq!(summary.used(), 2);
    assert_eq!(summary.capacity(), 3);
}

#[test]
fn test_free_and_free_by_owner_across_tiers() {
    let mut pool = small_medium_large();
    let s = pool.allocate("x", 1).unwrap();
    pool.allocate("y", 2).unwrap();
    pool.allocate("x", 10).unwrap();

    pool.free(s).unwrap();
    assert_eq!(pool.free(s), Err(PoolError::DoubleFree(s)));

    assert_eq!(pool.free_by_owner("x"), 1);
    let summary = pool.summary();
    assert_eq!(summary.owners.get("x"), None);
    assert_eq!(summary.owners.get("y"), Some(&1));
    assert_eq!(summary.used(), 1);
}

#[test]
fn test_free_unknown_id() {
    let mut pool = small_medium_large();
    let created_but_empty = pool.allocate("a", 1).unwrap();
    pool.free(created_but_empty).unwrap();

    let beyond = BlockId::from_raw(99, 1);
    assert_eq!(pool.free(beyond), Err(PoolError::NotFound(beyond)));

    // Slot 1 lies in tier M but has never been created
    let uncreated = BlockId::from_raw(1, 1);
    assert_eq!(pool.free(uncreated), Err(PoolError::NotFound(uncreated)));
}

#[test]
fn test_free_owned_checks_owner() {
    let mut pool = small_medium_large();
    let id = pool.allocate("initGuest", 4).unwrap();

    assert!(matches!(
        pool.free_owned(id, "sensorReader"),
        Err(PoolError::NotOwner { .. })
    ));
    pool.free_owned(id, "initGuest").unwrap();
    assert!(!pool.is_allocated(id));
}

#[test]
fn test_spanning_allocation_uses_largest_tier_first() {
    let mut pool = VariableBlockPool::new(vec![
        TierSpec::new("KB", 4 * KIB, 16),
        TierSpec::new("MB", 2 * MIB, 32),
        TierSpec::new("GB", 2 * GIB, 8),
    ])
    .unwrap();

    let ids = pool.allocate_spanning("initGuest", 10 * GIB).unwrap();
    assert_eq!(ids.len(), 5);
    assert!(ids.iter().all(|id| tier_of(&pool, *id) == "GB"));

    let ids = pool.allocate_spanning("loader", 2 * MIB + 100).unwrap();
    assert_eq!(ids.len(), 2);
    assert_eq!(tier_of(&pool, ids[0]), "MB");
    assert_eq!(tier_of(&pool, ids[1]), "KB");

    let summary = pool.summary();
    assert_eq!(summary.requested_bytes, 10 * GIB + 2 * MIB + 100);
}

#[test]
fn test_spanning_allocation_is_atomic() {
    let mut pool = small_medium_large();
    let before = pool.summary();

    // 16 + 4 + 1 = 21 bytes is all the pool holds
    assert!(matches!(
        pool.allocate_spanning("a", 22),
        Err(PoolError::OutOfMemory { .. })
    ));
    assert_eq!(pool.summary(), before);
    assert!(pool.list_blocks().is_empty());

    let ids = pool.allocate_spanning("a", 21).unwrap();
    assert_eq!(ids.len(), 3);
}

#[test]
fn test_owner_usage() {
    let mut pool = small_medium_large();
    pool.allocate("a", 1).unwrap();
    let m = pool.allocate("a", 3).unwrap();
    pool.free(m).unwrap();

    let usage = pool.owner_usage("a");
    assert_eq!(usage.blocks, 1);
    assert_eq!(usage.bytes, 1);
    assert_eq!(usage.peak_bytes, 5);
    assert_eq!(usage.allocation_count, 2);
}
