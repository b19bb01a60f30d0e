//! Set-Associative Tag Unit Tests.

use pretty_assertions::assert_eq;

use simcache_core::cache::tags::{
    FifoWayPolicy, LruWayPolicy, ReplacementPolicy, SetAssocTags, Victim,
};

use crate::common::{BLOCK, blk};

const WAYS: usize = 4;

/// Fills `addr` into whatever way the policy picks and returns the victim.
fn fill<P: ReplacementPolicy>(tags: &mut SetAssocTags<P>, addr: u64) -> Victim {
    let victim = tags.find_victim(addr).unwrap();
    tags.insert_block(addr, victim.way);
    victim
}

fn fifo_set() -> SetAssocTags<FifoWayPolicy> {
    SetAssocTags::new(1, WAYS, BLOCK, FifoWayPolicy::new(1, WAYS))
}

fn lru_set() -> SetAssocTags<LruWayPolicy> {
    SetAssocTags::new(1, WAYS, BLOCK, LruWayPolicy::new(1, WAYS))
}

#[test]
fn set_index_comes_from_block_number() {
    let tags = SetAssocTags::new(4, WAYS, BLOCK, FifoWayPolicy::new(4, WAYS));
    assert_eq!(tags.extract_set(blk(5)), 1);
    assert_eq!(tags.extract_set(blk(5) + 63), 1);
    assert_eq!(tags.extract_set(blk(8)), 0);
}

#[test]
fn fifo_fills_invalid_ways_then_replaces_oldest() {
    let mut tags = fifo_set();
    let ways: Vec<usize> = (1..=4).map(|n| fill(&mut tags, blk(n)).way).collect();
    assert_eq!(ways, vec![3, 2, 1, 0]);
    assert_eq!(tags.policy().order(0), &[0, 1, 2, 3]);

    let victim = fill(&mut tags, blk(5));
    assert_eq!(victim, Victim { set: 0, way: 3, resident: Some(blk(1)) });
    assert_eq!(tags.block_at(0, 3), Some(blk(5)));
}

#[test]
fn fifo_hit_does_not_reorder() {
    let mut tags = fifo_set();
    for n in 1..=4 {
        let _ = fill(&mut tags, blk(n));
    }
    assert_eq!(tags.access_block(blk(1) + 9), Some(3));
    assert_eq!(tags.find_victim(blk(5)).unwrap().resident, Some(blk(1)));
    assert_eq!(tags.access_block(blk(9)), None);
}

#[test]
fn lru_hit_promotes() {
    let mut tags = lru_set();
    for n in 1..=4 {
        let _ = fill(&mut tags, blk(n));
    }
    assert_eq!(tags.access_block(blk(1)), Some(3));
    assert_eq!(tags.policy().order(0), &[3, 0, 1, 2]);
    assert_eq!(tags.find_victim(blk(5)).unwrap().resident, Some(blk(2)));
}

#[test]
fn invalidated_way_is_refilled_first() {
    let mut tags = fifo_set();
    for n in 1..=4 {
        let _ = fill(&mut tags, blk(n));
    }
    tags.invalidate(0, 1);
    assert_eq!(tags.block_at(0, 1), None);
    let victim = tags.find_victim(blk(7)).unwrap();
    assert_eq!(victim, Victim { set: 0, way: 1, resident: None });
}

#[test]
fn alloc_assoc_limits_candidate_ways() {
    let mut tags = lru_set();
    tags.set_alloc_assoc(2);
    assert_eq!(tags.alloc_assoc(), 2);
    assert_eq!(fill(&mut tags, blk(1)).way, 1);
    assert_eq!(fill(&mut tags, blk(2)).way, 0);
    let victim = fill(&mut tags, blk(3));
    assert_eq!(victim.way, 1);
    assert_eq!(victim.resident, Some(blk(1)));

    tags.set_alloc_assoc(0);
    assert_eq!(tags.find_victim(blk(4)), None);

    tags.set_alloc_assoc(99);
    assert_eq!(tags.alloc_assoc(), WAYS);
}
