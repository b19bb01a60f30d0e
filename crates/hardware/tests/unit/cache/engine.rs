//! Access Engine Unit Tests.
//!
//! Lookup, forwarding decisions, and fills, without a controller or time.

use pretty_assertions::assert_eq;
use rstest::rstest;

use simcache_core::cache::engine::{AccessEngine, Forward};
use simcache_core::common::{
    CacheError, FETCH_REQ_ID_BASE, INTERNAL_REQ_ID, Invariant, MemCmd, Packet,
};
use simcache_core::config::EvictionPolicy;

use crate::common::{BLOCK, blk, block_response};

fn engine(capacity: usize, policy: EvictionPolicy) -> AccessEngine {
    AccessEngine::new(BLOCK, capacity, policy, 1)
}

// ══════════════════════════════════════════════════════════
// 1. Lookup
// ══════════════════════════════════════════════════════════

#[test]
fn hit_read_copies_covered_bytes() {
    let mut engine = engine(4, EvictionPolicy::Lru);
    let mut fill = block_response(blk(3), 0);
    for (i, b) in fill.data_mut().iter_mut().enumerate() {
        *b = i as u8;
    }
    assert_eq!(engine.insert(&fill), Ok(None));

    let mut pkt = Packet::read(1, blk(3) + 10, 4);
    assert_eq!(engine.try_access(&mut pkt), Ok(true));
    assert_eq!(pkt.data(), &[10, 11, 12, 13]);
}

#[test]
fn hit_write_changes_only_covered_bytes() {
    let mut engine = engine(4, EvictionPolicy::Lru);
    assert_eq!(engine.insert(&block_response(blk(1), 0x11)), Ok(None));

    let mut pkt = Packet::write(1, blk(1) + 62, vec![0xaa, 0xbb]);
    assert_eq!(engine.try_access(&mut pkt), Ok(true));

    let data = engine.store().get(blk(1)).unwrap();
    assert!(data[..62].iter().all(|&b| b == 0x11));
    assert_eq!(&data[62..], &[0xaa, 0xbb]);
}

#[test]
fn miss_leaves_packet_untouched() {
    let mut engine = engine(4, EvictionPolicy::Fifo);
    let mut pkt = Packet::read(1, blk(9), 8);
    let before = pkt.clone();
    assert_eq!(engine.try_access(&mut pkt), Ok(false));
    assert_eq!(pkt, before);
}

#[test]
fn span_is_checked_even_on_a_hit() {
    let mut engine = engine(4, EvictionPolicy::Fifo);
    assert_eq!(engine.insert(&block_response(blk(0), 0)), Ok(None));
    assert_eq!(engine.insert(&block_response(blk(1), 0)), Ok(None));

    let mut pkt = Packet::read(1, blk(1) - 2, 4);
    assert_eq!(
        engine.try_access(&mut pkt),
        Err(CacheError::UnsupportedSpan {
            addr: blk(1) - 2,
            size: 4,
            block_size: BLOCK,
        })
    );
}

#[rstest]
#[case(MemCmd::CleanEvict)]
fn non_read_write_is_unknown(#[case] cmd: MemCmd) {
    let mut engine = engine(4, EvictionPolicy::Fifo);
    let mut pkt = Packet::with_cmd(cmd, 1, blk(2), 0);
    assert_eq!(
        engine.try_access(&mut pkt),
        Err(CacheError::UnknownRequestKind { cmd, addr: blk(2) })
    );
}

// ══════════════════════════════════════════════════════════
// 2. Forwarding
// ══════════════════════════════════════════════════════════

#[rstest]
#[case::read(Packet::read(5, blk(4), BLOCK))]
#[case::write(Packet::write(5, blk(4), vec![1; BLOCK]))]
fn whole_block_goes_direct(#[case] pkt: Packet) {
    let mut engine = engine(4, EvictionPolicy::Lru);
    assert_eq!(engine.prepare_forward(pkt.clone()), Ok(Forward::Direct(pkt)));
}

#[test]
fn partial_request_is_upsized() {
    let mut engine = engine(4, EvictionPolicy::Lru);
    let pkt = Packet::write(5, blk(4) + 17, vec![0xee]);
    let Ok(Forward::Upsized { fetch, stash }) = engine.prepare_forward(pkt.clone()) else {
        panic!("expected an upsized forward");
    };
    assert_eq!(fetch.cmd(), MemCmd::ReadReq);
    assert_eq!(fetch.addr(), blk(4));
    assert_eq!(fetch.size(), BLOCK);
    assert_eq!(fetch.req_id(), FETCH_REQ_ID_BASE);
    assert_eq!(stash, pkt);

    let Ok(Forward::Upsized { fetch, .. }) = engine.prepare_forward(Packet::read(6, blk(9), 1)) else {
        panic!("expected an upsized forward");
    };
    assert_eq!(fetch.req_id(), FETCH_REQ_ID_BASE + 1);
}

#[test]
fn crossing_request_is_not_forwarded() {
    let mut engine = engine(4, EvictionPolicy::Lru);
    let pkt = Packet::read(5, blk(4) + 60, 8);
    assert!(matches!(
        engine.prepare_forward(pkt),
        Err(CacheError::UnsupportedSpan { size: 8, .. })
    ));
}

#[test]
fn into_parts_splits_the_forward() {
    let pkt = Packet::read(1, blk(1), BLOCK);
    assert_eq!(Forward::Direct(pkt.clone()).into_parts(), (pkt.clone(), None));
    let stash = Packet::read(1, blk(1) + 1, 1);
    let upsized = Forward::Upsized {
        fetch: pkt.clone(),
        stash: stash.clone(),
    };
    assert_eq!(upsized.into_parts(), (pkt, Some(stash)));
}

// ══════════════════════════════════════════════════════════
// 3. Fill
// ══════════════════════════════════════════════════════════

#[test]
fn insert_checks_the_reply() {
    let mut engine = engine(4, EvictionPolicy::Lru);
    assert_eq!(
        engine.insert(&block_response(blk(1) + 8, 0)),
        Err(Invariant::UnalignedInsert(blk(1) + 8).into())
    );

    let mut short = Packet::read(1, blk(1), 32);
    short.make_response();
    assert_eq!(
        engine.insert(&short),
        Err(Invariant::BlockSizeMismatch {
            addr: blk(1),
            len: 32,
            block_size: BLOCK,
        }
        .into())
    );

    assert_eq!(engine.insert(&block_response(blk(1), 0)), Ok(None));
    assert_eq!(
        engine.insert(&block_response(blk(1), 0)),
        Err(Invariant::DuplicateInsert(blk(1)).into())
    );
    assert_eq!(engine.store().len(), 1);
}

#[rstest]
#[case(EvictionPolicy::Fifo)]
#[case(EvictionPolicy::Filo)]
#[case(EvictionPolicy::Lru)]
#[case(EvictionPolicy::Random)]
#[case(EvictionPolicy::Sequential)]
fn eviction_writes_back_the_victim(#[case] policy: EvictionPolicy) {
    let mut engine = engine(2, policy);
    assert_eq!(engine.insert(&block_response(blk(1), 0x01)), Ok(None));
    assert_eq!(engine.insert(&block_response(blk(2), 0x02)), Ok(None));

    let writeback = engine.insert(&block_response(blk(3), 0x03)).unwrap().unwrap();
    assert_eq!(writeback.cmd(), MemCmd::WritebackDirty);
    assert_eq!(writeback.req_id(), INTERNAL_REQ_ID);
    assert!(!writeback.needs_response());

    let victim = writeback.addr();
    assert!(victim == blk(1) || victim == blk(2));
    let fill = (victim / BLOCK as u64) as u8;
    assert!(writeback.data().iter().all(|&b| b == fill));
    assert!(!engine.store().contains(victim));
    assert!(engine.store().contains(blk(3)));
    assert_eq!(engine.store().len(), 2);
}

#[test]
fn writeback_carries_modified_bytes() {
    let mut engine = engine(1, EvictionPolicy::Fifo);
    assert_eq!(engine.insert(&block_response(blk(1), 0)), Ok(None));
    let mut pkt = Packet::write(1, blk(1) + 3, vec![7]);
    assert_eq!(engine.try_access(&mut pkt), Ok(true));

    let writeback = engine.insert(&block_response(blk(2), 0)).unwrap().unwrap();
    assert_eq!(writeback.data()[3], 7);
    assert_eq!(writeback.data().iter().filter(|&&b| b != 0).count(), 1);
}

#[test]
fn touch_steers_lru_victim() {
    let mut engine = engine(2, EvictionPolicy::Lru);
    assert_eq!(engine.insert(&block_response(blk(1), 0)), Ok(None));
    assert_eq!(engine.insert(&block_response(blk(2), 0)), Ok(None));
    assert_eq!(engine.touch(blk(1)), Ok(()));
    let writeback = engine.insert(&block_response(blk(3), 0)).unwrap().unwrap();
    assert_eq!(writeback.addr(), blk(2));
}

#[test]
fn touch_of_untracked_block_is_a_desync() {
    let mut lru = engine(2, EvictionPolicy::Lru);
    assert_eq!(lru.insert(&block_response(blk(1), 0)), Ok(None));
    assert_eq!(lru.touch(blk(5)), Err(Invariant::LedgerDesync(blk(5))));

    let mut fifo = engine(2, EvictionPolicy::Fifo);
    assert_eq!(fifo.touch(blk(5)), Ok(()));
}
