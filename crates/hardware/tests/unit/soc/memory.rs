//! Main Memory Unit Tests.

use pretty_assertions::assert_eq;
use rstest::rstest;

use simcache_core::common::{AddrRange, MemCmd, Packet};
use simcache_core::config::{MemoryConfig, MemoryController as ControllerKind};
use simcache_core::soc::SimpleMemory;
use simcache_core::soc::memory::buffer::SparseBuffer;
use simcache_core::soc::memory::controller::{
    DramController, MemoryController, SimpleController, from_config,
};

fn memory(depth: usize) -> SimpleMemory {
    SimpleMemory::with_controller(
        AddrRange::new(0, 1 << 20),
        Box::new(SimpleController::new(10)),
        1000,
        depth,
    )
}

#[test]
fn write_then_read_with_latency() {
    let mut mem = memory(4);
    let (when, resp) = mem
        .recv_timing_req(Packet::write(1, 0x100, vec![1, 2, 3]), 500)
        .unwrap()
        .unwrap();
    assert_eq!(when, 11_000);
    assert_eq!(resp.cmd(), MemCmd::WriteResp);

    let (_, resp) = mem
        .recv_timing_req(Packet::read(2, 0x101, 2), 11_000)
        .unwrap()
        .unwrap();
    assert_eq!(resp.cmd(), MemCmd::ReadResp);
    assert_eq!(resp.data(), &[2, 3]);
    assert_eq!(mem.in_flight(), 2);
}

#[test]
fn writeback_needs_no_response() {
    let mut mem = memory(1);
    assert_eq!(
        mem.recv_timing_req(Packet::writeback(0x40, vec![9; 64]), 0),
        Ok(None)
    );
    assert_eq!(mem.in_flight(), 0);
    let mut pkt = Packet::read(0, 0x7f, 1);
    mem.recv_functional(&mut pkt);
    assert_eq!(pkt.data(), &[9]);
}

#[test]
fn full_queue_refuses_until_a_response_drains() {
    let mut mem = memory(1);
    assert!(mem.recv_timing_req(Packet::read(1, 0, 4), 0).unwrap().is_some());
    let refused = mem.recv_timing_req(Packet::read(2, 64, 4), 0).unwrap_err();
    assert_eq!(refused.req_id(), 2);
    assert!(mem.needs_retry());

    assert!(mem.response_delivered());
    assert!(!mem.needs_retry());
    assert!(mem.recv_timing_req(refused, 20_000).is_ok());
    assert!(!mem.response_delivered());
}

#[test]
fn out_of_range_access_still_completes() {
    let mut mem = SimpleMemory::with_controller(
        AddrRange::new(0x1000, 0x1000),
        Box::new(SimpleController::new(1)),
        1,
        4,
    );
    let mut pkt = Packet::write(1, 0x3000, vec![5]);
    mem.recv_functional(&mut pkt);
    let mut back = Packet::read(1, 0x3000, 1);
    mem.recv_functional(&mut back);
    assert_eq!(back.data(), &[5]);
}

#[rstest]
#[case(ControllerKind::Simple, [30, 30, 30])]
#[case(ControllerKind::Dram, [28, 14, 42])]
fn controller_from_config(#[case] kind: ControllerKind, #[case] expected: [u64; 3]) {
    let config = MemoryConfig {
        controller: kind,
        ..MemoryConfig::default()
    };
    let mut controller = from_config(&config);
    let got = [0x0, 0x40, 0x1000].map(|addr| controller.access_latency(addr));
    assert_eq!(got, expected);
}

#[test]
fn dram_row_switch_pays_precharge() {
    let mut dram = DramController::new(1, 2, 4);
    assert_eq!(dram.access_latency(0x800), 3);
    assert_eq!(dram.access_latency(0xfff), 1);
    assert_eq!(dram.access_latency(0x0), 7);
}

#[test]
fn sparse_buffer_reads_zero_and_allocates_lazily() {
    let mut buf = SparseBuffer::new();
    let mut out = [0xffu8; 4];
    buf.read_slice(0x10_0000, &mut out);
    assert_eq!(out, [0; 4]);
    assert_eq!(buf.resident_pages(), 0);

    // Straddles a page boundary.
    buf.write_slice(4094, &[1, 2, 3, 4]);
    assert_eq!(buf.resident_pages(), 2);
    buf.read_slice(4094, &mut out);
    assert_eq!(out, [1, 2, 3, 4]);
    assert_eq!(buf.read_u8(4097), 4);
}
