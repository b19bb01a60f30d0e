//! Trace Parsing and Traffic Generator Unit Tests.

use std::io::Write;

use pretty_assertions::assert_eq;
use rstest::rstest;

use simcache_core::common::{MemCmd, Packet};
use simcache_core::sim::traffic::TraceOpKind;
use simcache_core::sim::{TraceError, TraceOp, TrafficGen, load_trace, parse_trace};

const TRACE: &str = "\
# tick port op addr size|data
0     0 R 0x1000 8

2_000 1 W 0x1004 deadBEEF   # trailing comment
3000  0 r 4096   64
";

#[test]
fn parses_reads_writes_and_comments() {
    let ops = parse_trace(TRACE).unwrap();
    assert_eq!(ops.len(), 3);
    assert_eq!(
        ops[0],
        TraceOp {
            tick: 0,
            port: 0,
            addr: 0x1000,
            kind: TraceOpKind::Read { size: 8 },
            line: 2,
        }
    );
    assert_eq!(ops[1].tick, 2000);
    assert_eq!(ops[1].port, 1);
    assert_eq!(ops[1].kind, TraceOpKind::Write { data: vec![0xde, 0xad, 0xbe, 0xef] });
    assert_eq!(ops[1].line, 4);
    assert_eq!(ops[2].size(), 64);
    assert_eq!(ops[2].addr, 4096);
}

#[test]
fn ops_become_packets() {
    let ops = parse_trace(TRACE).unwrap();
    let read = ops[0].to_packet(5);
    assert_eq!((read.cmd(), read.addr(), read.size(), read.req_id()), (MemCmd::ReadReq, 0x1000, 8, 5));
    let write = ops[1].to_packet(6);
    assert_eq!(write.cmd(), MemCmd::WriteReq);
    assert_eq!(write.data(), &[0xde, 0xad, 0xbe, 0xef]);
}

#[rstest]
#[case("0 0 R 0x10", 1)]
#[case("0 0 R 0x10 4 extra", 1)]
fn wrong_field_count_is_malformed(#[case] text: &str, #[case] line: usize) {
    assert!(matches!(parse_trace(text), Err(TraceError::Malformed { line: l }) if l == line));
}

#[test]
fn errors_carry_line_numbers() {
    assert!(matches!(
        parse_trace("0 0 R 0x10 4\n0 0 X 0x10 4"),
        Err(TraceError::UnknownOp { line: 2, op }) if op == "X"
    ));
    assert!(matches!(
        parse_trace("\n\nzz 0 R 0 4"),
        Err(TraceError::BadNumber { line: 3, text }) if text == "zz"
    ));
    assert!(matches!(
        parse_trace("0 0 W 0 abc"),
        Err(TraceError::BadHex { line: 1, .. })
    ));
    assert!(matches!(
        parse_trace("0 0 W 0 zz"),
        Err(TraceError::BadHex { line: 1, .. })
    ));
    assert!(matches!(parse_trace("0 0 R 0 0"), Err(TraceError::Empty { line: 1 })));
}

#[test]
fn loads_trace_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(TRACE.as_bytes()).unwrap();
    assert_eq!(load_trace(file.path()).unwrap().len(), 3);

    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        load_trace(dir.path().join("missing.trace")),
        Err(TraceError::Io { .. })
    ));
}

// ══════════════════════════════════════════════════════════
// Traffic generator
// ══════════════════════════════════════════════════════════

fn gen_for(port: usize) -> TrafficGen {
    let ops = parse_trace("100 1 R 0x40 4\n50 1 W 0x80 01").unwrap();
    TrafficGen::new(port, ops)
}

#[test]
fn one_request_outstanding_at_a_time() {
    let mut traffic = gen_for(1);
    assert_eq!(traffic.next_issue_tick(), Some(100));
    let first = traffic.take_request(100).unwrap();
    assert_eq!(first.req_id(), (2 << 32) | 1);
    assert!(traffic.is_waiting());
    assert_eq!(traffic.next_issue_tick(), None);
    assert_eq!(traffic.take_request(150), None);

    let mut resp = first;
    resp.make_response();
    assert!(traffic.complete(resp, 400));
    let done = &traffic.completions()[0];
    assert_eq!((done.issued, done.completed), (100, 400));
    assert_eq!(done.cmd, MemCmd::ReadResp);

    // The second line's tick is already past; it issues right away.
    assert_eq!(traffic.next_issue_tick(), Some(50));
    let second = traffic.take_request(400).unwrap();
    assert_eq!(second.req_id(), (2 << 32) | 2);
    assert!(!traffic.is_done());
}

#[test]
fn refused_request_is_resent_with_original_issue_tick() {
    let mut traffic = gen_for(0);
    let pkt = traffic.take_request(100).unwrap();
    let id = pkt.req_id();
    traffic.refused(pkt);
    assert!(traffic.has_refused());
    assert_eq!(traffic.refusals(), 1);

    let again = traffic.take_request(900).unwrap();
    assert_eq!(again.req_id(), id);
    assert!(!traffic.has_refused());

    let mut resp = again;
    resp.make_response();
    assert!(traffic.complete(resp, 1200));
    assert_eq!(traffic.completions()[0].issued, 100);
}

#[test]
fn mismatched_response_is_rejected() {
    let mut traffic = gen_for(0);
    let _ = traffic.take_request(100).unwrap();
    let mut stray = Packet::read(42, 0x40, 4);
    stray.make_response();
    assert!(!traffic.complete(stray, 200));
    assert!(traffic.completions().is_empty());
    assert!(traffic.is_waiting());
}
