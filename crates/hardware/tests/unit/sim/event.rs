//! Event Queue and Clock Unit Tests.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;

use simcache_core::sim::{ClockDomain, DEFAULT_PRIORITY, EventQueue};

#[rstest]
#[case(1000, 0, 0, 0)]
#[case(1000, 0, 2, 2000)]
#[case(1000, 999, 0, 1000)]
#[case(1000, 1001, 1, 3000)]
#[case(500, 1000, 1, 1500)]
fn clock_edge_rounds_up_then_adds(
    #[case] period: u64,
    #[case] now: u64,
    #[case] cycles: u64,
    #[case] edge: u64,
) {
    let clk = ClockDomain::new(period);
    assert_eq!(clk.clock_edge(now, cycles), edge);
    assert_eq!(clk.cycles_to_ticks(cycles), cycles * period);
}

#[test]
fn pop_advances_time() {
    let mut queue = EventQueue::new();
    queue.schedule(300, 'b');
    queue.schedule(100, 'a');
    assert_eq!(queue.len(), 2);
    assert_eq!(queue.peek_tick(), Some(100));
    assert_eq!(queue.pop(), Some((100, 'a')));
    assert_eq!(queue.cur_tick(), 100);
    queue.schedule_after(50, 'c');
    assert_eq!(queue.pop(), Some((150, 'c')));
    assert_eq!(queue.pop(), Some((300, 'b')));
    assert_eq!(queue.pop(), None);
    assert!(queue.is_empty());
    assert_eq!(queue.cur_tick(), 300);
}

#[test]
fn past_ticks_are_clamped_to_now() {
    let mut queue = EventQueue::new();
    queue.schedule(500, 1);
    let _ = queue.pop();
    queue.schedule(10, 2);
    assert_eq!(queue.pop(), Some((500, 2)));
}

#[test]
fn lower_priority_runs_first_within_a_tick() {
    let mut queue = EventQueue::new();
    queue.schedule(100, "issue");
    queue.schedule_with_priority(100, -1, "retry");
    queue.schedule_with_priority(100, DEFAULT_PRIORITY, "late");
    assert_eq!(queue.pop(), Some((100, "retry")));
    assert_eq!(queue.pop(), Some((100, "issue")));
    assert_eq!(queue.pop(), Some((100, "late")));
}

proptest! {
    /// Delivery is ordered by tick, and by scheduling order within a tick.
    #[test]
    fn delivery_is_stable_in_tick_order(ticks in prop::collection::vec(0u64..20, 0..100)) {
        let mut queue = EventQueue::new();
        for (i, &tick) in ticks.iter().enumerate() {
            queue.schedule(tick, i);
        }
        let mut expected: Vec<(u64, usize)> = ticks.iter().copied().zip(0..).collect();
        expected.sort_by_key(|&(tick, i)| (tick, i));
        let delivered: Vec<(u64, usize)> = std::iter::from_fn(|| queue.pop()).collect();
        prop_assert_eq!(delivered, expected);
    }
}
