//! Discrete-event queue and clock domains.
//!
//! Events are delivered in tick order. Within a tick, lower priorities go
//! first, and events of equal priority are delivered in the order they were
//! scheduled.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::common::{Cycles, Tick};

/// Ordering of events that share a tick; lower runs first.
pub type Priority = i8;

/// Priority of [`EventQueue::schedule`].
pub const DEFAULT_PRIORITY: Priority = 0;

/// A clock with a fixed period, used to align events to cycle edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockDomain {
    period: Tick,
}

impl ClockDomain {
    /// Creates a clock with `period` ticks per cycle.
    pub const fn new(period: Tick) -> Self {
        debug_assert!(period > 0);
        Self { period }
    }

    /// Returns the ticks per cycle.
    pub const fn period(&self) -> Tick {
        self.period
    }

    /// Converts a cycle count to ticks.
    pub const fn cycles_to_ticks(&self, cycles: Cycles) -> Tick {
        cycles * self.period
    }

    /// Returns the tick of the clock edge `cycles` cycles after `now`.
    ///
    /// `now` is first rounded up to the next edge (or kept if it already is
    /// one), so `clock_edge(now, 0)` is the current or next edge.
    pub const fn clock_edge(&self, now: Tick, cycles: Cycles) -> Tick {
        now.div_ceil(self.period) * self.period + self.cycles_to_ticks(cycles)
    }
}

struct Entry<E> {
    when: Tick,
    priority: Priority,
    seq: u64,
    event: E,
}

impl<E> Entry<E> {
    const fn key(&self) -> (Tick, Priority, u64) {
        (self.when, self.priority, self.seq)
    }
}

impl<E> PartialEq for Entry<E> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl<E> Eq for Entry<E> {}

impl<E> PartialOrd for Entry<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for Entry<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Time-ordered queue of pending events.
pub struct EventQueue<E> {
    heap: BinaryHeap<Reverse<Entry<E>>>,
    now: Tick,
    seq: u64,
}

impl<E> std::fmt::Debug for EventQueue<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventQueue")
            .field("now", &self.now)
            .field("pending", &self.heap.len())
            .finish()
    }
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventQueue<E> {
    /// Creates an empty queue at tick 0.
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            now: 0,
            seq: 0,
        }
    }

    /// Returns the tick of the most recently delivered event.
    pub const fn cur_tick(&self) -> Tick {
        self.now
    }

    /// Returns the number of pending events.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns `true` if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Schedules `event` at absolute tick `when`. Ticks in the past are
    /// clamped to the current tick.
    pub fn schedule(&mut self, when: Tick, event: E) {
        self.schedule_with_priority(when, DEFAULT_PRIORITY, event);
    }

    /// Schedules `event` at `when`, ahead of any event of higher `priority`
    /// at the same tick.
    pub fn schedule_with_priority(&mut self, when: Tick, priority: Priority, event: E) {
        let when = when.max(self.now);
        self.heap.push(Reverse(Entry {
            when,
            priority,
            seq: self.seq,
            event,
        }));
        self.seq += 1;
    }

    /// Schedules `event` `delay` ticks from now.
    pub fn schedule_after(&mut self, delay: Tick, event: E) {
        self.schedule(self.now.saturating_add(delay), event);
    }

    /// Returns the tick of the next pending event.
    pub fn peek_tick(&self) -> Option<Tick> {
        self.heap.peek().map(|Reverse(e)| e.when)
    }

    /// Removes the next event and advances time to it.
    pub fn pop(&mut self) -> Option<(Tick, E)> {
        let Reverse(entry) = self.heap.pop()?;
        self.now = entry.when;
        Some((entry.when, entry.event))
    }
}
