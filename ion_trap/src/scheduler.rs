//! Cooperative one-shot timers
//!
//! Events are queued with a delay relative to the scheduler clock and handed back
//! from [`Scheduler::advance`] once the clock passes their due time. Events fire
//! exactly once, in non-decreasing due order; equal due times keep enqueue order.
//! Nothing can be cancelled.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;

struct Entry<E> {
    due: Duration,
    seq: u64,
    event: E,
}

impl<E> PartialEq for Entry<E> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<E> Eq for Entry<E> {}

impl<E> PartialOrd for Entry<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for Entry<E> {
    // Reversed so the max-heap pops the earliest entry first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

pub struct Scheduler<E> {
    now: Duration,
    next_seq: u64,
    queue: BinaryHeap<Entry<E>>,
}

impl<E> Scheduler<E> {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_seq: 0,
            queue: BinaryHeap::new(),
        }
    }

    /// Queue `event` to fire `delay` after the current clock
    pub fn schedule(&mut self, delay: Duration, event: E) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Entry {
            due: self.now + delay,
            seq,
            event,
        });
    }

    /// Move the clock forward and return every event that became due, in firing order
    pub fn advance(&mut self, dt: Duration) -> Vec<E> {
        self.now += dt;
        let mut fired = Vec::new();
        while let Some(entry) = self.queue.peek() {
            if entry.due > self.now {
                break;
            }
            if let Some(entry) = self.queue.pop() {
                fired.push(entry.event);
            }
        }
        fired
    }

    /// Time elapsed since the scheduler was created
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn fires_in_due_order() {
        let mut s = Scheduler::new();
        s.schedule(ms(300), "c");
        s.schedule(ms(100), "a");
        s.schedule(ms(200), "b");
        assert_eq!(s.advance(ms(1000)), vec!["a", "b", "c"]);
    }

    #[test]
    fn equal_delays_keep_enqueue_order() {
        let mut s = Scheduler::new();
        for name in ["first", "second", "third"] {
            s.schedule(ms(50), name);
        }
        assert_eq!(s.advance(ms(50)), vec!["first", "second", "third"]);
    }

    #[test]
    fn events_fire_exactly_once() {
        let mut s = Scheduler::new();
        s.schedule(ms(100), 1);
        assert!(s.advance(ms(99)).is_empty());
        assert_eq!(s.advance(ms(1)), vec![1]);
        assert!(s.advance(ms(500)).is_empty());
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn delay_is_relative_to_current_clock() {
        let mut s = Scheduler::new();
        s.advance(ms(1000));
        s.schedule(ms(200), 7);
        assert!(s.advance(ms(150)).is_empty());
        assert_eq!(s.advance(ms(50)), vec![7]);
        assert_eq!(s.now(), ms(1200));
    }
}
