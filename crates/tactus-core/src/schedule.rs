//! Delayed work.
//!
//! Recognizers never block or spawn. Anything that must happen later is
//! described as a [`ScheduledTask`] and handed to a [`Scheduler`]; the arena
//! runs due tasks from [`GestureArena::poll_timers`](crate::GestureArena::poll_timers).

use crate::arena::GestureId;
use crate::recognizer::GestureTimer;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::fmt;
use std::time::Duration;

/// A unit of deferred engine work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScheduledTask {
    /// Drop a just-ended recognizer from the active registry, unless it has
    /// been activated again since (`epoch` no longer current).
    ExpireActive {
        /// Recognizer to expire.
        gesture: GestureId,
        /// Activation epoch recorded when the task was issued.
        epoch: u64,
    },
    /// Deliver a recognizer-specific timer.
    Fire {
        /// Recognizer that asked for the timer.
        gesture: GestureId,
        /// Which timer.
        timer: GestureTimer,
    },
}

/// Capability to run work after a delay.
///
/// Implementations must hand back tasks with equal due times in the order they
/// were issued.
pub trait Scheduler: fmt::Debug {
    /// Queue `task` to become due `delay` after `now`.
    fn run_after(&mut self, now: Duration, delay: Duration, task: ScheduledTask);

    /// Remove and return every task due at or before `now`, earliest first.
    fn take_due(&mut self, now: Duration) -> Vec<ScheduledTask>;

    /// Number of queued tasks.
    fn pending(&self) -> usize;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    due: Duration,
    seq: u64,
    task: ScheduledTask,
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due
            .cmp(&other.due)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Default [`Scheduler`]: a min-heap keyed by (due time, issue order).
#[derive(Debug, Default)]
pub struct TimerQueue {
    heap: BinaryHeap<Reverse<Entry>>,
    next_seq: u64,
}

impl TimerQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Due time of the earliest queued task.
    #[must_use]
    pub fn next_due(&self) -> Option<Duration> {
        self.heap.peek().map(|Reverse(entry)| entry.due)
    }
}

impl Scheduler for TimerQueue {
    fn run_after(&mut self, now: Duration, delay: Duration, task: ScheduledTask) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Entry {
            due: now + delay,
            seq,
            task,
        }));
    }

    fn take_due(&mut self, now: Duration) -> Vec<ScheduledTask> {
        let mut due = Vec::new();
        while let Some(Reverse(entry)) = self.heap.peek() {
            if entry.due > now {
                break;
            }
            if let Some(Reverse(entry)) = self.heap.pop() {
                due.push(entry.task);
            }
        }
        due
    }

    fn pending(&self) -> usize {
        self.heap.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expire(index: u32, epoch: u64) -> ScheduledTask {
        ScheduledTask::ExpireActive {
            gesture: GestureId::from_raw_parts(index, 0),
            epoch,
        }
    }

    #[test]
    fn test_timer_queue_orders_by_due_time() {
        let mut queue = TimerQueue::new();
        let now = Duration::ZERO;
        queue.run_after(now, Duration::from_millis(30), expire(0, 3));
        queue.run_after(now, Duration::from_millis(10), expire(0, 1));
        queue.run_after(now, Duration::from_millis(20), expire(0, 2));

        assert_eq!(queue.next_due(), Some(Duration::from_millis(10)));
        let due = queue.take_due(Duration::from_millis(25));
        assert_eq!(due, vec![expire(0, 1), expire(0, 2)]);
        assert_eq!(queue.pending(), 1);
    }

    #[test]
    fn test_timer_queue_ties_fire_in_issue_order() {
        let mut queue = TimerQueue::new();
        let now = Duration::from_millis(5);
        for i in 0..5 {
            queue.run_after(now, Duration::from_millis(1), expire(i, 0));
        }
        let due = queue.take_due(Duration::from_millis(6));
        let expected: Vec<_> = (0..5).map(|i| expire(i, 0)).collect();
        assert_eq!(due, expected);
    }

    #[test]
    fn test_timer_queue_nothing_due() {
        let mut queue = TimerQueue::new();
        queue.run_after(Duration::ZERO, Duration::from_secs(1), expire(0, 0));
        assert!(queue.take_due(Duration::from_millis(999)).is_empty());
        assert_eq!(queue.pending(), 1);
    }
}
