//! Deadline-ordered timer queue
//!
//! Timers are kept in a min-heap keyed by deadline, then by insertion order so
//! that timers sharing a deadline fire FIFO.

use crate::cancel::{TimerId, TimerToken};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

struct Entry<T> {
    deadline: Instant,
    token: TimerToken,
    payload: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.token.id() == other.token.id()
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse so the earliest deadline is on top.
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.token.id().cmp(&self.token.id()))
    }
}

/// Timer queue driven by an explicit clock
///
/// # Example
///
/// ```
/// use flipbook_scheduler::TimerQueue;
/// use std::time::{Duration, Instant};
///
/// let mut queue = TimerQueue::new();
/// let now = Instant::now();
///
/// let token = queue.schedule(now + Duration::from_millis(50), "refresh");
/// queue.schedule(now + Duration::from_millis(10), "flip");
/// token.cancel();
///
/// assert_eq!(queue.poll(now + Duration::from_millis(60)), vec!["flip"]);
/// ```
pub struct TimerQueue<T> {
    heap: BinaryHeap<Entry<T>>,
    next_id: TimerId,
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self { heap: BinaryHeap::new(), next_id: 0 }
    }

    /// Schedule `payload` to fire at `deadline`
    pub fn schedule(&mut self, deadline: Instant, payload: T) -> TimerToken {
        self.next_id += 1;
        let token = TimerToken::new(self.next_id);

        self.heap.push(Entry { deadline, token: token.clone(), payload });
        token
    }

    /// Pop every live timer whose deadline is at or before `now`
    ///
    /// Cancelled timers are discarded as they surface.
    pub fn poll(&mut self, now: Instant) -> Vec<T> {
        let mut fired = Vec::new();

        while let Some(entry) = self.heap.peek() {
            if entry.deadline > now {
                break;
            }

            let Some(entry) = self.heap.pop() else {
                break;
            };

            if entry.token.is_cancelled() {
                continue;
            }

            fired.push(entry.payload);
        }

        fired
    }

    /// Earliest deadline among live timers
    pub fn next_deadline(&self) -> Option<Instant> {
        self.heap
            .iter()
            .filter(|entry| !entry.token.is_cancelled())
            .map(|entry| entry.deadline)
            .min()
    }

    /// Cancel and drop every pending timer
    ///
    /// Returns the number of live timers that were cancelled.
    pub fn cancel_all(&mut self) -> usize {
        let mut cancelled = 0;

        for entry in self.heap.drain() {
            if !entry.token.is_cancelled() {
                entry.token.cancel();
                cancelled += 1;
            }
        }

        if cancelled > 0 {
            tracing::debug!(cancelled, "cancelled pending timers");
        }

        cancelled
    }

    /// Number of live timers
    pub fn len(&self) -> usize {
        self.heap.iter().filter(|entry| !entry.token.is_cancelled()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
