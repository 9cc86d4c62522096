//! Trailing-edge debouncing on top of [`TimerQueue`]
//!
//! Each new event cancels the previous token before scheduling its own, so a
//! burst collapses into the last event of the burst.

use crate::cancel::TimerToken;
use crate::timer::TimerQueue;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<TimerToken>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: None }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace any pending timer with one firing `delay` after `now`
    pub fn schedule<T>(
        &mut self,
        queue: &mut TimerQueue<T>,
        now: Instant,
        payload: T,
    ) -> TimerToken {
        self.cancel();

        let token = queue.schedule(now + self.delay, payload);
        self.pending = Some(token.clone());
        token
    }

    /// Cancel the pending timer, if any
    ///
    /// Returns `true` when a live timer was cancelled.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(token) if !token.is_cancelled() => {
                token.cancel();
                true
            }
            _ => false,
        }
    }

    /// Whether a scheduled timer is still waiting to fire
    ///
    /// The queue does not tell the debouncer when a timer fires, so callers
    /// should call [`Debouncer::settle`] once they consume the payload.
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|token| !token.is_cancelled())
    }

    /// Forget the pending token after its timer fired
    pub fn settle(&mut self) {
        self.pending = None;
    }
}

/// A [`Debouncer`] bundled with its own [`TimerQueue`]
///
/// Convenient when a component debounces a single kind of event and has no
/// other timers to share a queue with.
pub struct Debounced<T> {
    debouncer: Debouncer,
    queue: TimerQueue<T>,
}

impl<T> Debounced<T> {
    pub fn new(delay: Duration) -> Self {
        Self { debouncer: Debouncer::new(delay), queue: TimerQueue::new() }
    }

    /// Cancel the pending payload and schedule `payload` in its place
    pub fn trigger(&mut self, now: Instant, payload: T) -> TimerToken {
        self.debouncer.schedule(&mut self.queue, now, payload)
    }

    /// Payload of the trailing event once its deadline has passed
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let mut fired = self.queue.poll(now);
        if fired.is_empty() {
            return None;
        }

        self.debouncer.settle();
        fired.pop()
    }

    pub fn cancel(&mut self) -> bool {
        let cancelled = self.debouncer.cancel();
        self.queue.cancel_all();
        cancelled
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.next_deadline()
    }
}
