//! Cancellation tokens for pending timers
//!
//! A token is handed out when a timer is scheduled. Whoever holds a clone can
//! cancel the timer; the queue checks the shared flag before firing.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Unique timer identifier
pub type TimerId = u64;

/// Cancellation token for a scheduled timer
///
/// Clones share the same cancellation state, so the scheduler and the code
/// that requested the timer observe the same flag.
///
/// # Example
///
/// ```
/// use flipbook_scheduler::TimerToken;
///
/// let token = TimerToken::new(7);
/// let held = token.clone();
///
/// token.cancel();
/// assert!(held.is_cancelled());
/// assert_eq!(held.id(), 7);
/// ```
#[derive(Debug, Clone)]
pub struct TimerToken {
    id: TimerId,
    cancelled: Arc<AtomicBool>,
}

impl TimerToken {
    /// Create a live token for the given timer
    pub fn new(id: TimerId) -> Self {
        Self { id, cancelled: Arc::new(AtomicBool::new(false)) }
    }

    pub fn id(&self) -> TimerId {
        self.id
    }

    /// Cancel the timer
    ///
    /// Idempotent. All clones observe the cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl PartialEq for TimerToken {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TimerToken {}
