//! Flipbook Scheduler Library
//!
//! Single-threaded timers with cancellable tokens.
//!
//! The viewer runs on a UI event loop, so nothing here spawns threads. Timers
//! are scheduled against explicit [`Instant`](std::time::Instant)s and fire
//! when the owner calls [`TimerQueue::poll`]. Every scheduled timer hands back
//! a [`TimerToken`]; cancelling the token suppresses the timer even if its
//! deadline has already passed.
//!
//! # Example
//!
//! ```
//! use flipbook_scheduler::{Debouncer, TimerQueue};
//! use std::time::{Duration, Instant};
//!
//! let mut queue = TimerQueue::new();
//! let mut debouncer = Debouncer::new(Duration::from_millis(100));
//! let start = Instant::now();
//!
//! // A burst of events collapses into the last one.
//! for offset in 0..5 {
//!     debouncer.schedule(&mut queue, start + Duration::from_millis(offset * 10), offset);
//! }
//!
//! assert!(queue.poll(start + Duration::from_millis(100)).is_empty());
//! assert_eq!(queue.poll(start + Duration::from_millis(140)), vec![4]);
//! ```

mod cancel;
mod debounce;
mod timer;

pub use cancel::{TimerId, TimerToken};
pub use debounce::{Debounced, Debouncer};
pub use timer::TimerQueue;
