//! A single-task scheduler for timers.
//!
//! Entries are one-shot, periodic or daily. One background task sleeps until
//! the earliest entry is due and runs its callback; adding or removing
//! entries wakes it up to reconsider.

pub mod clock;
pub mod entry;
pub mod error;
pub mod scheduler;

pub use clock::{BoxFuture, Clock, SystemClock};
pub use entry::{round_to_next_second, Callback, Entry, Schedule};
pub use error::SchedulerError;
pub use scheduler::Scheduler;
