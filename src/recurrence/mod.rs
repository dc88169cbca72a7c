//! Recurrence engine
//!
//! Turns recurring rules into expenses. [`due`] holds the pure per-rule
//! decisions, [`engine`] the transactional apply-pass and its read-only
//! preview, [`scheduler`] the daily timer.

pub mod due;
pub mod engine;
pub mod scheduler;

pub use due::{is_due_today, is_eligible, should_apply};
pub use engine::{ApplyReport, RecurrenceEngine};
pub use scheduler::{Scheduler, SchedulerHandle, next_run_after};
