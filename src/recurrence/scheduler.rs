//! Daily timer that drives the apply-pass

use super::engine::RecurrenceEngine;
use crate::core::time::today_utc;
use chrono::{DateTime, Days, NaiveTime, TimeZone, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Fires [`RecurrenceEngine::run_apply_pass`] once a day at `run_at` (UTC)
#[derive(Debug, Clone)]
pub struct Scheduler {
    engine: Arc<RecurrenceEngine>,
    run_at: NaiveTime,
    run_on_startup: bool,
}

/// Handle to the spawned timer task
#[derive(Debug)]
pub struct SchedulerHandle {
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop the timer; an apply-pass in flight is dropped before commit
    pub fn shutdown(self) {
        self.task.abort();
        tracing::info!("scheduler stopped");
    }
}

impl Scheduler {
    pub fn new(engine: Arc<RecurrenceEngine>, run_at: NaiveTime) -> Self {
        Self {
            engine,
            run_at,
            run_on_startup: false,
        }
    }

    /// Also run one pass immediately after spawning
    pub fn with_run_on_startup(mut self, enabled: bool) -> Self {
        self.run_on_startup = enabled;
        self
    }

    /// Start the timer on the current tokio runtime
    pub fn spawn(self) -> SchedulerHandle {
        tracing::info!(run_at = %self.run_at, "scheduler started");
        let task = tokio::spawn(async move {
            if self.run_on_startup {
                let applied = self.engine.run_apply_pass(today_utc()).await;
                tracing::info!(applied, "startup apply-pass complete");
            }

            loop {
                let now = Utc::now();
                let next = next_run_after(now, self.run_at);
                let wait = (next - now).to_std().unwrap_or_default();
                tracing::debug!(next_run = %next, "scheduler sleeping");
                tokio::time::sleep(wait).await;

                let applied = self.engine.run_apply_pass(next.date_naive()).await;
                tracing::info!(applied, "scheduled apply-pass complete");
            }
        });
        SchedulerHandle { task }
    }
}

/// Next instant strictly after `now` whose UTC time of day is `run_at`
pub fn next_run_after(now: DateTime<Utc>, run_at: NaiveTime) -> DateTime<Utc> {
    let today = now.date_naive();
    let candidate = Utc.from_utc_datetime(&today.and_time(run_at));
    if candidate > now {
        return candidate;
    }
    let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(today);
    Utc.from_utc_datetime(&tomorrow.and_time(run_at))
}
