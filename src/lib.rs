//! # Expense Tracker
//!
//! A personal expense tracker: a JSON API over a SQLite database, with
//! recurring expense rules that are turned into real expenses once a day.
//!
//! ## Layout
//!
//! - [`core`]: domain types, request payloads, validation and errors
//! - [`storage`]: SQLite stores for expenses and recurring rules
//! - [`recurrence`]: due-date logic, the transactional apply-pass and the daily timer
//! - [`backup`]: CSV snapshots of the expense table
//! - [`server`]: axum router, handlers and the [`ServerBuilder`](server::ServerBuilder)
//! - [`config`]: YAML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use expense_tracker::prelude::*;
//!
//! let config = AppConfig::load(None)?;
//! ServerBuilder::new(config).serve().await?;
//! ```

pub mod backup;
pub mod config;
pub mod core;
pub mod recurrence;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types
pub mod prelude {
    // === Domain ===
    pub use crate::core::{
        ApiError, Expense, ExpenseFilter, ExpensePage, Frequency, MonthKey, NewExpense, Page,
        RecurringRule, RuleDraft, Schedule,
    };

    // === Services ===
    pub use crate::backup::{BackupService, SnapshotInfo};
    pub use crate::recurrence::{ApplyReport, RecurrenceEngine, Scheduler, SchedulerHandle};
    pub use crate::storage::{Database, ExpenseStore, RecurringStore};

    // === Config ===
    pub use crate::config::AppConfig;

    // === Server ===
    pub use crate::server::{AppContext, ServerBuilder, build_router};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use chrono::{DateTime, NaiveDate, Utc};
}
