//! Application context shared by every handler

use crate::backup::BackupService;
use crate::recurrence::RecurrenceEngine;
use crate::storage::{Database, ExpenseStore, RecurringStore};
use std::path::PathBuf;
use std::sync::Arc;

/// Handles to the stores and services, cloned into each request
///
/// Built once at startup and passed to the router and the scheduler; there
/// is no global state.
#[derive(Clone, Debug)]
pub struct AppContext {
    pub expenses: ExpenseStore,
    pub rules: RecurringStore,
    pub engine: Arc<RecurrenceEngine>,
    pub backup: BackupService,
}

impl AppContext {
    pub fn new(db: &Database, exports_dir: impl Into<PathBuf>) -> Self {
        let pool = db.pool().clone();
        let expenses = ExpenseStore::new(pool.clone());
        Self {
            rules: RecurringStore::new(pool.clone()),
            engine: Arc::new(RecurrenceEngine::new(pool)),
            backup: BackupService::new(exports_dir, expenses.clone()),
            expenses,
        }
    }
}
