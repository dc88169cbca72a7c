//! Core domain types shared by the stores, the recurrence engine and the HTTP layer

pub mod error;
pub mod expense;
pub mod payload;
pub mod rule;
pub mod time;
pub mod validation;

pub use error::{ApiError, BackupError, EngineError, ErrorResponse, StorageError};
pub use expense::{Expense, ExpenseFilter, ExpensePage, MonthKey, NewExpense, Page};
pub use payload::{ExpensePayload, ExpenseQueryParams, RulePatch, RulePayload};
pub use rule::{Frequency, RecurringRule, RuleDraft, Schedule, UnknownFrequency};
pub use validation::Validated;
