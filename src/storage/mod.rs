//! SQLite persistence for expenses and recurrence rules
//!
//! Store methods run on the shared pool. The `*_with` functions take any
//! [`sqlx::SqliteExecutor`] so the recurrence engine and snapshot restore can
//! run several statements inside one transaction.

pub mod expenses;
pub mod recurring;
pub mod schema;

pub use expenses::ExpenseStore;
pub use recurring::RecurringStore;
pub use schema::{Database, ensure_schema};
