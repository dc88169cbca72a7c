//! Expense records and their query shapes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single finalized expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Expense {
    pub id: i64,
    pub amount: f64,
    pub category: String,
    pub description: String,
    pub date: DateTime<Utc>,
}

/// Field values for a new or fully replaced expense
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub amount: f64,
    pub category: String,
    pub description: String,
    pub date: DateTime<Utc>,
}

impl NewExpense {
    pub fn new(
        amount: f64,
        category: impl Into<String>,
        description: impl Into<String>,
        date: DateTime<Utc>,
    ) -> Self {
        Self {
            amount,
            category: category.into(),
            description: description.into(),
            date,
        }
    }
}

/// Offset/limit pagination, 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub per_page: u32,
}

impl Page {
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.per_page)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }
}

/// Month filter with optional pagination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpenseFilter {
    pub year: i32,
    pub month: u32,
    pub page: Option<Page>,
}

/// One page of expenses plus the size of the whole filtered set
#[derive(Debug, Clone, PartialEq)]
pub struct ExpensePage {
    pub expenses: Vec<Expense>,
    /// Full filtered count, independent of the page size
    pub total: i64,
}

/// A `(year, month)` pair that has at least one expense
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}
