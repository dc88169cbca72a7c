//! Expense store backed by the `expenses` table

use crate::core::time::month_bounds;
use crate::core::{Expense, ExpenseFilter, ExpensePage, MonthKey, NewExpense, StorageError};
use chrono::{DateTime, Utc};
use sqlx::{SqliteExecutor, SqlitePool};

const EXPENSE_COLUMNS: &str = "id, amount, category, description, date";

/// CRUD and month queries over finalized expenses
#[derive(Clone, Debug)]
pub struct ExpenseStore {
    pool: SqlitePool,
}

impl ExpenseStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn create(&self, new: &NewExpense) -> Result<Expense, StorageError> {
        insert_with(&self.pool, new).await
    }

    pub async fn get(&self, id: i64) -> Result<Option<Expense>, StorageError> {
        let sql = format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = ?");
        let expense = sqlx::query_as::<_, Expense>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(expense)
    }

    /// Replace every field of an expense; `None` when the id is unknown
    pub async fn update(&self, id: i64, new: &NewExpense) -> Result<Option<Expense>, StorageError> {
        let sql = format!(
            "UPDATE expenses SET amount = ?, category = ?, description = ?, date = ?
             WHERE id = ? RETURNING {EXPENSE_COLUMNS}"
        );
        let expense = sqlx::query_as::<_, Expense>(&sql)
            .bind(new.amount)
            .bind(&new.category)
            .bind(&new.description)
            .bind(new.date)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(expense)
    }

    /// Returns whether a row was removed
    pub async fn delete(&self, id: i64) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Expenses of one calendar month, newest first, with the full match count
    ///
    /// Equal dates are ordered by id descending so pages are stable.
    pub async fn query(&self, filter: &ExpenseFilter) -> Result<ExpensePage, StorageError> {
        let Some((from, to)) = month_bounds(filter.year, filter.month) else {
            return Ok(ExpensePage {
                expenses: Vec::new(),
                total: 0,
            });
        };

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM expenses WHERE date >= ? AND date < ?")
                .bind(from)
                .bind(to)
                .fetch_one(&self.pool)
                .await?;

        let sql = format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE date >= ? AND date < ?
             ORDER BY date DESC, id DESC LIMIT ? OFFSET ?"
        );
        // SQLite treats a negative LIMIT as unbounded
        let (limit, offset) = filter
            .page
            .map(|page| (page.limit(), page.offset()))
            .unwrap_or((-1, 0));

        let expenses = sqlx::query_as::<_, Expense>(&sql)
            .bind(from)
            .bind(to)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(ExpensePage { expenses, total })
    }

    /// Distinct `(year, month)` pairs that have expenses, ascending
    pub async fn months(&self) -> Result<Vec<MonthKey>, StorageError> {
        let rows: Vec<(i64, i64)> = sqlx::query_as(
            "SELECT DISTINCT CAST(substr(date, 1, 4) AS INTEGER) AS year,
                             CAST(substr(date, 6, 2) AS INTEGER) AS month
             FROM expenses ORDER BY year ASC, month ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(year, month)| {
                let key = i32::try_from(year)
                    .ok()
                    .zip(u32::try_from(month).ok())
                    .map(|(year, month)| MonthKey { year, month });
                key.ok_or_else(|| StorageError::CorruptRow {
                    table: "expenses",
                    id: 0,
                    message: format!("unreadable month {year}-{month}"),
                })
            })
            .collect()
    }

    /// Every expense, newest first
    pub async fn all_by_date_desc(&self) -> Result<Vec<Expense>, StorageError> {
        let sql = format!("SELECT {EXPENSE_COLUMNS} FROM expenses ORDER BY date DESC, id DESC");
        let expenses = sqlx::query_as::<_, Expense>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(expenses)
    }
}

/// Insert an expense on any executor (pool, connection or open transaction)
pub async fn insert_with<'e, E>(executor: E, new: &NewExpense) -> Result<Expense, StorageError>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!(
        "INSERT INTO expenses (amount, category, description, date)
         VALUES (?, ?, ?, ?) RETURNING {EXPENSE_COLUMNS}"
    );
    let expense = sqlx::query_as::<_, Expense>(&sql)
        .bind(new.amount)
        .bind(&new.category)
        .bind(&new.description)
        .bind(new.date)
        .fetch_one(executor)
        .await?;
    Ok(expense)
}

/// Whether an expense with these field values is dated within `[from, to)`
pub async fn exists_on_day_with<'e, E>(
    executor: E,
    amount: f64,
    category: &str,
    description: &str,
    (from, to): (DateTime<Utc>, DateTime<Utc>),
) -> Result<bool, StorageError>
where
    E: SqliteExecutor<'e>,
{
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM expenses
         WHERE amount = ? AND category = ? AND description = ? AND date >= ? AND date < ?",
    )
    .bind(amount)
    .bind(category)
    .bind(description)
    .bind(from)
    .bind(to)
    .fetch_one(executor)
    .await?;
    Ok(count > 0)
}

/// Remove every expense; used when restoring a snapshot
pub async fn delete_all_with<'e, E>(executor: E) -> Result<u64, StorageError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM expenses").execute(executor).await?;
    Ok(result.rows_affected())
}
