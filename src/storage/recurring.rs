//! Recurring rule store backed by the `recurring_expenses` table

use crate::core::{Frequency, RecurringRule, RuleDraft, StorageError};
use chrono::{DateTime, Utc};
use sqlx::{SqliteExecutor, SqlitePool};

const RULE_COLUMNS: &str = "id, amount, category, description, frequency, day_of_month, \
     start_date, end_date, is_active, last_applied_date, created_at";

/// Raw row as stored; converted into [`RecurringRule`] after checking the
/// columns SQLite cannot type for us
#[derive(Debug, sqlx::FromRow)]
struct RuleRow {
    id: i64,
    amount: f64,
    category: String,
    description: String,
    frequency: String,
    day_of_month: Option<i64>,
    start_date: DateTime<Utc>,
    end_date: Option<DateTime<Utc>>,
    is_active: bool,
    last_applied_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<RuleRow> for RecurringRule {
    type Error = StorageError;

    fn try_from(row: RuleRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt = |message: String| StorageError::CorruptRow {
            table: "recurring_expenses",
            id,
            message,
        };

        let frequency: Frequency = row.frequency.parse().map_err(|e| corrupt(format!("{e}")))?;
        let day_of_month = row
            .day_of_month
            .map(|day| u32::try_from(day).map_err(|_| corrupt(format!("invalid day_of_month {day}"))))
            .transpose()?;

        Ok(RecurringRule {
            id,
            amount: row.amount,
            category: row.category,
            description: row.description,
            frequency,
            day_of_month,
            start_date: row.start_date,
            end_date: row.end_date,
            is_active: row.is_active,
            last_applied_date: row.last_applied_date,
            created_at: row.created_at,
        })
    }
}

fn into_rules(rows: Vec<RuleRow>) -> Result<Vec<RecurringRule>, StorageError> {
    rows.into_iter().map(RecurringRule::try_from).collect()
}

/// CRUD over recurrence rules
#[derive(Clone, Debug)]
pub struct RecurringStore {
    pool: SqlitePool,
}

impl RecurringStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert a rule; `last_applied_date` starts empty and `created_at` is now
    pub async fn create(&self, draft: &RuleDraft) -> Result<RecurringRule, StorageError> {
        let sql = format!(
            "INSERT INTO recurring_expenses
                (amount, category, description, frequency, day_of_month,
                 start_date, end_date, is_active, last_applied_date, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, NULL, ?)
             RETURNING {RULE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, RuleRow>(&sql)
            .bind(draft.amount)
            .bind(&draft.category)
            .bind(&draft.description)
            .bind(draft.frequency.as_str())
            .bind(draft.day_of_month.map(i64::from))
            .bind(draft.start_date)
            .bind(draft.end_date)
            .bind(draft.is_active)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;
        row.try_into()
    }

    pub async fn get(&self, id: i64) -> Result<Option<RecurringRule>, StorageError> {
        let sql = format!("SELECT {RULE_COLUMNS} FROM recurring_expenses WHERE id = ?");
        sqlx::query_as::<_, RuleRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(RecurringRule::try_from)
            .transpose()
    }

    /// All rules, oldest first
    pub async fn list(&self) -> Result<Vec<RecurringRule>, StorageError> {
        let sql = format!("SELECT {RULE_COLUMNS} FROM recurring_expenses ORDER BY id ASC");
        let rows = sqlx::query_as::<_, RuleRow>(&sql).fetch_all(&self.pool).await?;
        into_rules(rows)
    }

    /// Active rules, oldest first
    pub async fn list_active(&self) -> Result<Vec<RecurringRule>, StorageError> {
        list_active_with(&self.pool).await
    }

    /// Overwrite the editable fields; `None` when the id is unknown
    ///
    /// `last_applied_date` and `created_at` are left untouched.
    pub async fn update(
        &self,
        id: i64,
        draft: &RuleDraft,
    ) -> Result<Option<RecurringRule>, StorageError> {
        let sql = format!(
            "UPDATE recurring_expenses
             SET amount = ?, category = ?, description = ?, frequency = ?, day_of_month = ?,
                 start_date = ?, end_date = ?, is_active = ?
             WHERE id = ?
             RETURNING {RULE_COLUMNS}"
        );
        sqlx::query_as::<_, RuleRow>(&sql)
            .bind(draft.amount)
            .bind(&draft.category)
            .bind(&draft.description)
            .bind(draft.frequency.as_str())
            .bind(draft.day_of_month.map(i64::from))
            .bind(draft.start_date)
            .bind(draft.end_date)
            .bind(draft.is_active)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(RecurringRule::try_from)
            .transpose()
    }

    /// Returns whether a row was removed; generated expenses are kept
    pub async fn delete(&self, id: i64) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM recurring_expenses WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Active rules on any executor
pub async fn list_active_with<'e, E>(executor: E) -> Result<Vec<RecurringRule>, StorageError>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!(
        "SELECT {RULE_COLUMNS} FROM recurring_expenses WHERE is_active = 1 ORDER BY id ASC"
    );
    let rows = sqlx::query_as::<_, RuleRow>(&sql).fetch_all(executor).await?;
    into_rules(rows)
}

/// Record that a rule fired at `applied_at`
pub async fn mark_applied_with<'e, E>(
    executor: E,
    id: i64,
    applied_at: DateTime<Utc>,
) -> Result<(), StorageError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("UPDATE recurring_expenses SET last_applied_date = ? WHERE id = ?")
        .bind(applied_at)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}
