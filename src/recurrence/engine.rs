//! Apply-pass and preview over the stored rules

use super::due::should_apply;
use crate::core::time::{day_bounds, start_of_day, today_utc};
use crate::core::{EngineError, NewExpense, RecurringRule};
use crate::storage::expenses::{exists_on_day_with, insert_with};
use crate::storage::recurring::{list_active_with, mark_applied_with};
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::SqlitePool;
use tokio::sync::Mutex;

/// Outcome of a successful apply-pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    /// Number of expenses created
    pub applied: usize,
    /// Ids of the created expenses, in rule order
    pub expense_ids: Vec<i64>,
}

/// Materializes due rules into expenses
///
/// Every apply-pass runs behind one async mutex and inside one transaction,
/// so the daily timer and the manual HTTP trigger can race without ever
/// creating the same expense twice. A failure anywhere rolls the whole pass
/// back.
///
/// The mutex only covers passes in this process. The transaction is opened
/// with `BEGIN IMMEDIATE`, so a pass from another process on the same
/// database file (the `apply` command next to a running server) waits for
/// the write lock up to the SQLite busy timeout, then sees the rows the first
/// pass committed and skips them.
#[derive(Debug)]
pub struct RecurrenceEngine {
    pool: SqlitePool,
    gate: Mutex<()>,
}

impl RecurrenceEngine {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            gate: Mutex::new(()),
        }
    }

    /// Create one expense dated `today` for every eligible, due rule
    ///
    /// Rules whose template already has an expense dated `today` are skipped
    /// and keep their `last_applied_date`.
    pub async fn apply_due(&self, today: NaiveDate) -> Result<ApplyReport, EngineError> {
        let _pass = self.gate.lock().await;

        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;
        let rules = list_active_with(&mut *tx).await?;
        let applied_at = start_of_day(today);
        let bounds = day_bounds(today);

        let mut report = ApplyReport::default();
        for rule in rules.iter().filter(|rule| should_apply(rule, today)) {
            let duplicate = exists_on_day_with(
                &mut *tx,
                rule.amount,
                &rule.category,
                &rule.description,
                bounds,
            )
            .await?;
            if duplicate {
                tracing::debug!(rule_id = rule.id, %today, "expense already present, skipping");
                continue;
            }

            let expense = insert_with(
                &mut *tx,
                &NewExpense::new(rule.amount, &rule.category, &rule.description, applied_at),
            )
            .await?;
            mark_applied_with(&mut *tx, rule.id, applied_at).await?;

            tracing::info!(
                rule_id = rule.id,
                expense_id = expense.id,
                amount = rule.amount,
                category = %rule.category,
                "applied recurring expense"
            );
            report.expense_ids.push(expense.id);
        }

        tx.commit().await?;
        report.applied = report.expense_ids.len();

        tracing::info!(applied = report.applied, %today, "apply-pass finished");
        Ok(report)
    }

    /// Rules that [`apply_due`](Self::apply_due) would apply on `today`, without writing
    ///
    /// A rule whose template matches one already accepted earlier in the
    /// list is left out, as the apply-pass would find that expense in its
    /// own transaction.
    pub async fn preview_pending(&self, today: NaiveDate) -> Result<Vec<RecurringRule>, EngineError> {
        let rules = list_active_with(&self.pool).await?;
        let bounds = day_bounds(today);

        let mut pending: Vec<RecurringRule> = Vec::new();
        for rule in rules.into_iter().filter(|rule| should_apply(rule, today)) {
            let accepted = pending
                .iter()
                .any(|p| p.matches_template(rule.amount, &rule.category, &rule.description));
            if accepted {
                continue;
            }
            let duplicate = exists_on_day_with(
                &self.pool,
                rule.amount,
                &rule.category,
                &rule.description,
                bounds,
            )
            .await?;
            if !duplicate {
                pending.push(rule);
            }
        }
        Ok(pending)
    }

    pub async fn apply_due_now(&self) -> Result<ApplyReport, EngineError> {
        self.apply_due(today_utc()).await
    }

    pub async fn preview_pending_now(&self) -> Result<Vec<RecurringRule>, EngineError> {
        self.preview_pending(today_utc()).await
    }

    /// Apply-pass for the timer and the HTTP trigger
    ///
    /// Never fails: errors are logged and reported as zero applied.
    pub async fn run_apply_pass(&self, today: NaiveDate) -> usize {
        match self.apply_due(today).await {
            Ok(report) => report.applied,
            Err(e) => {
                tracing::error!(error = %e, %today, "apply-pass failed, rolled back");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::parse_timestamp;
    use crate::core::{Frequency, RuleDraft};
    use crate::storage::{Database, ExpenseStore, RecurringStore};
    use chrono::{Datelike, Duration};
    use std::sync::Arc;

    struct Fixture {
        engine: Arc<RecurrenceEngine>,
        expenses: ExpenseStore,
        rules: RecurringStore,
    }

    async fn fixture() -> Fixture {
        let db = Database::in_memory().await.unwrap();
        Fixture {
            engine: Arc::new(RecurrenceEngine::new(db.pool().clone())),
            expenses: ExpenseStore::new(db.pool().clone()),
            rules: RecurringStore::new(db.pool().clone()),
        }
    }

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    fn rent(today: NaiveDate) -> RuleDraft {
        RuleDraft {
            amount: 100.0,
            category: "super".to_string(),
            description: "Rent".to_string(),
            frequency: Frequency::Monthly,
            day_of_month: Some(today.day()),
            start_date: start_of_day(today) - Duration::days(30),
            end_date: None,
            is_active: true,
        }
    }

    async fn expenses_on(fx: &Fixture, day: NaiveDate) -> Vec<crate::core::Expense> {
        let (from, to) = day_bounds(day);
        fx.expenses
            .all_by_date_desc()
            .await
            .unwrap()
            .into_iter()
            .filter(|e| e.date >= from && e.date < to)
            .collect()
    }

    #[tokio::test]
    async fn test_apply_creates_expense_and_marks_rule() {
        let fx = fixture().await;
        let today = date("2024-03-15");
        let rule = fx.rules.create(&rent(today)).await.unwrap();

        let report = fx.engine.apply_due(today).await.unwrap();
        assert_eq!(report.applied, 1);

        let created = expenses_on(&fx, today).await;
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].amount, 100.0);
        assert_eq!(created[0].category, "super");
        assert_eq!(created[0].description, "Rent");
        assert_eq!(created[0].date, start_of_day(today));
        assert_eq!(report.expense_ids, vec![created[0].id]);

        let rule = fx.rules.get(rule.id).await.unwrap().unwrap();
        assert_eq!(rule.last_applied_date, Some(start_of_day(today)));
    }

    #[tokio::test]
    async fn test_apply_is_idempotent_per_day() {
        let fx = fixture().await;
        let today = date("2024-03-15");
        fx.rules.create(&rent(today)).await.unwrap();

        assert_eq!(fx.engine.apply_due(today).await.unwrap().applied, 1);
        assert_eq!(fx.engine.apply_due(today).await.unwrap().applied, 0);
        assert_eq!(expenses_on(&fx, today).await.len(), 1);
    }

    #[tokio::test]
    async fn test_inactive_and_expired_rules_are_skipped() {
        let fx = fixture().await;
        let today = date("2024-03-15");

        let mut inactive = rent(today);
        inactive.is_active = false;
        fx.rules.create(&inactive).await.unwrap();

        let mut expired = rent(today);
        expired.description = "Old lease".to_string();
        expired.end_date = Some(start_of_day(today) - Duration::days(1));
        fx.rules.create(&expired).await.unwrap();

        assert_eq!(fx.engine.apply_due(today).await.unwrap().applied, 0);
        assert!(expenses_on(&fx, today).await.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_guard_skips_existing_expense() {
        let fx = fixture().await;
        let today = date("2024-03-15");
        let rule = fx.rules.create(&rent(today)).await.unwrap();
        fx.expenses
            .create(&NewExpense::new(
                100.0,
                "super",
                "Rent",
                parse_timestamp("2024-03-15T09:30:00Z").unwrap(),
            ))
            .await
            .unwrap();

        assert!(fx.engine.preview_pending(today).await.unwrap().is_empty());
        assert_eq!(fx.engine.apply_due(today).await.unwrap().applied, 0);

        let rule = fx.rules.get(rule.id).await.unwrap().unwrap();
        assert!(rule.last_applied_date.is_none());
    }

    #[tokio::test]
    async fn test_identical_templates_in_one_pass_apply_once() {
        let fx = fixture().await;
        let today = date("2024-03-15");
        let first = fx.rules.create(&rent(today)).await.unwrap();
        fx.rules.create(&rent(today)).await.unwrap();

        let pending = fx.engine.preview_pending(today).await.unwrap();
        assert_eq!(pending.iter().map(|r| r.id).collect::<Vec<_>>(), vec![first.id]);

        let report = fx.engine.apply_due(today).await.unwrap();
        assert_eq!(report.applied, 1);
        assert_eq!(report.applied, pending.len());
        assert_eq!(expenses_on(&fx, today).await.len(), 1);
    }

    #[tokio::test]
    async fn test_preview_matches_apply_and_does_not_write() {
        let fx = fixture().await;
        let today = date("2024-03-15");
        let due = fx.rules.create(&rent(today)).await.unwrap();

        let mut not_due = rent(today);
        not_due.description = "Insurance".to_string();
        not_due.day_of_month = Some(1);
        let not_due = fx.rules.create(&not_due).await.unwrap();
        mark_applied_with(fx.rules.pool(), not_due.id, start_of_day(date("2024-03-01")))
            .await
            .unwrap();

        let pending = fx.engine.preview_pending(today).await.unwrap();
        assert_eq!(pending.iter().map(|r| r.id).collect::<Vec<_>>(), vec![due.id]);
        assert!(expenses_on(&fx, today).await.is_empty());

        let report = fx.engine.apply_due(today).await.unwrap();
        assert_eq!(report.applied, pending.len());
    }

    #[tokio::test]
    async fn test_concurrent_passes_apply_once() {
        let fx = fixture().await;
        let today = date("2024-03-15");
        fx.rules.create(&rent(today)).await.unwrap();

        let (a, b) = tokio::join!(fx.engine.apply_due(today), fx.engine.apply_due(today));
        assert_eq!(a.unwrap().applied + b.unwrap().applied, 1);
        assert_eq!(expenses_on(&fx, today).await.len(), 1);
    }

    #[tokio::test]
    async fn test_passes_from_separate_pools_apply_once() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("expenses.db").display());
        let server = Database::connect(&url, 2).await.unwrap();
        let cli = Database::connect(&url, 2).await.unwrap();

        let today = date("2024-03-15");
        RecurringStore::new(server.pool().clone())
            .create(&rent(today))
            .await
            .unwrap();

        let a = RecurrenceEngine::new(server.pool().clone());
        let b = RecurrenceEngine::new(cli.pool().clone());
        let (a, b) = tokio::join!(a.apply_due(today), b.apply_due(today));
        assert_eq!(a.unwrap().applied + b.unwrap().applied, 1);

        let all = ExpenseStore::new(server.pool().clone())
            .all_by_date_desc()
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_pass_rolls_back_and_reports_zero() {
        let fx = fixture().await;
        let today = date("2024-03-15");
        fx.rules.create(&rent(today)).await.unwrap();

        sqlx::query("DROP TABLE expenses")
            .execute(fx.rules.pool())
            .await
            .unwrap();

        assert_eq!(fx.engine.run_apply_pass(today).await, 0);
        let rules = fx.rules.list().await.unwrap();
        assert!(rules[0].last_applied_date.is_none());
    }
}
