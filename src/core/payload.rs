//! Request payloads for the JSON API
//!
//! Each payload is deserialized through [`Validated`](super::validation::Validated)
//! and turned into a store-level value (`NewExpense`, `RuleDraft`) here, so
//! handlers never see raw JSON.

use super::error::ApiError;
use super::expense::{ExpenseFilter, NewExpense, Page};
use super::rule::{Frequency, RecurringRule, RuleDraft};
use super::time::current_month;
use super::validation::de;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use validator::Validate;

const DEFAULT_PER_PAGE: u32 = 20;

fn default_true() -> bool {
    true
}

/// Body of `POST /api/expenses` and `PUT /api/expenses/{id}`
///
/// Updates replace every field; `date` keeps its previous value when omitted.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ExpensePayload {
    #[serde(deserialize_with = "de::amount")]
    #[validate(custom(function = "crate::core::validation::validators::valid_amount"))]
    pub amount: f64,

    #[validate(custom(function = "crate::core::validation::validators::not_blank"))]
    pub category: String,

    #[validate(custom(function = "crate::core::validation::validators::not_blank"))]
    pub description: String,

    #[serde(default, deserialize_with = "de::opt_timestamp")]
    pub date: Option<DateTime<Utc>>,
}

impl ExpensePayload {
    /// Build the stored values, falling back to `default_date` when no date was sent
    pub fn into_new_expense(self, default_date: DateTime<Utc>) -> NewExpense {
        NewExpense {
            amount: self.amount,
            category: self.category,
            description: self.description,
            date: self.date.unwrap_or(default_date),
        }
    }
}

/// Body of `POST /api/recurring`
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RulePayload {
    #[serde(deserialize_with = "de::amount")]
    #[validate(custom(function = "crate::core::validation::validators::valid_amount"))]
    pub amount: f64,

    #[validate(custom(function = "crate::core::validation::validators::not_blank"))]
    pub category: String,

    #[validate(custom(function = "crate::core::validation::validators::not_blank"))]
    pub description: String,

    pub frequency: Frequency,

    #[serde(default)]
    pub day_of_month: Option<u32>,

    #[serde(default, deserialize_with = "de::opt_timestamp")]
    pub start_date: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "de::opt_timestamp")]
    pub end_date: Option<DateTime<Utc>>,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl RulePayload {
    /// Build a checked draft; `start_date` defaults to `now`
    pub fn into_draft(self, now: DateTime<Utc>) -> Result<RuleDraft, ApiError> {
        let draft = RuleDraft {
            amount: self.amount,
            category: self.category,
            description: self.description,
            frequency: self.frequency,
            day_of_month: self.day_of_month,
            start_date: self.start_date.unwrap_or(now),
            end_date: self.end_date,
            is_active: self.is_active,
        };
        check_draft(&draft)?;
        Ok(draft)
    }
}

/// Body of `PUT /api/recurring/{id}`: any subset of fields
///
/// `day_of_month` and `end_date` can be cleared by sending `null`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RulePatch {
    #[serde(default, deserialize_with = "de::opt_amount")]
    #[validate(custom(function = "crate::core::validation::validators::valid_amount"))]
    pub amount: Option<f64>,

    #[validate(custom(function = "crate::core::validation::validators::not_blank"))]
    pub category: Option<String>,

    #[validate(custom(function = "crate::core::validation::validators::not_blank"))]
    pub description: Option<String>,

    pub frequency: Option<Frequency>,

    #[serde(default, deserialize_with = "de::patch_nullable")]
    pub day_of_month: Option<Option<u32>>,

    #[serde(default, deserialize_with = "de::opt_timestamp")]
    pub start_date: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "de::patch_timestamp")]
    pub end_date: Option<Option<DateTime<Utc>>>,

    pub is_active: Option<bool>,
}

impl RulePatch {
    /// Merge onto the stored rule and re-check the result
    pub fn apply_to(self, rule: &RecurringRule) -> Result<RuleDraft, ApiError> {
        let mut draft = RuleDraft::from(rule);

        if let Some(amount) = self.amount {
            draft.amount = amount;
        }
        if let Some(category) = self.category {
            draft.category = category;
        }
        if let Some(description) = self.description {
            draft.description = description;
        }
        if let Some(frequency) = self.frequency {
            draft.frequency = frequency;
        }
        if let Some(day) = self.day_of_month {
            draft.day_of_month = day;
        }
        if let Some(start) = self.start_date {
            draft.start_date = start;
        }
        if let Some(end) = self.end_date {
            draft.end_date = end;
        }
        if let Some(active) = self.is_active {
            draft.is_active = active;
        }

        check_draft(&draft)?;
        Ok(draft)
    }
}

fn check_draft(draft: &RuleDraft) -> Result<(), ApiError> {
    draft.check_day().map_err(ApiError::Validation)?;
    if let Some(end) = draft.end_date {
        if end < draft.start_date {
            return Err(ApiError::validation("end_date must not be before start_date"));
        }
    }
    Ok(())
}

/// Query string of `GET /api/expenses`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ExpenseQueryParams {
    #[validate(range(min = 1, max = 12, message = "must be between 1 and 12"))]
    pub month: Option<u32>,

    #[validate(range(min = 1, max = 9999, message = "must be between 1 and 9999"))]
    pub year: Option<i32>,

    #[validate(range(min = 1, message = "must be at least 1"))]
    pub page: Option<u32>,

    #[validate(range(min = 1, message = "must be at least 1"))]
    pub per_page: Option<u32>,
}

impl ExpenseQueryParams {
    /// Resolve defaults: current UTC month, no pagination unless asked for
    pub fn into_filter(self) -> ExpenseFilter {
        let (current_year, current_month) = current_month();
        let page = match (self.page, self.per_page) {
            (None, None) => None,
            (page, per_page) => Some(Page {
                page: page.unwrap_or(1),
                per_page: per_page.unwrap_or(DEFAULT_PER_PAGE),
            }),
        };

        ExpenseFilter {
            year: self.year.unwrap_or(current_year),
            month: self.month.unwrap_or(current_month),
            page,
        }
    }
}
