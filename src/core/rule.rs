//! Recurring expense rules
//!
//! A rule is a template that the recurrence engine copies into a new
//! [`Expense`](super::expense::Expense) whenever the rule falls due.
//!
//! The wire format keeps a single `day_of_month` field whose meaning depends
//! on `frequency`: day of month (1-31) for monthly and yearly rules, ISO
//! weekday (1 = Monday .. 7 = Sunday) for weekly rules. Internally the pair is
//! read through [`Schedule`] so the overload is resolved in one place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

/// How often a rule fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Monthly,
    Weekly,
    Yearly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Monthly => "monthly",
            Frequency::Weekly => "weekly",
            Frequency::Yearly => "yearly",
        }
    }

    /// Valid values of `day_of_month` for this frequency
    pub fn day_range(&self) -> RangeInclusive<u32> {
        match self {
            Frequency::Weekly => 1..=7,
            Frequency::Monthly | Frequency::Yearly => 1..=31,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown frequency name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown frequency '{0}' (expected monthly, weekly or yearly)")]
pub struct UnknownFrequency(pub String);

impl FromStr for Frequency {
    type Err = UnknownFrequency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(Frequency::Monthly),
            "weekly" => Ok(Frequency::Weekly),
            "yearly" => Ok(Frequency::Yearly),
            other => Err(UnknownFrequency(other.to_string())),
        }
    }
}

/// Resolved firing schedule of a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Fires on this day of every month
    Monthly { day: u32 },
    /// Fires on this ISO weekday (1 = Monday)
    Weekly { iso_weekday: u32 },
    /// Fires on this day of the rule's start month, once a year
    Yearly { day: u32 },
}

impl Schedule {
    /// Combine a frequency with the overloaded `day_of_month` field
    ///
    /// Returns `None` when no day is set; such a rule only ever fires once.
    pub fn from_parts(frequency: Frequency, day_of_month: Option<u32>) -> Option<Self> {
        let day = day_of_month?;
        Some(match frequency {
            Frequency::Monthly => Schedule::Monthly { day },
            Frequency::Weekly => Schedule::Weekly { iso_weekday: day },
            Frequency::Yearly => Schedule::Yearly { day },
        })
    }
}

/// A stored recurrence definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringRule {
    pub id: i64,
    pub amount: f64,
    pub category: String,
    pub description: String,
    pub frequency: Frequency,
    pub day_of_month: Option<u32>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub last_applied_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl RecurringRule {
    pub fn schedule(&self) -> Option<Schedule> {
        Schedule::from_parts(self.frequency, self.day_of_month)
    }

    /// Whether the generated expense template matches these field values
    pub fn matches_template(&self, amount: f64, category: &str, description: &str) -> bool {
        self.amount == amount && self.category == category && self.description == description
    }
}

/// Field values for a new or updated rule
///
/// `last_applied_date` and `created_at` are not part of this: the first is
/// owned by the recurrence engine, the second is set once by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleDraft {
    pub amount: f64,
    pub category: String,
    pub description: String,
    pub frequency: Frequency,
    pub day_of_month: Option<u32>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl RuleDraft {
    /// Check that `day_of_month` fits the frequency
    pub fn check_day(&self) -> Result<(), String> {
        match self.day_of_month {
            Some(day) if !self.frequency.day_range().contains(&day) => {
                let range = self.frequency.day_range();
                Err(format!(
                    "day_of_month must be between {} and {} for {} rules",
                    range.start(),
                    range.end(),
                    self.frequency
                ))
            }
            _ => Ok(()),
        }
    }
}

impl From<&RecurringRule> for RuleDraft {
    fn from(rule: &RecurringRule) -> Self {
        Self {
            amount: rule.amount,
            category: rule.category.clone(),
            description: rule.description.clone(),
            frequency: rule.frequency,
            day_of_month: rule.day_of_month,
            start_date: rule.start_date,
            end_date: rule.end_date,
            is_active: rule.is_active,
        }
    }
}
