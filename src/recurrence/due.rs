//! Pure due-date and eligibility decisions
//!
//! Both functions only look at the rule and the calendar date they are
//! given, so they can be tested without a clock or a database.

use crate::core::time::start_of_day;
use crate::core::{RecurringRule, Schedule};
use chrono::{Datelike, Duration, NaiveDate};

/// Whether `rule` should produce an expense on `today`
///
/// - A rule that never fired is due.
/// - A rule without `day_of_month` fires once and is never due again.
/// - Monthly: day matches and the last fire was in another month.
/// - Weekly: ISO weekday matches and at least seven days passed since the
///   last fire (measured from today's midnight).
/// - Yearly: day and the start month match and the last fire was in another year.
pub fn is_due_today(rule: &RecurringRule, today: NaiveDate) -> bool {
    let Some(last) = rule.last_applied_date else {
        return true;
    };
    let Some(schedule) = rule.schedule() else {
        return false;
    };

    let last_day = last.date_naive();
    match schedule {
        Schedule::Monthly { day } => {
            today.day() == day && (last_day.month(), last_day.year()) != (today.month(), today.year())
        }
        Schedule::Weekly { iso_weekday } => {
            today.weekday().number_from_monday() == iso_weekday
                && start_of_day(today) - last >= Duration::days(7)
        }
        Schedule::Yearly { day } => {
            today.day() == day
                && today.month() == rule.start_date.month()
                && last_day.year() != today.year()
        }
    }
}

/// Whether `rule` may fire at all on `today`
///
/// Bounds are compared on calendar dates, so a rule that starts later today
/// or ends today is still eligible.
pub fn is_eligible(rule: &RecurringRule, today: NaiveDate) -> bool {
    rule.is_active
        && rule.start_date.date_naive() <= today
        && rule.end_date.is_none_or(|end| end.date_naive() >= today)
}

/// Eligible and due
pub fn should_apply(rule: &RecurringRule, today: NaiveDate) -> bool {
    is_eligible(rule, today) && is_due_today(rule, today)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Frequency;
    use crate::core::time::parse_timestamp;
    use chrono::{DateTime, Utc};

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    fn at(raw: &str) -> DateTime<Utc> {
        parse_timestamp(raw).unwrap()
    }

    fn rule(frequency: Frequency, day: Option<u32>) -> RecurringRule {
        RecurringRule {
            id: 1,
            amount: 50.0,
            category: "super".to_string(),
            description: "Gym".to_string(),
            frequency,
            day_of_month: day,
            start_date: at("2024-01-01T00:00:00Z"),
            end_date: None,
            is_active: true,
            last_applied_date: None,
            created_at: at("2024-01-01T00:00:00Z"),
        }
    }

    #[test]
    fn test_never_applied_is_due() {
        for freq in [Frequency::Monthly, Frequency::Weekly, Frequency::Yearly] {
            assert!(is_due_today(&rule(freq, Some(15)), date("2024-03-03")));
            assert!(is_due_today(&rule(freq, None), date("2024-03-03")));
        }
    }

    #[test]
    fn test_missing_day_fires_only_once() {
        let mut r = rule(Frequency::Monthly, None);
        r.last_applied_date = Some(at("2023-01-01T00:00:00Z"));
        assert!(!is_due_today(&r, date("2024-03-01")));
    }

    #[test]
    fn test_monthly() {
        let mut r = rule(Frequency::Monthly, Some(15));
        r.last_applied_date = Some(at("2024-02-15T00:00:00Z"));

        assert!(is_due_today(&r, date("2024-03-15")));
        assert!(!is_due_today(&r, date("2024-03-14")));
        assert!(!is_due_today(&r, date("2024-02-15")));

        // same month number in a later year is due again
        r.last_applied_date = Some(at("2023-03-15T00:00:00Z"));
        assert!(is_due_today(&r, date("2024-03-15")));
    }

    #[test]
    fn test_monthly_day_31_skips_short_months() {
        let mut r = rule(Frequency::Monthly, Some(31));
        r.last_applied_date = Some(at("2024-01-31T00:00:00Z"));

        let mut day = date("2024-02-01");
        while day <= date("2024-02-29") {
            assert!(!is_due_today(&r, day), "{day} should not be due");
            day = day.succ_opt().unwrap();
        }
        assert!(is_due_today(&r, date("2024-03-31")));
    }

    #[test]
    fn test_weekly() {
        // 2024-03-04 is a Monday
        let mut r = rule(Frequency::Weekly, Some(1));
        r.last_applied_date = Some(at("2024-02-26T00:00:00Z"));

        assert!(is_due_today(&r, date("2024-03-04")));
        assert!(!is_due_today(&r, date("2024-03-05")));

        r.last_applied_date = Some(at("2024-03-04T00:00:00Z"));
        assert!(!is_due_today(&r, date("2024-03-04")));
        assert!(is_due_today(&r, date("2024-03-11")));
    }

    #[test]
    fn test_weekly_needs_seven_full_days() {
        // last fire at noon a week ago: today's midnight is only 6.5 days later
        let mut r = rule(Frequency::Weekly, Some(1));
        r.last_applied_date = Some(at("2024-02-26T12:00:00Z"));
        assert!(!is_due_today(&r, date("2024-03-04")));
    }

    #[test]
    fn test_weekly_sunday_is_seven() {
        // 2024-03-10 is a Sunday
        let mut r = rule(Frequency::Weekly, Some(7));
        r.last_applied_date = Some(at("2024-03-03T00:00:00Z"));
        assert!(is_due_today(&r, date("2024-03-10")));
    }

    #[test]
    fn test_yearly_uses_start_month() {
        let mut r = rule(Frequency::Yearly, Some(1));
        r.start_date = at("2024-03-01T00:00:00Z");
        r.last_applied_date = Some(at("2024-03-01T00:00:00Z"));

        assert!(is_due_today(&r, date("2025-03-01")));
        assert!(!is_due_today(&r, date("2025-04-01")));
        assert!(!is_due_today(&r, date("2024-03-01")));
    }

    #[test]
    fn test_eligibility_bounds() {
        let mut r = rule(Frequency::Monthly, Some(1));
        r.start_date = at("2024-03-10T18:00:00Z");
        r.end_date = Some(at("2024-03-20T06:00:00Z"));

        assert!(!is_eligible(&r, date("2024-03-09")));
        assert!(is_eligible(&r, date("2024-03-10")));
        assert!(is_eligible(&r, date("2024-03-20")));
        assert!(!is_eligible(&r, date("2024-03-21")));

        r.is_active = false;
        assert!(!is_eligible(&r, date("2024-03-15")));
    }

    #[test]
    fn test_should_apply_combines_both() {
        let mut r = rule(Frequency::Monthly, Some(15));
        r.start_date = at("2025-01-01T00:00:00Z");
        assert!(is_due_today(&r, date("2024-03-15")));
        assert!(!should_apply(&r, date("2024-03-15")));
    }
}
