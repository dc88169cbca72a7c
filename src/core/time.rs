//! Timestamp parsing and calendar helpers
//!
//! All timestamps are UTC. Incoming strings may be RFC 3339 (with `Z` or an
//! explicit offset), a naive ISO-8601 date-time, or a bare date.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// Parse an ISO-8601 timestamp as sent by clients
///
/// Accepted forms:
/// - `2024-03-01T10:30:00Z`, `2024-03-01T10:30:00+02:00`
/// - `2024-03-01T10:30:00` or `2024-03-01T10:30:00.123456` (taken as UTC)
/// - `2024-03-01` (midnight UTC)
///
/// The UTC year must be within 1..=9999: stored dates are compared and
/// grouped by month as fixed-width text.
pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    parse_any(input.trim()).filter(|dt| YEAR_RANGE.contains(&dt.year()))
}

const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1..=9999;

fn parse_any(input: &str) -> Option<DateTime<Utc>> {
    if input.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .map(start_of_day)
}

/// Midnight UTC at the start of `day`
pub fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN))
}

/// Half-open `[start, end)` range covering one calendar day
pub fn day_bounds(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let next = day.checked_add_days(Days::new(1)).unwrap_or(day);
    (start_of_day(day), start_of_day(next))
}

/// Half-open `[start, end)` range covering one calendar month
///
/// Returns `None` when `month` is outside 1..=12 or the year is out of range.
pub fn month_bounds(year: i32, month: u32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((start_of_day(first), start_of_day(next)))
}

/// Today's date in UTC
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// `(year, month)` of the current UTC date
pub fn current_month() -> (i32, u32) {
    let today = today_utc();
    (today.year(), today.month())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_z_suffix_matches_offset() {
        let z = parse_timestamp("2024-03-01T10:30:00Z").unwrap();
        let offset = parse_timestamp("2024-03-01T10:30:00+00:00").unwrap();
        assert_eq!(z, offset);
    }

    #[test]
    fn test_parse_converts_offset_to_utc() {
        let dt = parse_timestamp("2024-03-01T01:00:00+02:00").unwrap();
        assert_eq!(dt.day(), 29);
        assert_eq!(dt.month(), 2);
        assert_eq!(dt.hour(), 23);
    }

    #[test]
    fn test_parse_naive_and_date_only() {
        let naive = parse_timestamp("2024-03-01T10:30:00.250").unwrap();
        assert_eq!(naive.hour(), 10);

        let date = parse_timestamp("2024-03-01").unwrap();
        assert_eq!(date, start_of_day(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("next tuesday").is_none());
        assert!(parse_timestamp("2024-13-01").is_none());
    }

    #[test]
    fn test_parse_rejects_years_outside_four_digits() {
        assert!(parse_timestamp("+12345-01-01T00:00:00").is_none());
        assert!(parse_timestamp("-0001-06-01").is_none());
        assert!(parse_timestamp("0000-01-01T00:00:00Z").is_none());
        assert!(parse_timestamp("9999-12-31T23:00:00-02:00").is_none());

        assert_eq!(parse_timestamp("0001-01-01").unwrap().year(), 1);
        assert_eq!(parse_timestamp("9999-12-31T23:59:59Z").unwrap().year(), 9999);
    }

    #[test]
    fn test_month_bounds_wraps_year() {
        let (start, end) = month_bounds(2024, 12).unwrap();
        assert_eq!(start.to_rfc3339(), "2024-12-01T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2025-01-01T00:00:00+00:00");
        assert!(month_bounds(2024, 13).is_none());
        assert!(month_bounds(2024, 0).is_none());
    }

    #[test]
    fn test_day_bounds() {
        let day = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let (start, end) = day_bounds(day);
        assert_eq!(end - start, chrono::Duration::days(1));
        assert_eq!(end.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }
}
