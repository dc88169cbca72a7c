//! Lenient field deserializers for request payloads
//!
//! Clients send amounts either as JSON numbers or numeric strings, and
//! timestamps in several ISO-8601 shapes. Partial updates need to tell an
//! absent field (`None`) apart from an explicit `null` (`Some(None)`).

use crate::core::time::parse_timestamp;
use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Number or numeric string
pub fn amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| D::Error::custom("amount must be a number")),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| D::Error::custom(format!("amount must be a number, got '{s}'"))),
        _ => Err(D::Error::custom("amount must be a number")),
    }
}

/// Optional amount for partial updates; `null` is rejected
pub fn opt_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    amount(deserializer).map(Some)
}

/// Required ISO-8601 timestamp
pub fn timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| D::Error::custom(format!("invalid date '{raw}'")))
}

/// Optional timestamp; `null` means absent
pub fn opt_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid date '{raw}'"))),
    }
}

/// Timestamp in a partial update: absent, cleared with `null`, or set
///
/// Use together with `#[serde(default)]` so an absent field stays `None`.
pub fn patch_timestamp<'de, D>(deserializer: D) -> Result<Option<Option<DateTime<Utc>>>, D::Error>
where
    D: Deserializer<'de>,
{
    opt_timestamp(deserializer).map(Some)
}

/// Nullable value in a partial update: absent, cleared with `null`, or set
pub fn patch_nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(deserialize_with = "amount")]
        amount: f64,
        #[serde(default, deserialize_with = "opt_timestamp")]
        date: Option<DateTime<Utc>>,
        #[serde(default, deserialize_with = "patch_nullable")]
        day: Option<Option<u32>>,
    }

    #[test]
    fn test_amount_accepts_number_and_string() {
        let probe: Probe = serde_json::from_value(json!({"amount": 12.5})).unwrap();
        assert_eq!(probe.amount, 12.5);
        let probe: Probe = serde_json::from_value(json!({"amount": "7.25"})).unwrap();
        assert_eq!(probe.amount, 7.25);
    }

    #[test]
    fn test_amount_rejects_non_numeric() {
        assert!(serde_json::from_value::<Probe>(json!({"amount": "invalid"})).is_err());
        assert!(serde_json::from_value::<Probe>(json!({"amount": null})).is_err());
        assert!(serde_json::from_value::<Probe>(json!({"amount": true})).is_err());
    }

    #[test]
    fn test_opt_timestamp() {
        let probe: Probe = serde_json::from_value(json!({"amount": 1, "date": null})).unwrap();
        assert!(probe.date.is_none());

        let probe: Probe =
            serde_json::from_value(json!({"amount": 1, "date": "2024-03-01T00:00:00Z"})).unwrap();
        assert!(probe.date.is_some());

        let err = serde_json::from_value::<Probe>(json!({"amount": 1, "date": "yesterday"}));
        assert!(err.unwrap_err().to_string().contains("invalid date"));
    }

    #[test]
    fn test_patch_nullable_distinguishes_null_from_absent() {
        let absent: Probe = serde_json::from_value(json!({"amount": 1})).unwrap();
        assert_eq!(absent.day, None);

        let cleared: Probe = serde_json::from_value(json!({"amount": 1, "day": null})).unwrap();
        assert_eq!(cleared.day, Some(None));

        let set: Probe = serde_json::from_value(json!({"amount": 1, "day": 5})).unwrap();
        assert_eq!(set.day, Some(Some(5)));
    }
}
