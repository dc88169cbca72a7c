//! Payload filters
//!
//! These transform raw JSON before it is deserialized.

use serde_json::Value;

/// Trim whitespace from every top-level string field
pub fn trim_strings(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, trim(value)))
                .collect(),
        ),
        other => other,
    }
}

fn trim(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.trim().to_string()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_trim_strings_only_touches_strings() {
        let filtered = trim_strings(json!({
            "category": "  super ",
            "amount": 12.5,
            "day_of_month": null,
        }));
        assert_eq!(filtered["category"], "super");
        assert_eq!(filtered["amount"], 12.5);
        assert!(filtered["day_of_month"].is_null());
    }
}
