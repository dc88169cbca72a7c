//! Axum extractor for validated payloads
//!
//! This module provides the `Validated<T>` extractor that parses, filters and
//! validates request bodies before they reach handlers.

use super::filters;
use crate::core::error::ApiError;
use axum::{
    Json,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use validator::Validate;

/// Axum extractor that yields a typed, validated payload
///
/// Every failure is reported as [`ApiError::Validation`], so clients always
/// get a 400 with an `error` message.
///
/// # Usage
///
/// ```rust,ignore
/// pub async fn create_expense(
///     State(ctx): State<AppContext>,
///     Validated(payload): Validated<ExpensePayload>,
/// ) -> Result<(StatusCode, Json<Expense>), ApiError> {
///     // payload is already trimmed, typed and validated
/// }
/// ```
#[derive(Debug)]
pub struct Validated<T>(pub T);

impl<T> std::ops::Deref for Validated<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S, T> FromRequest<S> for Validated<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload): Json<Value> = Json::from_request(req, state)
            .await
            .map_err(|e| ApiError::validation(format!("Invalid JSON: {}", e.body_text())))?;

        parse_payload(payload).map(Validated)
    }
}

/// Filter, deserialize and validate a raw JSON payload
pub fn parse_payload<T>(payload: Value) -> Result<T, ApiError>
where
    T: DeserializeOwned + Validate,
{
    if !payload.is_object() {
        return Err(ApiError::validation("Request body must be a JSON object"));
    }

    let payload = filters::trim_strings(payload);
    let parsed: T = serde_json::from_value(payload).map_err(|e| ApiError::validation(e.to_string()))?;
    parsed.validate()?;
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, Validate)]
    struct Probe {
        #[validate(custom(function = "crate::core::validation::validators::not_blank"))]
        name: String,
    }

    #[test]
    fn test_parse_payload_trims_before_validating() {
        let probe: Probe = parse_payload(json!({"name": "  Lidl  "})).unwrap();
        assert_eq!(probe.name, "Lidl");

        let err = parse_payload::<Probe>(json!({"name": "   "})).unwrap_err();
        assert_eq!(err.to_string(), "name must not be empty");
    }

    #[test]
    fn test_parse_payload_reports_missing_field() {
        let err = parse_payload::<Probe>(json!({})).unwrap_err();
        assert!(err.to_string().contains("missing field `name`"));
    }

    #[test]
    fn test_parse_payload_rejects_non_object() {
        let err = parse_payload::<Probe>(json!([1, 2])).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
