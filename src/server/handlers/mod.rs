//! HTTP handlers, grouped by resource

pub mod backup;
pub mod expenses;
pub mod recurring;

use crate::core::{ApiError, ErrorResponse};
use axum::Json;
use axum::http::StatusCode;
use serde_json::{Value, json};

/// Path ids are integers; anything else is a client error
pub(crate) fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::validation(format!("invalid id '{raw}'")))
}

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "expense-tracker",
    }))
}

/// Fallback for unknown `/api` paths
pub async fn api_not_found() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Not found".to_string(),
            code: "NOT_FOUND",
        }),
    )
}
