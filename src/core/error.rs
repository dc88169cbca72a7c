//! Typed error handling for the expense tracker
//!
//! Errors are grouped by who caused them:
//!
//! - [`ApiError::Validation`]: the client sent something unusable (400)
//! - [`ApiError::NotFound`]: the client referenced an unknown id (404)
//! - [`ApiError::Storage`] / [`ApiError::Backup`]: our fault (500)
//!
//! Only validation and not-found errors expose their message to the client.
//! Everything else is logged in full and rendered with a generic message.
//!
//! # Example
//!
//! ```rust,ignore
//! async fn get_rule(id: i64) -> Result<RecurringRule, ApiError> {
//!     store.get(id).await?.ok_or(ApiError::not_found("recurring expense", id))
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// The error type returned by every HTTP handler
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed input
    #[error("{0}")]
    Validation(String),

    /// Referenced record does not exist
    #[error("{entity} with id '{id}' not found")]
    NotFound { entity: &'static str, id: i64 },

    /// Persistence layer failure
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Snapshot export or restore failure
    #[error("backup failed: {0}")]
    Backup(String),
}

/// Errors raised by the SQLite stores
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A row was read back but one of its columns could not be interpreted
    #[error("corrupt {table} row {id}: {message}")]
    CorruptRow {
        table: &'static str,
        id: i64,
        message: String,
    },
}

/// Errors raised by an apply-pass
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors raised while writing or restoring CSV snapshots
#[derive(Debug, Error)]
pub enum BackupError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Snapshot content that cannot be turned into an expense
    #[error("line {line}: {message}")]
    InvalidRow { line: u64, message: String },

    #[error("no snapshot found in {0}")]
    NoSnapshot(String),
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        EngineError::Storage(StorageError::Database(err))
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Storage(StorageError::Database(err))
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Storage(e) => ApiError::Storage(e),
        }
    }
}

impl From<BackupError> for ApiError {
    fn from(err: BackupError) -> Self {
        ApiError::Backup(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Validation(describe_validation_errors(&errors))
    }
}

/// Error body sent to clients
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable message
    pub error: String,
    /// Stable code for programmatic handling
    pub code: &'static str,
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, id: i64) -> Self {
        ApiError::NotFound { entity, id }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Storage(_) | ApiError::Backup(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::NotFound { .. } => "NOT_FOUND",
            ApiError::Storage(_) => "STORAGE_ERROR",
            ApiError::Backup(_) => "BACKUP_ERROR",
        }
    }

    /// Message safe to show to a client
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Validation(_) | ApiError::NotFound { .. } => self.to_string(),
            ApiError::Backup(message) => message.clone(),
            ApiError::Storage(_) => "Internal server error".to_string(),
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.public_message(),
            code: self.error_code(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        (status, Json(self.to_response())).into_response()
    }
}

/// Flatten validator output into one short line, fields in name order
fn describe_validation_errors(errors: &validator::ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    let parts: Vec<String> = fields
        .into_iter()
        .map(|(field, errs)| {
            let message = errs
                .first()
                .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                .unwrap_or_else(|| "is invalid".to_string());
            format!("{field} {message}")
        })
        .collect();

    if parts.is_empty() {
        "Invalid input".to_string()
    } else {
        parts.join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_returns_400() {
        let err = ApiError::validation("amount is required");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert_eq!(err.public_message(), "amount is required");
    }

    #[test]
    fn test_not_found_returns_404() {
        let err = ApiError::not_found("expense", 42);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.public_message(), "expense with id '42' not found");
    }

    #[test]
    fn test_storage_error_hides_detail() {
        let err = ApiError::Storage(StorageError::CorruptRow {
            table: "expenses",
            id: 7,
            message: "bad date".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Internal server error");
        assert!(err.to_string().contains("bad date"));
    }

    #[test]
    fn test_backup_error_keeps_message() {
        let err = ApiError::Backup("no snapshot found".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_response().error, "no snapshot found");
    }

    #[test]
    fn test_backup_error_converts_with_message() {
        let err: ApiError = BackupError::NoSnapshot("exports".to_string()).into();
        assert_eq!(err.error_code(), "BACKUP_ERROR");
        assert_eq!(err.public_message(), "no snapshot found in exports");
    }

    #[test]
    fn test_sqlx_error_converts_to_storage() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.error_code(), "STORAGE_ERROR");
    }
}
