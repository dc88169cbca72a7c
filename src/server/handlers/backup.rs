//! Snapshot export HTTP handlers

use crate::core::{ApiError, BackupError};
use crate::server::AppContext;
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Json, Response},
};
use serde_json::{Value, json};

pub async fn create_backup(State(ctx): State<AppContext>) -> Result<Json<Value>, ApiError> {
    let snapshot = ctx.backup.export().await?;
    Ok(Json(json!({
        "success": true,
        "message": format!("Backup created: {}", snapshot.filename),
    })))
}

/// Export a fresh snapshot, then send the newest one as an attachment
pub async fn download_backup(State(ctx): State<AppContext>) -> Result<Response, ApiError> {
    ctx.backup.export().await?;
    let snapshot = ctx.backup.latest().await?.ok_or_else(|| {
        BackupError::NoSnapshot(ctx.backup.exports_dir().display().to_string())
    })?;

    let bytes = tokio::fs::read(&snapshot.path)
        .await
        .map_err(BackupError::from)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", snapshot.filename),
            ),
        ],
        bytes,
    )
        .into_response())
}
