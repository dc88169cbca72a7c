//! Recurring rule HTTP handlers

use super::parse_id;
use crate::core::{ApiError, RecurringRule, RulePatch, RulePayload, Validated};
use crate::server::AppContext;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use serde_json::{Value, json};

pub async fn list_rules(State(ctx): State<AppContext>) -> Result<Json<Value>, ApiError> {
    let rules = ctx.rules.list().await?;
    Ok(Json(json!({ "recurring_expenses": rules })))
}

pub async fn create_rule(
    State(ctx): State<AppContext>,
    Validated(payload): Validated<RulePayload>,
) -> Result<(StatusCode, Json<RecurringRule>), ApiError> {
    let draft = payload.into_draft(Utc::now())?;
    let rule = ctx.rules.create(&draft).await?;

    tracing::info!(rule_id = rule.id, frequency = %rule.frequency, "recurring expense created");
    Ok((StatusCode::CREATED, Json(rule)))
}

pub async fn get_rule(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<RecurringRule>, ApiError> {
    let id = parse_id(&id)?;
    ctx.rules
        .get(id)
        .await?
        .map(Json)
        .ok_or(ApiError::not_found("recurring expense", id))
}

pub async fn update_rule(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    Validated(patch): Validated<RulePatch>,
) -> Result<Json<RecurringRule>, ApiError> {
    let id = parse_id(&id)?;
    let rule = ctx
        .rules
        .get(id)
        .await?
        .ok_or(ApiError::not_found("recurring expense", id))?;

    let draft = patch.apply_to(&rule)?;
    ctx.rules
        .update(id, &draft)
        .await?
        .map(Json)
        .ok_or(ApiError::not_found("recurring expense", id))
}

pub async fn delete_rule(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    if ctx.rules.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("recurring expense", id))
    }
}

/// Manual apply-pass; failures are reported in the body, never as a 5xx
pub async fn apply_rules(State(ctx): State<AppContext>) -> Json<Value> {
    match ctx.engine.apply_due_now().await {
        Ok(report) => Json(json!({ "success": true, "applied": report.applied })),
        Err(e) => {
            tracing::error!(error = %e, "manual apply-pass failed, rolled back");
            Json(json!({
                "success": false,
                "applied": 0,
                "error": "Failed to apply recurring expenses",
            }))
        }
    }
}

pub async fn pending_rules(State(ctx): State<AppContext>) -> Result<Json<Value>, ApiError> {
    let pending = ctx.engine.preview_pending_now().await?;
    Ok(Json(json!({ "pending": pending })))
}
