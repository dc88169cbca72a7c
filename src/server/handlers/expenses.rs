//! Expense HTTP handlers

use super::parse_id;
use crate::core::{ApiError, Expense, ExpensePayload, ExpenseQueryParams, MonthKey, Validated};
use crate::server::AppContext;
use axum::{
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use serde::Serialize;
use validator::Validate;

/// Body of `GET /api/expenses`
#[derive(Debug, Serialize)]
pub struct ExpenseListResponse {
    pub expenses: Vec<Expense>,
    pub month: u32,
    pub year: i32,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub total: i64,
}

pub async fn list_expenses(
    State(ctx): State<AppContext>,
    query: Result<Query<ExpenseQueryParams>, QueryRejection>,
) -> Result<Json<ExpenseListResponse>, ApiError> {
    let Query(params) = query.map_err(|e| ApiError::validation(e.body_text()))?;
    params.validate()?;

    let filter = params.into_filter();
    let page = ctx.expenses.query(&filter).await?;

    Ok(Json(ExpenseListResponse {
        expenses: page.expenses,
        month: filter.month,
        year: filter.year,
        page: filter.page.map(|p| p.page),
        per_page: filter.page.map(|p| p.per_page),
        total: page.total,
    }))
}

pub async fn create_expense(
    State(ctx): State<AppContext>,
    Validated(payload): Validated<ExpensePayload>,
) -> Result<(StatusCode, Json<Expense>), ApiError> {
    let expense = ctx
        .expenses
        .create(&payload.into_new_expense(Utc::now()))
        .await?;

    tracing::debug!(expense_id = expense.id, "expense created");
    Ok((StatusCode::CREATED, Json(expense)))
}

pub async fn update_expense(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    Validated(payload): Validated<ExpensePayload>,
) -> Result<Json<Expense>, ApiError> {
    let id = parse_id(&id)?;
    let existing = ctx
        .expenses
        .get(id)
        .await?
        .ok_or(ApiError::not_found("expense", id))?;

    ctx.expenses
        .update(id, &payload.into_new_expense(existing.date))
        .await?
        .map(Json)
        .ok_or(ApiError::not_found("expense", id))
}

pub async fn delete_expense(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    if ctx.expenses.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("expense", id))
    }
}

pub async fn list_months(State(ctx): State<AppContext>) -> Result<Json<Vec<MonthKey>>, ApiError> {
    Ok(Json(ctx.expenses.months().await?))
}
