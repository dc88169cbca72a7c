//! Shared harness for the HTTP integration tests
//!
//! Every test gets its own in-memory database and its own exports
//! directory, so tests can run in parallel.

#![allow(dead_code)]

use axum_test::TestServer;
use chrono::{Datelike, Duration, Utc};
use expense_tracker::prelude::*;
use serde_json::{Value, json};
use std::path::PathBuf;
use tempfile::TempDir;

pub struct TestApp {
    pub server: TestServer,
    pub ctx: AppContext,
    pub exports: TempDir,
}

pub fn static_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("static")
}

pub async fn spawn_app() -> TestApp {
    let db = Database::in_memory()
        .await
        .expect("Failed to open in-memory database");
    let exports = tempfile::tempdir().expect("Failed to create exports dir");
    let ctx = AppContext::new(&db, exports.path());

    let app = build_router(ctx.clone(), &static_dir());
    let server = TestServer::new(app);

    TestApp {
        server,
        ctx,
        exports,
    }
}

impl TestApp {
    /// POST an expense and return the response body
    pub async fn create_expense(&self, body: Value) -> Value {
        let response = self.server.post("/api/expenses").json(&body).await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json()
    }

    /// POST a rule and return the response body
    pub async fn create_rule(&self, body: Value) -> Value {
        let response = self.server.post("/api/recurring").json(&body).await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json()
    }
}

/// Monthly rule that is due today and started 30 days ago
pub fn rule_due_today(description: &str) -> Value {
    let now = Utc::now();
    json!({
        "amount": 100.0,
        "category": "super",
        "description": description,
        "frequency": "monthly",
        "day_of_month": now.day(),
        "start_date": (now - Duration::days(30)).to_rfc3339(),
    })
}
