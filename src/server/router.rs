//! Route table

use super::context::AppContext;
use super::handlers::{api_not_found, backup, expenses, health_check, recurring};
use axum::{
    Router,
    http::{HeaderValue, header},
    routing::{get, post, put},
};
use std::path::Path;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

/// JSON API, mounted under `/api`
///
/// - GET/POST /expenses, PUT/DELETE /expenses/{id}
/// - GET /months
/// - GET/POST /recurring, GET/PUT/DELETE /recurring/{id}
/// - POST /recurring/apply, GET /recurring/pending
/// - POST /backup, GET /backup/download
pub fn api_routes() -> Router<AppContext> {
    Router::new()
        .route(
            "/expenses",
            get(expenses::list_expenses).post(expenses::create_expense),
        )
        .route(
            "/expenses/{id}",
            put(expenses::update_expense).delete(expenses::delete_expense),
        )
        .route("/months", get(expenses::list_months))
        .route(
            "/recurring",
            get(recurring::list_rules).post(recurring::create_rule),
        )
        .route("/recurring/apply", post(recurring::apply_rules))
        .route("/recurring/pending", get(recurring::pending_rules))
        .route(
            "/recurring/{id}",
            get(recurring::get_rule)
                .put(recurring::update_rule)
                .delete(recurring::delete_rule),
        )
        .route("/backup", post(backup::create_backup))
        .route("/backup/download", get(backup::download_backup))
        .fallback(api_not_found)
}

/// Full application: API, health check and the static front-end
///
/// Unknown non-API paths are answered with `index.html` so client-side
/// routes survive a reload.
pub fn build_router(ctx: AppContext, static_dir: &Path) -> Router {
    let static_files = tower::ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache"),
        ))
        .service(
            ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html"))),
        );

    Router::new()
        .nest("/api", api_routes())
        .route("/health", get(health_check))
        .with_state(ctx)
        .fallback_service(static_files)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
