//! REST API: a thin adaptor over the routing core. No handler here computes
//! a score or decides a disable — each is a direct passthrough to C1-C7.

mod accounts;
mod events;
mod health;
mod issues;
mod metrics;

#[cfg(test)]
mod health_tests;

use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::{http::StatusCode, Router};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health/matrix", get(health::get_matrix))
        .route("/health/config", get(health::get_config).post(health::update_config))
        .route("/accounts/:email/health", get(accounts::get_account_health))
        .route("/accounts/:email/models/:model_id/toggle", post(accounts::toggle_model))
        .route("/accounts/:email/health/reset", post(accounts::reset_health))
        .route("/issues", get(issues::list_issues))
        .route("/issues/active", get(issues::list_active))
        .route("/issues/stats", get(issues::issue_stats))
        .route("/issues/:id/resolve", post(issues::resolve_issue))
        .route("/issues/:id/acknowledge", post(issues::acknowledge_issue))
        .route("/events", get(events::get_events).delete(events::clear_events))
        .route("/events/stats", get(events::get_stats))
        .route("/events/stream", get(events::stream_events))
        .route("/metrics", get(metrics::get_metrics))
        .fallback(api_not_found)
}

async fn api_not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(serde_json::json!({"error": "not found"})))
}
