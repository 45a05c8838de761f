//! `/api/metrics`: Prometheus text exposition, modeled on the teacher's
//! `proxy::prometheus` module.

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;

use crate::state::AppState;

pub async fn get_metrics(State(state): State<AppState>) -> impl IntoResponse {
    let accounts = state.registry.list();
    let summary = state.health.get_health_summary(&accounts);
    antigravity_core::metrics::update_gauges(&accounts, &summary, &state.issues, state.events.len());
    let body = antigravity_core::metrics::render_metrics();

    ([(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")], body)
}
