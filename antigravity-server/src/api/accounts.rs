//! `/api/accounts/:email/*`: per-account health reads and operator overrides.
//! Account CRUD itself is out of this core's HTTP surface — see §6.

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};

use antigravity_core::models::HealthRecord;

use crate::state::AppState;

#[derive(Serialize)]
pub struct AccountHealthResponse {
    pub(crate) health: HashMap<String, HealthRecord>,
}

pub async fn get_account_health(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<AccountHealthResponse>, StatusCode> {
    let account = state.registry.get(&email).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(AccountHealthResponse { health: account.health }))
}

#[derive(Deserialize)]
pub struct ToggleBody {
    pub(crate) enabled: bool,
}

#[derive(Serialize)]
pub struct ToggleResponse {
    pub(crate) success: bool,
    pub(crate) health: HealthRecord,
}

pub async fn toggle_model(
    State(state): State<AppState>,
    Path((email, model_id)): Path<(String, String)>,
    Json(body): Json<ToggleBody>,
) -> Result<Json<ToggleResponse>, StatusCode> {
    let health = state.health.toggle_model(&email, &model_id, body.enabled).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(ToggleResponse { success: true, health }))
}

#[derive(Deserialize, Default)]
pub struct ResetBody {
    pub(crate) model_id: Option<String>,
}

#[derive(Serialize)]
pub struct ResetResponse {
    pub(crate) success: bool,
}

pub async fn reset_health(
    State(state): State<AppState>,
    Path(email): Path<String>,
    Json(body): Json<ResetBody>,
) -> Json<ResetResponse> {
    let success = state.health.reset_health(&email, body.model_id.as_deref());
    Json(ResetResponse { success })
}
