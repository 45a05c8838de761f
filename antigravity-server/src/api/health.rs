//! `/api/health/*`: the health matrix and the health-threshold config.

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::response::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use antigravity_core::health::HealthTracker;
use antigravity_core::models::{HealthConfig, HealthConfigPatch, HealthRecord, HealthStatus};
use antigravity_core::HealthError;
use antigravity_types::error::FieldError;

use crate::state::AppState;

#[derive(Deserialize)]
pub struct MatrixQuery {
    pub(crate) models: Option<String>,
}

#[derive(Serialize)]
pub struct ModelHealthCell {
    #[serde(flatten)]
    record: HealthRecord,
    status: HealthStatus,
}

#[derive(Serialize)]
pub struct AccountMatrixRow {
    pub(crate) email: String,
    enabled: bool,
    pub(crate) models: HashMap<String, ModelHealthCell>,
}

#[derive(Serialize)]
pub struct HealthMatrix {
    pub(crate) accounts: Vec<AccountMatrixRow>,
    models: Vec<String>,
    generated: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct MatrixResponse {
    pub(crate) matrix: HealthMatrix,
}

pub async fn get_matrix(State(state): State<AppState>, Query(query): Query<MatrixQuery>) -> Json<MatrixResponse> {
    let accounts = state.registry.list();
    let config = state.config.health();

    let mut models: Vec<String> = match query.models {
        Some(csv) => csv.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect(),
        None => {
            let mut set: std::collections::BTreeSet<String> = std::collections::BTreeSet::new();
            for account in &accounts {
                set.extend(account.health.keys().cloned());
            }
            set.into_iter().collect()
        }
    };
    models.sort();
    models.dedup();

    let by_account = state.health.build_health_matrix(&accounts, &models);
    let rows = accounts
        .iter()
        .map(|account| {
            let per_model = by_account.get(&account.email).cloned().unwrap_or_default();
            let cells = per_model
                .into_iter()
                .map(|(model, record)| {
                    let status = HealthTracker::status_for(&config, &record);
                    (model, ModelHealthCell { record, status })
                })
                .collect();
            AccountMatrixRow { email: account.email.clone(), enabled: account.enabled, models: cells }
        })
        .collect();

    Json(MatrixResponse {
        matrix: HealthMatrix { accounts: rows, models, generated: Utc::now() },
    })
}

#[derive(Serialize)]
pub struct ConfigResponse {
    pub(crate) config: HealthConfig,
}

pub async fn get_config(State(state): State<AppState>) -> Json<ConfigResponse> {
    Json(ConfigResponse { config: state.config.health() })
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UpdateConfigResponse {
    Ok { config: HealthConfig },
    Error { errors: Vec<FieldError> },
}

pub async fn update_config(
    State(state): State<AppState>,
    Json(patch): Json<HealthConfigPatch>,
) -> Json<UpdateConfigResponse> {
    match state.config.update(&patch) {
        Ok(app_config) => Json(UpdateConfigResponse::Ok { config: app_config.health }),
        Err(HealthError::InvalidConfig { errors }) => Json(UpdateConfigResponse::Error { errors }),
        Err(_) => Json(UpdateConfigResponse::Error { errors: Vec::new() }),
    }
}
