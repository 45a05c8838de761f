use axum::extract::{Query, State};

use antigravity_core::models::Account;

use super::health::{get_config, get_matrix, update_config, MatrixQuery, UpdateConfigResponse};
use crate::test_helpers::test_app_state;

#[tokio::test]
async fn matrix_is_empty_for_a_fresh_registry() {
    let (state, _tmp) = test_app_state();
    let axum::Json(response) = get_matrix(State(state), Query(MatrixQuery { models: None })).await;
    assert!(response.matrix.accounts.is_empty());
}

#[tokio::test]
async fn matrix_lists_requested_models_for_each_account() {
    let (state, _tmp) = test_app_state();
    state.registry.add(Account::new("a@example.com")).unwrap();
    state.health.record_result("a@example.com", "gemini-2.5-pro", true, None);

    let query = MatrixQuery { models: Some("gemini-2.5-pro,gemini-2.5-flash".to_string()) };
    let axum::Json(response) = get_matrix(State(state), Query(query)).await;

    assert_eq!(response.matrix.accounts.len(), 1);
    let row = &response.matrix.accounts[0];
    assert_eq!(row.email, "a@example.com");
    assert_eq!(row.models.len(), 2);
}

#[tokio::test]
async fn get_config_returns_defaults() {
    let (state, _tmp) = test_app_state();
    let axum::Json(response) = get_config(State(state)).await;
    assert_eq!(response.config.consecutive_failure_threshold, 5);
}

#[tokio::test]
async fn update_config_rejects_invalid_patch_without_mutating_state() {
    let (state, _tmp) = test_app_state();
    let patch = antigravity_core::models::HealthConfigPatch {
        warning_threshold: Some(10.0),
        critical_threshold: Some(90.0),
        ..Default::default()
    };
    let axum::Json(response) = update_config(State(state.clone()), axum::Json(patch)).await;
    match response {
        UpdateConfigResponse::Error { errors } => assert!(!errors.is_empty()),
        UpdateConfigResponse::Ok { .. } => panic!("expected rejection"),
    }
    assert_eq!(state.config.health().warning_threshold, 70.0);
}

#[tokio::test]
async fn update_config_accepts_valid_patch() {
    let (state, _tmp) = test_app_state();
    let patch = antigravity_core::models::HealthConfigPatch {
        consecutive_failure_threshold: Some(3),
        ..Default::default()
    };
    let axum::Json(response) = update_config(State(state), axum::Json(patch)).await;
    match response {
        UpdateConfigResponse::Ok { config } => assert_eq!(config.consecutive_failure_threshold, 3),
        UpdateConfigResponse::Error { errors } => panic!("unexpected rejection: {errors:?}"),
    }
}
