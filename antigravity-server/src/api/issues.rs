//! `/api/issues/*`: the operator-visible incident list and its lifecycle.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};

use antigravity_core::models::{Issue, IssueStats, IssueStatus};

use crate::state::AppState;

#[derive(Deserialize)]
pub struct IssueQuery {
    pub(crate) status: Option<IssueStatus>,
}

#[derive(Serialize)]
pub struct IssueListResponse {
    pub(crate) issues: Vec<Issue>,
}

pub async fn list_issues(State(state): State<AppState>, Query(query): Query<IssueQuery>) -> Json<IssueListResponse> {
    Json(IssueListResponse { issues: state.issues.list(query.status) })
}

pub async fn list_active(State(state): State<AppState>) -> Json<IssueListResponse> {
    Json(IssueListResponse { issues: state.issues.list(Some(IssueStatus::Active)) })
}

#[derive(Serialize)]
pub struct IssueStatsResponse {
    pub(crate) stats: IssueStats,
}

pub async fn issue_stats(State(state): State<AppState>) -> Json<IssueStatsResponse> {
    Json(IssueStatsResponse { stats: state.issues.stats() })
}

#[derive(Serialize)]
pub struct IssueResponse {
    pub(crate) issue: Issue,
}

pub async fn resolve_issue(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<IssueResponse>, StatusCode> {
    state.issues.resolve(&id).map(|issue| Json(IssueResponse { issue })).ok_or(StatusCode::NOT_FOUND)
}

pub async fn acknowledge_issue(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<IssueResponse>, StatusCode> {
    state.issues.acknowledge(&id).map(|issue| Json(IssueResponse { issue })).ok_or(StatusCode::NOT_FOUND)
}
