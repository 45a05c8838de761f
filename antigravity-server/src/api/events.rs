//! `/api/events/*`: the structured event log, its stats, and the live SSE
//! stream.

use axum::extract::{Query, State};
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::response::{IntoResponse, Json};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;

use antigravity_core::models::{EventFilter, EventPage, EventStats};

use crate::state::AppState;

pub async fn get_events(State(state): State<AppState>, Query(filter): Query<EventFilter>) -> Json<EventPage> {
    Json(state.events.get_events(&filter))
}

#[derive(Deserialize)]
pub struct StatsQuery {
    pub(crate) since: Option<i64>,
    pub(crate) account: Option<String>,
    pub(crate) model: Option<String>,
}

pub async fn get_stats(State(state): State<AppState>, Query(query): Query<StatsQuery>) -> Json<EventStats> {
    Json(state.events.get_stats(query.since, query.account.as_deref(), query.model.as_deref()))
}

#[derive(Serialize)]
pub struct ClearResponse {
    pub(crate) success: bool,
    pub(crate) cleared: usize,
}

pub async fn clear_events(State(state): State<AppState>) -> Json<ClearResponse> {
    Json(ClearResponse { success: true, cleared: state.events.clear() })
}

#[derive(Deserialize)]
pub struct StreamQuery {
    #[serde(default)]
    pub(crate) history: bool,
    pub(crate) limit: Option<usize>,
}

pub async fn stream_events(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
) -> impl IntoResponse {
    let history = query.history.then(|| state.events.tail(query.limit.unwrap_or(100)));
    let rx = state.broker.subscribe(history);

    let stream = UnboundedReceiverStream::new(rx).map(|frame| {
        let payload = serde_json::to_string(&frame.to_json()).unwrap_or_default();
        Ok::<_, std::convert::Infallible>(SseEvent::default().data(payload))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
