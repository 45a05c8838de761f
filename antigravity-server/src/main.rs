//! Antigravity routing core - headless HTTP gateway.
//!
//! Hosts the account × model health tracker, event recorder/streamer, issue
//! aggregator, and router behind a thin axum surface. Translation and
//! upstream transport are external collaborators (see
//! [`antigravity_core::router::Translator`] / [`UpstreamClient`]) and are not
//! served here.

use std::time::Duration;

use anyhow::Result;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod api;
mod cli;
mod server_utils;
mod state;
#[cfg(test)]
mod test_helpers;

use cli::Cli;
use state::AppState;

const SNAPSHOT_TICK: Duration = Duration::from_secs(60);
const RECOVERY_TICK: Duration = Duration::from_secs(30);
const ISSUE_SWEEP_TICK: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    antigravity_core::metrics::init_metrics();

    let data_dir = cli.data_dir.unwrap_or_else(antigravity_core::modules::paths::get_data_dir);
    info!(data_dir = %data_dir.display(), "antigravity-server starting");

    let state = AppState::new(data_dir);
    spawn_background_tasks(state.clone());

    let events = state.events.clone();
    let app = build_router(state);

    let listener = server_utils::create_listener("0.0.0.0", cli.port).await?;
    info!(port = cli.port, "listening");

    axum::serve(listener, app).with_graceful_shutdown(server_utils::shutdown_signal()).await?;

    info!("flushing event log before exit");
    if let Err(e) = events.snapshot() {
        tracing::error!(error = %e, "final event snapshot failed on shutdown");
    }

    Ok(())
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", api::router())
        .route("/health", get(liveness))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .with_state(state)
}

async fn liveness() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Spawns the three interval-driven background tasks (§5) plus the issue
/// aggregator's event subscription (a logical C5 consumer, wired as a task
/// rather than a direct call so C6 only ever sees events through the same
/// broker the SSE surface does).
fn spawn_background_tasks(state: AppState) {
    tokio::spawn({
        let state = state.clone();
        async move {
            let mut interval = tokio::time::interval(SNAPSHOT_TICK);
            loop {
                interval.tick().await;
                if let Err(e) = state.events.snapshot() {
                    tracing::error!(error = %e, "event snapshot tick failed");
                }
                let config = state.config.health();
                state.events.prune(config.event_retention_days, config.event_max_count);
            }
        }
    });

    tokio::spawn({
        let state = state.clone();
        async move {
            let mut interval = tokio::time::interval(RECOVERY_TICK);
            loop {
                interval.tick().await;
                state.health.tick_recovery(chrono::Utc::now().timestamp_millis());
            }
        }
    });

    tokio::spawn({
        let state = state.clone();
        async move {
            let mut interval = tokio::time::interval(ISSUE_SWEEP_TICK);
            loop {
                interval.tick().await;
                let accounts = state.registry.list();
                state.issues.sweep_health_degraded(&accounts, chrono::Utc::now().timestamp_millis());
            }
        }
    });

    tokio::spawn({
        let issues = state.issues.clone();
        let mut rx = state.broker.subscribe(None);
        async move {
            use antigravity_core::events::Frame;
            while let Some(frame) = rx.recv().await {
                if let Frame::Single(event) = frame {
                    issues.ingest(&event);
                }
            }
        }
    });
}
