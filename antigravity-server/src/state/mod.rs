//! Application state: the C1-C7 services, held by `Arc` and injected into
//! every handler via axum's `State` extractor. One set per process; tests
//! build fresh ones against a temp directory.

use std::path::PathBuf;
use std::sync::Arc;

use antigravity_core::{AccountRegistry, ConfigStore, EventBroker, EventRecorder, HealthTracker, IssueAggregator, Router};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ConfigStore>,
    pub registry: Arc<AccountRegistry>,
    pub health: Arc<HealthTracker>,
    pub events: Arc<EventRecorder>,
    pub broker: Arc<EventBroker>,
    pub issues: Arc<IssueAggregator>,
    pub router: Arc<Router>,
}

impl AppState {
    pub fn new(data_dir: PathBuf) -> Self {
        let config = Arc::new(ConfigStore::load(data_dir.clone()));
        let registry = Arc::new(AccountRegistry::load(data_dir.clone()));
        let broker = Arc::new(EventBroker::new());
        let events = Arc::new(EventRecorder::load(data_dir.clone(), broker.clone()));
        let health = Arc::new(HealthTracker::new(registry.clone(), events.clone(), config.clone()));
        let issues = Arc::new(IssueAggregator::new(config.clone()));
        let router = Arc::new(Router::new(registry.clone(), health.clone()));

        Self { config, registry, health, events, broker, issues, router }
    }
}
