//! Router (C7): selects an (account, model) for each incoming request.
//!
//! Depends only on [`AccountRegistry`] and [`HealthTracker`] — never on an
//! HTTP client. Translation and transport are external collaborators; the
//! two traits below mark those seams without implementing them.

use std::sync::Arc;

use antigravity_types::error::ProxyError;
use antigravity_types::models::{Account, LastError};

use crate::events::EventRecorder;
use crate::health::HealthTracker;
use crate::registry::AccountRegistry;

/// Seam for the out-of-scope Anthropic↔Google schema translation layer.
/// No implementation lives in this crate.
pub trait Translator: Send + Sync {}

/// Seam for the out-of-scope OAuth/upstream-HTTP transport collaborator.
/// No implementation lives in this crate.
pub trait UpstreamClient: Send + Sync {}

/// Selects an (account, model) pair for each incoming request.
pub struct Router {
    registry: Arc<AccountRegistry>,
    health: Arc<HealthTracker>,
}

impl Router {
    pub fn new(registry: Arc<AccountRegistry>, health: Arc<HealthTracker>) -> Self {
        Self { registry, health }
    }

    /// §4.7: filter to enabled + usable accounts, then order by fewest
    /// consecutive failures, highest score, most-stale last success, and
    /// finally email for a stable tie-break.
    pub fn pick_account(&self, model_id: &str) -> Result<(Account, String), ProxyError> {
        let mut usable: Vec<Account> = self
            .registry
            .list()
            .into_iter()
            .filter(|a| a.enabled && self.health.is_model_usable(a, model_id))
            .collect();

        if usable.is_empty() {
            return Err(ProxyError::Unavailable {
                model_id: model_id.to_string(),
                reason: "no_usable_account".to_string(),
            });
        }

        usable.sort_by(|a, b| {
            let ra = a.health_snapshot(model_id);
            let rb = b.health_snapshot(model_id);

            ra.consecutive_failures
                .cmp(&rb.consecutive_failures)
                .then_with(|| rb.health_score.partial_cmp(&ra.health_score).unwrap_or(std::cmp::Ordering::Equal))
                .then_with(|| ra.last_success_ms.unwrap_or(0).cmp(&rb.last_success_ms.unwrap_or(0)))
                .then_with(|| a.email.cmp(&b.email))
        });

        let chosen = usable.remove(0);
        Ok((chosen, model_id.to_string()))
    }

    /// Reports the outcome of a dispatched request: updates health (C3) and
    /// records a `request` event (C4) atomically from the caller's point of
    /// view, so the "both C3 and C4" contract is never forgotten at a call
    /// site.
    pub fn report_outcome(
        &self,
        events: &EventRecorder,
        email: &str,
        model_id: &str,
        success: bool,
        error: Option<LastError>,
        request_id: Option<String>,
    ) {
        self.health.record_result(email, model_id, success, error);
        events.record_request(email, model_id, request_id, success);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBroker;
    use crate::modules::config::ConfigStore;
    use antigravity_types::models::Account;

    fn harness() -> (Arc<AccountRegistry>, Arc<EventRecorder>, Router) {
        let dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(AccountRegistry::new(dir.path().to_path_buf()));
        let events = Arc::new(EventRecorder::new(dir.path().to_path_buf(), Arc::new(EventBroker::new())));
        let config = Arc::new(ConfigStore::load(dir.path().to_path_buf()));
        let health = Arc::new(HealthTracker::new(registry.clone(), events.clone(), config));
        (registry.clone(), events, Router::new(registry, health))
    }

    #[test]
    fn empty_registry_is_unavailable() {
        let (_registry, _events, router) = harness();
        let err = router.pick_account("gemini-2.5-pro").unwrap_err();
        assert!(matches!(err, ProxyError::Unavailable { .. }));
    }

    #[test]
    fn disabled_account_is_never_picked() {
        let (registry, events, router) = harness();
        registry.add(Account::new("a@example.com")).unwrap();
        registry.set_enabled("a@example.com", false, &events).unwrap();

        let err = router.pick_account("m").unwrap_err();
        assert!(matches!(err, ProxyError::Unavailable { .. }));
    }

    #[test]
    fn picks_fewer_consecutive_failures_first() {
        let (registry, events, router) = harness();
        registry.add(Account::new("a@example.com")).unwrap();
        registry.add(Account::new("b@example.com")).unwrap();

        router.report_outcome(&events, "a@example.com", "m", false, None, None);
        router.report_outcome(&events, "b@example.com", "m", true, None, None);

        let (picked, _) = router.pick_account("m").unwrap();
        assert_eq!(picked.email, "b@example.com");
    }

    #[test]
    fn stable_tie_break_is_lexicographic_email() {
        let (registry, _events, router) = harness();
        registry.add(Account::new("z@example.com")).unwrap();
        registry.add(Account::new("a@example.com")).unwrap();

        let (picked, _) = router.pick_account("m").unwrap();
        assert_eq!(picked.email, "a@example.com");
    }
}
