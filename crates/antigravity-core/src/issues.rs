//! Issue aggregator (C6): collapses event patterns into operator-visible
//! incidents with an acknowledge/resolve lifecycle.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;

use antigravity_types::models::{
    Account, Event, EventType, Issue, IssueSeverity, IssueStats, IssueStatus, IssueType,
};

use crate::modules::config::ConfigStore;

const RATE_LIMIT_WINDOW_MS: i64 = 10 * 60 * 1000;
const RATE_LIMIT_STREAK: usize = 3;

/// Rolling state the aggregator needs beyond the issues themselves: recent
/// rate-limit timestamps per pair, and how long each pair has been below
/// the critical threshold.
#[derive(Default)]
struct Tracking {
    rate_limit_hits: HashMap<(String, String), Vec<i64>>,
    below_critical_since: HashMap<(String, String), i64>,
}

/// Consumes events (as a logical C5 subscriber — wired by a background task
/// that forwards broker frames into [`Self::ingest`]) and produces
/// [`Issue`]s. One active issue per `(type, account?, model?)` key.
pub struct IssueAggregator {
    issues: DashMap<String, Issue>,
    tracking: parking_lot::Mutex<Tracking>,
    config: Arc<ConfigStore>,
}

fn issue_key(issue_type: IssueType, account: Option<&str>, model: Option<&str>) -> String {
    format!("{issue_type:?}:{}:{}", account.unwrap_or("-"), model.unwrap_or("-"))
}

impl IssueAggregator {
    pub fn new(config: Arc<ConfigStore>) -> Self {
        Self { issues: DashMap::new(), tracking: parking_lot::Mutex::new(Tracking::default()), config }
    }

    /// Feed one event through the detection rules in §4.6.
    pub fn ingest(&self, event: &Event) {
        match event.event_type {
            EventType::RateLimit => self.on_rate_limit(event),
            EventType::AuthFailure => self.on_auth_failure(event),
            EventType::HealthChange => self.on_health_change(event),
            EventType::Request => self.on_request(event),
            _ => {}
        }
    }

    fn on_rate_limit(&self, event: &Event) {
        let (Some(account), Some(model)) = (&event.account, &event.model) else { return };
        let key = (account.clone(), model.clone());

        let streak_len = {
            let mut tracking = self.tracking.lock();
            let hits = tracking.rate_limit_hits.entry(key).or_default();
            hits.push(event.timestamp_ms);
            hits.retain(|ts| event.timestamp_ms - ts <= RATE_LIMIT_WINDOW_MS);
            hits.len()
        };

        if streak_len >= RATE_LIMIT_STREAK {
            self.upsert(
                IssueType::RateLimitStreak,
                IssueSeverity::Medium,
                Some(account.clone()),
                Some(model.clone()),
                event.timestamp_ms,
                serde_json::json!({"streak": streak_len}),
            );
        }
    }

    fn on_auth_failure(&self, event: &Event) {
        let Some(account) = &event.account else { return };
        self.upsert(
            IssueType::AuthFailure,
            IssueSeverity::High,
            Some(account.clone()),
            None,
            event.timestamp_ms,
            serde_json::json!({"message": event.message}),
        );
    }

    /// `auth_failure` auto-clears on a subsequent `request(success)` for the
    /// same account.
    fn on_request(&self, event: &Event) {
        let Some(account) = &event.account else { return };
        let success = event.details.get("success").and_then(|v| v.as_bool()).unwrap_or(false);
        if !success {
            return;
        }
        let key = issue_key(IssueType::AuthFailure, Some(account), None);
        if let Some(mut entry) = self.issues.get_mut(&key) {
            if entry.status != IssueStatus::Resolved {
                entry.status = IssueStatus::Resolved;
            }
        }
    }

    /// `model_exhausted` is raised by `health_change: disabled` and cleared
    /// by the matching `recovered` event.
    fn on_health_change(&self, event: &Event) {
        let (Some(account), Some(model)) = (&event.account, &event.model) else { return };
        let disabled = event.details.get("disabled").and_then(|v| v.as_bool()).unwrap_or(false);
        let key = issue_key(IssueType::ModelExhausted, Some(account), Some(model));

        if disabled {
            self.upsert(
                IssueType::ModelExhausted,
                IssueSeverity::High,
                Some(account.clone()),
                Some(model.clone()),
                event.timestamp_ms,
                serde_json::Value::Null,
            );
        } else if let Some(mut entry) = self.issues.get_mut(&key) {
            if entry.status != IssueStatus::Resolved {
                entry.status = IssueStatus::Resolved;
            }
        }
    }

    /// Periodic sweep driving `health_degraded`: `health_score <
    /// critical_threshold` sustained for `stale_issue_ms`. Called by a
    /// background interval task alongside the prune/snapshot tick.
    pub fn sweep_health_degraded(&self, accounts: &[Account], now_ms: i64) {
        let config = self.config.health();
        let mut tracking = self.tracking.lock();

        for account in accounts {
            for (model, rec) in &account.health {
                let key = (account.email.clone(), model.clone());
                if rec.health_score < config.critical_threshold {
                    let since = *tracking.below_critical_since.entry(key.clone()).or_insert(now_ms);
                    if now_ms - since >= config.stale_issue_ms {
                        self.upsert(
                            IssueType::HealthDegraded,
                            IssueSeverity::Medium,
                            Some(account.email.clone()),
                            Some(model.clone()),
                            now_ms,
                            serde_json::json!({"health_score": rec.health_score}),
                        );
                    }
                } else {
                    tracking.below_critical_since.remove(&key);
                    let issue_key = issue_key(IssueType::HealthDegraded, Some(&account.email), Some(model));
                    if let Some(mut entry) = self.issues.get_mut(&issue_key) {
                        if entry.status != IssueStatus::Resolved {
                            entry.status = IssueStatus::Resolved;
                        }
                    }
                }
            }
        }
    }

    fn upsert(
        &self,
        issue_type: IssueType,
        severity: IssueSeverity,
        account: Option<String>,
        model: Option<String>,
        now_ms: i64,
        details: serde_json::Value,
    ) {
        let key = issue_key(issue_type, account.as_deref(), model.as_deref());
        self.issues
            .entry(key)
            .and_modify(|issue| {
                issue.last_seen_ms = now_ms;
                issue.count += 1;
                if issue.status == IssueStatus::Resolved {
                    issue.status = IssueStatus::Active;
                }
                issue.details = details.clone();
            })
            .or_insert_with(|| Issue {
                id: uuid::Uuid::new_v4().to_string(),
                issue_type,
                severity,
                account,
                model,
                first_seen_ms: now_ms,
                last_seen_ms: now_ms,
                count: 1,
                status: IssueStatus::Active,
                details,
            });
    }

    pub fn list(&self, status: Option<IssueStatus>) -> Vec<Issue> {
        self.issues
            .iter()
            .filter(|e| status.map_or(true, |s| e.value().status == s))
            .map(|e| e.value().clone())
            .collect()
    }

    pub fn stats(&self) -> IssueStats {
        let mut stats = IssueStats::default();
        for entry in self.issues.iter() {
            match entry.status {
                IssueStatus::Active => stats.active += 1,
                IssueStatus::Acknowledged => stats.acknowledged += 1,
                IssueStatus::Resolved => stats.resolved += 1,
            }
            *stats.by_type.entry(entry.issue_type).or_insert(0) += 1;
        }
        stats
    }

    pub fn acknowledge(&self, id: &str) -> Option<Issue> {
        self.transition(id, IssueStatus::Acknowledged)
    }

    pub fn resolve(&self, id: &str) -> Option<Issue> {
        self.transition(id, IssueStatus::Resolved)
    }

    fn transition(&self, id: &str, next: IssueStatus) -> Option<Issue> {
        for mut entry in self.issues.iter_mut() {
            if entry.id == id {
                if entry.status.can_transition_to(next) {
                    entry.status = next;
                }
                return Some(entry.clone());
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use antigravity_types::models::Severity;

    fn aggregator() -> IssueAggregator {
        let dir = tempfile::tempdir().unwrap();
        IssueAggregator::new(Arc::new(ConfigStore::load(dir.path().to_path_buf())))
    }

    fn event(event_type: EventType, account: &str, model: &str, ts: i64, details: serde_json::Value) -> Event {
        Event {
            id: 1,
            timestamp: chrono::Utc::now(),
            timestamp_ms: ts,
            event_type,
            severity: Severity::Warn,
            account: Some(account.to_string()),
            model: Some(model.to_string()),
            request_id: None,
            message: "probe".to_string(),
            details,
        }
    }

    #[test]
    fn rate_limit_streak_requires_three_within_window() {
        let agg = aggregator();
        for i in 0..2 {
            agg.ingest(&event(EventType::RateLimit, "a@example.com", "m", i * 1000, serde_json::Value::Null));
        }
        assert!(agg.list(None).is_empty());

        agg.ingest(&event(EventType::RateLimit, "a@example.com", "m", 2000, serde_json::Value::Null));
        let issues = agg.list(None);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].issue_type, IssueType::RateLimitStreak);
    }

    #[test]
    fn auth_failure_autoclears_on_success() {
        let agg = aggregator();
        agg.ingest(&event(EventType::AuthFailure, "a@example.com", "m", 0, serde_json::Value::Null));
        assert_eq!(agg.list(Some(IssueStatus::Active)).len(), 1);

        agg.ingest(&event(EventType::Request, "a@example.com", "m", 1000, serde_json::json!({"success": true})));
        assert_eq!(agg.list(Some(IssueStatus::Active)).len(), 0);
        assert_eq!(agg.list(Some(IssueStatus::Resolved)).len(), 1);
    }

    #[test]
    fn model_exhausted_raised_and_cleared() {
        let agg = aggregator();
        agg.ingest(&event(EventType::HealthChange, "a@example.com", "m", 0, serde_json::json!({"disabled": true})));
        assert_eq!(agg.list(Some(IssueStatus::Active)).len(), 1);

        agg.ingest(&event(EventType::HealthChange, "a@example.com", "m", 1000, serde_json::json!({"disabled": false})));
        assert_eq!(agg.list(Some(IssueStatus::Active)).len(), 0);
    }

    #[test]
    fn acknowledge_then_resolve_is_terminal() {
        let agg = aggregator();
        agg.ingest(&event(EventType::AuthFailure, "a@example.com", "m", 0, serde_json::Value::Null));
        let id = agg.list(None)[0].id.clone();

        let acked = agg.acknowledge(&id).unwrap();
        assert_eq!(acked.status, IssueStatus::Acknowledged);

        let resolved = agg.resolve(&id).unwrap();
        assert_eq!(resolved.status, IssueStatus::Resolved);

        // Resolution is terminal: can't go back to active.
        let after = agg.transition(&id, IssueStatus::Active);
        assert_eq!(after.unwrap().status, IssueStatus::Resolved);
    }
}
