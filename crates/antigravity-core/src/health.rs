//! Health tracker (C3): per-(account, model) scoring, auto-disable,
//! auto-recovery, and manual overrides.

use std::collections::HashMap;
use std::sync::Arc;

use antigravity_types::models::{
    Account, HealthConfig, HealthRecord, HealthStatus, LastError,
};

use crate::events::EventRecorder;
use crate::modules::config::ConfigStore;
use crate::registry::AccountRegistry;

/// Summary counts across all tracked (account, model) pairs, bucketed by the
/// configured thresholds. A pair is counted once: disabled pairs never also
/// land in a score bucket.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct HealthSummary {
    pub healthy: u64,
    pub warning: u64,
    pub critical: u64,
    pub disabled: u64,
}

/// Per-(account, model) health scoring, auto-disable, and recovery policy.
///
/// Mutation happens through [`AccountRegistry::with_health_mut`], which
/// gives single-writer semantics per account entry; this type never stores
/// health state of its own.
pub struct HealthTracker {
    registry: Arc<AccountRegistry>,
    events: Arc<EventRecorder>,
    config: Arc<ConfigStore>,
}

impl HealthTracker {
    pub fn new(registry: Arc<AccountRegistry>, events: Arc<EventRecorder>, config: Arc<ConfigStore>) -> Self {
        Self { registry, events, config }
    }

    /// `total = success + fail`; `base = 100 * success / total`; `penalty =
    /// min(consecutive_failures * 6, 30)`; `score = clamp(base - penalty, 0,
    /// 100)`. `total == 0` scores 100.
    pub fn score(success_count: u64, fail_count: u64, consecutive_failures: u32) -> f64 {
        let total = success_count + fail_count;
        if total == 0 {
            return 100.0;
        }
        let base = 100.0 * success_count as f64 / total as f64;
        let penalty = f64::from(consecutive_failures.saturating_mul(6)).min(30.0);
        (base - penalty).clamp(0.0, 100.0)
    }

    /// Record the outcome of one request against `(email, model_id)`.
    /// No-op (lazily creates the record, but touches no event wiring beyond
    /// that) if the account is absent from the registry.
    pub fn record_result(
        &self,
        email: &str,
        model_id: &str,
        success: bool,
        error: Option<LastError>,
    ) -> Option<HealthRecord> {
        let config = self.config.health();
        let now_ms = chrono::Utc::now().timestamp_millis();

        let (snapshot, newly_recovered, newly_disabled) = self.registry.with_health_mut(email, model_id, |rec| {
            if success {
                rec.success_count += 1;
                rec.consecutive_failures = 0;
                rec.last_success_ms = Some(now_ms);

                let recovered = rec.disabled && !rec.manual_disabled;
                if recovered {
                    rec.disabled = false;
                    rec.disabled_reason = None;
                    rec.disabled_at_ms = None;
                }
                rec.health_score = Self::score(rec.success_count, rec.fail_count, rec.consecutive_failures);
                (rec.clone(), recovered, false)
            } else {
                rec.fail_count += 1;
                rec.consecutive_failures += 1;
                rec.last_error = error.clone().map(|mut e| {
                    e.at_ms = now_ms;
                    e
                });

                let mut newly_disabled = false;
                if config.auto_disable_enabled
                    && !rec.disabled
                    && !rec.manual_disabled
                    && rec.consecutive_failures >= config.consecutive_failure_threshold
                {
                    rec.disabled = true;
                    rec.disabled_reason = Some(format!(
                        "{} consecutive failures",
                        rec.consecutive_failures
                    ));
                    rec.disabled_at_ms = Some(now_ms);
                    newly_disabled = true;
                }
                rec.health_score = Self::score(rec.success_count, rec.fail_count, rec.consecutive_failures);
                (rec.clone(), false, newly_disabled)
            }
        })?;

        if newly_recovered {
            self.events.record_health_change(email, model_id, false, "successful_request");
        }
        if newly_disabled {
            self.events.record_health_change(email, model_id, true, "consecutive_failure_threshold");
        }

        Some(snapshot)
    }

    /// Pure read: `true` unless auto-disabled or manually disabled, or if no
    /// record exists yet. Auto-recovery-by-timeout is performed by
    /// [`Self::tick_recovery`], not here — see SPEC_FULL §9 (resolved open
    /// question 1).
    pub fn is_model_usable(&self, account: &Account, model_id: &str) -> bool {
        account.health.get(model_id).map_or(true, HealthRecord::is_usable)
    }

    /// Scan every tracked pair; clear auto-disable (and `consecutive_failures`)
    /// on any pair whose cooldown has elapsed. Called by a background
    /// interval task, not from a request-serving path.
    pub fn tick_recovery(&self, now_ms: i64) {
        let auto_recovery_ms = self.config.health().auto_recovery_ms;

        for account in self.registry.list() {
            for (model_id, rec) in &account.health {
                if !rec.disabled || rec.manual_disabled {
                    continue;
                }
                let Some(disabled_at) = rec.disabled_at_ms else { continue };
                if now_ms - disabled_at <= auto_recovery_ms {
                    continue;
                }

                let recovered = self.registry.with_health_mut(&account.email, model_id, |rec| {
                    rec.disabled = false;
                    rec.consecutive_failures = 0;
                    rec.disabled_reason = None;
                    rec.disabled_at_ms = None;
                    rec.health_score = Self::score(rec.success_count, rec.fail_count, rec.consecutive_failures);
                });
                if recovered.is_some() {
                    self.events.record_health_change(&account.email, model_id, false, "auto_recovery_timeout");
                }
            }
        }
    }

    /// Operator override, independent of auto-disable history. Enabling
    /// also clears any auto-disable state.
    pub fn toggle_model(&self, email: &str, model_id: &str, enabled: bool) -> Option<HealthRecord> {
        self.registry.with_health_mut(email, model_id, |rec| {
            rec.manual_disabled = !enabled;
            if enabled {
                rec.disabled = false;
                rec.disabled_reason = None;
                rec.disabled_at_ms = None;
            } else {
                rec.disabled_reason = Some("manual_override".to_string());
                rec.disabled_at_ms = Some(chrono::Utc::now().timestamp_millis());
            }
            rec.clone()
        })
    }

    /// Replace the health record(s) for `email` with fresh zero records.
    pub fn reset_health(&self, email: &str, model_id: Option<&str>) -> bool {
        self.registry.reset_health(email, model_id)
    }

    /// For each account, a snapshot of each requested model's record (or a
    /// synthetic "never used" record scoring 100).
    pub fn build_health_matrix(&self, accounts: &[Account], model_ids: &[String]) -> HashMap<String, HashMap<String, HealthRecord>> {
        accounts
            .iter()
            .map(|account| {
                let per_model = model_ids
                    .iter()
                    .map(|model_id| (model_id.clone(), account.health_snapshot(model_id)))
                    .collect();
                (account.email.clone(), per_model)
            })
            .collect()
    }

    /// Counts healthy/warning/critical/disabled across all tracked pairs.
    pub fn get_health_summary(&self, accounts: &[Account]) -> HealthSummary {
        let config = self.config.health();
        let mut summary = HealthSummary::default();

        for account in accounts {
            for rec in account.health.values() {
                if rec.disabled || rec.manual_disabled {
                    summary.disabled += 1;
                } else if rec.health_score >= config.warning_threshold {
                    summary.healthy += 1;
                } else if rec.health_score < config.critical_threshold {
                    summary.critical += 1;
                } else {
                    summary.warning += 1;
                }
            }
        }

        summary
    }

    /// The bucket a single score/disabled-state combination falls into,
    /// used by the HTTP surface to annotate matrix cells.
    pub fn status_for(config: &HealthConfig, rec: &HealthRecord) -> HealthStatus {
        if rec.disabled || rec.manual_disabled {
            HealthStatus::Disabled
        } else if rec.health_score >= config.warning_threshold {
            HealthStatus::Healthy
        } else if rec.health_score < config.critical_threshold {
            HealthStatus::Critical
        } else {
            HealthStatus::Warning
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBroker;
    use antigravity_types::models::{EventFilter, EventType, HealthConfigPatch};

    fn harness() -> (tempfile::TempDir, Arc<AccountRegistry>, Arc<EventRecorder>, Arc<ConfigStore>, HealthTracker) {
        let dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(AccountRegistry::new(dir.path().to_path_buf()));
        let broker = Arc::new(EventBroker::new());
        let events = Arc::new(EventRecorder::new(dir.path().to_path_buf(), broker));
        let config = Arc::new(ConfigStore::load(dir.path().to_path_buf()));
        registry.add(Account::new("a@example.com")).unwrap();
        let tracker = HealthTracker::new(registry.clone(), events.clone(), config.clone());
        (dir, registry, events, config, tracker)
    }

    #[test]
    fn score_formula_matches_spec_example() {
        // successes=9, failures=1, consecutive_failures=1 => clamp(90-6,0,100)=84
        assert_eq!(HealthTracker::score(9, 1, 1), 84.0);
    }

    #[test]
    fn fresh_pair_scores_100() {
        assert_eq!(HealthTracker::score(0, 0, 0), 100.0);
    }

    #[test]
    fn auto_disable_on_streak() {
        let (_dir, registry, events, config, tracker) = harness();
        let patch = HealthConfigPatch { consecutive_failure_threshold: Some(5), ..Default::default() };
        config.update(&patch).unwrap();

        for _ in 0..5 {
            tracker.record_result("a@example.com", "m", false, None);
        }

        let account = registry.get("a@example.com").unwrap();
        assert!(!tracker.is_model_usable(&account, "m"));
        let rec = account.health_snapshot("m");
        assert!(rec.disabled);
        assert_eq!(rec.health_score, 0.0);

        let page = events.get_events(&EventFilter { event_type: Some(EventType::HealthChange), ..Default::default() });
        assert_eq!(page.total, 1);
    }

    #[test]
    fn auto_recovery_by_timeout() {
        let (_dir, registry, events, config, tracker) = harness();
        config.update(&HealthConfigPatch { consecutive_failure_threshold: Some(5), auto_recovery_ms: Some(1000), ..Default::default() }).unwrap();
        for _ in 0..5 {
            tracker.record_result("a@example.com", "m", false, None);
        }

        let disabled_at = registry.get("a@example.com").unwrap().health_snapshot("m").disabled_at_ms.unwrap();
        tracker.tick_recovery(disabled_at + 1001);

        let account = registry.get("a@example.com").unwrap();
        let rec = account.health_snapshot("m");
        assert!(!rec.disabled);
        assert_eq!(rec.consecutive_failures, 0);
        assert!(tracker.is_model_usable(&account, "m"));

        let page = events.get_events(&EventFilter { event_type: Some(EventType::HealthChange), ..Default::default() });
        assert_eq!(page.total, 2);
    }

    #[test]
    fn manual_disable_stamps_reason_and_timestamp() {
        let (_dir, registry, _events, _config, tracker) = harness();
        tracker.toggle_model("a@example.com", "m", false);

        let rec = registry.get("a@example.com").unwrap().health_snapshot("m");
        assert!(rec.manual_disabled);
        assert_eq!(rec.disabled_reason.as_deref(), Some("manual_override"));
        assert!(rec.disabled_at_ms.is_some());
    }

    #[test]
    fn manual_override_survives_success() {
        let (_dir, registry, events, _config, tracker) = harness();
        tracker.toggle_model("a@example.com", "m", false);
        tracker.record_result("a@example.com", "m", true, None);

        let account = registry.get("a@example.com").unwrap();
        let rec = account.health_snapshot("m");
        assert!(rec.manual_disabled);
        assert!(!tracker.is_model_usable(&account, "m"));

        let page = events.get_events(&EventFilter { event_type: Some(EventType::HealthChange), ..Default::default() });
        assert_eq!(page.total, 0);
    }

    #[test]
    fn toggle_model_is_idempotent() {
        let (_dir, registry, _events, _config, tracker) = harness();
        tracker.toggle_model("a@example.com", "m", true);
        let first = registry.get("a@example.com").unwrap().health_snapshot("m");
        tracker.toggle_model("a@example.com", "m", true);
        let second = registry.get("a@example.com").unwrap().health_snapshot("m");
        assert_eq!(first, second);
    }

    #[test]
    fn reset_health_is_idempotent_and_restores_defaults() {
        let (_dir, registry, _events, _config, tracker) = harness();
        tracker.record_result("a@example.com", "m", false, None);
        tracker.reset_health("a@example.com", Some("m"));
        let once = registry.get("a@example.com").unwrap().health_snapshot("m");
        tracker.reset_health("a@example.com", Some("m"));
        let twice = registry.get("a@example.com").unwrap().health_snapshot("m");
        assert_eq!(once, twice);
        assert_eq!(once.health_score, 100.0);
    }

    #[test]
    fn absent_account_reads_are_noop() {
        let (_dir, _registry, _events, _config, tracker) = harness();
        let ghost = Account::new("ghost@example.com");
        assert!(tracker.is_model_usable(&ghost, "m"));
        assert!(tracker.record_result("ghost@example.com", "m", true, None).is_none());
    }
}
