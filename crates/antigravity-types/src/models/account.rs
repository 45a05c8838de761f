//! Account and per-(account, model) health record models.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An upstream account the router may dispatch requests through.
///
/// `email` is the stable identifier and never changes after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    /// Stable, unique identifier.
    pub email: String,
    /// Whether the router may select this account at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Opaque upstream project identifier, used by transport collaborators.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Opaque upstream source tag (e.g. which credential store this came from).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Opaque upstream quota/limit metadata, untouched by the core.
    #[serde(default)]
    pub limits: serde_json::Value,
    /// Per-model health, created lazily on first `record_result`.
    #[serde(default)]
    pub health: HashMap<String, HealthRecord>,
    /// Creation timestamp, epoch millis.
    pub created_at_ms: i64,
}

const fn default_true() -> bool {
    true
}

impl Account {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            enabled: true,
            project_id: None,
            source: None,
            limits: serde_json::Value::Null,
            health: HashMap::new(),
            created_at_ms: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Health record for `model_id`, or a fresh "never used" snapshot if the
    /// pair has no history yet. Does not mutate `self.health`.
    pub fn health_snapshot(&self, model_id: &str) -> HealthRecord {
        self.health.get(model_id).cloned().unwrap_or_default()
    }
}

/// A description of the last error observed for a (account, model) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct LastError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Epoch millis, compared internally instead of reparsing the ISO string.
    pub at_ms: i64,
}

/// Health state for a single (account, model) pair.
///
/// `health_score` is a pure function of `(success_count, fail_count,
/// consecutive_failures)` — see `HealthTracker::score` in `antigravity-core`
/// for the formula. `manual_disabled` is independent of failure history and
/// survives auto-recovery.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthRecord {
    pub success_count: u64,
    pub fail_count: u64,
    pub consecutive_failures: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_success_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<LastError>,
    pub health_score: f64,
    /// Set by the tracker on an auto-disable streak.
    pub disabled: bool,
    /// Operator override; survives auto-recovery.
    pub manual_disabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled_at_ms: Option<i64>,
}

impl Default for HealthRecord {
    fn default() -> Self {
        Self {
            success_count: 0,
            fail_count: 0,
            consecutive_failures: 0,
            last_success_ms: None,
            last_error: None,
            health_score: 100.0,
            disabled: false,
            manual_disabled: false,
            disabled_reason: None,
            disabled_at_ms: None,
        }
    }
}

impl HealthRecord {
    /// A fresh record for a pair that has never seen a result.
    pub fn fresh() -> Self {
        Self::default()
    }

    /// `true` unless auto-disabled or manually disabled.
    pub const fn is_usable(&self) -> bool {
        !self.disabled && !self.manual_disabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_record_scores_100() {
        let rec = HealthRecord::fresh();
        assert_eq!(rec.health_score, 100.0);
        assert!(rec.is_usable());
    }

    #[test]
    fn new_account_is_enabled_with_no_health() {
        let acc = Account::new("a@example.com");
        assert!(acc.enabled);
        assert!(acc.health.is_empty());
    }

    #[test]
    fn health_snapshot_defaults_for_unseen_model() {
        let acc = Account::new("a@example.com");
        let snap = acc.health_snapshot("gemini-2.5-pro");
        assert_eq!(snap.health_score, 100.0);
    }
}
