//! Health thresholds, retention knobs, and the top-level config document.

use serde::{Deserialize, Serialize};

use crate::error::{FieldError, HealthError};

/// Health thresholds and retention knobs (C1's validated domain).
///
/// Mutated only through [`HealthConfig::validate`]-gated writes; never
/// partially applied.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthConfig {
    /// Consecutive failures before auto-disable. Must be >= 1.
    pub consecutive_failure_threshold: u32,
    /// Score at/above which a pair counts as "healthy". 0-100, must be >= `critical_threshold`.
    pub warning_threshold: f64,
    /// Score below which a pair counts as "critical". 0-100.
    pub critical_threshold: f64,
    pub auto_disable_enabled: bool,
    /// Cooldown before `tick_recovery` clears an auto-disable. Must be > 0.
    pub auto_recovery_ms: i64,
    /// Bound on the event log, 1000-50000.
    pub event_max_count: usize,
    /// Retention window in days, 1-30.
    pub event_retention_days: u32,
    /// Fraction, 0.0-0.5, reserved for the (out-of-scope) quota-protection collaborator.
    pub quota_threshold: f64,
    pub quota_poll_interval_ms: i64,
    /// How long `health_degraded` must be sustained before an issue is raised.
    pub stale_issue_ms: i64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            consecutive_failure_threshold: 5,
            warning_threshold: 70.0,
            critical_threshold: 40.0,
            auto_disable_enabled: true,
            auto_recovery_ms: 5 * 60 * 1000,
            event_max_count: 10_000,
            event_retention_days: 7,
            quota_threshold: 0.1,
            quota_poll_interval_ms: 5 * 60 * 1000,
            stale_issue_ms: 10 * 60 * 1000,
        }
    }
}

impl HealthConfig {
    /// Validate all §3 constraints plus the cross-field `warning >= critical`
    /// rule. Returns every failing field, never just the first.
    pub fn validate(&self) -> Result<(), HealthError> {
        let mut errors = Vec::new();

        if self.consecutive_failure_threshold < 1 {
            errors.push(FieldError::new(
                "consecutive_failure_threshold",
                "must be >= 1",
            ));
        }
        if !(0.0..=100.0).contains(&self.warning_threshold) {
            errors.push(FieldError::new("warning_threshold", "must be in 0..=100"));
        }
        if !(0.0..=100.0).contains(&self.critical_threshold) {
            errors.push(FieldError::new("critical_threshold", "must be in 0..=100"));
        }
        if self.warning_threshold < self.critical_threshold {
            errors.push(FieldError::new(
                "warning_threshold",
                "must be >= critical_threshold",
            ));
        }
        if self.auto_recovery_ms <= 0 {
            errors.push(FieldError::new("auto_recovery_ms", "must be > 0"));
        }
        if !(1000..=50_000).contains(&self.event_max_count) {
            errors.push(FieldError::new(
                "event_max_count",
                "must be between 1000 and 50000",
            ));
        }
        if !(1..=30).contains(&self.event_retention_days) {
            errors.push(FieldError::new(
                "event_retention_days",
                "must be between 1 and 30",
            ));
        }
        if !(0.0..=0.5).contains(&self.quota_threshold) {
            errors.push(FieldError::new("quota_threshold", "must be in 0.0..=0.5"));
        }
        if self.quota_poll_interval_ms <= 0 {
            errors.push(FieldError::new("quota_poll_interval_ms", "must be > 0"));
        }
        if self.stale_issue_ms <= 0 {
            errors.push(FieldError::new("stale_issue_ms", "must be > 0"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(HealthError::InvalidConfig { errors })
        }
    }
}

/// A partial update to [`HealthConfig`]; every field is optional, unset
/// fields keep their current value. Applied, then validated as a whole —
/// never field-by-field, so a patch can never leave the config half-valid.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HealthConfigPatch {
    pub consecutive_failure_threshold: Option<u32>,
    pub warning_threshold: Option<f64>,
    pub critical_threshold: Option<f64>,
    pub auto_disable_enabled: Option<bool>,
    pub auto_recovery_ms: Option<i64>,
    pub event_max_count: Option<usize>,
    pub event_retention_days: Option<u32>,
    pub quota_threshold: Option<f64>,
    pub quota_poll_interval_ms: Option<i64>,
    pub stale_issue_ms: Option<i64>,
}

impl HealthConfigPatch {
    /// Apply onto a clone of `base`; does not mutate `base`.
    pub fn apply(&self, base: &HealthConfig) -> HealthConfig {
        let mut next = base.clone();
        if let Some(v) = self.consecutive_failure_threshold {
            next.consecutive_failure_threshold = v;
        }
        if let Some(v) = self.warning_threshold {
            next.warning_threshold = v;
        }
        if let Some(v) = self.critical_threshold {
            next.critical_threshold = v;
        }
        if let Some(v) = self.auto_disable_enabled {
            next.auto_disable_enabled = v;
        }
        if let Some(v) = self.auto_recovery_ms {
            next.auto_recovery_ms = v;
        }
        if let Some(v) = self.event_max_count {
            next.event_max_count = v;
        }
        if let Some(v) = self.event_retention_days {
            next.event_retention_days = v;
        }
        if let Some(v) = self.quota_threshold {
            next.quota_threshold = v;
        }
        if let Some(v) = self.quota_poll_interval_ms {
            next.quota_poll_interval_ms = v;
        }
        if let Some(v) = self.stale_issue_ms {
            next.stale_issue_ms = v;
        }
        next
    }
}

/// Bucket a health score falls into relative to the configured thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
    Disabled,
}

/// Bind address/port the HTTP surface reads once at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_address: "127.0.0.1".to_string(), port: 8045 }
    }
}

/// The top-level document persisted to `config.json`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(HealthConfig::default().validate().is_ok());
    }

    #[test]
    fn warning_below_critical_is_rejected() {
        let mut cfg = HealthConfig::default();
        cfg.warning_threshold = 10.0;
        cfg.critical_threshold = 40.0;
        let err = cfg.validate().unwrap_err();
        match err {
            HealthError::InvalidConfig { errors } => {
                assert!(errors.iter().any(|e| e.field == "warning_threshold"));
            }
            _ => panic!("expected InvalidConfig"),
        }
    }

    #[test]
    fn patch_leaves_unset_fields_unchanged() {
        let base = HealthConfig::default();
        let patch = HealthConfigPatch {
            consecutive_failure_threshold: Some(3),
            ..Default::default()
        };
        let patched = patch.apply(&base);
        assert_eq!(patched.consecutive_failure_threshold, 3);
        assert_eq!(patched.warning_threshold, base.warning_threshold);
    }

    #[test]
    fn invalid_patch_reports_every_failing_field() {
        let base = HealthConfig::default();
        let patch = HealthConfigPatch {
            warning_threshold: Some(-5.0),
            event_max_count: Some(10),
            ..Default::default()
        };
        let patched = patch.apply(&base);
        let err = patched.validate().unwrap_err();
        match err {
            HealthError::InvalidConfig { errors } => assert_eq!(errors.len(), 2),
            _ => panic!("expected InvalidConfig"),
        }
    }
}
