//! Config store (C1): typed key-value holding health thresholds and
//! retention knobs, with validated writes and a durable snapshot.

use std::path::PathBuf;
use std::sync::RwLock;

use antigravity_types::error::HealthError;
use antigravity_types::models::{AppConfig, HealthConfig, HealthConfigPatch};

use super::logger;
use super::paths::write_atomic;

const CONFIG_FILE: &str = "config.json";

/// Copy-on-write holder of the one [`AppConfig`] document for the process.
///
/// Readers always observe a complete prior version; `update` takes the write
/// lock and validates the whole patched config before mutating `guard`, so a
/// rejected patch never partially applies.
pub struct ConfigStore {
    data_dir: PathBuf,
    inner: RwLock<AppConfig>,
}

impl ConfigStore {
    /// Load `config.json` from `data_dir`, falling back to (and persisting)
    /// [`AppConfig::default`] if it is missing or unreadable.
    pub fn load(data_dir: PathBuf) -> Self {
        let path = data_dir.join(CONFIG_FILE);
        let config = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::error!(error = %e, path = %path.display(), "config snapshot corrupt, using defaults");
                AppConfig::default()
            }),
            Err(_) => {
                logger::log_info("config file not found, using defaults");
                AppConfig::default()
            }
        };

        let store = Self { data_dir, inner: RwLock::new(config) };
        if let Err(e) = store.persist() {
            tracing::error!(error = %e, "failed to persist initial config snapshot");
        }
        store
    }

    /// A defensive copy of the current config.
    pub fn get(&self) -> AppConfig {
        self.inner.read().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// A defensive copy of just the health thresholds, the subset every
    /// other subsystem actually reads.
    pub fn health(&self) -> HealthConfig {
        self.get().health
    }

    /// Validate `patch` applied against the current config as a whole, then
    /// durably write it. Returns every failing field on rejection; the
    /// config is left completely unchanged.
    pub fn update(&self, patch: &HealthConfigPatch) -> Result<AppConfig, HealthError> {
        let mut guard = self.inner.write().unwrap_or_else(|p| p.into_inner());
        let candidate_health = patch.apply(&guard.health);
        candidate_health.validate()?;

        guard.health = candidate_health;
        let snapshot = guard.clone();
        drop(guard);

        if let Err(e) = self.persist() {
            tracing::error!(error = %e, "config persisted in memory but snapshot write failed");
        }
        Ok(snapshot)
    }

    fn persist(&self) -> std::io::Result<()> {
        let snapshot = self.get();
        let content = serde_json::to_string_pretty(&snapshot)?;
        write_atomic(&self.data_dir, CONFIG_FILE, &content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ConfigStore {
        ConfigStore::load(tempfile::tempdir().unwrap().into_path())
    }

    #[test]
    fn default_config_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::load(dir.path().to_path_buf());
        assert_eq!(store.get().health, HealthConfig::default());
        assert!(dir.path().join(CONFIG_FILE).exists());
    }

    #[test]
    fn rejected_patch_leaves_config_unchanged() {
        let store = store();
        let before = store.get();
        let patch = HealthConfigPatch {
            warning_threshold: Some(10.0),
            critical_threshold: Some(90.0),
            ..Default::default()
        };
        let err = store.update(&patch).unwrap_err();
        assert!(matches!(err, HealthError::InvalidConfig { .. }));
        assert_eq!(store.get(), before);
    }

    #[test]
    fn accepted_patch_applies_and_persists() {
        let store = store();
        let patch = HealthConfigPatch {
            consecutive_failure_threshold: Some(3),
            ..Default::default()
        };
        let updated = store.update(&patch).unwrap();
        assert_eq!(updated.health.consecutive_failure_threshold, 3);
        assert_eq!(store.get().health.consecutive_failure_threshold, 3);
    }
}
