//! Account registry (C2): the set of accounts the router may dispatch
//! through, each carrying its per-model health sub-records.

use std::path::PathBuf;

use dashmap::DashMap;
use dashmap::mapref::one::RefMut;

use antigravity_types::error::AccountError;
use antigravity_types::models::{Account, HealthRecord};

use crate::events::EventRecorder;
use crate::modules::logger;
use crate::modules::paths::write_atomic;

const ACCOUNTS_FILE: &str = "accounts.json";

/// CRUD over the account set, keyed by email for O(1) lookup.
///
/// Per-account mutation is serialized by `DashMap`'s entry-level locking; no
/// operation here ever holds two account entries at once.
pub struct AccountRegistry {
    accounts: DashMap<String, Account>,
    data_dir: PathBuf,
}

impl AccountRegistry {
    /// An empty registry rooted at `data_dir`, used by tests that don't need
    /// persistence.
    pub fn new(data_dir: PathBuf) -> Self {
        Self { accounts: DashMap::new(), data_dir }
    }

    /// Load `accounts.json` from `data_dir`. A missing or corrupt snapshot
    /// yields an empty registry with an error logged — never a user-visible
    /// failure, matching the event recorder's snapshot-load contract.
    pub fn load(data_dir: PathBuf) -> Self {
        let path = data_dir.join(ACCOUNTS_FILE);
        let accounts: Vec<Account> = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::error!(error = %e, path = %path.display(), "accounts snapshot corrupt, starting empty");
                Vec::new()
            }),
            Err(_) => Vec::new(),
        };

        let map = DashMap::new();
        for account in accounts {
            map.insert(account.email.clone(), account);
        }
        Self { accounts: map, data_dir }
    }

    /// Re-read the account set from the on-disk snapshot, discarding any
    /// in-memory state. Stands in for "reread from credential store": the
    /// real credential store is out of scope for this core.
    pub fn reload(&self) -> Result<(), AccountError> {
        let reloaded = Self::load(self.data_dir.clone());
        self.accounts.clear();
        for pair in reloaded.accounts {
            self.accounts.insert(pair.0, pair.1);
        }
        Ok(())
    }

    pub fn list(&self) -> Vec<Account> {
        self.accounts.iter().map(|e| e.value().clone()).collect()
    }

    pub fn get(&self, email: &str) -> Option<Account> {
        self.accounts.get(email).map(|e| e.clone())
    }

    pub fn add(&self, account: Account) -> Result<Account, AccountError> {
        if self.accounts.contains_key(&account.email) {
            return Err(AccountError::AlreadyExists { email: account.email });
        }
        let email = account.email.clone();
        self.accounts.insert(email.clone(), account);
        self.persist();
        Ok(self.get(&email).expect("just inserted"))
    }

    /// Removes the account. Cascades to its health records (they live inside
    /// the removed `Account`) and triggers no implicit event beyond a
    /// `system` event, recorded by the caller-supplied recorder.
    pub fn remove(&self, email: &str, events: &EventRecorder) -> Result<Account, AccountError> {
        let (_, account) =
            self.accounts.remove(email).ok_or_else(|| AccountError::NotFound { email: email.to_string() })?;
        self.persist();
        events.record_system(format!("account {email} removed"));
        Ok(account)
    }

    pub fn set_enabled(&self, email: &str, enabled: bool, events: &EventRecorder) -> Result<Account, AccountError> {
        let mut entry = self
            .accounts
            .get_mut(email)
            .ok_or_else(|| AccountError::NotFound { email: email.to_string() })?;
        entry.enabled = enabled;
        let snapshot = entry.clone();
        drop(entry);
        self.persist();
        let verb = if enabled { "enabled" } else { "disabled" };
        events.record_system(format!("account {email} {verb}"));
        Ok(snapshot)
    }

    /// A read-only snapshot of one (account, model) health record, or a
    /// fresh "never used" one if the pair has no history.
    pub fn health_snapshot(&self, email: &str, model_id: &str) -> Option<HealthRecord> {
        self.accounts.get(email).map(|e| e.health_snapshot(model_id))
    }

    /// Mutate the health record for `(email, model_id)` in place, creating
    /// it lazily if absent. Returns `None` if the account itself does not
    /// exist (the health tracker's "absent account yields no-op writes").
    pub(crate) fn with_health_mut<R>(
        &self,
        email: &str,
        model_id: &str,
        f: impl FnOnce(&mut HealthRecord) -> R,
    ) -> Option<R> {
        let mut entry: RefMut<'_, String, Account> = self.accounts.get_mut(email)?;
        let record = entry.health.entry(model_id.to_string()).or_insert_with(HealthRecord::fresh);
        let result = f(record);
        drop(entry);
        self.persist();
        Some(result)
    }

    /// Replace the health record(s) for an account with fresh zero records.
    /// `model_id = None` resets every tracked model for that account.
    pub(crate) fn reset_health(&self, email: &str, model_id: Option<&str>) -> bool {
        let Some(mut entry) = self.accounts.get_mut(email) else {
            return false;
        };
        match model_id {
            Some(model) => {
                entry.health.insert(model.to_string(), HealthRecord::fresh());
            }
            None => {
                for rec in entry.health.values_mut() {
                    *rec = HealthRecord::fresh();
                }
            }
        }
        drop(entry);
        self.persist();
        true
    }

    fn persist(&self) {
        let snapshot = self.list();
        match serde_json::to_string_pretty(&snapshot) {
            Ok(content) => {
                if let Err(e) = write_atomic(&self.data_dir, ACCOUNTS_FILE, &content) {
                    tracing::error!(error = %e, "failed to persist accounts snapshot");
                }
            }
            Err(e) => tracing::error!(error = %e, "failed to serialize accounts snapshot"),
        }
        logger::log_info("accounts snapshot updated");
    }
}
