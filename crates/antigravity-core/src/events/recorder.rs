//! Event recorder (C4): append-only structured event log with filter/stats
//! queries, on-disk snapshot, and pruning.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use antigravity_types::error::EventError;
use antigravity_types::models::{
    Event, EventFilter, EventPage, EventStats, EventType, Severity,
};

use super::broker::EventBroker;
use crate::modules::paths::write_atomic;

const EVENTS_FILE: &str = "events.json";

/// Append-only log of [`Event`]s, bounded by retention policy, persisted to
/// `events.json`, and broadcast to [`EventBroker`] subscribers on every
/// `record`.
pub struct EventRecorder {
    events: Mutex<Vec<Event>>,
    next_id: AtomicU64,
    dirty: AtomicBool,
    data_dir: PathBuf,
    broker: Arc<EventBroker>,
}

impl EventRecorder {
    pub fn new(data_dir: PathBuf, broker: Arc<EventBroker>) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            dirty: AtomicBool::new(false),
            data_dir,
            broker,
        }
    }

    /// Load `events.json`. A corrupt snapshot is replaced by an empty log
    /// with an error logged — never surfaced as a user-visible failure.
    pub fn load(data_dir: PathBuf, broker: Arc<EventBroker>) -> Self {
        let path = data_dir.join(EVENTS_FILE);
        let events: Vec<Event> = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::error!(error = %e, path = %path.display(), "event snapshot corrupt, starting empty");
                Vec::new()
            }),
            Err(_) => Vec::new(),
        };

        let next_id = events.iter().map(|e| e.id).max().map_or(1, |max| max + 1);
        Self {
            events: Mutex::new(events),
            next_id: AtomicU64::new(next_id),
            dirty: AtomicBool::new(false),
            data_dir,
            broker,
        }
    }

    /// Append a new event, assigning `id`/`timestamp`, broadcasting it
    /// outside the append critical section, and logging at a
    /// severity-appropriate level.
    #[allow(clippy::too_many_arguments)]
    pub fn record(
        &self,
        event_type: EventType,
        severity: Severity,
        account: Option<String>,
        model: Option<String>,
        request_id: Option<String>,
        message: String,
        details: serde_json::Value,
    ) -> Event {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let timestamp = chrono::Utc::now();
        let event = Event {
            id,
            timestamp,
            timestamp_ms: timestamp.timestamp_millis(),
            event_type,
            severity,
            account,
            model,
            request_id,
            message,
            details,
        };

        {
            let mut guard = self.events.lock().unwrap_or_else(|p| p.into_inner());
            guard.push(event.clone());
        }
        self.dirty.store(true, Ordering::Relaxed);

        match severity {
            Severity::Info => tracing::info!(event = event.event_type.as_str(), message = %event.message, "event recorded"),
            Severity::Warn => tracing::warn!(event = event.event_type.as_str(), message = %event.message, "event recorded"),
            Severity::Error => tracing::error!(event = event.event_type.as_str(), message = %event.message, "event recorded"),
        }

        self.broker.broadcast(event.clone());
        event
    }

    pub fn get_events(&self, filter: &EventFilter) -> EventPage {
        let guard = self.events.lock().unwrap_or_else(|p| p.into_inner());
        let mut matched: Vec<Event> = guard
            .iter()
            .filter(|e| matches(e, filter))
            .cloned()
            .collect();
        drop(guard);

        matched.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms).then_with(|| b.id.cmp(&a.id)));

        let total = matched.len();
        let offset = filter.offset.unwrap_or(0);
        let limit = filter.limit.unwrap_or(100);
        let page = matched.into_iter().skip(offset).take(limit).collect();

        EventPage { events: page, total }
    }

    pub fn get_stats(&self, since: Option<i64>, account: Option<&str>, model: Option<&str>) -> EventStats {
        let guard = self.events.lock().unwrap_or_else(|p| p.into_inner());
        let mut stats = EventStats::default();

        for event in guard.iter() {
            if let Some(since) = since {
                if event.timestamp_ms < since {
                    continue;
                }
            }
            if let Some(account) = account {
                if event.account.as_deref() != Some(account) {
                    continue;
                }
            }
            if let Some(model) = model {
                if event.model.as_deref() != Some(model) {
                    continue;
                }
            }

            *stats.by_type.entry(event.event_type).or_insert(0) += 1;
            *stats.by_severity.entry(event.severity).or_insert(0) += 1;
            if let Some(acc) = &event.account {
                *stats.by_account.entry(acc.clone()).or_insert(0) += 1;
            }
            if let Some(m) = &event.model {
                *stats.by_model.entry(m.clone()).or_insert(0) += 1;
            }

            if event.event_type == EventType::Request {
                stats.requests.total += 1;
                let success = event.details.get("success").and_then(|v| v.as_bool()).unwrap_or(false);
                if success {
                    stats.requests.success += 1;
                } else {
                    stats.requests.failed += 1;
                }
            }
        }

        stats.requests.success_rate = if stats.requests.total == 0 {
            100.0
        } else {
            (stats.requests.success as f64 / stats.requests.total as f64 * 1000.0).round() / 10.0
        };

        stats
    }

    /// Drop all events; persists immediately and returns the prior count.
    pub fn clear(&self) -> usize {
        let prior = {
            let mut guard = self.events.lock().unwrap_or_else(|p| p.into_inner());
            let len = guard.len();
            guard.clear();
            len
        };
        self.dirty.store(true, Ordering::Relaxed);
        if let Err(e) = self.snapshot() {
            tracing::error!(error = %e, "failed to persist events after clear");
        }
        prior
    }

    /// Drop events older than `retention_days`, then truncate to the newest
    /// `max_count`. Marks dirty if anything changed.
    pub fn prune(&self, retention_days: u32, max_count: usize) {
        let cutoff = chrono::Utc::now().timestamp_millis() - i64::from(retention_days) * 86_400_000;
        let mut guard = self.events.lock().unwrap_or_else(|p| p.into_inner());
        let before = guard.len();

        guard.retain(|e| e.timestamp_ms >= cutoff);
        if guard.len() > max_count {
            let drop_count = guard.len() - max_count;
            guard.drain(0..drop_count);
        }

        if guard.len() != before {
            self.dirty.store(true, Ordering::Relaxed);
        }
    }

    /// Snapshot the full log to disk if dirty. On write failure, logs and
    /// leaves `dirty` set for the next tick.
    pub fn snapshot(&self) -> Result<(), EventError> {
        if !self.dirty.load(Ordering::Relaxed) {
            return Ok(());
        }

        let events = self.events.lock().unwrap_or_else(|p| p.into_inner()).clone();
        let content = serde_json::to_string_pretty(&events).map_err(|e| EventError::SnapshotWriteFailed {
            message: e.to_string(),
        })?;

        write_atomic(&self.data_dir, EVENTS_FILE, &content).map_err(|e| {
            let err = EventError::SnapshotWriteFailed { message: e.to_string() };
            tracing::error!(error = %err, "event snapshot write failed");
            err
        })?;

        self.dirty.store(false, Ordering::Relaxed);
        Ok(())
    }

    /// Number of events currently held in memory.
    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The newest `limit` events, oldest-first — used for SSE history replay.
    pub fn tail(&self, limit: usize) -> Vec<Event> {
        let guard = self.events.lock().unwrap_or_else(|p| p.into_inner());
        let len = guard.len();
        let start = len.saturating_sub(limit);
        guard[start..].to_vec()
    }

    // ---- Convenience recorders (§4.4 table) ----

    pub fn record_rate_limit(&self, account: &str, model: &str, request_id: Option<String>, message: String) -> Event {
        self.record(
            EventType::RateLimit,
            Severity::Warn,
            Some(account.to_string()),
            Some(model.to_string()),
            request_id,
            message,
            serde_json::Value::Null,
        )
    }

    pub fn record_auth_failure(&self, account: &str, message: String) -> Event {
        self.record(
            EventType::AuthFailure,
            Severity::Error,
            Some(account.to_string()),
            None,
            None,
            message,
            serde_json::Value::Null,
        )
    }

    pub fn record_api_error(&self, account: &str, model: &str, request_id: Option<String>, message: String) -> Event {
        self.record(
            EventType::ApiError,
            Severity::Error,
            Some(account.to_string()),
            Some(model.to_string()),
            request_id,
            message,
            serde_json::Value::Null,
        )
    }

    pub fn record_fallback(&self, account: &str, from_model: &str, to_model: &str, request_id: Option<String>) -> Event {
        self.record(
            EventType::Fallback,
            Severity::Warn,
            Some(account.to_string()),
            Some(from_model.to_string()),
            request_id,
            format!("fell back from {from_model} to {to_model} for {account}"),
            serde_json::json!({"to_model": to_model}),
        )
    }

    pub fn record_account_switch(&self, from_account: &str, to_account: &str, model: &str, request_id: Option<String>) -> Event {
        self.record(
            EventType::AccountSwitch,
            Severity::Info,
            Some(to_account.to_string()),
            Some(model.to_string()),
            request_id,
            format!("switched from {from_account} to {to_account} for model {model}"),
            serde_json::json!({"from_account": from_account}),
        )
    }

    pub fn record_health_change(&self, account: &str, model: &str, disabled: bool, trigger: &str) -> Event {
        let (severity, action) = if disabled { (Severity::Error, "disabled") } else { (Severity::Info, "recovered") };
        self.record(
            EventType::HealthChange,
            severity,
            Some(account.to_string()),
            Some(model.to_string()),
            None,
            format!("{account}/{model} {action} (trigger: {trigger})"),
            serde_json::json!({"trigger": trigger, "disabled": disabled}),
        )
    }

    pub fn record_request(&self, account: &str, model: &str, request_id: Option<String>, success: bool) -> Event {
        let severity = if success { Severity::Info } else { Severity::Warn };
        let verb = if success { "succeeded" } else { "failed" };
        self.record(
            EventType::Request,
            severity,
            Some(account.to_string()),
            Some(model.to_string()),
            request_id,
            format!("{account}/{model} request {verb}"),
            serde_json::json!({"success": success}),
        )
    }

    pub fn record_system(&self, message: String) -> Event {
        self.record(EventType::System, Severity::Info, None, None, None, message, serde_json::Value::Null)
    }
}

fn matches(event: &Event, filter: &EventFilter) -> bool {
    if let Some(t) = filter.event_type {
        if event.event_type != t {
            return false;
        }
    }
    if let Some(account) = &filter.account {
        if event.account.as_deref() != Some(account.as_str()) {
            return false;
        }
    }
    if let Some(model) = &filter.model {
        if event.model.as_deref() != Some(model.as_str()) {
            return false;
        }
    }
    if let Some(severity) = filter.severity {
        if event.severity != severity {
            return false;
        }
    }
    if let Some(request_id) = &filter.request_id {
        if event.request_id.as_deref() != Some(request_id.as_str()) {
            return false;
        }
    }
    if let Some(since) = filter.since {
        if event.timestamp_ms < since {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (tempfile::TempDir, EventRecorder) {
        let dir = tempfile::tempdir().unwrap();
        let recorder = EventRecorder::new(dir.path().to_path_buf(), Arc::new(EventBroker::new()));
        (dir, recorder)
    }

    #[test]
    fn record_assigns_monotonic_ids() {
        let (_dir, rec) = recorder();
        let a = rec.record_request("a@example.com", "m", None, true);
        let b = rec.record_request("a@example.com", "m", None, false);
        assert!(b.id > a.id);
    }

    #[test]
    fn get_events_filters_and_paginates() {
        let (_dir, rec) = recorder();
        for _ in 0..5 {
            rec.record_rate_limit("a@example.com", "m", None, "hit".to_string());
        }
        rec.record_auth_failure("a@example.com", "bad token".to_string());

        let filter = EventFilter { event_type: Some(EventType::RateLimit), limit: Some(2), ..Default::default() };
        let page = rec.get_events(&filter);
        assert_eq!(page.total, 5);
        assert_eq!(page.events.len(), 2);
    }

    #[test]
    fn stats_success_rate_matches_spec_example() {
        let (_dir, rec) = recorder();
        rec.record_request("a@example.com", "m", None, true);
        rec.record_request("a@example.com", "m", None, true);
        rec.record_request("a@example.com", "m", None, false);

        let stats = rec.get_stats(Some(0), None, None);
        assert_eq!(stats.requests.total, 3);
        assert!((stats.requests.success_rate - 66.7).abs() < 0.01);
    }

    #[test]
    fn clear_persists_and_returns_prior_count() {
        let (dir, rec) = recorder();
        rec.record_system("boot".to_string());
        rec.record_system("boot2".to_string());
        let prior = rec.clear();
        assert_eq!(prior, 2);
        let content = std::fs::read_to_string(dir.path().join(EVENTS_FILE)).unwrap();
        assert_eq!(content.trim(), "[]");
    }

    #[test]
    fn snapshot_round_trips_through_reload() {
        let dir = tempfile::tempdir().unwrap();
        let broker = Arc::new(EventBroker::new());
        let rec = EventRecorder::new(dir.path().to_path_buf(), broker.clone());
        rec.record_system("one".to_string());
        rec.record_system("two".to_string());
        rec.snapshot().unwrap();

        let reloaded = EventRecorder::load(dir.path().to_path_buf(), broker);
        let page = reloaded.get_events(&EventFilter::default());
        assert_eq!(page.total, 2);
    }

    #[test]
    fn prune_drops_old_and_truncates_to_max_count() {
        let (_dir, rec) = recorder();
        for _ in 0..10 {
            rec.record_system("e".to_string());
        }
        rec.prune(7, 3);
        let page = rec.get_events(&EventFilter::default());
        assert_eq!(page.total, 3);
    }

    #[test]
    fn corrupt_snapshot_falls_back_to_empty_log() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(EVENTS_FILE), "{not json").unwrap();
        let reloaded = EventRecorder::load(dir.path().to_path_buf(), Arc::new(EventBroker::new()));
        assert_eq!(reloaded.get_events(&EventFilter::default()).total, 0);
    }
}
