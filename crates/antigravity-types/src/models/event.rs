//! Structured event log entries.

use serde::{Deserialize, Serialize};

/// The kind of occurrence an [`Event`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Request,
    RateLimit,
    AuthFailure,
    ApiError,
    Fallback,
    AccountSwitch,
    HealthChange,
    System,
}

/// Event severity, independent of the HTTP status a caller might map it to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

/// An immutable, structured record of a single system occurrence.
///
/// Assigned an `id` and `timestamp` by the recorder at append time; never
/// constructed directly by callers (see `EventRecorder::record` in
/// `antigravity-core`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub id: u64,
    /// ISO-8601 UTC, for the wire.
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Epoch millis mirror of `timestamp`, compared in hot loops instead of
    /// reparsing the ISO string.
    pub timestamp_ms: i64,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub message: String,
    #[serde(default)]
    pub details: serde_json::Value,
}

/// Filters accepted by `EventRecorder::get_events`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventFilter {
    #[serde(rename = "type")]
    pub event_type: Option<EventType>,
    pub account: Option<String>,
    pub model: Option<String>,
    pub severity: Option<Severity>,
    pub request_id: Option<String>,
    /// Epoch millis lower bound, inclusive.
    pub since: Option<i64>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

/// A page of events plus the pre-pagination total.
#[derive(Debug, Clone, Serialize)]
pub struct EventPage {
    pub events: Vec<Event>,
    pub total: usize,
}

/// Aggregate counts over a filtered window, as returned by `get_stats`.
#[derive(Debug, Clone, Serialize, Default)]
pub struct EventStats {
    pub by_type: std::collections::HashMap<EventType, u64>,
    pub by_severity: std::collections::HashMap<Severity, u64>,
    pub by_account: std::collections::HashMap<String, u64>,
    pub by_model: std::collections::HashMap<String, u64>,
    pub requests: RequestStats,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct RequestStats {
    pub total: u64,
    pub success: u64,
    pub failed: u64,
    /// `round(success/total * 1000) / 10`; `100.0` when `total == 0`.
    pub success_rate: f64,
}

impl EventType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::RateLimit => "rate_limit",
            Self::AuthFailure => "auth_failure",
            Self::ApiError => "api_error",
            Self::Fallback => "fallback",
            Self::AccountSwitch => "account_switch",
            Self::HealthChange => "health_change",
            Self::System => "system",
        }
    }
}

impl Severity {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_round_trips_through_json() {
        let json = serde_json::to_string(&EventType::RateLimit).unwrap();
        assert_eq!(json, "\"rate_limit\"");
        let back: EventType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, EventType::RateLimit);
    }

    #[test]
    fn severity_ordering_is_info_lt_warn_lt_error() {
        assert!(Severity::Info < Severity::Warn);
        assert!(Severity::Warn < Severity::Error);
    }
}
