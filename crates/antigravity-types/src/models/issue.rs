//! Operator-visible incidents rolled up from event patterns.

use serde::{Deserialize, Serialize};

/// Detection rule that produced an [`Issue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    RateLimitStreak,
    AuthFailure,
    ModelExhausted,
    HealthDegraded,
}

/// Lifecycle state of an [`Issue`]. `Resolved` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Active,
    Acknowledged,
    Resolved,
}

impl IssueStatus {
    /// Valid forward transitions, mirroring the circuit breaker's
    /// closed/open/half-open state table.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Active, Self::Acknowledged)
                | (Self::Active, Self::Resolved)
                | (Self::Acknowledged, Self::Resolved)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Medium,
    High,
}

/// An operator-visible incident derived from an event pattern.
///
/// One active issue exists per `(type, account?, model?)` key; `count` is
/// monotonic while active.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Issue {
    pub id: String,
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub severity: IssueSeverity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub first_seen_ms: i64,
    pub last_seen_ms: i64,
    pub count: u64,
    pub status: IssueStatus,
    #[serde(default)]
    pub details: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct IssueStats {
    pub active: u64,
    pub acknowledged: u64,
    pub resolved: u64,
    pub by_type: std::collections::HashMap<IssueType, u64>,
}
