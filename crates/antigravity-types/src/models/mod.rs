//! Core domain models for the Antigravity routing core.
//!
//! This module contains all shared data structures used across the Antigravity ecosystem.

mod account;
mod config;
mod event;
mod issue;

// Re-export all models
pub use account::{Account, HealthRecord, LastError};
pub use config::{AppConfig, HealthConfig, HealthConfigPatch, HealthStatus, ServerConfig};
pub use event::{Event, EventFilter, EventPage, EventStats, EventType, RequestStats, Severity};
pub use issue::{Issue, IssueSeverity, IssueStats, IssueStatus, IssueType};
