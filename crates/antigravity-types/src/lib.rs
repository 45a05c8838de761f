//! # Antigravity Types
//!
//! Core types, models, and error definitions for the Antigravity routing core.
//!
//! This crate provides the foundational type system:
//!
//! - **`error`** - Typed error hierarchy for accounts, config, health, and events
//! - **`models`** - Domain models (Account, HealthRecord, Event, Issue, config)
//!
//! ## Architecture role
//!
//! `antigravity-types` sits at the bottom of the dependency graph:
//!
//! ```text
//!                antigravity-types (this crate)
//!                        │
//!                        ▼
//!                antigravity-core
//!                        │
//!                        ▼
//!                antigravity-server
//! ```
//!
//! All types are designed to be:
//! - **Serializable** via serde for the HTTP API
//! - **Clone** for cheap sharing across async boundaries
//! - **PartialEq** for testing and comparison

pub mod error;
pub mod models;

pub use error::{AccountError, ConfigError, EventError, HealthError, Result, TypedError};

pub use models::{
    Account, AppConfig, Event, EventType, HealthConfig, HealthRecord, HealthStatus, Issue,
    IssueStatus, IssueType, Severity,
};
