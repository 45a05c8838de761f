//! # Antigravity Core
//!
//! Routing and reliability core for the Antigravity proxy: account registry,
//! per-(account, model) health tracking, the structured event log and its
//! live broker, issue aggregation, and the router that ties them together.
//!
//! ```text
//!                antigravity-types
//!                        │
//!                        ▼
//!                antigravity-core (this crate)
//!                        │
//!                        ▼
//!                antigravity-server
//! ```
//!
//! Translation of wire protocols and upstream HTTP transport are explicitly
//! out of scope here — see [`router::Translator`] and [`router::UpstreamClient`]
//! for the seams a caller would fill in.

pub mod events;
pub mod health;
pub mod issues;
pub mod metrics;
pub mod modules;
pub mod registry;
pub mod router;

pub use antigravity_types::{
    error::{AccountError, ConfigError, EventError, HealthError, ProxyError, Result, TypedError},
    models,
};

pub use events::{EventBroker, EventRecorder};
pub use health::HealthTracker;
pub use issues::IssueAggregator;
pub use modules::config::ConfigStore;
pub use registry::AccountRegistry;
pub use router::Router;
