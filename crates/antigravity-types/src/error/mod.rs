//! Typed error definitions for the Antigravity routing core.
//!
//! This module provides a structured error hierarchy with specific error
//! types for different domains. All errors are designed to be:
//!
//! - **Serializable** for API responses via serde
//! - **Displayable** for logging via Display trait
//! - **Matchable** for error handling logic via enum variants
//! - **Composable** via thiserror derive macros

mod account;
mod config;
mod event;
mod health;
mod proxy;

pub use account::AccountError;
pub use config::ConfigError;
pub use event::EventError;
pub use health::{FieldError, HealthError};
pub use proxy::ProxyError;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type that wraps all domain-specific errors.
///
/// Use this when you need a single error type that can represent
/// any Antigravity error.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq)]
#[serde(tag = "domain", content = "error")]
pub enum TypedError {
    /// Wraps an account-related error
    #[error("Account error: {0}")]
    Account(#[from] AccountError),

    /// Wraps a config-related error
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Wraps an event-log error
    #[error("Event error: {0}")]
    Event(#[from] EventError),

    /// Wraps a health-tracker error
    #[error("Health error: {0}")]
    Health(#[from] HealthError),

    /// Wraps a router error
    #[error("Router error: {0}")]
    Router(#[from] ProxyError),
}

/// Standard Result type using TypedError.
pub type Result<T> = std::result::Result<T, TypedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let err = TypedError::Account(AccountError::NotFound { email: "test-123".to_string() });

        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("Account"));
        assert!(json.contains("test-123"));

        let deserialized: TypedError = serde_json::from_str(&json).unwrap();
        assert_eq!(err, deserialized);
    }

    #[test]
    fn test_error_display() {
        let err = TypedError::Router(ProxyError::Unavailable {
            model_id: "claude-3-opus".to_string(),
            reason: "no_usable_account".to_string(),
        });

        let msg = format!("{err}");
        assert!(msg.contains("claude-3-opus"));
    }
}
