//! Health tracker and config-validation errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single field that failed validation, surfaced to the config-update caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

/// Errors surfaced by the health tracker and config store.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum HealthError {
    /// A `HealthConfig` patch failed validation. Lists every failing field;
    /// the patch is never partially applied.
    #[error("Invalid health config: {} field(s) failed validation", errors.len())]
    InvalidConfig { errors: Vec<FieldError> },

    /// Internal plumbing only — reads/writes against an absent account are
    /// no-ops per the tracker's failure semantics, this variant never
    /// reaches a caller.
    #[error("Unknown account: {email}")]
    UnknownAccount { email: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_config_counts_errors() {
        let err = HealthError::InvalidConfig {
            errors: vec![
                FieldError::new("warning_threshold", "must be >= critical_threshold"),
                FieldError::new("event_max_count", "must be between 1000 and 50000"),
            ],
        };
        assert!(format!("{err}").contains("2 field"));
    }
}
