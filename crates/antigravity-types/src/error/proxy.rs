//! Router errors.
//!
//! The router's only failure mode is "nothing usable was found" — everything
//! else (upstream transport, translation) is an external collaborator's
//! concern and never surfaces through this type.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by [`crate::models`]-level routing decisions.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum ProxyError {
    /// No (account, model) pair satisfied the usability predicate.
    #[error("No usable account for model {model_id}: {reason}")]
    Unavailable { model_id: String, reason: String },
}

impl ProxyError {
    /// HTTP status code a caller should translate this error to.
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::Unavailable { .. } => 503,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_maps_to_503() {
        let err = ProxyError::Unavailable {
            model_id: "gemini-2.5-pro".to_string(),
            reason: "no_usable_account".to_string(),
        };
        assert_eq!(err.http_status_code(), 503);
        assert!(format!("{err}").contains("gemini-2.5-pro"));
    }
}
