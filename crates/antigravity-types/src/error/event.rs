//! Event log errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while recording, querying, or persisting events.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum EventError {
    /// A query filter was malformed (bad enum value, unparsable timestamp, ...).
    #[error("Invalid filter for {field}: {message}")]
    InvalidFilter { field: String, message: String },

    /// The on-disk snapshot could not be parsed. Never propagated to a
    /// `record()` caller — the recorder falls back to an empty log and logs
    /// this at error level instead.
    #[error("Event snapshot corrupt: {message}")]
    SnapshotCorrupt { message: String },

    /// The on-disk snapshot could not be written. The in-memory log remains
    /// authoritative; `dirty` stays set so the next tick retries.
    #[error("Event snapshot write failed: {message}")]
    SnapshotWriteFailed { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_filter_displays_field() {
        let err = EventError::InvalidFilter {
            field: "severity".to_string(),
            message: "unknown value 'critical'".to_string(),
        };
        assert!(format!("{err}").contains("severity"));
    }
}
