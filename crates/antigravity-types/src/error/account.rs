//! Account registry errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during account registry operations.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum AccountError {
    /// Account with given email not found
    #[error("Account not found: {email}")]
    NotFound { email: String },

    /// Account already exists (duplicate email on `add`)
    #[error("Account already exists: {email}")]
    AlreadyExists { email: String },

    /// Account storage/filesystem error (credential reload, snapshot I/O)
    #[error("Account storage error: {message}")]
    StorageError { message: String },

    /// Account validation error (e.g. empty email)
    #[error("Validation error for {field}: {message}")]
    ValidationError { field: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_displays_email() {
        let err = AccountError::NotFound { email: "a@example.com".to_string() };
        assert!(format!("{err}").contains("a@example.com"));
    }
}
