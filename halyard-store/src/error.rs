//! Error types for the halyard-store crate.

use std::io;

use thiserror::Error;

use crate::RecordId;

/// Top-level store error type.
///
/// All store operations return this error type, which categorizes failures
/// into I/O, serialization, and logical errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O operation failed (file read/write/delete).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Document not found in the collection.
    #[error("document not found: {0}")]
    NotFound(RecordId),

    /// A singleton collection held no document at all.
    #[error("expected a single document in '{0}', found none")]
    MissingSingleton(&'static str),

    /// Internal error (lock poisoning, etc.).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Specialized `Result` type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

// Convenience conversion for lock poisoning
impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        Self::Internal(format!("lock poisoned: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let store_err: StoreError = io_err.into();
        assert!(matches!(store_err, StoreError::Io(_)));
        assert!(store_err.to_string().contains("file not found"));
    }

    #[test]
    fn missing_singleton_display() {
        let err = StoreError::MissingSingleton("email_settings");
        assert_eq!(
            err.to_string(),
            "expected a single document in 'email_settings', found none"
        );
    }
}
