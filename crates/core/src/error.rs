//! Error taxonomy for lamina stores
//!
//! One error type serves the whole stack. `NotFound` is a routine signal (a
//! missing key, an invalid walker, an exhausted sequence) distinguished by the
//! predicate helpers; the remaining variants are genuine failures.
//!
//! Operations report errors through `Result` returns. Nothing in the library
//! panics on a contract violation: reading `key()`/`value()` from an invalid
//! walker yields an absent value, not an abort.

use crate::types::{display_key, Key};
use std::io;
use thiserror::Error;

/// Result type alias for lamina operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for lamina operations
#[derive(Debug, Error)]
pub enum Error {
    /// Routine absence signal: missing key, invalid walker, exhausted
    /// sequence. Non-fatal by convention.
    #[error("not found: {reason}{}", key_suffix(.key))]
    NotFound {
        /// What was looked for and not found
        reason: String,
        /// The key involved, when one exists
        key: Option<Key>,
    },

    /// An invariant violation observed in persisted data, e.g. a sequence or
    /// mapping record of the wrong size.
    #[error("corruption: {0}")]
    Corruption(String),

    /// The store cannot perform the requested operation.
    #[error("not supported: {0}")]
    NotSupported(String),

    /// The caller passed an argument the contract forbids.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A failure in the underlying storage engine.
    #[error("io error: {0}")]
    Io(String),
}

fn key_suffix(key: &Option<Key>) -> String {
    match key {
        Some(key) => format!(" (key {})", display_key(key)),
        None => String::new(),
    }
}

impl Error {
    /// Create a `NotFound` error without key context
    pub fn not_found(reason: impl Into<String>) -> Self {
        Error::NotFound {
            reason: reason.into(),
            key: None,
        }
    }

    /// Create a `NotFound` error for a specific key
    pub fn not_found_key(reason: impl Into<String>, key: impl Into<Key>) -> Self {
        Error::NotFound {
            reason: reason.into(),
            key: Some(key.into()),
        }
    }

    /// Create a `Corruption` error
    pub fn corruption(reason: impl Into<String>) -> Self {
        Error::Corruption(reason.into())
    }

    /// Create a `NotSupported` error
    pub fn not_supported(reason: impl Into<String>) -> Self {
        Error::NotSupported(reason.into())
    }

    /// Create an `InvalidArgument` error
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Error::InvalidArgument(reason.into())
    }

    /// Create an `Io` error
    pub fn io(reason: impl Into<String>) -> Self {
        Error::Io(reason.into())
    }

    /// Check whether this is the routine `NotFound` signal
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Check whether this reports corrupted persisted data
    pub fn is_corruption(&self) -> bool {
        matches!(self, Error::Corruption(_))
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display_without_key() {
        let err = Error::not_found("invalid walker");
        assert_eq!(err.to_string(), "not found: invalid walker");
        assert!(err.is_not_found());
        assert!(!err.is_corruption());
    }

    #[test]
    fn test_not_found_display_with_key() {
        let err = Error::not_found_key("deleted in transaction", b"user:1".to_vec());
        assert_eq!(
            err.to_string(),
            "not found: deleted in transaction (key user:1)"
        );
        assert!(err.is_not_found());
    }

    #[test]
    fn test_corruption_classification() {
        let err = Error::corruption("sequence entry size mismatch");
        assert!(err.is_corruption());
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("sequence entry size mismatch"));
    }

    #[test]
    fn test_from_io_error() {
        let err: Error = io::Error::new(io::ErrorKind::Other, "disk full").into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("disk full"));
    }
}
