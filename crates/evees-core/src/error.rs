//! Error types for the content store and perspective index

use thiserror::Error;

/// Errors surfaced by [`ContentStore`](crate::ContentStore) and
/// [`PerspectiveIndex`](crate::PerspectiveIndex) implementations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Requested object or perspective does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Backend temporarily unreachable; retrying is the caller's concern
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// I/O error in a file-backed store
    #[error("I/O error: {0}")]
    Io(String),

    /// Encoding or decoding failure
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Stored bytes do not hash to the requested address
    #[error("Integrity error: expected {expected}, got {actual}")]
    Integrity { expected: String, actual: String },
}

impl StoreError {
    /// Create a new NotFound error
    pub fn not_found(item: impl Into<String>) -> Self {
        Self::NotFound(item.into())
    }

    /// Create a new Unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Create a new Serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

impl From<postcard::Error> for StoreError {
    fn from(err: postcard::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let err = StoreError::not_found("abc123");
        assert!(err.is_not_found());
        assert!(err.to_string().contains("abc123"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: StoreError = io_err.into();
        assert!(matches!(err, StoreError::Io(_)));
        assert!(!err.is_not_found());
    }
}
