//! Error types for lock handles

use std::io;
use std::path::PathBuf;

/// Errors that can occur while constructing or inspecting a lock
///
/// A busy lock is not an error: `acquire` reports it as `Ok(false)`.
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    /// Lock name was empty
    #[error("Lock name must not be empty")]
    EmptyName,

    /// Storage I/O failed
    #[error("Lock storage error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Lock record could not be decoded
    #[error("Invalid lock record at {}: {source}", path.display())]
    Record {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Backend-specific failure
    #[error("{message}")]
    Other { message: String },
}

impl LockError {
    /// Create an Io error for a record path
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a Record error for a record path
    pub fn record(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Record {
            path: path.into(),
            source,
        }
    }

    /// Create an Other error from a message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }
}

/// Result type for lock operations
pub type Result<T> = std::result::Result<T, LockError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_lock_error_display() {
        let err = LockError::EmptyName;
        assert_eq!(format!("{}", err), "Lock name must not be empty");

        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err = LockError::io("/tmp/leader.lock", io_err);
        let message = format!("{}", err);
        assert!(message.contains("Lock storage error"));
        assert!(message.contains("leader.lock"));
    }

    #[test]
    fn test_lock_error_source() {
        let err = LockError::EmptyName;
        assert!(err.source().is_none());

        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let err = LockError::io("/tmp/leader.lock", io_err);
        assert!(err.source().is_some());

        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err = LockError::record("/tmp/leader.lock", json_err);
        assert!(err.source().is_some());
    }

    #[test]
    fn test_other_error_message() {
        let err = LockError::other("row vanished");
        assert_eq!(err.to_string(), "row vanished");
    }
}
