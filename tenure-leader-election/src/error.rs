//! Error types for leader election

/// Errors that can occur while configuring or starting an election
///
/// Failed acquisition attempts are not errors; they surface as `Standby`.
#[derive(Debug, thiserror::Error)]
pub enum ElectionError {
    /// The lock has an empty name
    #[error("Lock name must not be empty")]
    EmptyLockName,

    /// Poll interval is zero
    #[error("Poll interval must be greater than zero")]
    InvalidPollInterval,

    /// `start` was called twice
    #[error("Election service is already running")]
    AlreadyStarted,

    /// `start` was called after `stop`
    #[error("Election service has been stopped")]
    Stopped,

    /// `start` was called outside a tokio runtime
    #[error("No tokio runtime available to run the election loop")]
    NoRuntime,
}

/// Result type for election operations
pub type Result<T> = std::result::Result<T, ElectionError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_election_error_display() {
        let err = ElectionError::EmptyLockName;
        assert_eq!(format!("{}", err), "Lock name must not be empty");

        let err = ElectionError::AlreadyStarted;
        assert!(format!("{}", err).contains("already running"));
    }

    #[test]
    fn test_election_error_has_no_source() {
        assert!(ElectionError::Stopped.source().is_none());
        assert!(ElectionError::NoRuntime.source().is_none());
    }

    #[test]
    fn test_all_error_variants_display() {
        let variants = [
            ElectionError::EmptyLockName,
            ElectionError::InvalidPollInterval,
            ElectionError::AlreadyStarted,
            ElectionError::Stopped,
            ElectionError::NoRuntime,
        ];
        for variant in variants {
            assert!(!format!("{}", variant).is_empty());
        }
    }
}
