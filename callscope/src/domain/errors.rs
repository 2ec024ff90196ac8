//! Structured error types for callscope
//!
//! Using thiserror for automatic Display implementation and error chaining.
//!
//! Lifecycle failures (`InitError`, `FiniError`) surface synchronously to
//! whoever drives the session. Per-event failures (`BackendError`) are
//! swallowed at the dispatcher boundary — a call in the monitored program
//! must never fail because tracing failed.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AcquireError {
    #[error("monitoring tool slot unavailable (in use by {holders})")]
    SlotUnavailable { holders: String },
}

#[derive(Error, Debug)]
pub enum InitError {
    #[error(transparent)]
    SlotUnavailable(#[from] AcquireError),

    #[error("backend initialization failed: {0}")]
    BackendInitFailed(#[source] BackendError),

    #[error("a monitoring session is already active")]
    AlreadyActive,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FiniError {
    #[error("no monitoring session is active")]
    NotActive,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("backend not initialized")]
    NotInitialized,

    #[error("span consumer disconnected")]
    Disconnected,

    #[error("backend rejected span: {0}")]
    Rejected(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("excluded names contain an empty string")]
    EmptyExcludedName,

    #[error("path prefix at index {0} is empty (would suppress every code unit)")]
    EmptyPathPrefix(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_error_display() {
        let err = AcquireError::SlotUnavailable { holders: "coverage-tool".to_string() };
        assert_eq!(err.to_string(), "monitoring tool slot unavailable (in use by coverage-tool)");
    }

    #[test]
    fn test_init_error_wraps_acquire_error() {
        let err = InitError::from(AcquireError::SlotUnavailable { holders: "debugger".to_string() });
        assert!(matches!(err, InitError::SlotUnavailable(_)));
        // transparent: the message is the acquire error's own
        assert!(err.to_string().contains("debugger"));
    }

    #[test]
    fn test_backend_init_failure_chains_source() {
        use std::error::Error as _;

        let err = InitError::BackendInitFailed(BackendError::NotInitialized);
        assert!(err.to_string().contains("backend initialization failed"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_fini_error_display() {
        assert_eq!(FiniError::NotActive.to_string(), "no monitoring session is active");
    }
}
