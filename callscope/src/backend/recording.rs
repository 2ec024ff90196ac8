//! In-memory recording backend.
//!
//! Records every backend call in order so a test can assert on exactly what
//! the dispatcher forwarded. Failure injection covers the lifecycle
//! controller's rollback paths.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use super::SpanBackend;
use crate::domain::BackendError;

/// One observed backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Initialize,
    Finalize,
    Start { name: String, source_path: String, line: u32 },
    Stop { name: String, source_path: String, line: u32 },
}

#[derive(Default)]
pub struct RecordingBackend {
    calls: Mutex<Vec<BackendCall>>,
    initialized: AtomicBool,
    fail_initialize: bool,
}

impl RecordingBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose `initialize` always fails, for rollback tests.
    #[must_use]
    pub fn failing_initialize() -> Self {
        Self { fail_initialize: true, ..Self::default() }
    }

    /// Every call observed so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Only the span calls, skipping lifecycle ones.
    #[must_use]
    pub fn spans(&self) -> Vec<BackendCall> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, BackendCall::Start { .. } | BackendCall::Stop { .. }))
            .collect()
    }

    fn record(&self, call: BackendCall) {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(call);
    }
}

impl SpanBackend for RecordingBackend {
    fn initialize(&self) -> Result<(), BackendError> {
        if self.fail_initialize {
            return Err(BackendError::Rejected("initialize refused".to_owned()));
        }
        self.initialized.store(true, Ordering::Release);
        self.record(BackendCall::Initialize);
        Ok(())
    }

    fn finalize(&self) -> Result<(), BackendError> {
        self.initialized.store(false, Ordering::Release);
        self.record(BackendCall::Finalize);
        Ok(())
    }

    fn start_span(&self, name: &str, source_path: &str, line: u32) -> Result<(), BackendError> {
        if !self.initialized.load(Ordering::Acquire) {
            return Err(BackendError::NotInitialized);
        }
        self.record(BackendCall::Start {
            name: name.to_owned(),
            source_path: source_path.to_owned(),
            line,
        });
        Ok(())
    }

    fn stop_span(&self, name: &str, source_path: &str, line: u32) -> Result<(), BackendError> {
        if !self.initialized.load(Ordering::Acquire) {
            return Err(BackendError::NotInitialized);
        }
        self.record(BackendCall::Stop {
            name: name.to_owned(),
            source_path: source_path.to_owned(),
            line,
        });
        Ok(())
    }
}
