//! Log-facade backend.
//!
//! Emits each span boundary at debug level, the headless counterpart of a
//! real profiling sink. Useful for smoke-testing an integration before the
//! actual backend is wired up.

use log::{debug, info};
use std::sync::atomic::{AtomicBool, Ordering};

use super::SpanBackend;
use crate::domain::BackendError;

#[derive(Default)]
pub struct LogBackend {
    initialized: AtomicBool,
}

impl LogBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_initialized(&self) -> Result<(), BackendError> {
        if self.initialized.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(BackendError::NotInitialized)
        }
    }
}

impl SpanBackend for LogBackend {
    fn initialize(&self) -> Result<(), BackendError> {
        self.initialized.store(true, Ordering::Release);
        info!("log backend ready");
        Ok(())
    }

    fn finalize(&self) -> Result<(), BackendError> {
        self.initialized.store(false, Ordering::Release);
        info!("log backend closed");
        Ok(())
    }

    fn start_span(&self, name: &str, source_path: &str, line: u32) -> Result<(), BackendError> {
        self.ensure_initialized()?;
        debug!("[START] {name} {source_path}:{line}");
        Ok(())
    }

    fn stop_span(&self, name: &str, source_path: &str, line: u32) -> Result<(), BackendError> {
        self.ensure_initialized()?;
        debug!("[STOP]  {name} {source_path}:{line}");
        Ok(())
    }
}
