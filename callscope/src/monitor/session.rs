//! # Session Lifecycle
//!
//! Wires the engine together at startup and tears it down at shutdown:
//!
//! - [`Tracer::init_tracing`] - acquire the tool slot, initialize the
//!   backend, register the dispatcher's callbacks
//! - [`Tracer::fini_tracing`] - unregister, finalize the backend, release
//!   the slot
//!
//! A multi-step init that fails partway must undo what it already did; the
//! slot is held by an RAII guard until every later step has succeeded, so
//! no failure leaves a partial session behind.

use log::{info, warn};
use std::sync::{Arc, Mutex, PoisonError};

use super::dispatcher::{DispatchSnapshot, EventDispatcher};
use crate::backend::SpanBackend;
use crate::config::FilterConfig;
use crate::domain::{ConfigError, EventKind, EventSet, FiniError, InitError, ToolId};
use crate::host::MonitoringHost;

/// Consumer identity presented to the host when claiming a tool slot.
const CONSUMER_NAME: &str = "callscope";

/// Releases an acquired tool slot unless disarmed.
///
/// Armed between acquisition and the end of a successful `init_tracing`,
/// which guarantees release on every early-error path in between.
struct SlotGuard<'a> {
    host: &'a dyn MonitoringHost,
    tool: ToolId,
    armed: bool,
}

impl<'a> SlotGuard<'a> {
    fn new(host: &'a dyn MonitoringHost, tool: ToolId) -> Self {
        Self { host, tool, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!("rolling back partial session, releasing {}", self.tool);
            self.host.release_tool(self.tool);
        }
    }
}

/// State held while a session is active.
struct ActiveSession {
    tool: ToolId,
    dispatcher: Arc<EventDispatcher>,
}

/// The lifecycle controller: owns the host and backend handles plus the
/// config snapshot, and tracks at most one active session.
///
/// `init_tracing` / `fini_tracing` are serialized by an internal mutex;
/// racing calls fail cleanly (`AlreadyActive` / `NotActive`) instead of
/// double-registering. Dropping a `Tracer` mid-session tears the session
/// down best-effort, but `fini_tracing` is the supported path.
pub struct Tracer {
    host: Arc<dyn MonitoringHost>,
    backend: Arc<dyn SpanBackend>,
    config: Arc<FilterConfig>,
    session: Mutex<Option<ActiveSession>>,
}

impl Tracer {
    /// Validate `config` and capture it as the session snapshot.
    ///
    /// # Errors
    /// `ConfigError` for degenerate filter values (see
    /// [`FilterConfig::validate`]).
    pub fn new(
        host: Arc<dyn MonitoringHost>,
        backend: Arc<dyn SpanBackend>,
        config: FilterConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { host, backend, config: Arc::new(config), session: Mutex::new(None) })
    }

    /// Start the monitoring session.
    ///
    /// # Errors
    /// - `InitError::AlreadyActive` if a session is running (it is left
    ///   untouched)
    /// - `InitError::SlotUnavailable` if another consumer holds the
    ///   facility's slots
    /// - `InitError::BackendInitFailed` if the backend refuses; the slot
    ///   acquired in the meantime is released before returning
    pub fn init_tracing(&self) -> Result<(), InitError> {
        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        if session.is_some() {
            return Err(InitError::AlreadyActive);
        }

        let tool = self.host.acquire_tool(CONSUMER_NAME, EventSet::ENTRY | EventSet::EXIT)?;
        let mut guard = SlotGuard::new(self.host.as_ref(), tool);

        self.backend.initialize().map_err(InitError::BackendInitFailed)?;

        let dispatcher =
            Arc::new(EventDispatcher::new(Arc::clone(&self.config), Arc::clone(&self.backend)));
        self.host.register_callback(tool, EventKind::Entry, Some(dispatcher.clone()));
        self.host.register_callback(tool, EventKind::Exit, Some(dispatcher.clone()));

        guard.disarm();
        *session = Some(ActiveSession { tool, dispatcher });
        info!("✓ Monitoring session active on {tool}");
        Ok(())
    }

    /// Stop the monitoring session.
    ///
    /// Backend finalize failure is logged and teardown continues — the
    /// slot must be returned regardless.
    ///
    /// # Errors
    /// `FiniError::NotActive` if no session is running; no backend or
    /// slot operation is performed in that case.
    pub fn fini_tracing(&self) -> Result<(), FiniError> {
        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(active) = session.take() else {
            return Err(FiniError::NotActive);
        };

        self.teardown(&active);
        info!("✓ Monitoring session closed");
        Ok(())
    }

    /// Dispatch counters of the active session, if any.
    #[must_use]
    pub fn dispatch_stats(&self) -> Option<DispatchSnapshot> {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|active| active.dispatcher.stats())
    }

    fn teardown(&self, active: &ActiveSession) {
        self.host.register_callback(active.tool, EventKind::Entry, None);
        self.host.register_callback(active.tool, EventKind::Exit, None);
        if let Err(e) = self.backend.finalize() {
            warn!("backend finalize failed: {e}");
        }
        self.host.release_tool(active.tool);
    }
}

impl Drop for Tracer {
    fn drop(&mut self) {
        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(active) = session.take() {
            warn!("tracer dropped with an active session, tearing down");
            self.teardown(&active);
        }
    }
}
