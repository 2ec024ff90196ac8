//! # Event Dispatch
//!
//! The two callback entry points the host runtime invokes on every function
//! entry and exit in the monitored program. This is the engine's critical
//! path: filter, then either forward the span boundary to the backend or
//! hand the runtime a permanent disable signal for the code unit.
//!
//! ## Failure Containment
//!
//! A backend failure is counted, debug-logged, and dropped. The signal
//! returned to the runtime is still `Continue` — a call in the monitored
//! program must never fail because tracing failed.

use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::backend::SpanBackend;
use crate::config::FilterConfig;
use crate::domain::{CallerFrame, CodeUnit, DispatchSignal, EventKind, ReturnValue};
use crate::filter::{decide, diagnostics, Decision};
use crate::host::EventSink;

/// Per-session dispatch counters.
///
/// Relaxed atomics: callbacks fire concurrently from every thread of the
/// monitored program and these are diagnostics, not synchronization.
#[derive(Default)]
pub struct DispatchStats {
    entries_emitted: AtomicU64,
    exits_emitted: AtomicU64,
    units_suppressed: AtomicU64,
    backend_errors: AtomicU64,
}

/// Copyable view of [`DispatchStats`] at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSnapshot {
    pub entries_emitted: u64,
    pub exits_emitted: u64,
    pub units_suppressed: u64,
    pub backend_errors: u64,
}

impl DispatchStats {
    #[must_use]
    pub fn snapshot(&self) -> DispatchSnapshot {
        DispatchSnapshot {
            entries_emitted: self.entries_emitted.load(Ordering::Relaxed),
            exits_emitted: self.exits_emitted.load(Ordering::Relaxed),
            units_suppressed: self.units_suppressed.load(Ordering::Relaxed),
            backend_errors: self.backend_errors.load(Ordering::Relaxed),
        }
    }
}

/// Encapsulates the per-event decision and forwarding logic.
///
/// Holds an immutable config snapshot taken at construction: concurrent
/// callbacks read it lock-free, and nothing can mutate it under them.
pub struct EventDispatcher {
    // Dependencies (readonly)
    config: Arc<FilterConfig>,
    backend: Arc<dyn SpanBackend>,

    // Diagnostics
    stats: DispatchStats,
}

impl EventDispatcher {
    #[must_use]
    pub fn new(config: Arc<FilterConfig>, backend: Arc<dyn SpanBackend>) -> Self {
        Self { config, backend, stats: DispatchStats::default() }
    }

    #[must_use]
    pub fn stats(&self) -> DispatchSnapshot {
        self.stats.snapshot()
    }

    /// Shared path for both callbacks: same filter, same disable signal,
    /// only the backend operation differs.
    fn dispatch(&self, kind: EventKind, unit: &CodeUnit, caller: &CallerFrame) -> DispatchSignal {
        let decision = decide(unit, &self.config);
        diagnostics().record_decision(unit, decision);

        if decision == Decision::SuppressPermanently {
            self.stats.units_suppressed.fetch_add(1, Ordering::Relaxed);
            return DispatchSignal::Disable;
        }

        let result = match kind {
            EventKind::Entry => {
                self.backend.start_span(&unit.name, &unit.source_path, caller.line)
            }
            EventKind::Exit => self.backend.stop_span(&unit.name, &unit.source_path, caller.line),
        };

        match result {
            Ok(()) => {
                let counter = match kind {
                    EventKind::Entry => &self.stats.entries_emitted,
                    EventKind::Exit => &self.stats.exits_emitted,
                };
                counter.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                // Dropped, never raised into the monitored call stack
                self.stats.backend_errors.fetch_add(1, Ordering::Relaxed);
                debug!("backend refused {kind} event for {unit}: {e}");
            }
        }

        DispatchSignal::Continue
    }
}

impl EventSink for EventDispatcher {
    fn on_entry(&self, unit: &CodeUnit, caller: &CallerFrame) -> DispatchSignal {
        self.dispatch(EventKind::Entry, unit, caller)
    }

    fn on_exit(
        &self,
        unit: &CodeUnit,
        caller: &CallerFrame,
        _retval: ReturnValue<'_>,
    ) -> DispatchSignal {
        self.dispatch(EventKind::Exit, unit, caller)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendCall, RecordingBackend};

    fn dispatcher_with(
        config: FilterConfig,
    ) -> (EventDispatcher, Arc<RecordingBackend>) {
        let backend = Arc::new(RecordingBackend::new());
        backend.initialize().expect("initialize");
        let dispatcher = EventDispatcher::new(Arc::new(config), backend.clone());
        (dispatcher, backend)
    }

    #[test]
    fn test_emitted_unit_reaches_backend_with_caller_line() {
        let (dispatcher, backend) = dispatcher_with(FilterConfig::default());
        let unit = CodeUnit::new("process", "/app/main.py");
        let caller = CallerFrame::at_line(42);

        assert_eq!(dispatcher.on_entry(&unit, &caller), DispatchSignal::Continue);
        assert_eq!(dispatcher.on_exit(&unit, &caller, ReturnValue::none()), DispatchSignal::Continue);

        assert_eq!(
            backend.spans(),
            vec![
                BackendCall::Start {
                    name: "process".to_owned(),
                    source_path: "/app/main.py".to_owned(),
                    line: 42
                },
                BackendCall::Stop {
                    name: "process".to_owned(),
                    source_path: "/app/main.py".to_owned(),
                    line: 42
                },
            ]
        );

        let stats = dispatcher.stats();
        assert_eq!(stats.entries_emitted, 1);
        assert_eq!(stats.exits_emitted, 1);
        assert_eq!(stats.units_suppressed, 0);
    }

    #[test]
    fn test_excluded_unit_disabled_without_backend_call() {
        let (dispatcher, backend) = dispatcher_with(FilterConfig::new().exclude_name("helper"));
        let unit = CodeUnit::new("helper", "/app/util.py");
        let caller = CallerFrame::at_line(7);

        assert_eq!(dispatcher.on_entry(&unit, &caller), DispatchSignal::Disable);
        assert_eq!(dispatcher.on_exit(&unit, &caller, ReturnValue::none()), DispatchSignal::Disable);

        assert!(backend.spans().is_empty());
        assert_eq!(dispatcher.stats().units_suppressed, 2);
    }

    #[test]
    fn test_backend_error_swallowed_and_counted() {
        let backend = Arc::new(RecordingBackend::new());
        // Not initialized: every span call fails
        let dispatcher = EventDispatcher::new(Arc::new(FilterConfig::default()), backend.clone());
        let unit = CodeUnit::new("process", "/app/main.py");
        let caller = CallerFrame::at_line(1);

        // Still Continue: the monitored program must not be affected
        assert_eq!(dispatcher.on_entry(&unit, &caller), DispatchSignal::Continue);
        assert_eq!(dispatcher.stats().backend_errors, 1);
        assert_eq!(dispatcher.stats().entries_emitted, 0);
    }
}
