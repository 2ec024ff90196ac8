//! Session lifecycle: acquisition, rollback, re-initialization.

use std::sync::Arc;

use callscope::backend::{BackendCall, RecordingBackend};
use callscope::config::FilterConfig;
use callscope::domain::{CodeUnit, EventSet, FiniError, InitError};
use callscope::host::{MonitoringHost, SimHost};
use callscope::monitor::Tracer;

fn tracer_on(host: Arc<SimHost>, backend: Arc<RecordingBackend>) -> Tracer {
    Tracer::new(host, backend, FilterConfig::default()).expect("valid config")
}

#[test]
fn test_slot_collision_reported() {
    let host = Arc::new(SimHost::new());

    // Saturate the facility with other consumers
    for i in 0..callscope::host::sim::MAX_TOOL_SLOTS {
        host.acquire_tool(&format!("other-{i}"), EventSet::ENTRY).expect("slot");
    }

    let backend = Arc::new(RecordingBackend::new());
    let tracer = tracer_on(host, backend.clone());

    let err = tracer.init_tracing().unwrap_err();
    assert!(matches!(err, InitError::SlotUnavailable(_)));
    assert!(err.to_string().contains("other-0"));

    // No partial session: the backend was never touched
    assert!(backend.calls().is_empty());
    assert!(matches!(tracer.fini_tracing(), Err(FiniError::NotActive)));
}

#[test]
fn test_backend_init_failure_rolls_back_slot() {
    let host = Arc::new(SimHost::new());
    let backend = Arc::new(RecordingBackend::failing_initialize());
    let tracer = Tracer::new(host.clone(), backend, FilterConfig::default()).expect("config");

    let err = tracer.init_tracing().unwrap_err();
    assert!(matches!(err, InitError::BackendInitFailed(_)));

    // The slot acquired before the failing step was released: another
    // consumer can claim the whole pool again.
    for i in 0..callscope::host::sim::MAX_TOOL_SLOTS {
        host.acquire_tool(&format!("verify-{i}"), EventSet::ENTRY)
            .expect("every slot free after rollback");
    }
}

#[test]
fn test_already_active_leaves_session_untouched() {
    let host = Arc::new(SimHost::new());
    let backend = Arc::new(RecordingBackend::new());
    let tracer = tracer_on(host.clone(), backend.clone());

    tracer.init_tracing().expect("init");
    assert!(matches!(tracer.init_tracing(), Err(InitError::AlreadyActive)));

    // Events still flow through the original registration
    host.call(&CodeUnit::new("work", "/app/main.py"), 5, || {});
    assert_eq!(backend.spans().len(), 2);

    tracer.fini_tracing().expect("fini");
}

#[test]
fn test_fini_without_init_performs_no_operations() {
    let host = Arc::new(SimHost::new());
    let backend = Arc::new(RecordingBackend::new());
    let tracer = tracer_on(host.clone(), backend.clone());

    assert!(matches!(tracer.fini_tracing(), Err(FiniError::NotActive)));
    assert!(backend.calls().is_empty());

    // The slot pool was never touched either
    for i in 0..callscope::host::sim::MAX_TOOL_SLOTS {
        host.acquire_tool(&format!("verify-{i}"), EventSet::ENTRY).expect("slot untouched");
    }
}

#[test]
fn test_fini_unregisters_before_release() {
    let host = Arc::new(SimHost::new());
    let backend = Arc::new(RecordingBackend::new());
    let tracer = tracer_on(host.clone(), backend.clone());

    tracer.init_tracing().expect("init");
    host.call(&CodeUnit::new("work", "/app/main.py"), 5, || {});
    tracer.fini_tracing().expect("fini");

    // Lifecycle calls bracket the spans
    let calls = backend.calls();
    assert_eq!(calls.first(), Some(&BackendCall::Initialize));
    assert_eq!(calls.last(), Some(&BackendCall::Finalize));

    // Events after shutdown go nowhere
    host.call(&CodeUnit::new("work", "/app/main.py"), 5, || {});
    assert_eq!(backend.spans().len(), 2);
}

#[test]
fn test_full_cycle_twice_on_same_tracer() {
    let host = Arc::new(SimHost::new());
    let backend = Arc::new(RecordingBackend::new());
    let tracer = tracer_on(host.clone(), backend.clone());

    for _ in 0..2 {
        tracer.init_tracing().expect("init");
        host.call(&CodeUnit::new("work", "/app/main.py"), 5, || {});
        tracer.fini_tracing().expect("fini");
    }

    assert_eq!(backend.spans().len(), 4);
}
