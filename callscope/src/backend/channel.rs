//! Channel-forwarding backend.
//!
//! Hands each span boundary to an external consumer over a bounded
//! crossbeam channel. The send is non-blocking: the monitored program's
//! forward progress can never hinge on how fast the consumer drains, so a
//! full channel drops the event and bumps a counter instead of waiting.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use super::{SpanBackend, SpanEvent, SpanPhase};
use crate::domain::BackendError;

pub struct ChannelBackend {
    tx: Sender<SpanEvent>,
    initialized: AtomicBool,
    dropped: AtomicU64,
}

impl ChannelBackend {
    /// Create a backend and the receiving end for the consumer, with room
    /// for `capacity` in-flight span events.
    #[must_use]
    pub fn bounded(capacity: usize) -> (Self, Receiver<SpanEvent>) {
        let (tx, rx) = bounded(capacity);
        (Self { tx, initialized: AtomicBool::new(false), dropped: AtomicU64::new(0) }, rx)
    }

    /// Span events dropped because the consumer lagged behind.
    #[must_use]
    pub fn dropped_events(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn forward(&self, event: SpanEvent) -> Result<(), BackendError> {
        if !self.initialized.load(Ordering::Acquire) {
            return Err(BackendError::NotInitialized);
        }
        match self.tx.try_send(event) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                // Consumer is slow; dropping is this backend's policy
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(TrySendError::Disconnected(_)) => Err(BackendError::Disconnected),
        }
    }
}

impl SpanBackend for ChannelBackend {
    fn initialize(&self) -> Result<(), BackendError> {
        self.initialized.store(true, Ordering::Release);
        Ok(())
    }

    fn finalize(&self) -> Result<(), BackendError> {
        self.initialized.store(false, Ordering::Release);
        Ok(())
    }

    fn start_span(&self, name: &str, source_path: &str, line: u32) -> Result<(), BackendError> {
        self.forward(SpanEvent::new(SpanPhase::Start, name, source_path, line))
    }

    fn stop_span(&self, name: &str, source_path: &str, line: u32) -> Result<(), BackendError> {
        self.forward(SpanEvent::new(SpanPhase::Stop, name, source_path, line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forwards_span_events_in_order() {
        let (backend, rx) = ChannelBackend::bounded(8);
        backend.initialize().expect("initialize");

        backend.start_span("foo", "/app/foo.py", 10).expect("start");
        backend.stop_span("foo", "/app/foo.py", 10).expect("stop");

        assert_eq!(rx.recv().expect("event").phase, SpanPhase::Start);
        let stop = rx.recv().expect("event");
        assert_eq!(stop.phase, SpanPhase::Stop);
        assert_eq!(stop.name, "foo");
        assert_eq!(stop.line, 10);
    }

    #[test]
    fn test_rejects_spans_before_initialize() {
        let (backend, _rx) = ChannelBackend::bounded(8);
        let err = backend.start_span("foo", "/app/foo.py", 1).unwrap_err();
        assert_eq!(err, BackendError::NotInitialized);
    }

    #[test]
    fn test_full_channel_drops_and_counts() {
        let (backend, rx) = ChannelBackend::bounded(1);
        backend.initialize().expect("initialize");

        backend.start_span("a", "/app/a.py", 1).expect("fits");
        backend.start_span("b", "/app/b.py", 2).expect("dropped, not an error");

        assert_eq!(backend.dropped_events(), 1);
        assert_eq!(rx.recv().expect("event").name, "a");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_disconnected_consumer_is_reported() {
        let (backend, rx) = ChannelBackend::bounded(1);
        backend.initialize().expect("initialize");
        drop(rx);

        let err = backend.stop_span("a", "/app/a.py", 1).unwrap_err();
        assert_eq!(err, BackendError::Disconnected);
    }
}
