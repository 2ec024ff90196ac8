//! Span-recording backend contract and bundled adapters.
//!
//! The engine does not record spans itself — it forwards each surviving
//! entry/exit event to a [`SpanBackend`]. Pairing starts with stops, span
//! stacking, timing: all backend business. The engine retains nothing past
//! the call.
//!
//! Backend implementations must not themselves be code units known to the
//! host's monitoring facility, or the dispatcher would instrument its own
//! backend calls recursively. Native backends (everything in this module)
//! satisfy that by construction.
//!
//! Bundled adapters:
//!
//! - [`ChannelBackend`] - forwards spans over a bounded channel to an
//!   external consumer, dropping (and counting) when the consumer lags
//! - [`LogBackend`] - emits span boundaries through the `log` facade
//! - [`RecordingBackend`] - in-memory record of every backend call, for
//!   tests and demos

pub mod channel;
pub mod logging;
pub mod recording;

pub use channel::ChannelBackend;
pub use logging::LogBackend;
pub use recording::{BackendCall, RecordingBackend};

use crate::domain::BackendError;

/// External profiling backend consumed by the dispatcher and the lifecycle
/// controller.
///
/// All methods take `&self`: span calls fire concurrently from whichever
/// threads the monitored program runs on.
pub trait SpanBackend: Send + Sync {
    /// Called once by `init_tracing` before any span is forwarded.
    fn initialize(&self) -> Result<(), BackendError>;

    /// Called once by `fini_tracing`; no spans are forwarded afterwards.
    fn finalize(&self) -> Result<(), BackendError>;

    /// A surviving entry event: `line` is the caller's line at call time.
    fn start_span(&self, name: &str, source_path: &str, line: u32) -> Result<(), BackendError>;

    /// A surviving exit event for the same `(name, source_path)`.
    fn stop_span(&self, name: &str, source_path: &str, line: u32) -> Result<(), BackendError>;
}

/// Which boundary of a span an event marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanPhase {
    Start,
    Stop,
}

/// Owned span-boundary record, the channel backend's wire type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanEvent {
    pub phase: SpanPhase,
    pub name: String,
    pub source_path: String,
    /// Caller's line at the moment of the call
    pub line: u32,
}

impl SpanEvent {
    #[must_use]
    pub fn new(phase: SpanPhase, name: &str, source_path: &str, line: u32) -> Self {
        Self { phase, name: name.to_owned(), source_path: source_path.to_owned(), line }
    }
}
