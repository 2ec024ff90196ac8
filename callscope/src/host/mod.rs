//! Host runtime contract.
//!
//! The monitored runtime, an interpreter with a PEP 669-style monitoring
//! facility, is reached exclusively through [`MonitoringHost`]. The host
//! provides what the engine needs and nothing more:
//!
//! - exclusive tool-slot acquisition keyed by a consumer identity
//! - per-event-kind callback registration (`None` restores the inert state)
//! - honoring the per-call [`DispatchSignal::Disable`] return by caching it
//!   and never delivering that (code unit, event kind) pair again
//! - the immediate caller's frame, handed to each callback
//!
//! Callbacks run synchronously inline on whichever thread triggered the
//! event and must return before the monitored program proceeds.

pub mod sim;

pub use sim::SimHost;

use std::sync::Arc;

use crate::domain::{
    AcquireError, CallerFrame, CodeUnit, DispatchSignal, EventKind, EventSet, ReturnValue, ToolId,
};

/// Receiver for monitoring events, registered with the host per event kind.
///
/// Implementations must tolerate concurrent invocation: a multi-threaded
/// monitored program fires callbacks from every one of its threads.
pub trait EventSink: Send + Sync {
    /// A monitored callable was entered.
    fn on_entry(&self, unit: &CodeUnit, caller: &CallerFrame) -> DispatchSignal;

    /// A monitored callable returned. `retval` is the runtime's return
    /// value, passed through opaquely.
    fn on_exit(
        &self,
        unit: &CodeUnit,
        caller: &CallerFrame,
        retval: ReturnValue<'_>,
    ) -> DispatchSignal;
}

/// The host runtime's event-monitoring facility.
pub trait MonitoringHost: Send + Sync {
    /// Claim an exclusive tool slot for `consumer`, subscribing to `events`.
    ///
    /// # Errors
    /// `AcquireError::SlotUnavailable` when every slot is held by another
    /// consumer. Collisions are reported, never silently ignored.
    fn acquire_tool(&self, consumer: &str, events: EventSet) -> Result<ToolId, AcquireError>;

    /// Install (`Some`) or remove (`None`) the callback for one event kind
    /// on an acquired slot. Removal restores the inert state.
    fn register_callback(&self, tool: ToolId, kind: EventKind, sink: Option<Arc<dyn EventSink>>);

    /// Return the slot. Must pair 1:1 with `acquire_tool`; the host drops
    /// any cached suppression state for the slot.
    fn release_tool(&self, tool: ToolId);
}
