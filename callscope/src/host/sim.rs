//! Simulated host runtime.
//!
//! An in-process [`MonitoringHost`] standing in for an interpreter, used by
//! the integration suite and the demo programs. It implements the parts of
//! the contract the engine depends on faithfully:
//!
//! - a fixed pool of tool slots, exhaustion reported as `SlotUnavailable`
//! - per-(unit, event-kind) suppression caching once a callback returns
//!   [`DispatchSignal::Disable`], cleared when the owning slot is released
//! - caller-frame line numbers delivered with every event
//!
//! Simulated programs are driven through [`SimHost::call`], which fires the
//! entry event, runs the nested body, and fires the exit event, giving the
//! same nesting order a real call stack would.

use log::debug;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use super::{EventSink, MonitoringHost};
use crate::domain::{
    AcquireError, CallerFrame, CodeUnit, DispatchSignal, EventKind, EventSet, ReturnValue, ToolId,
};

/// Number of concurrent monitoring consumers the facility supports,
/// matching the small fixed pools of real interpreter runtimes.
pub const MAX_TOOL_SLOTS: usize = 6;

struct SlotState {
    consumer: String,
    events: EventSet,
    entry_sink: Option<Arc<dyn EventSink>>,
    exit_sink: Option<Arc<dyn EventSink>>,
}

/// Key for the per-slot suppression cache: the exact code unit plus the
/// event kind the disable signal was returned for.
type SuppressedKey = (u32, String, String, EventKind);

pub struct SimHost {
    slots: Mutex<Vec<Option<SlotState>>>,
    suppressed: Mutex<HashSet<SuppressedKey>>,
    delivered: AtomicU64,
}

impl Default for SimHost {
    fn default() -> Self {
        Self::new()
    }
}

impl SimHost {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Mutex::new((0..MAX_TOOL_SLOTS).map(|_| None).collect()),
            suppressed: Mutex::new(HashSet::new()),
            delivered: AtomicU64::new(0),
        }
    }

    /// Events actually delivered to a callback (suppressed pairs and
    /// unsubscribed kinds don't count).
    #[must_use]
    pub fn delivered_events(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// Simulate one execution of `unit`: entry event, body, exit event.
    ///
    /// `caller_line` is the line the (simulated) caller is executing (the
    /// call site). It is reported for both boundary events, which is what
    /// a real frame inspection yields since the caller has not advanced.
    /// Nested `call`s inside `body` produce correctly nested events.
    pub fn call<R: 'static>(
        &self,
        unit: &CodeUnit,
        caller_line: u32,
        body: impl FnOnce() -> R,
    ) -> R {
        let caller = CallerFrame::at_line(caller_line);
        self.deliver(unit, EventKind::Entry, &caller, None);
        let out = body();
        self.deliver(unit, EventKind::Exit, &caller, Some(&out));
        out
    }

    /// Deliver one event to every subscribed tool, honoring the per-slot
    /// suppression cache and recording any new disable signals.
    fn deliver(
        &self,
        unit: &CodeUnit,
        kind: EventKind,
        caller: &CallerFrame,
        retval: Option<&dyn std::any::Any>,
    ) {
        // Collect targets first: callbacks may themselves drive nested
        // calls back into this host, so no lock is held while they run.
        let targets: Vec<(u32, Arc<dyn EventSink>)> = {
            let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            let suppressed = self.suppressed.lock().unwrap_or_else(PoisonError::into_inner);
            slots
                .iter()
                .enumerate()
                .filter_map(|(idx, slot)| {
                    let slot = slot.as_ref()?;
                    if !slot.events.contains(kind) {
                        return None;
                    }
                    #[allow(clippy::cast_possible_truncation)]
                    let tool = idx as u32;
                    let key =
                        (tool, unit.name.clone(), unit.source_path.clone(), kind);
                    if suppressed.contains(&key) {
                        return None;
                    }
                    let sink = match kind {
                        EventKind::Entry => slot.entry_sink.as_ref(),
                        EventKind::Exit => slot.exit_sink.as_ref(),
                    }?;
                    Some((tool, Arc::clone(sink)))
                })
                .collect()
        };

        for (tool, sink) in targets {
            self.delivered.fetch_add(1, Ordering::Relaxed);
            let signal = match kind {
                EventKind::Entry => sink.on_entry(unit, caller),
                EventKind::Exit => {
                    let rv = retval.map_or_else(ReturnValue::none, ReturnValue::of);
                    sink.on_exit(unit, caller, rv)
                }
            };
            if signal.is_disable() {
                debug!("caching disable for {unit} ({kind}) on tool:{tool}");
                self.suppressed
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert((tool, unit.name.clone(), unit.source_path.clone(), kind));
            }
        }
    }
}

impl MonitoringHost for SimHost {
    fn acquire_tool(&self, consumer: &str, events: EventSet) -> Result<ToolId, AcquireError> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(idx) = slots.iter().position(Option::is_none) {
            slots[idx] = Some(SlotState {
                consumer: consumer.to_owned(),
                events,
                entry_sink: None,
                exit_sink: None,
            });
            #[allow(clippy::cast_possible_truncation)]
            return Ok(ToolId(idx as u32));
        }

        let holders: Vec<&str> =
            slots.iter().flatten().map(|slot| slot.consumer.as_str()).collect();
        Err(AcquireError::SlotUnavailable { holders: holders.join(", ") })
    }

    fn register_callback(&self, tool: ToolId, kind: EventKind, sink: Option<Arc<dyn EventSink>>) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = slots.get_mut(tool.0 as usize).and_then(Option::as_mut) {
            match kind {
                EventKind::Entry => slot.entry_sink = sink,
                EventKind::Exit => slot.exit_sink = sink,
            }
        } else {
            debug!("register_callback for unheld {tool} ignored");
        }
    }

    fn release_tool(&self, tool: ToolId) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = slots.get_mut(tool.0 as usize) {
            *slot = None;
        }
        // Fresh sessions re-evaluate every unit
        self.suppressed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(holder, _, _, _)| *holder != tool.0);
    }
}
