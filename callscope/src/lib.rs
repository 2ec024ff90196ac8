//! # callscope - Call-Boundary Instrumentation Engine
//!
//! callscope attaches zero-code-change performance tracing to programs
//! running on an interpreted runtime. It claims the runtime's monitoring
//! facility, receives every function entry and exit event, filters out the
//! noise per code unit, and forwards what survives as timed spans to an
//! external profiling backend.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Monitored Program                          │
//! │                 (interpreter + user code)                       │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ function entry/exit events
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │              Host Monitoring Facility (trait)                   │
//! │  • Exclusive tool slots  • Callback registration                │
//! │  • Caches per-unit disable signals                              │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ synchronous, inline callbacks
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   callscope (This Crate)                        │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐        │
//! │  │   Session    │──▶│    Event     │──▶│   Backend    │        │
//! │  │  Lifecycle   │   │  Dispatcher  │   │   (spans)    │        │
//! │  └──────────────┘   └──────┬───────┘   └──────────────┘        │
//! │                            │                                    │
//! │                            ▼                                    │
//! │                     ┌──────────────┐                            │
//! │                     │    Filter    │                            │
//! │                     │   (decide)   │                            │
//! │                     └──────────────┘                            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`monitor`]: The engine core
//!   - `session`: `Tracer` with `init_tracing` / `fini_tracing`, rollback
//!     on partial failure
//!   - `dispatcher`: the per-event callbacks (filter, forward, or disable)
//!
//! - [`filter`]: Pure per-code-unit decisions (exclusion list, system and
//!   frozen path prefixes) plus suppression diagnostics
//!
//! - [`host`]: The runtime collaborator contract (`MonitoringHost`,
//!   `EventSink`) and `SimHost`, an in-process reference host for tests
//!   and demos
//!
//! - [`backend`]: The span collaborator contract (`SpanBackend`) and
//!   forwarding adapters (channel, log, recording)
//!
//! - [`config`]: `FilterConfig`, populated before a session and frozen for
//!   its duration
//!
//! - [`domain`]: Core types (`CodeUnit`, `EventKind`, `DispatchSignal`)
//!   and the error taxonomy
//!
//! ## Key Concepts
//!
//! - **Code unit**: one callable definition, identified by name and
//!   defining source path
//! - **Span**: a paired start/stop record for one execution of a code unit
//! - **Tool slot**: the runtime's exclusive registration point for one
//!   monitoring consumer
//! - **Suppression**: the cached, irrevocable "never deliver this again"
//!   directive returned from a callback
//!
//! ## Typical Usage
//!
//! ```
//! use std::sync::Arc;
//! use callscope::backend::ChannelBackend;
//! use callscope::config::FilterConfig;
//! use callscope::domain::CodeUnit;
//! use callscope::host::SimHost;
//! use callscope::monitor::Tracer;
//!
//! let host = Arc::new(SimHost::new());
//! let (backend, spans) = ChannelBackend::bounded(64);
//! let config = FilterConfig::new().exclude_name("helper");
//!
//! let tracer = Tracer::new(host.clone(), Arc::new(backend), config)?;
//! tracer.init_tracing()?;
//!
//! host.call(&CodeUnit::new("work", "/app/main.py"), 17, || { /* ... */ });
//!
//! tracer.fini_tracing()?;
//! assert_eq!(spans.try_iter().count(), 2); // work start + stop
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod backend;
pub mod config;
pub mod domain;
pub mod filter;
pub mod host;
pub mod monitor;
