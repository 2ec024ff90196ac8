//! Monitoring core modules
//!
//! This module contains the engine's hot path and lifecycle:
//! - Event dispatch (the two callbacks on every monitored call boundary)
//! - Session lifecycle (slot acquisition, registration, teardown)

pub mod dispatcher;
pub mod session;

// Re-export common types
pub use dispatcher::{DispatchSnapshot, EventDispatcher};
pub use session::Tracer;
