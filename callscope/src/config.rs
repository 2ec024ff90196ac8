//! Filter configuration for a monitoring session.
//!
//! Populated by the embedder before tracing starts (how it gets populated,
//! from files or environment, is the embedder's concern). The
//! lifecycle controller snapshots it behind an `Arc` at session start, so
//! during an active session it is read-only and lock-free.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::ConfigError;

/// Per-session filter configuration.
///
/// Serde derives let embedders keep this in a JSON config file; every field
/// defaults so partial documents parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Exact callable names that must never produce spans
    #[serde(default)]
    pub excluded_names: HashSet<String>,

    /// Whether callables under system/frozen paths are instrumented at all
    #[serde(default)]
    pub internal_timers_enabled: bool,

    /// Source-path prefixes of the runtime's own library tree
    #[serde(default)]
    pub system_path_prefixes: Vec<String>,

    /// Source-path prefixes of frozen/bootstrap modules (e.g. `<frozen`)
    #[serde(default)]
    pub frozen_path_prefixes: Vec<String>,
}

impl FilterConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an exact-name exclusion.
    #[must_use]
    pub fn exclude_name(mut self, name: impl Into<String>) -> Self {
        self.excluded_names.insert(name.into());
        self
    }

    /// Enable or disable spans for system/frozen code units.
    #[must_use]
    pub fn internal_timers(mut self, enabled: bool) -> Self {
        self.internal_timers_enabled = enabled;
        self
    }

    /// Add a system library path prefix.
    #[must_use]
    pub fn system_path(mut self, prefix: impl Into<String>) -> Self {
        self.system_path_prefixes.push(prefix.into());
        self
    }

    /// Add a frozen-module path prefix.
    #[must_use]
    pub fn frozen_path(mut self, prefix: impl Into<String>) -> Self {
        self.frozen_path_prefixes.push(prefix.into());
        self
    }

    /// Whether a source path falls under a system or frozen prefix.
    #[must_use]
    pub fn is_system_or_frozen(&self, source_path: &str) -> bool {
        self.system_path_prefixes
            .iter()
            .chain(self.frozen_path_prefixes.iter())
            .any(|prefix| source_path.starts_with(prefix.as_str()))
    }

    /// Validate configuration before a session starts.
    ///
    /// An empty prefix would match every source path and silently suppress
    /// the whole program, so it is rejected here instead.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.excluded_names.iter().any(|name| name.is_empty()) {
            return Err(ConfigError::EmptyExcludedName);
        }
        let mut prefixes =
            self.system_path_prefixes.iter().chain(self.frozen_path_prefixes.iter());
        if let Some(idx) = prefixes.position(|prefix| prefix.is_empty()) {
            return Err(ConfigError::EmptyPathPrefix(idx));
        }
        Ok(())
    }
}
