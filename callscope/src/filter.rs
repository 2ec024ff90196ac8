//! Per-code-unit filter decisions.
//!
//! The filter runs once per (code unit, event kind) in the steady state: the
//! host runtime caches the resulting disable signal, so a suppressed unit
//! stops generating events entirely. That makes the decision irrevocable for
//! the rest of the session; later config changes cannot resurrect a unit.
//!
//! # Decision Order
//!
//! 1. **Exact-name exclusion** - the unit's name is on the exclusion list
//! 2. **System/frozen paths** - internal timers are off and the unit's
//!    source path falls under a system or frozen prefix
//! 3. Otherwise the event is emitted

use log::warn;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};

use crate::config::FilterConfig;
use crate::domain::CodeUnit;

/// Outcome of filtering a code unit.
///
/// `SuppressPermanently` is threaded back to the host runtime as the
/// per-unit disable signal; there is no "suppress once", because the runtime's
/// cache makes every suppression permanent for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Forward this unit's events to the backend
    Emit,
    /// Tell the runtime to stop delivering events for this unit
    SuppressPermanently,
}

impl Decision {
    /// Returns true if the unit's events reach the backend.
    #[must_use]
    pub fn is_emit(self) -> bool {
        matches!(self, Decision::Emit)
    }
}

/// Decide whether a code unit's events are emitted or suppressed.
///
/// Pure and deterministic given its inputs; first match wins.
///
/// # Examples
///
/// ```
/// use callscope::config::FilterConfig;
/// use callscope::domain::CodeUnit;
/// use callscope::filter::{decide, Decision};
///
/// let config = FilterConfig::new().exclude_name("helper");
/// let unit = CodeUnit::new("helper", "/app/util.py");
/// assert_eq!(decide(&unit, &config), Decision::SuppressPermanently);
/// ```
#[must_use]
pub fn decide(unit: &CodeUnit, config: &FilterConfig) -> Decision {
    if config.excluded_names.contains(unit.name.as_str()) {
        return Decision::SuppressPermanently;
    }

    if !config.internal_timers_enabled && config.is_system_or_frozen(&unit.source_path) {
        return Decision::SuppressPermanently;
    }

    Decision::Emit
}

// =============================================================================
// FILTER DIAGNOSTICS
// =============================================================================

/// Tracks filter outcomes so users can tell why expected spans are missing.
///
/// Suppression happens once per unit and then goes silent (the runtime stops
/// delivering events), which makes "where did my spans go?" hard to answer
/// after the fact. Recording happens off the steady-state path for exactly
/// that reason.
pub struct FilterDiagnostics {
    /// Unit names already warned about (to avoid log spam)
    warned_units: Mutex<HashSet<String>>,
    /// Count of decisions that emitted
    emitted: AtomicU64,
    /// Count of decisions that suppressed
    suppressed: AtomicU64,
}

impl FilterDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self {
            warned_units: Mutex::new(HashSet::new()),
            emitted: AtomicU64::new(0),
            suppressed: AtomicU64::new(0),
        }
    }

    /// Record a filter decision, warning once per suppressed unit name.
    pub fn record_decision(&self, unit: &CodeUnit, decision: Decision) {
        if decision.is_emit() {
            self.emitted.fetch_add(1, Ordering::Relaxed);
        } else {
            self.suppressed.fetch_add(1, Ordering::Relaxed);

            // insert() tells us whether the name was new, one lookup
            if let Ok(mut warned) = self.warned_units.lock() {
                if warned.insert(unit.name.clone()) {
                    warn!(
                        "suppressing '{}' ({}) for the rest of the session",
                        unit.name, unit.source_path
                    );
                }
            }
        }
    }

    #[must_use]
    pub fn emitted_decisions(&self) -> u64 {
        self.emitted.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn suppressed_decisions(&self) -> u64 {
        self.suppressed.load(Ordering::Relaxed)
    }
}

impl Default for FilterDiagnostics {
    fn default() -> Self {
        Self::new()
    }
}

/// Global diagnostics instance, initialized on first access.
static DIAGNOSTICS: OnceLock<FilterDiagnostics> = OnceLock::new();

/// Get the global filter diagnostics tracker.
pub fn diagnostics() -> &'static FilterDiagnostics {
    DIAGNOSTICS.get_or_init(FilterDiagnostics::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excluded_name_suppresses() {
        let config = FilterConfig::new().exclude_name("helper");
        let unit = CodeUnit::new("helper", "/app/util.py");
        assert_eq!(decide(&unit, &config), Decision::SuppressPermanently);
    }

    #[test]
    fn test_exclusion_wins_over_internal_timers() {
        // Rule 1 fires before rule 2 ever looks at paths
        let config =
            FilterConfig::new().exclude_name("open").internal_timers(true).system_path("/usr/lib");
        let unit = CodeUnit::new("open", "/usr/lib/py3/io.py");
        assert_eq!(decide(&unit, &config), Decision::SuppressPermanently);
    }

    #[test]
    fn test_system_path_suppressed_when_internal_timers_off() {
        let config = FilterConfig::new().internal_timers(false).system_path("/usr/lib/py3");
        let unit = CodeUnit::new("join", "/usr/lib/py3/os.py");
        assert_eq!(decide(&unit, &config), Decision::SuppressPermanently);
    }

    #[test]
    fn test_system_path_emitted_when_internal_timers_on() {
        let config = FilterConfig::new().internal_timers(true).system_path("/usr/lib/py3");
        let unit = CodeUnit::new("join", "/usr/lib/py3/os.py");
        assert_eq!(decide(&unit, &config), Decision::Emit);
    }

    #[test]
    fn test_frozen_path_suppressed() {
        let config = FilterConfig::new().internal_timers(false).frozen_path("<frozen");
        let unit = CodeUnit::new("_find_spec", "<frozen importlib._bootstrap>");
        assert_eq!(decide(&unit, &config), Decision::SuppressPermanently);
    }

    #[test]
    fn test_user_code_emits() {
        let config = FilterConfig::new()
            .exclude_name("helper")
            .internal_timers(false)
            .system_path("/usr/lib/py3");
        let unit = CodeUnit::new("process", "/app/main.py");
        assert_eq!(decide(&unit, &config), Decision::Emit);
        assert!(decide(&unit, &config).is_emit());
    }

    #[test]
    fn test_decide_is_deterministic() {
        let config = FilterConfig::new().exclude_name("helper");
        let unit = CodeUnit::new("helper", "/app/util.py");
        assert_eq!(decide(&unit, &config), decide(&unit, &config));
    }

    #[test]
    fn test_diagnostics_counts() {
        let diag = FilterDiagnostics::new();
        let emit = CodeUnit::new("process", "/app/main.py");
        let skip = CodeUnit::new("helper", "/app/util.py");

        diag.record_decision(&emit, Decision::Emit);
        diag.record_decision(&skip, Decision::SuppressPermanently);
        diag.record_decision(&skip, Decision::SuppressPermanently);

        assert_eq!(diag.emitted_decisions(), 1);
        assert_eq!(diag.suppressed_decisions(), 2);
    }
}
