//! Per-hook timer and counter state.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Instant;

/// Label used when `time`/`timeEnd`/`count` are called without one.
pub const DEFAULT_LABEL: &str = "default";

/// Named timers and counters owned by one hook. Created when the hook is
/// installed, discarded when it is removed.
#[derive(Default)]
pub struct HookState {
    timers: Mutex<HashMap<String, Instant>>,
    counters: Mutex<HashMap<String, u64>>,
}

impl HookState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) a named timer. Last call wins.
    pub fn start_timer(&self, label: &str) {
        self.timers.lock().insert(label.to_string(), Instant::now());
    }

    /// Stop a named timer, returning elapsed milliseconds if it was running.
    pub fn end_timer(&self, label: &str) -> Option<f64> {
        self.timers
            .lock()
            .remove(label)
            .map(|start| start.elapsed().as_secs_f64() * 1000.0)
    }

    /// Increment a named counter and return the running total.
    pub fn bump_counter(&self, label: &str) -> u64 {
        let mut counters = self.counters.lock();
        let count = counters.entry(label.to_string()).or_insert(0);
        *count += 1;
        *count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_last_call_wins() {
        let state = HookState::new();
        state.start_timer("t");
        state.start_timer("t");
        assert!(state.end_timer("t").is_some());
        assert_eq!(state.end_timer("t"), None);
    }

    #[test]
    fn test_unknown_timer_is_none() {
        let state = HookState::new();
        assert_eq!(state.end_timer("missing"), None);
    }

    #[test]
    fn test_elapsed_is_non_negative() {
        let state = HookState::new();
        state.start_timer("t");
        let elapsed = state.end_timer("t").unwrap();
        assert!(elapsed >= 0.0);
    }

    #[test]
    fn test_counters_are_independent() {
        let state = HookState::new();
        assert_eq!(state.bump_counter("a"), 1);
        assert_eq!(state.bump_counter("a"), 2);
        assert_eq!(state.bump_counter("b"), 1);
        assert_eq!(state.bump_counter(DEFAULT_LABEL), 1);
    }
}
