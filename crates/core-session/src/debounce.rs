//! Cancelable deferred actions as explicit deadlines.
//!
//! The session defers two operations (persistence, the proximity scan)
//! behind short delays so rapid edits coalesce into one execution. Rather
//! than framework timers, each deferred action is a stored deadline the
//! owner polls via `tick`: re-triggering restarts the delay from zero and
//! the previous pending execution simply never happens. No trailing-edge
//! accumulation, nothing to join on teardown, fully deterministic under
//! injected clocks.

use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct DebounceTimer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl DebounceTimer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Arm (or re-arm) the timer; the delay restarts from `now`.
    pub fn trigger(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// Drop any pending execution.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// True exactly once when the deadline has passed; disarms the timer.
    pub fn fire_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(d) if now >= d => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
