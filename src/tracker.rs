// Per-monitor inactivity state machine.
//
// One independent timer per tracked monitor index, driven by a fixed
// interval poll. Time and the pointer's monitor are injected into `tick`,
// so the whole state machine is pure and testable without Win32.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::time::{Duration, Instant};
use tracing::debug;

/// Poll cadence for the pointer position.
pub const POLL_INTERVAL_MS: u32 = 300;

/// Transition emitted by [`InactivityTracker::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// The pointer has been away from this monitor for at least the timeout.
    Inactivity(usize),
    /// The pointer returned to a monitor whose overlay is up.
    Activity(usize),
}

#[derive(Debug, Clone, Copy)]
struct TrackedScreen {
    last_seen: Instant,
    overlay_active: bool,
}

pub struct InactivityTracker {
    timeout: Duration,
    screens: BTreeMap<usize, TrackedScreen>,
    running: bool,
}

impl InactivityTracker {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            screens: BTreeMap::new(),
            running: false,
        }
    }

    /// Replace the tracked set. Safe to call while running: retained indices
    /// keep their state, new indices count as seen at `now`.
    pub fn configure(&mut self, indices: &BTreeSet<usize>, timeout: Duration, now: Instant) {
        self.timeout = timeout;
        self.screens.retain(|i, _| indices.contains(i));
        for &i in indices {
            self.screens.entry(i).or_insert(TrackedScreen {
                last_seen: now,
                overlay_active: false,
            });
        }
    }

    /// Begin polling with fresh timers.
    pub fn start(&mut self, now: Instant) {
        self.reset(now);
        self.running = true;
    }

    /// Halt polling. State is kept untouched; the next `start` re-initializes
    /// it, so a pause can never leave stale timers behind.
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Restart every timer from `now` and clear all active flags.
    pub fn reset(&mut self, now: Instant) {
        for state in self.screens.values_mut() {
            state.last_seen = now;
            state.overlay_active = false;
        }
    }

    pub fn tracked_indices(&self) -> BTreeSet<usize> {
        self.screens.keys().copied().collect()
    }

    /// Force a monitor into the active (covered) state without waiting for
    /// its timeout. Needed for manual blackout: the next pointer entry must
    /// fire an activity transition instead of being ignored.
    pub fn mark_active(&mut self, index: usize) {
        if let Some(state) = self.screens.get_mut(&index) {
            state.overlay_active = true;
        }
    }

    /// One poll step. `pointer_monitor` is the monitor currently containing
    /// the pointer; `None` means the pointer maps to no monitor (topology
    /// mid-change), in which case the tick is skipped entirely so no timer
    /// advances or resets spuriously.
    ///
    /// Every tracked monitor is evaluated independently against the same
    /// pointer snapshot; presence on one monitor never touches another's
    /// timer.
    pub fn tick(&mut self, now: Instant, pointer_monitor: Option<usize>) -> Vec<Signal> {
        if !self.running {
            return Vec::new();
        }
        let Some(pointer) = pointer_monitor else {
            debug!("pointer unmapped, skipping tick");
            return Vec::new();
        };

        let mut signals = Vec::new();
        for (&index, state) in &mut self.screens {
            if index == pointer {
                state.last_seen = now;
                if state.overlay_active {
                    state.overlay_active = false;
                    signals.push(Signal::Activity(index));
                }
            } else if !state.overlay_active
                && now.duration_since(state.last_seen) >= self.timeout
            {
                state.overlay_active = true;
                signals.push(Signal::Inactivity(index));
            }
        }
        signals
    }
}
