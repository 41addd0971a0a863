//! Scheduled-event queue for deferred stage effects.
//!
//! Events are keyed by simulated time, so pausing the clock also holds every
//! pending timer. Each event carries the guard it was scheduled under; the
//! stage machine discards events whose guard no longer matches.

use super::stage::Stage;

/// Effect to apply when a scheduled event comes due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimedAction {
    EndDormancy,
    RampPressure,
    EndEruption,
    EndAftermath,
}

/// Snapshot of machine state at schedule time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Guard {
    pub epoch: u64,
    pub stage: Stage,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledEvent {
    /// Simulated time at which the event fires.
    pub due: f64,
    pub guard: Guard,
    pub action: TimedAction,
}

/// Pending events ordered by due time. Ties keep insertion order.
#[derive(Debug, Clone, Default)]
pub struct TimerQueue {
    events: Vec<ScheduledEvent>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, event: ScheduledEvent) {
        let at = self.events.partition_point(|e| e.due <= event.due);
        self.events.insert(at, event);
    }

    /// Remove and return the earliest event due at or before `now`.
    pub fn pop_due(&mut self, now: f64) -> Option<ScheduledEvent> {
        match self.events.first() {
            Some(first) if first.due <= now => Some(self.events.remove(0)),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
