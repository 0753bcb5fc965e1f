//! Clock and one-shot timer ports.
//!
//! Registries never own time. They query a [`Clock`] and arm one-shot timers on
//! a [`Scheduler`]; when a timer expires the caller hands the [`TimerHandle`]
//! back to whichever registry armed it. A handle nobody recognises is dropped.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// Opaque token identifying one scheduled callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Monotonic world clock in milliseconds
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Deferred one-shot callbacks
pub trait Scheduler: Clock {
    /// Arm a timer that expires `delay_ms` after now.
    fn schedule_once(&mut self, delay_ms: u64) -> TimerHandle;

    /// Disarm a pending timer. Returns false if it already fired or never existed.
    fn cancel(&mut self, handle: TimerHandle) -> bool;
}

/// Tick-driven scheduler. Time only moves when [`ManualScheduler::advance`] is called.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    now_ms: u64,
    next_handle: u64,
    /// (due time, handle) ordered by due time, then arming order
    queue: BTreeSet<(u64, u64)>,
    due_by_handle: HashMap<u64, u64>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the clock at an arbitrary time
    pub fn starting_at(now_ms: u64) -> Self {
        Self {
            now_ms,
            ..Self::default()
        }
    }

    /// Move time forward and return every timer that expired, earliest first.
    pub fn advance(&mut self, delta_ms: u64) -> Vec<TimerHandle> {
        self.now_ms = self.now_ms.saturating_add(delta_ms);

        let mut fired = Vec::new();
        while let Some(&(due, raw)) = self.queue.first() {
            if due > self.now_ms {
                break;
            }
            self.queue.remove(&(due, raw));
            self.due_by_handle.remove(&raw);
            fired.push(TimerHandle(raw));
        }
        fired
    }

    /// Number of armed timers
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.due_by_handle.contains_key(&handle.0)
    }
}

impl Clock for ManualScheduler {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_once(&mut self, delay_ms: u64) -> TimerHandle {
        let raw = self.next_handle;
        self.next_handle += 1;
        let due = self.now_ms.saturating_add(delay_ms);
        self.queue.insert((due, raw));
        self.due_by_handle.insert(raw, due);
        TimerHandle(raw)
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.due_by_handle.remove(&handle.0) {
            Some(due) => self.queue.remove(&(due, handle.0)),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timers_fire_in_due_order() {
        let mut scheduler = ManualScheduler::new();
        let late = scheduler.schedule_once(300);
        let early = scheduler.schedule_once(100);

        assert!(scheduler.advance(50).is_empty());
        assert_eq!(scheduler.advance(300), vec![early, late]);
        assert_eq!(scheduler.now_ms(), 350);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_cancelled_timer_never_fires() {
        let mut scheduler = ManualScheduler::starting_at(1_000);
        let handle = scheduler.schedule_once(10);
        assert!(scheduler.is_pending(handle));

        assert!(scheduler.cancel(handle));
        assert!(!scheduler.cancel(handle));
        assert!(scheduler.advance(100).is_empty());
    }

    #[test]
    fn test_zero_delay_fires_on_next_advance() {
        let mut scheduler = ManualScheduler::new();
        let handle = scheduler.schedule_once(0);
        assert_eq!(scheduler.advance(0), vec![handle]);
    }
}
