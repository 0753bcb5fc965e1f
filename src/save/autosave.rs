use tracing::{debug, info};

use crate::timer::{Scheduler, TimerHandle};

pub const DEFAULT_AUTOSAVE_SLOT: &str = "AutoSave";
pub const DEFAULT_AUTOSAVE_INTERVAL_MS: u64 = 300_000;
const MIN_AUTOSAVE_INTERVAL_MS: u64 = 1_000;

/// Periodic auto-save timer.
///
/// Owns only the schedule; the caller writes the save when `on_timer` says so.
#[derive(Debug)]
pub struct AutoSave {
    slot: String,
    interval_ms: u64,
    enabled: bool,
    timer: Option<TimerHandle>,
}

impl AutoSave {
    pub fn new(slot: impl Into<String>, interval_ms: u64) -> Self {
        Self {
            slot: slot.into(),
            interval_ms: interval_ms.max(MIN_AUTOSAVE_INTERVAL_MS),
            enabled: false,
            timer: None,
        }
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool, scheduler: &mut dyn Scheduler) {
        self.enabled = enabled;
        self.disarm(scheduler);

        if enabled {
            self.arm(scheduler);
            info!(
                target: "gameplay::save",
                "Auto-save enabled (every {} ms, slot '{}')", self.interval_ms, self.slot
            );
        } else {
            info!(target: "gameplay::save", "Auto-save disabled");
        }
    }

    /// Change the interval (clamped to at least one second). Re-arms when enabled.
    pub fn set_interval(&mut self, interval_ms: u64, scheduler: &mut dyn Scheduler) {
        self.interval_ms = interval_ms.max(MIN_AUTOSAVE_INTERVAL_MS);
        if self.enabled {
            self.disarm(scheduler);
            self.arm(scheduler);
        }
    }

    /// Returns true if `handle` is the auto-save timer; the next one is armed.
    pub fn on_timer(&mut self, handle: TimerHandle, scheduler: &mut dyn Scheduler) -> bool {
        if self.timer != Some(handle) {
            return false;
        }

        self.timer = None;
        if self.enabled {
            self.arm(scheduler);
        }
        info!(target: "gameplay::save", "Auto-save triggered (slot '{}')", self.slot);
        true
    }

    fn arm(&mut self, scheduler: &mut dyn Scheduler) {
        let handle = scheduler.schedule_once(self.interval_ms);
        debug!(target: "gameplay::save", "Auto-save armed ({:?})", handle);
        self.timer = Some(handle);
    }

    fn disarm(&mut self, scheduler: &mut dyn Scheduler) {
        if let Some(handle) = self.timer.take() {
            scheduler.cancel(handle);
        }
    }
}

impl Default for AutoSave {
    fn default() -> Self {
        Self::new(DEFAULT_AUTOSAVE_SLOT, DEFAULT_AUTOSAVE_INTERVAL_MS)
    }
}
