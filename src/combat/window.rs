//! Timed attack window and its per-target latch.

use std::collections::HashSet;

/// Open/close state of one attack, plus the targets already struck during it.
///
/// Each opening starts a new cycle. The latch holds at most one entry per target
/// and is cleared whenever the window re-opens.
#[derive(Debug, Default, Clone)]
pub struct AttackWindow {
    active: bool,
    cycle: u64,
    latched: HashSet<hecs::Entity>,
}

impl AttackWindow {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Number of the current (or most recent) cycle; zero before the first opening.
    #[inline]
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Open a new cycle. Returns `false` if the window was already open.
    pub fn open(&mut self) -> bool {
        if self.active {
            return false;
        }
        self.active = true;
        self.cycle += 1;
        self.latched.clear();
        true
    }

    /// Close the window, returning the cycle that ended.
    pub fn close(&mut self) -> Option<u64> {
        if !self.active {
            return None;
        }
        self.active = false;
        Some(self.cycle)
    }

    pub fn is_latched(&self, entity: hecs::Entity) -> bool {
        self.latched.contains(&entity)
    }

    /// Mark `entity` as struck in this cycle. Returns `false` if it already was.
    pub fn latch(&mut self, entity: hecs::Entity) -> bool {
        self.latched.insert(entity)
    }

    pub fn latched_count(&self) -> usize {
        self.latched.len()
    }

    /// Clear the latch if `cycle` is still the current cycle and the window is closed.
    pub fn clear_latch(&mut self, cycle: u64) -> bool {
        if self.active || cycle != self.cycle {
            return false;
        }
        self.latched.clear();
        true
    }
}
