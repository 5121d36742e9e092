//! Actions postponed to a later tick.
//!
//! The queue only stores data; the owner interprets each [`DeferredAction`] when
//! [`DeferredQueue::run_due`] hands it back.

/// Work scheduled for a future tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredAction {
    /// Clear the impact latch of the attack window cycle that just closed.
    ClearImpactLatch { cycle: u64 },
}

#[derive(Debug, Clone, Copy)]
struct Scheduled {
    due_tick: u64,
    action: DeferredAction,
}

/// Tick-indexed FIFO of [`DeferredAction`]s.
#[derive(Debug, Default)]
pub struct DeferredQueue {
    pending: Vec<Scheduled>,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `action` to run at `due_tick`.
    pub fn schedule(&mut self, due_tick: u64, action: DeferredAction) {
        self.pending.push(Scheduled { due_tick, action });
    }

    /// Schedule `action` for the tick after `current_tick`.
    pub fn schedule_next_tick(&mut self, current_tick: u64, action: DeferredAction) {
        self.schedule(current_tick + 1, action);
    }

    /// Remove and return every action due at or before `tick`, in scheduling order.
    pub fn run_due(&mut self, tick: u64) -> Vec<DeferredAction> {
        let mut due = Vec::new();
        self.pending.retain(|scheduled| {
            if scheduled.due_tick <= tick {
                due.push(scheduled.action);
                false
            } else {
                true
            }
        });
        due
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
