//! Outbound notifications to the animation layer.

/// Receiver for the two state changes animation cares about.
///
/// Delivery is synchronous from inside [`crate::character::PlayerCharacter::tick`].
pub trait AnimationBridge {
    fn attack_window_changed(&mut self, open: bool);
    fn climbing_state_changed(&mut self, climbing: bool);
}

/// A notification waiting for delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationEvent {
    AttackWindow(bool),
    Climbing(bool),
}

impl AnimationEvent {
    pub fn deliver(self, bridge: &mut dyn AnimationBridge) {
        match self {
            AnimationEvent::AttackWindow(open) => bridge.attack_window_changed(open),
            AnimationEvent::Climbing(climbing) => bridge.climbing_state_changed(climbing),
        }
    }
}

/// Bridge that records every notification, in order.
#[derive(Debug, Default, Clone)]
pub struct RecordingBridge {
    pub events: Vec<AnimationEvent>,
}

impl AnimationBridge for RecordingBridge {
    fn attack_window_changed(&mut self, open: bool) {
        self.events.push(AnimationEvent::AttackWindow(open));
    }

    fn climbing_state_changed(&mut self, climbing: bool) {
        self.events.push(AnimationEvent::Climbing(climbing));
    }
}
