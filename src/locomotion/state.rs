//! Locomotion mode ownership and transitions.

use crate::ecs::components::physics::ColliderShape;

/// The character's active locomotion mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocomotionMode {
    Grounded,
    #[default]
    Airborne,
    Climbing,
}

/// Mode change reported to the caller, which owns the notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeTransition {
    EnteredClimbing,
    ExitedClimbing,
    Landed,
    LeftGround,
}

/// Holds the locomotion mode and the climb request.
///
/// Only this type changes the mode. Leaving [`LocomotionMode::Climbing`] requires
/// [`cancel_climb`](Self::cancel_climb); ground tests and jumps never do it.
#[derive(Debug, Clone)]
pub struct LocomotionStateMachine {
    mode: LocomotionMode,
    wants_to_climb: bool,
    gravity_enabled: bool,
    climbing_shrink: f32,
    /// Capsule total half height saved on entering Climbing.
    stored_half_height: Option<f32>,
}

impl LocomotionStateMachine {
    pub fn new(climbing_shrink: f32) -> Self {
        Self {
            mode: LocomotionMode::default(),
            wants_to_climb: false,
            gravity_enabled: true,
            climbing_shrink,
            stored_half_height: None,
        }
    }

    #[inline]
    pub fn mode(&self) -> LocomotionMode {
        self.mode
    }

    #[inline]
    pub fn is_climbing(&self) -> bool {
        self.mode == LocomotionMode::Climbing
    }

    #[inline]
    pub fn wants_to_climb(&self) -> bool {
        self.wants_to_climb
    }

    #[inline]
    pub fn gravity_enabled(&self) -> bool {
        self.gravity_enabled
    }

    /// Record a climb request if the gate accepted it.
    pub fn try_climb(&mut self, gate_ok: bool) {
        if gate_ok {
            self.wants_to_climb = true;
        } else {
            tracing::debug!("climb request rejected by gate");
        }
    }

    /// Clear the climb request; Climbing ends at the next movement update.
    pub fn cancel_climb(&mut self) {
        self.wants_to_climb = false;
    }

    /// Apply the climb request after movement integrated this tick.
    ///
    /// `capsule` is the character's collision shape; it is shrunk on entry and
    /// restored on exit.
    pub fn on_movement_updated(&mut self, capsule: &mut ColliderShape) -> Option<ModeTransition> {
        match (self.mode, self.wants_to_climb) {
            (LocomotionMode::Climbing, false) => {
                self.exit_climbing(capsule);
                self.mode = LocomotionMode::Airborne;
                Some(ModeTransition::ExitedClimbing)
            }
            (LocomotionMode::Climbing, true) => None,
            (_, true) => {
                self.enter_climbing(capsule);
                self.mode = LocomotionMode::Climbing;
                Some(ModeTransition::EnteredClimbing)
            }
            (_, false) => None,
        }
    }

    /// Result of the move-and-slide floor test. Ignored while Climbing.
    pub fn set_grounded(&mut self, on_floor: bool) -> Option<ModeTransition> {
        match (self.mode, on_floor) {
            (LocomotionMode::Airborne, true) => {
                self.mode = LocomotionMode::Grounded;
                Some(ModeTransition::Landed)
            }
            (LocomotionMode::Grounded, false) => {
                self.mode = LocomotionMode::Airborne;
                Some(ModeTransition::LeftGround)
            }
            _ => None,
        }
    }

    /// Start a jump. Only possible from Grounded.
    pub fn jump(&mut self) -> bool {
        if self.mode == LocomotionMode::Grounded {
            self.mode = LocomotionMode::Airborne;
            true
        } else {
            false
        }
    }

    fn enter_climbing(&mut self, capsule: &mut ColliderShape) {
        self.gravity_enabled = false;
        if let ColliderShape::Capsule { radius, half_height } = *capsule {
            let total = half_height + radius;
            self.stored_half_height = Some(total);
            *capsule = ColliderShape::capsule_with_total_half_height(
                radius,
                (total - self.climbing_shrink).max(0.0),
            );
        }
        tracing::debug!("entered climbing");
    }

    fn exit_climbing(&mut self, capsule: &mut ColliderShape) {
        self.gravity_enabled = true;
        let stored = self.stored_half_height.take();
        if let (Some(total), ColliderShape::Capsule { radius, .. }) = (stored, capsule.clone()) {
            *capsule = ColliderShape::capsule_with_total_half_height(radius, total);
        }
        tracing::debug!("exited climbing");
    }
}
