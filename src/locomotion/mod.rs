//! Character locomotion: wall scanning, climb gating, mode transitions and
//! kinematic movement.

pub mod gate;
pub mod movement;
pub mod scanner;
pub mod state;

pub use gate::{ClimbGate, ClimbVerdict, EyeProbe};
pub use movement::{CharacterMotor, ControlRotation, MoveRequest};
pub use scanner::{SurfaceScanner, WallContact};
pub use state::{LocomotionMode, LocomotionStateMachine, ModeTransition};
