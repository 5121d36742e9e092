//! grip: climbing locomotion and melee impacts for a kinematic character.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! 1. **ecs** - hecs components (transforms, rigid bodies, colliders)
//! 2. **physics** - Fixed-step rigid body simulation and world queries
//! 3. **locomotion** - Wall scanning, climb gating, locomotion modes, movement
//! 4. **combat** - Attack window and impact resolution
//! 5. **character** - The per-tick driver wiring everything together
//!
//! Gameplay code reaches the world only through the query traits in
//! [`physics::query`] and [`combat::ProxyAccess`], handed in at each tick.

pub mod anim;
pub mod character;
pub mod combat;
pub mod config;
pub mod deferred;
pub mod ecs;
pub mod error;
pub mod locomotion;
pub mod physics;

pub use anim::{AnimationBridge, AnimationEvent};
pub use character::{Command, PlayerCharacter, TickReport};
pub use combat::{AttackWindow, ImpactReport, ImpactResolver, PhysicsProxy, ProxyAccess};
pub use config::{
    CharacterConfig, ClimbConfig, ImpactConfig, MovementConfig, ProbePolicy, ScanConfig,
};
pub use deferred::{DeferredAction, DeferredQueue};
pub use ecs::prelude::*;
pub use error::{CharacterError, ConfigError};
pub use locomotion::{
    ClimbGate, ClimbVerdict, ControlRotation, LocomotionMode, LocomotionStateMachine,
    SurfaceScanner, WallContact,
};
pub use physics::{PhysicsConfig, PhysicsWorld};

// Re-export dependencies for convenience
pub use glam;
pub use hecs;
