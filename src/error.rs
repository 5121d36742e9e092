//! Error types.

use thiserror::Error;

/// A designer-tunable parameter outside its supported range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{name} must be within {min}..={max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f32 },
    #[cfg(feature = "serde")]
    #[error("invalid configuration file: {0}")]
    Parse(String),
}

/// Wiring errors raised while ticking a character.
#[derive(Debug, Error)]
pub enum CharacterError {
    /// The character entity is gone or lacks a component the controller drives.
    #[error("character entity {entity:?} is missing a required component")]
    MissingComponent {
        entity: hecs::Entity,
        #[source]
        source: hecs::ComponentError,
    },
    #[error("character collider must be a capsule")]
    NotACapsule,
    #[error(transparent)]
    Config(#[from] ConfigError),
}
