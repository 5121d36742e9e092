//! Designer-tunable parameters.
//!
//! Distances are in centimetres, speeds in cm/s and angles in degrees.

use glam::Vec3;

use crate::error::ConfigError;
use crate::physics::PhysicsConfig;

/// How the eye-level probe takes part in the climb decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProbePolicy {
    /// The probe is evaluated, but a contact passing the angle test is accepted without it.
    #[default]
    Preferred,
    /// A contact is only accepted when the probe confirms it.
    Required,
}

/// Capsule sweep used to find walls ahead of the character.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ScanConfig {
    pub radius: f32,
    /// Half length of the capsule's inner segment (total half height minus radius).
    pub half_height: f32,
    /// Distance ahead of the character's centre where the sweep starts.
    pub start_offset: f32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            radius: 50.0,
            half_height: 22.0,
            start_offset: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ClimbConfig {
    /// Largest facing angle at which climbing may start. Range 1..=75.
    pub max_facing_angle_deg: f32,
    /// Height of the eye-level probe above the character's centre.
    pub eye_height: f32,
    /// Probe length against a vertical wall; shallower surfaces scale it up.
    pub probe_base_distance: f32,
    pub probe_policy: ProbePolicy,
    /// Capsule half-height removed while climbing. Range 0..=80.
    pub climbing_shrink: f32,
    pub climb_speed: f32,
    /// Turn rate towards the climbed surface.
    pub surface_turn_rate_deg: f32,
}

impl Default for ClimbConfig {
    fn default() -> Self {
        Self {
            max_facing_angle_deg: 25.0,
            eye_height: 64.0,
            probe_base_distance: 80.0,
            probe_policy: ProbePolicy::Preferred,
            climbing_shrink: 30.0,
            climb_speed: 120.0,
            surface_turn_rate_deg: 360.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MovementConfig {
    pub max_walk_speed: f32,
    /// Slowest speed analog input asks for once it is past the dead zone.
    pub min_analog_walk_speed: f32,
    pub acceleration: f32,
    pub braking_deceleration_walking: f32,
    pub braking_deceleration_falling: f32,
    /// Fraction of ground acceleration available in the air.
    pub air_control: f32,
    pub jump_z_velocity: f32,
    /// Yaw turn rate when orienting to movement.
    pub rotation_rate_deg: f32,
    /// Steepest floor the character can stand on.
    pub walkable_floor_deg: f32,
    /// How far below the feet a floor is still found while grounded.
    pub floor_probe_distance: f32,
    pub look_sensitivity: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            max_walk_speed: 500.0,
            min_analog_walk_speed: 20.0,
            acceleration: 2048.0,
            braking_deceleration_walking: 2000.0,
            braking_deceleration_falling: 1500.0,
            air_control: 0.35,
            jump_z_velocity: 700.0,
            rotation_rate_deg: 500.0,
            walkable_floor_deg: 44.765,
            floor_probe_distance: 2.4,
            look_sensitivity: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ImpactConfig {
    pub impulse_magnitude: f32,
    pub angular_damping: f32,
    pub linear_damping: f32,
    /// Radius of the fist overlap sphere.
    pub fist_radius: f32,
    /// Fist position in the character's local frame (-Z is forward).
    pub fist_offset: Vec3,
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            impulse_magnitude: 10000.0,
            angular_damping: 5.0,
            linear_damping: 2.0,
            fist_radius: 20.0,
            fist_offset: Vec3::new(0.0, 40.0, -60.0),
        }
    }
}

/// Everything a [`crate::character::PlayerCharacter`] is tuned by.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CharacterConfig {
    pub scan: ScanConfig,
    pub climb: ClimbConfig,
    pub movement: MovementConfig,
    pub impact: ImpactConfig,
    pub physics: PhysicsConfig,
}

fn in_range(name: &'static str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value,
            min,
            max,
        })
    }
}

fn positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { name, value })
    }
}

impl CharacterConfig {
    /// Check every bounded parameter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("scan.radius", self.scan.radius)?;
        in_range("scan.half_height", self.scan.half_height, 0.0, f32::MAX)?;
        positive("scan.start_offset", self.scan.start_offset)?;

        in_range(
            "climb.max_facing_angle_deg",
            self.climb.max_facing_angle_deg,
            1.0,
            75.0,
        )?;
        in_range("climb.climbing_shrink", self.climb.climbing_shrink, 0.0, 80.0)?;
        positive("climb.probe_base_distance", self.climb.probe_base_distance)?;
        positive("climb.climb_speed", self.climb.climb_speed)?;

        positive("movement.max_walk_speed", self.movement.max_walk_speed)?;
        in_range("movement.air_control", self.movement.air_control, 0.0, 1.0)?;
        in_range(
            "movement.walkable_floor_deg",
            self.movement.walkable_floor_deg,
            0.0,
            90.0,
        )?;

        positive("impact.impulse_magnitude", self.impact.impulse_magnitude)?;
        in_range("impact.angular_damping", self.impact.angular_damping, 0.0, f32::MAX)?;
        in_range("impact.linear_damping", self.impact.linear_damping, 0.0, f32::MAX)?;
        positive("impact.fist_radius", self.impact.fist_radius)?;

        if self.physics.fixed_timestep <= 0.0 {
            return Err(ConfigError::NotPositive {
                name: "physics.fixed_timestep",
                value: self.physics.fixed_timestep as f32,
            });
        }
        Ok(())
    }

    /// Parse and validate a TOML document; missing keys keep their defaults.
    #[cfg(feature = "serde")]
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: CharacterConfig =
            toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}
