//! Kinematic integration for each locomotion mode.
//!
//! The character is moved by sweeping its capsule against the world and sliding
//! along whatever blocks it. Velocities follow the usual walking model: input
//! accelerates towards a target speed, no input brakes, the air keeps only a
//! fraction of ground control.

use std::f32::consts::{PI, TAU};

use glam::{Quat, Vec2, Vec3};

use crate::config::{ClimbConfig, MovementConfig};
use crate::physics::query::{CapsuleProbe, QueryFilter, SurfaceQuery};

use super::state::LocomotionMode;

/// Gap kept between the capsule and anything it slides against (cm).
pub const SKIN_WIDTH: f32 = 0.02;
const MAX_SLIDE_ITERATIONS: usize = 4;
const MAX_DEPENETRATION_ITERATIONS: usize = 4;
const MAX_PITCH: f32 = 89.0 * PI / 180.0;

/// Where the player is looking. Drives the move basis outside Climbing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlRotation {
    /// Radians about +Y; zero looks down -Z.
    pub yaw: f32,
    /// Radians, positive looks up. Clamped to +-89 degrees.
    pub pitch: f32,
}

impl ControlRotation {
    /// Apply a look delta in degrees: `x` turns right, `y` looks up.
    pub fn apply_look(&mut self, delta: Vec2, sensitivity: f32) {
        self.yaw = wrap_angle(self.yaw - delta.x.to_radians() * sensitivity);
        self.pitch = (self.pitch + delta.y.to_radians() * sensitivity).clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Horizontal forward and right vectors for the current yaw.
    pub fn planar_basis(&self) -> (Vec3, Vec3) {
        let forward = Quat::from_rotation_y(self.yaw) * Vec3::NEG_Z;
        (forward, forward.cross(Vec3::Y))
    }
}

/// Move directions on a climbed surface with normal `normal`.
///
/// The first vector is where forward input goes (up the wall when facing it),
/// the second where right input goes.
pub fn climb_basis(normal: Vec3, right: Vec3, up: Vec3) -> (Vec3, Vec3) {
    (
        normal.cross(right).normalize_or_zero(),
        up.cross(normal).normalize_or_zero(),
    )
}

/// Yaw at which a character faces `direction`, ignoring its vertical part.
pub fn yaw_facing(direction: Vec3) -> Option<f32> {
    let flat = Vec3::new(direction.x, 0.0, direction.z);
    (flat.length_squared() > 1e-8).then(|| f32::atan2(-flat.x, -flat.z))
}

/// Turn `current` towards `target` by at most `max_step` radians, the short way round.
pub fn turn_towards(current: f32, target: f32, max_step: f32) -> f32 {
    let diff = wrap_angle(target - current);
    wrap_angle(current + diff.clamp(-max_step, max_step))
}

fn wrap_angle(angle: f32) -> f32 {
    (angle + PI).rem_euclid(TAU) - PI
}

fn move_towards(current: Vec3, target: Vec3, max_delta: f32) -> Vec3 {
    let diff = target - current;
    let distance = diff.length();
    if distance <= max_delta || distance < 1e-6 {
        target
    } else {
        current + diff / distance * max_delta
    }
}

/// New horizontal velocity for walking or falling.
///
/// `input` is the world-space input direction, its length the analog strength (at
/// most 1). The vertical component of `velocity` is returned untouched.
pub fn walk_velocity(
    velocity: Vec3,
    input: Vec3,
    config: &MovementConfig,
    airborne: bool,
    dt: f32,
) -> Vec3 {
    let horizontal = Vec3::new(velocity.x, 0.0, velocity.z);
    let input = Vec3::new(input.x, 0.0, input.z).clamp_length_max(1.0);
    let strength = input.length();

    let next = if strength > 1e-4 {
        let speed = (config.max_walk_speed * strength).max(config.min_analog_walk_speed);
        let acceleration = if airborne {
            config.acceleration * config.air_control
        } else {
            config.acceleration
        };
        move_towards(horizontal, input / strength * speed, acceleration * dt)
    } else {
        let braking = if airborne {
            config.braking_deceleration_falling
        } else {
            config.braking_deceleration_walking
        };
        move_towards(horizontal, Vec3::ZERO, braking * dt)
    };
    Vec3::new(next.x, velocity.y, next.z)
}

/// Result of [`move_and_slide`].
#[derive(Debug, Clone, PartialEq)]
pub struct SlideMove {
    pub position: Vec3,
    /// Normals of every surface that blocked the move, in order.
    pub blocking_normals: Vec<Vec3>,
}

/// Sweep `capsule` from `start` by `delta`, sliding along blocking surfaces.
pub fn move_and_slide(
    query: &dyn SurfaceQuery,
    capsule: CapsuleProbe,
    filter: &QueryFilter,
    start: Vec3,
    delta: Vec3,
) -> SlideMove {
    let mut position = start;
    let mut remaining = delta;
    let mut blocking_normals: Vec<Vec3> = Vec::new();

    for _ in 0..MAX_SLIDE_ITERATIONS {
        let length = remaining.length();
        if length < 1e-4 {
            break;
        }
        let hits = query.sweep_capsule(capsule, position, position + remaining, filter);
        let Some(hit) = hits.iter().find(|hit| hit.normal.dot(remaining) < 0.0) else {
            position += remaining;
            break;
        };

        let direction = remaining / length;
        let travel = (hit.distance - SKIN_WIDTH).clamp(0.0, length);
        position += direction * travel;

        let left = direction * (length - travel);
        remaining = left - hit.normal * left.dot(hit.normal);
        // Sliding back into an earlier surface: follow the crease between the two.
        if let Some(previous) = blocking_normals.last() {
            if remaining.dot(*previous) < 0.0 {
                let crease = previous.cross(hit.normal).normalize_or_zero();
                remaining = crease * remaining.dot(crease);
            }
        }
        blocking_normals.push(hit.normal);
    }

    SlideMove {
        position,
        blocking_normals,
    }
}

/// Push `position` out of anything the capsule overlaps.
pub fn depenetrate(query: &dyn SurfaceQuery, capsule: CapsuleProbe, filter: &QueryFilter, position: Vec3) -> Vec3 {
    let mut position = position;
    for _ in 0..MAX_DEPENETRATION_ITERATIONS {
        let penetrations = query.capsule_penetrations(capsule, position, filter);
        let Some(deepest) = penetrations.iter().max_by(|a, b| a.depth.total_cmp(&b.depth)) else {
            break;
        };
        tracing::trace!(depth = deepest.depth, "depenetrating character capsule");
        position += deepest.normal * (deepest.depth + SKIN_WIDTH);
    }
    position
}

/// Walkable surface found under the capsule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloorHit {
    pub entity: hecs::Entity,
    pub normal: Vec3,
    /// Gap between the capsule and the floor.
    pub distance: f32,
}

/// Walkable floor within `max_distance` below `position`.
pub fn find_floor(
    query: &dyn SurfaceQuery,
    capsule: CapsuleProbe,
    filter: &QueryFilter,
    position: Vec3,
    max_distance: f32,
    walkable_floor_deg: f32,
) -> Option<FloorHit> {
    let min_normal_y = walkable_floor_deg.to_radians().cos();
    query
        .sweep_capsule(capsule, position, position - Vec3::Y * max_distance, filter)
        .into_iter()
        .find(|hit| hit.normal.y >= min_normal_y)
        .map(|hit| FloorHit {
            entity: hit.entity,
            normal: hit.normal,
            distance: hit.distance,
        })
}

/// Per-tick inputs to [`CharacterMotor::integrate`].
#[derive(Debug, Clone, Copy)]
pub struct MoveRequest {
    pub mode: LocomotionMode,
    /// Move axis: `x` right, `y` forward.
    pub input: Vec2,
    pub control: ControlRotation,
    /// First wall contact's normal this tick, if the scanner found one.
    pub surface_normal: Option<Vec3>,
    /// Gravity acceleration; zero when gravity is disabled.
    pub gravity: Vec3,
    pub dt: f32,
}

/// Result of one integration step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveOutcome {
    pub position: Vec3,
    pub yaw: f32,
    /// Walkable floor under the character after the move (never set while Climbing).
    pub floor: Option<FloorHit>,
}

/// Velocity and facing of a kinematic character, integrated per mode.
#[derive(Debug, Clone)]
pub struct CharacterMotor {
    movement: MovementConfig,
    climb_speed: f32,
    surface_turn_rate: f32,
    velocity: Vec3,
    yaw: f32,
    last_surface_normal: Option<Vec3>,
}

impl CharacterMotor {
    pub fn new(movement: MovementConfig, climb: &ClimbConfig, yaw: f32) -> Self {
        Self {
            movement,
            climb_speed: climb.climb_speed,
            surface_turn_rate: climb.surface_turn_rate_deg.to_radians(),
            velocity: Vec3::ZERO,
            yaw,
            last_surface_normal: None,
        }
    }

    #[inline]
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    #[inline]
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn movement_config(&self) -> &MovementConfig {
        &self.movement
    }

    /// Rotation matching the current yaw.
    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw)
    }

    /// Give the character its jump velocity.
    pub fn launch(&mut self) {
        self.velocity.y = self.movement.jump_z_velocity;
    }

    /// Forget the stored climbing surface.
    pub fn clear_surface(&mut self) {
        self.last_surface_normal = None;
    }

    /// Advance the character at `position` by one tick of `request.mode`.
    pub fn integrate(
        &mut self,
        query: &dyn SurfaceQuery,
        capsule: CapsuleProbe,
        filter: &QueryFilter,
        position: Vec3,
        request: &MoveRequest,
    ) -> MoveOutcome {
        match request.mode {
            LocomotionMode::Climbing => self.integrate_climbing(query, capsule, filter, position, request),
            LocomotionMode::Grounded | LocomotionMode::Airborne => {
                self.integrate_walking(query, capsule, filter, position, request)
            }
        }
    }

    fn integrate_climbing(
        &mut self,
        query: &dyn SurfaceQuery,
        capsule: CapsuleProbe,
        filter: &QueryFilter,
        position: Vec3,
        request: &MoveRequest,
    ) -> MoveOutcome {
        let position = depenetrate(query, capsule, filter, position);
        if let Some(normal) = request.surface_normal {
            self.last_surface_normal = Some(normal);
        }
        let Some(normal) = self.last_surface_normal else {
            self.velocity = Vec3::ZERO;
            return MoveOutcome {
                position,
                yaw: self.yaw,
                floor: None,
            };
        };

        if let Some(target) = yaw_facing(-normal) {
            self.yaw = turn_towards(self.yaw, target, self.surface_turn_rate * request.dt);
        }

        let right = self.rotation() * Vec3::X;
        let (up_wall, along_wall) = climb_basis(normal, right, Vec3::Y);
        let desired = (up_wall * request.input.y + along_wall * request.input.x).clamp_length_max(1.0)
            * self.climb_speed;

        let slide = move_and_slide(query, capsule, filter, position, desired * request.dt);
        self.velocity = clip_velocity(desired, &slide.blocking_normals);
        MoveOutcome {
            position: slide.position,
            yaw: self.yaw,
            floor: None,
        }
    }

    fn integrate_walking(
        &mut self,
        query: &dyn SurfaceQuery,
        capsule: CapsuleProbe,
        filter: &QueryFilter,
        position: Vec3,
        request: &MoveRequest,
    ) -> MoveOutcome {
        let airborne = request.mode == LocomotionMode::Airborne;
        let dt = request.dt;
        let position = depenetrate(query, capsule, filter, position);

        let (forward, right) = request.control.planar_basis();
        let input = (forward * request.input.y + right * request.input.x).clamp_length_max(1.0);

        let mut velocity = walk_velocity(self.velocity, input, &self.movement, airborne, dt);
        if airborne {
            velocity += request.gravity * dt;
        } else {
            velocity.y = 0.0;
        }

        if let Some(target) = yaw_facing(input) {
            let max_step = self.movement.rotation_rate_deg.to_radians() * dt;
            self.yaw = turn_towards(self.yaw, target, max_step);
        }

        let slide = move_and_slide(query, capsule, filter, position, velocity * dt);
        let mut position = slide.position;
        velocity = clip_velocity(velocity, &slide.blocking_normals);

        // Walkable slopes drop at most one unit per unit of horizontal travel.
        let horizontal_travel = Vec3::new(velocity.x, 0.0, velocity.z).length() * dt;
        let probe = if airborne {
            self.movement.floor_probe_distance
        } else {
            self.movement.floor_probe_distance + horizontal_travel
        };
        let floor = if airborne && velocity.y > 0.0 {
            None
        } else {
            find_floor(query, capsule, filter, position, probe, self.movement.walkable_floor_deg)
        };
        if let Some(hit) = floor {
            position.y -= (hit.distance - SKIN_WIDTH).max(0.0);
            velocity.y = 0.0;
        }

        self.velocity = velocity;
        MoveOutcome {
            position,
            yaw: self.yaw,
            floor,
        }
    }
}

/// Remove velocity pointing into any of `normals`.
fn clip_velocity(velocity: Vec3, normals: &[Vec3]) -> Vec3 {
    normals.iter().fold(velocity, |v, n| {
        let into = v.dot(*n);
        if into < 0.0 {
            v - *n * into
        } else {
            v
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::physics::{Collider, ColliderShape, RigidBody};
    use crate::ecs::components::transform::{GlobalTransform, Transform};
    use crate::physics::SceneQuery;

    const CAPSULE: CapsuleProbe = CapsuleProbe {
        radius: 42.0,
        half_height: 54.0,
    };

    fn spawn_static_box(world: &mut hecs::World, center: Vec3, half_extents: Vec3) -> hecs::Entity {
        let transform = Transform::from_position(center);
        world.spawn((
            transform,
            GlobalTransform::from_transform(&transform),
            RigidBody::new_static(),
            Collider::new(ColliderShape::Box { half_extents }),
        ))
    }

    /// Ground with its top at y = 0 and a wall occupying x in [200, 220].
    fn scene() -> hecs::World {
        let mut world = hecs::World::new();
        spawn_static_box(&mut world, Vec3::new(0.0, -10.0, 0.0), Vec3::new(1000.0, 10.0, 1000.0));
        spawn_static_box(&mut world, Vec3::new(210.0, 300.0, 0.0), Vec3::new(10.0, 300.0, 1000.0));
        world
    }

    fn request(mode: LocomotionMode, input: Vec2) -> MoveRequest {
        MoveRequest {
            mode,
            input,
            control: ControlRotation::default(),
            surface_normal: None,
            gravity: Vec3::new(0.0, -980.0, 0.0),
            dt: 1.0 / 60.0,
        }
    }

    #[test]
    fn test_climb_basis_on_wall() {
        // Facing +X (yaw -90 degrees): right is +Z.
        let (up_wall, along_wall) = climb_basis(Vec3::NEG_X, Vec3::Z, Vec3::Y);
        assert!((up_wall - Vec3::Y).length() < 1e-5);
        assert!((along_wall - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_control_rotation() {
        let mut control = ControlRotation::default();
        control.apply_look(Vec2::new(90.0, 0.0), 1.0);
        let (forward, right) = control.planar_basis();
        assert!((forward - Vec3::X).length() < 1e-5);
        assert!((right - Vec3::Z).length() < 1e-5);

        control.apply_look(Vec2::new(0.0, 200.0), 1.0);
        assert!((control.pitch.to_degrees() - 89.0).abs() < 1e-3);
    }

    #[test]
    fn test_yaw_helpers() {
        assert_eq!(yaw_facing(Vec3::Y), None);
        let yaw = yaw_facing(Vec3::X).unwrap();
        assert!((Quat::from_rotation_y(yaw) * Vec3::NEG_Z - Vec3::X).length() < 1e-5);

        // 170 to -170 degrees is a 20 degree turn through 180.
        let turned = turn_towards(170f32.to_radians(), (-170f32).to_radians(), 5f32.to_radians());
        assert!((turned.to_degrees() - 175.0).abs() < 1e-3);
    }

    #[test]
    fn test_walk_velocity_accelerates_and_brakes() {
        let config = MovementConfig::default();
        let dt = 1.0 / 60.0;
        let mut v = Vec3::ZERO;
        for _ in 0..60 {
            v = walk_velocity(v, Vec3::X, &config, false, dt);
        }
        assert!((v.x - 500.0).abs() < 1e-3);

        let braked = walk_velocity(v, Vec3::ZERO, &config, false, dt);
        assert!((braked.x - (500.0 - 2000.0 * dt)).abs() < 1e-3);

        // Air control scales acceleration.
        let air = walk_velocity(Vec3::ZERO, Vec3::X, &config, true, dt);
        assert!((air.x - 2048.0 * 0.35 * dt).abs() < 1e-3);

        // Tiny analog input still asks for the minimum analog speed.
        let mut slow = Vec3::ZERO;
        for _ in 0..60 {
            slow = walk_velocity(slow, Vec3::X * 0.01, &config, false, dt);
        }
        assert!((slow.x - 20.0).abs() < 1e-3);
    }

    #[test]
    fn test_slide_stops_at_wall() {
        let world = scene();
        let query = SceneQuery::new(&world);
        let start = Vec3::new(100.0, 100.0, 0.0);
        let slide = move_and_slide(&query, CAPSULE, &QueryFilter::default(), start, Vec3::new(100.0, 0.0, 50.0));

        assert_eq!(slide.blocking_normals.len(), 1);
        // Capsule surface stops at the wall face, x = 200.
        assert!(slide.position.x <= 158.0 + 1e-3 && slide.position.x > 157.8, "x = {}", slide.position.x);
        assert!((slide.position.z - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_find_floor() {
        let world = scene();
        let query = SceneQuery::new(&world);
        let standing = Vec3::new(0.0, 96.5, 0.0);
        let floor = find_floor(&query, CAPSULE, &QueryFilter::default(), standing, 2.4, 44.765).unwrap();
        assert!((floor.normal - Vec3::Y).length() < 1e-3);
        assert!((floor.distance - 0.5).abs() < 0.06);

        let high = Vec3::new(0.0, 150.0, 0.0);
        assert!(find_floor(&query, CAPSULE, &QueryFilter::default(), high, 2.4, 44.765).is_none());
    }

    #[test]
    fn test_fall_and_land() {
        let world = scene();
        let query = SceneQuery::new(&world);
        let mut motor = CharacterMotor::new(MovementConfig::default(), &ClimbConfig::default(), 0.0);
        let mut position = Vec3::new(0.0, 150.0, 0.0);

        let mut landed = false;
        for _ in 0..120 {
            let outcome = motor.integrate(
                &query,
                CAPSULE,
                &QueryFilter::default(),
                position,
                &request(LocomotionMode::Airborne, Vec2::ZERO),
            );
            position = outcome.position;
            if outcome.floor.is_some() {
                landed = true;
                break;
            }
        }
        assert!(landed);
        assert!((position.y - 96.0).abs() < 0.1, "y = {}", position.y);
        assert_eq!(motor.velocity().y, 0.0);
    }

    #[test]
    fn test_walk_turns_towards_input() {
        let world = scene();
        let query = SceneQuery::new(&world);
        let mut motor = CharacterMotor::new(MovementConfig::default(), &ClimbConfig::default(), 0.0);
        let mut position = Vec3::new(-300.0, 96.01, 0.0);

        // Right input with zero control yaw walks towards +X.
        for _ in 0..60 {
            let outcome = motor.integrate(
                &query,
                CAPSULE,
                &QueryFilter::default(),
                position,
                &request(LocomotionMode::Grounded, Vec2::new(1.0, 0.0)),
            );
            assert!(outcome.floor.is_some());
            position = outcome.position;
        }
        assert!(position.x > -300.0 + 100.0);
        assert!((position.y - 96.0).abs() < 0.1);
        let facing = motor.rotation() * Vec3::NEG_Z;
        assert!((facing - Vec3::X).length() < 1e-3);
    }

    #[test]
    fn test_climbing_moves_up_the_wall() {
        let world = scene();
        let query = SceneQuery::new(&world);
        let mut motor = CharacterMotor::new(MovementConfig::default(), &ClimbConfig::default(), -std::f32::consts::FRAC_PI_2);
        let start = Vec3::new(150.0, 200.0, 0.0);

        let mut climb = request(LocomotionMode::Climbing, Vec2::new(0.0, 1.0));
        climb.surface_normal = Some(Vec3::NEG_X);
        climb.gravity = Vec3::ZERO;
        let outcome = motor.integrate(&query, CAPSULE, &QueryFilter::default(), start, &climb);
        assert!((outcome.position.y - (200.0 + 2.0)).abs() < 1e-3);
        assert!((outcome.position.x - 150.0).abs() < 1e-3);

        // No contact this tick: the last normal still drives the remap.
        climb.surface_normal = None;
        climb.input = Vec2::new(1.0, 0.0);
        let outcome = motor.integrate(&query, CAPSULE, &QueryFilter::default(), outcome.position, &climb);
        assert!((outcome.position.z - 2.0).abs() < 1e-3);
    }
}
