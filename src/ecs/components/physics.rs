//! Physics components for ECS entities.

use glam::Vec3;

/// Rigid body type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RigidBodyType {
    /// Affected by forces and collisions.
    Dynamic,
    /// Immovable world geometry. The only bodies climbing scans and probes see.
    Static,
    /// Position controlled by user (character capsules, animated bodies), but affects dynamic bodies.
    Kinematic,
}

/// Rigid body component.
#[derive(Debug, Clone)]
pub struct RigidBody {
    pub body_type: RigidBodyType,
    pub mass: f32,
    /// Inertia tensor stored as column-major 3x3 matrix.
    pub inertia_tensor: [f32; 9],
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    pub force_accumulator: Vec3,
    pub torque_accumulator: Vec3,
    /// Linear damping per second (default: 0.01).
    pub linear_damping: f32,
    /// Angular damping per second (default: 0.01).
    pub angular_damping: f32,
    /// Coefficient of restitution (0.0 - 1.0).
    pub restitution: f32,
    /// Friction coefficient (0.0 - 1.0).
    pub friction: f32,
    /// Gravity scale (default: 1.0).
    pub gravity_scale: f32,
}

impl RigidBody {
    /// Create a new dynamic rigid body with the given mass.
    pub fn new_dynamic(mass: f32) -> Self {
        // Default inertia tensor: identity * mass (unit sphere approximation)
        let i = mass;
        Self {
            body_type: RigidBodyType::Dynamic,
            mass,
            inertia_tensor: [i, 0.0, 0.0, 0.0, i, 0.0, 0.0, 0.0, i],
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            force_accumulator: Vec3::ZERO,
            torque_accumulator: Vec3::ZERO,
            linear_damping: 0.01,
            angular_damping: 0.01,
            restitution: 0.3,
            friction: 0.5,
            gravity_scale: 1.0,
        }
    }

    /// Create a new static rigid body.
    pub fn new_static() -> Self {
        Self {
            body_type: RigidBodyType::Static,
            mass: 0.0,
            inertia_tensor: [0.0; 9],
            gravity_scale: 0.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            ..Self::new_dynamic(0.0)
        }
    }

    /// Create a new kinematic rigid body.
    ///
    /// Mass is kept so the body can later be switched to [`RigidBodyType::Dynamic`]
    /// without re-authoring it.
    pub fn new_kinematic(mass: f32) -> Self {
        Self {
            body_type: RigidBodyType::Kinematic,
            ..Self::new_dynamic(mass)
        }
    }

    /// Inverse of the diagonal inertia approximation (`inertia_tensor[0]`, `[4]`, `[8]`).
    #[inline]
    pub fn inverse_inertia(&self) -> Vec3 {
        let inv = |i: f32| if i > 0.0 { 1.0 / i } else { 0.0 };
        Vec3::new(
            inv(self.inertia_tensor[0]),
            inv(self.inertia_tensor[4]),
            inv(self.inertia_tensor[8]),
        )
    }

    /// Inverse mass for the solver; zero for anything not dynamic.
    #[inline]
    pub fn inverse_mass(&self) -> f32 {
        if self.body_type == RigidBodyType::Dynamic && self.mass > 0.0 {
            1.0 / self.mass
        } else {
            0.0
        }
    }
}

/// Sleep state of a dynamic body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepState {
    Awake,
    Sleeping,
}

/// Optional component enabling sleep for a dynamic body.
#[derive(Debug, Clone, Copy)]
pub struct SleepInfo {
    pub state: SleepState,
    /// Seconds spent below the sleep thresholds.
    pub timer: f32,
}

impl Default for SleepInfo {
    fn default() -> Self {
        Self {
            state: SleepState::Awake,
            timer: 0.0,
        }
    }
}

/// Collider shape.
///
/// Capsules and boxes are upright in local space; a capsule's `half_height` is the
/// half length of its inner segment (the caps add `radius` on each end).
#[derive(Debug, Clone, PartialEq)]
pub enum ColliderShape {
    Sphere { radius: f32 },
    Box { half_extents: Vec3 },
    Capsule { radius: f32, half_height: f32 },
}

impl ColliderShape {
    /// Capsule from a radius and a total half height measured to the tip of a cap.
    pub fn capsule_with_total_half_height(radius: f32, total_half_height: f32) -> Self {
        ColliderShape::Capsule {
            radius,
            half_height: (total_half_height - radius).max(0.0),
        }
    }
}

/// Collision detection component.
#[derive(Debug, Clone)]
pub struct Collider {
    pub shape: ColliderShape,
    /// Offset from the entity's transform origin.
    pub offset: Vec3,
}

impl Collider {
    pub fn new(shape: ColliderShape) -> Self {
        Self {
            shape,
            offset: Vec3::ZERO,
        }
    }
}

impl Default for Collider {
    fn default() -> Self {
        Self::new(ColliderShape::Sphere { radius: 0.5 })
    }
}

/// Articulated (skeletal) physics proxy.
///
/// Marks an entity whose [`RigidBody`] normally follows animation (kinematic) and can be
/// released into free simulation, ragdoll style. Presence of this component is the
/// capability melee impacts look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArticulatedBody {
    simulating: bool,
}

impl ArticulatedBody {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_simulating(&self) -> bool {
        self.simulating
    }

    /// Toggle free simulation, switching the paired rigid body between dynamic and kinematic.
    pub fn set_simulate_physics(&mut self, body: &mut RigidBody, simulate: bool) {
        self.simulating = simulate;
        body.body_type = if simulate {
            RigidBodyType::Dynamic
        } else {
            RigidBodyType::Kinematic
        };
    }

    /// Return the body to animation control with its motion cleared.
    ///
    /// Nothing in this crate calls it: bodies released by an impact stay simulating
    /// until the owner of the target's lifecycle hands them back.
    pub fn restore_animated(&mut self, body: &mut RigidBody) {
        self.set_simulate_physics(body, false);
        body.linear_velocity = Vec3::ZERO;
        body.angular_velocity = Vec3::ZERO;
    }
}
