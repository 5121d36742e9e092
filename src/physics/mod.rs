//! CPU physics for the bodies melee impacts release, plus world queries.
//!
//! # Architecture
//!
//! The physics pipeline runs in a fixed timestep loop:
//!
//! 1. Apply forces (gravity)
//! 2. Integrate velocities (with damping)
//! 3. Broadphase collision detection (AABB overlap)
//! 4. Narrowphase collision detection (SAT and distance-field tests)
//! 5. Solve contact constraints (sequential impulse)
//! 6. Integrate positions
//! 7. Synchronize transforms
//! 8. Clear force accumulators and update sleep states
//!
//! Characters are kinematic: the physics step never moves them, they move
//! themselves through [`query::SurfaceQuery`].

pub mod broadphase;
pub mod collider;
pub mod contact;
pub mod narrowphase;
pub mod query;
pub mod rigid_body;
pub mod solver;

use glam::Vec3;

use crate::ecs::components::physics::Collider;
use crate::ecs::components::transform::GlobalTransform;

use self::broadphase::SweepAndPrune;
use self::contact::ContactManifold;
use self::narrowphase::detect_collision;

pub use self::query::{QueryFilter, SceneQuery};

/// Configuration for the physics simulation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PhysicsConfig {
    /// Gravity vector in cm/s^2. Default: (0, -980, 0).
    pub gravity: Vec3,
    /// Fixed timestep for physics updates in seconds. Default: 1/60.
    pub fixed_timestep: f64,
    /// Maximum number of sub-steps per frame. Default: 4.
    pub max_substeps: u32,
    /// Number of constraint solver iterations. Default: 8.
    pub solver_iterations: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -980.0, 0.0),
            fixed_timestep: 1.0 / 60.0,
            max_substeps: 4,
            solver_iterations: 8,
        }
    }
}

/// The main physics world managing simulation state.
pub struct PhysicsWorld {
    config: PhysicsConfig,
    accumulator: f64,
    broadphase: SweepAndPrune,
    contacts: Vec<ContactManifold>,
}

impl PhysicsWorld {
    /// Create a new physics world with the given configuration.
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            config,
            accumulator: 0.0,
            broadphase: SweepAndPrune::new(),
            contacts: Vec::new(),
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Contacts found during the most recent fixed step.
    pub fn contacts(&self) -> &[ContactManifold] {
        &self.contacts
    }

    /// Step the physics simulation forward by `delta_time` seconds.
    ///
    /// Uses a fixed timestep accumulator to ensure deterministic simulation.
    /// Returns the number of fixed steps taken.
    pub fn step(&mut self, world: &mut hecs::World, delta_time: f64) -> u32 {
        self.accumulator += delta_time;

        let mut substeps = 0u32;
        while self.accumulator >= self.config.fixed_timestep && substeps < self.config.max_substeps
        {
            self.fixed_step(world, self.config.fixed_timestep as f32);
            self.accumulator -= self.config.fixed_timestep;
            substeps += 1;
        }

        // Clamp accumulator to avoid spiral of death
        if self.accumulator > self.config.fixed_timestep * self.config.max_substeps as f64 {
            tracing::warn!(
                "physics fell behind by {:.3}s, dropping accumulated time",
                self.accumulator
            );
            self.accumulator = 0.0;
        }
        substeps
    }

    /// Run exactly one fixed step of `dt` seconds.
    pub fn fixed_step(&mut self, world: &mut hecs::World, dt: f32) {
        rigid_body::apply_gravity(world, self.config.gravity);
        rigid_body::integrate_velocities(world, dt);

        let pairs = self.broadphase.find_pairs(world);

        self.contacts.clear();
        for (entity_a, entity_b) in pairs {
            let contact = {
                let collider_a = world.get::<&Collider>(entity_a);
                let collider_b = world.get::<&Collider>(entity_b);
                let transform_a = world.get::<&GlobalTransform>(entity_a);
                let transform_b = world.get::<&GlobalTransform>(entity_b);

                match (collider_a, collider_b, transform_a, transform_b) {
                    (Ok(ca), Ok(cb), Ok(ta), Ok(tb)) => detect_collision(
                        &ca.shape,
                        &ta.with_local_offset(ca.offset),
                        &cb.shape,
                        &tb.with_local_offset(cb.offset),
                    ),
                    _ => None,
                }
            };

            if let Some(info) = contact {
                rigid_body::wake_body(world, entity_a);
                rigid_body::wake_body(world, entity_b);
                self.contacts
                    .push(ContactManifold::single(entity_a, entity_b, info));
            }
        }

        solver::solve_contacts(
            &mut self.contacts,
            world,
            self.config.solver_iterations,
            dt,
        );

        rigid_body::integrate_positions(world, dt);
        rigid_body::sync_transforms(world);
        rigid_body::clear_forces(world);
        rigid_body::update_sleep_states(world, dt);
    }
}
