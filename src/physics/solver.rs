//! Sequential impulse constraint solver.

use glam::Vec3;

use crate::ecs::components::physics::RigidBody;
use crate::ecs::components::transform::Transform;

use super::contact::ContactManifold;

/// Baumgarte stabilization parameter.
const BAUMGARTE_BETA: f32 = 0.2;
/// Penetration slop (allowed penetration before position correction, cm).
const PENETRATION_SLOP: f32 = 0.5;

/// Solve contact constraints using sequential impulse iteration.
pub fn solve_contacts(
    manifolds: &mut [ContactManifold],
    world: &mut hecs::World,
    solver_iterations: u32,
    dt: f32,
) {
    for _ in 0..solver_iterations {
        for manifold in manifolds.iter_mut() {
            solve_manifold(manifold, world, dt);
        }
    }
}

fn solve_manifold(manifold: &mut ContactManifold, world: &mut hecs::World, dt: f32) {
    let pair = (manifold.entity_a, manifold.entity_b);
    let (Some(a), Some(b)) = (RbData::read(world, pair.0), RbData::read(world, pair.1)) else {
        return;
    };

    // Skip if both are static/kinematic
    if a.inv_mass == 0.0 && b.inv_mass == 0.0 {
        return;
    }

    let normal = manifold.normal;
    let restitution = (a.restitution + b.restitution) * 0.5;
    let friction = (a.friction + b.friction) * 0.5;

    for contact in &mut manifold.contacts {
        let r_a = contact.position - a.position;
        let r_b = contact.position - b.position;

        let (Some(a), Some(b)) = (RbData::read(world, pair.0), RbData::read(world, pair.1)) else {
            return;
        };

        let relative_velocity = b.velocity_at(r_b) - a.velocity_at(r_a);
        let contact_velocity = relative_velocity.dot(normal);

        let inv_mass_sum = a.effective_inverse_mass(r_a, normal) + b.effective_inverse_mass(r_b, normal);
        if inv_mass_sum <= 0.0 {
            continue;
        }

        // Baumgarte position correction
        let bias = BAUMGARTE_BETA / dt * (contact.penetration - PENETRATION_SLOP).max(0.0);

        // Restitution only for closing speeds; resting contacts stay resting.
        let bounce = if contact_velocity < 0.0 {
            -(1.0 + restitution) * contact_velocity
        } else {
            -contact_velocity
        };
        let j_normal = (bounce + bias) / inv_mass_sum;

        // Clamp accumulated normal impulse
        let old_impulse = contact.normal_impulse;
        contact.normal_impulse = (old_impulse + j_normal).max(0.0);
        let j_normal = contact.normal_impulse - old_impulse;

        apply_impulse(world, pair, normal * j_normal, r_a, r_b);

        // Friction impulse, from velocities after the normal impulse
        let (Some(a2), Some(b2)) = (RbData::read(world, pair.0), RbData::read(world, pair.1)) else {
            return;
        };

        let rel_vel2 = b2.velocity_at(r_b) - a2.velocity_at(r_a);
        let tangent_vel = rel_vel2 - normal * rel_vel2.dot(normal);
        let tangent_len = tangent_vel.length();

        if tangent_len > 1e-6 {
            let tangent = tangent_vel / tangent_len;
            let inv_mass_t =
                a2.effective_inverse_mass(r_a, tangent) + b2.effective_inverse_mass(r_b, tangent);

            if inv_mass_t > 0.0 {
                // Coulomb friction: |Jt| <= mu * |Jn|
                let max_friction = friction * contact.normal_impulse;
                let j_tangent = (-tangent_len / inv_mass_t).clamp(-max_friction, max_friction);
                apply_impulse(world, pair, tangent * j_tangent, r_a, r_b);
            }
        }
    }
}

/// Snapshot of a body's solver-relevant data.
struct RbData {
    inv_mass: f32,
    inv_inertia: Vec3,
    linear_velocity: Vec3,
    angular_velocity: Vec3,
    position: Vec3,
    restitution: f32,
    friction: f32,
}

impl RbData {
    fn read(world: &hecs::World, entity: hecs::Entity) -> Option<Self> {
        let rb = world.get::<&RigidBody>(entity).ok()?;
        let position = world
            .get::<&Transform>(entity)
            .map(|t| t.position)
            .unwrap_or(Vec3::ZERO);
        let inv_mass = rb.inverse_mass();
        Some(Self {
            inv_mass,
            inv_inertia: if inv_mass > 0.0 {
                rb.inverse_inertia()
            } else {
                Vec3::ZERO
            },
            linear_velocity: rb.linear_velocity,
            angular_velocity: rb.angular_velocity,
            position,
            restitution: rb.restitution,
            friction: rb.friction,
        })
    }

    #[inline]
    fn velocity_at(&self, r: Vec3) -> Vec3 {
        self.linear_velocity + self.angular_velocity.cross(r)
    }

    #[inline]
    fn effective_inverse_mass(&self, r: Vec3, direction: Vec3) -> f32 {
        let rxn = r.cross(direction);
        self.inv_mass + (self.inv_inertia * rxn).dot(rxn)
    }
}

/// Apply an impulse to both bodies at the contact point (negative on A, positive on B).
fn apply_impulse(
    world: &mut hecs::World,
    (entity_a, entity_b): (hecs::Entity, hecs::Entity),
    impulse: Vec3,
    r_a: Vec3,
    r_b: Vec3,
) {
    for (entity, sign, r) in [(entity_a, -1.0f32, r_a), (entity_b, 1.0f32, r_b)] {
        if let Ok(mut rb) = world.get::<&mut RigidBody>(entity) {
            let inv_mass = rb.inverse_mass();
            if inv_mass > 0.0 {
                let inv_inertia = rb.inverse_inertia();
                rb.linear_velocity += impulse * (sign * inv_mass);
                rb.angular_velocity += inv_inertia * r.cross(impulse) * sign;
            }
        }
    }
}
