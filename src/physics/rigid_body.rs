//! Rigid body integration functions.

use glam::{Quat, Vec3};

use crate::ecs::components::physics::{RigidBody, RigidBodyType, SleepInfo, SleepState};
use crate::ecs::components::transform::{GlobalTransform, Transform};

/// Linear velocity threshold for sleep eligibility (cm/s).
const LINEAR_SLEEP_THRESHOLD: f32 = 5.0;
/// Angular velocity threshold for sleep eligibility.
const ANGULAR_SLEEP_THRESHOLD: f32 = 0.05;
/// Time in seconds a body must be below thresholds before sleeping.
const SLEEP_TIME: f32 = 1.0;

fn is_sleeping(sleep: Option<&SleepInfo>) -> bool {
    sleep.is_some_and(|s| s.state == SleepState::Sleeping)
}

/// Apply gravity force to all dynamic rigid bodies.
pub fn apply_gravity(world: &mut hecs::World, gravity: Vec3) {
    for (_, (rb, sleep)) in world.query_mut::<(&mut RigidBody, Option<&SleepInfo>)>() {
        if rb.body_type == RigidBodyType::Dynamic && rb.mass > 0.0 && !is_sleeping(sleep) {
            rb.force_accumulator += gravity * rb.mass * rb.gravity_scale;
        }
    }
}

/// Integrate velocities using semi-implicit Euler: v += (F/m) * dt.
///
/// Damping is applied as `v *= 1 / (1 + dt * damping)`, so a damping of 5.0 removes
/// most of a body's spin within a second without ever reversing it.
pub fn integrate_velocities(world: &mut hecs::World, dt: f32) {
    for (_, (rb, sleep)) in world.query_mut::<(&mut RigidBody, Option<&SleepInfo>)>() {
        if rb.body_type != RigidBodyType::Dynamic || rb.mass <= 0.0 || is_sleeping(sleep) {
            continue;
        }

        let inv_mass = 1.0 / rb.mass;
        rb.linear_velocity += rb.force_accumulator * inv_mass * dt;
        rb.angular_velocity += rb.torque_accumulator * rb.inverse_inertia() * dt;

        rb.linear_velocity *= 1.0 / (1.0 + dt * rb.linear_damping.max(0.0));
        rb.angular_velocity *= 1.0 / (1.0 + dt * rb.angular_damping.max(0.0));
    }
}

/// Integrate positions: p += v * dt, q += 0.5 * omega * q * dt.
pub fn integrate_positions(world: &mut hecs::World, dt: f32) {
    for (_, (rb, transform, sleep)) in
        world.query_mut::<(&RigidBody, &mut Transform, Option<&SleepInfo>)>()
    {
        if rb.body_type != RigidBodyType::Dynamic || is_sleeping(sleep) {
            continue;
        }

        transform.position += rb.linear_velocity * dt;

        // q' = q + 0.5 * dt * omega_quat * q
        let omega = rb.angular_velocity;
        if omega.length_squared() > 1e-10 {
            let omega_quat = Quat::from_xyzw(omega.x, omega.y, omega.z, 0.0);
            let q_dot = omega_quat * transform.rotation * 0.5;
            transform.rotation = Quat::from_xyzw(
                transform.rotation.x + q_dot.x * dt,
                transform.rotation.y + q_dot.y * dt,
                transform.rotation.z + q_dot.z * dt,
                transform.rotation.w + q_dot.w * dt,
            )
            .normalize();
        }
    }
}

/// Synchronize Transform to GlobalTransform.
pub fn sync_transforms(world: &mut hecs::World) {
    for (_, (transform, global)) in world.query_mut::<(&Transform, &mut GlobalTransform)>() {
        global.0 = transform.to_matrix();
    }
}

/// Clear force and torque accumulators on all rigid bodies.
pub fn clear_forces(world: &mut hecs::World) {
    for (_, rb) in world.query_mut::<&mut RigidBody>() {
        rb.force_accumulator = Vec3::ZERO;
        rb.torque_accumulator = Vec3::ZERO;
    }
}

/// Update sleep states for all dynamic bodies.
///
/// Bodies with velocities below thresholds for `SLEEP_TIME` seconds
/// transition to `Sleeping`. Sleeping bodies skip integration and gravity.
pub fn update_sleep_states(world: &mut hecs::World, dt: f32) {
    for (_, (rb, sleep)) in world.query_mut::<(&mut RigidBody, &mut SleepInfo)>() {
        if rb.body_type != RigidBodyType::Dynamic {
            continue;
        }

        let linear_speed = rb.linear_velocity.length();
        let angular_speed = rb.angular_velocity.length();

        if linear_speed < LINEAR_SLEEP_THRESHOLD && angular_speed < ANGULAR_SLEEP_THRESHOLD {
            sleep.timer += dt;
            if sleep.timer >= SLEEP_TIME {
                sleep.state = SleepState::Sleeping;
                rb.linear_velocity = Vec3::ZERO;
                rb.angular_velocity = Vec3::ZERO;
            }
        } else {
            sleep.timer = 0.0;
            sleep.state = SleepState::Awake;
        }
    }
}

/// Wake up a specific entity's rigid body.
pub fn wake_body(world: &mut hecs::World, entity: hecs::Entity) {
    if let Ok(mut sleep) = world.get::<&mut SleepInfo>(entity) {
        wake(&mut sleep);
    }
}

pub(crate) fn wake(sleep: &mut SleepInfo) {
    if sleep.state == SleepState::Sleeping {
        sleep.state = SleepState::Awake;
        sleep.timer = 0.0;
    }
}

/// Apply a one-shot impulse at the centre of mass.
///
/// With `velocity_change` the impulse is taken as a change in velocity and the
/// body's mass is ignored; otherwise it is divided by the mass. Non-dynamic bodies
/// are left untouched.
pub fn apply_central_impulse(rb: &mut RigidBody, impulse: Vec3, velocity_change: bool) {
    if rb.body_type != RigidBodyType::Dynamic {
        return;
    }
    if velocity_change {
        rb.linear_velocity += impulse;
    } else if rb.mass > 0.0 {
        rb.linear_velocity += impulse / rb.mass;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(world: &mut hecs::World, gravity: Vec3, dt: f32) {
        apply_gravity(world, gravity);
        integrate_velocities(world, dt);
        integrate_positions(world, dt);
        sync_transforms(world);
        clear_forces(world);
    }

    #[test]
    fn test_free_fall() {
        let mut world = hecs::World::new();

        let entity = world.spawn((
            Transform::from_position(Vec3::new(0.0, 1000.0, 0.0)),
            GlobalTransform::default(),
            RigidBody::new_dynamic(1.0),
        ));

        let gravity = Vec3::new(0.0, -980.0, 0.0);
        for _ in 0..60 {
            step(&mut world, gravity, 1.0 / 60.0);
        }

        let transform = world.get::<&Transform>(entity).unwrap();

        // Roughly 490 cm of fall after one second.
        assert!(transform.position.y < 600.0, "y = {}", transform.position.y);
        assert!(transform.position.y > 400.0, "y = {}", transform.position.y);

        let eps = 1e-5;
        assert!(transform.position.x.abs() < eps);
        assert!(transform.position.z.abs() < eps);
    }

    #[test]
    fn test_static_and_kinematic_unaffected() {
        let mut world = hecs::World::new();

        let fixed = world.spawn((
            Transform::identity(),
            GlobalTransform::default(),
            RigidBody::new_static(),
        ));
        let animated = world.spawn((
            Transform::identity(),
            GlobalTransform::default(),
            RigidBody::new_kinematic(70.0),
        ));

        for _ in 0..60 {
            step(&mut world, Vec3::new(0.0, -980.0, 0.0), 1.0 / 60.0);
        }

        assert_eq!(world.get::<&Transform>(fixed).unwrap().position, Vec3::ZERO);
        assert_eq!(world.get::<&Transform>(animated).unwrap().position, Vec3::ZERO);
    }

    #[test]
    fn test_heavy_damping_never_reverses_velocity() {
        let mut world = hecs::World::new();
        let entity = world.spawn((Transform::identity(), GlobalTransform::default(), {
            let mut rb = RigidBody::new_dynamic(1.0);
            rb.linear_velocity = Vec3::new(100.0, 0.0, 0.0);
            rb.angular_velocity = Vec3::new(0.0, 10.0, 0.0);
            rb.linear_damping = 2.0;
            rb.angular_damping = 5.0;
            rb
        }));

        integrate_velocities(&mut world, 1.0 / 60.0);

        let rb = world.get::<&RigidBody>(entity).unwrap();
        assert!(rb.linear_velocity.x > 90.0 && rb.linear_velocity.x < 100.0);
        assert!(rb.angular_velocity.y > 0.0 && rb.angular_velocity.y < 10.0);
    }

    #[test]
    fn test_central_impulse() {
        let mut rb = RigidBody::new_dynamic(50.0);
        apply_central_impulse(&mut rb, Vec3::new(0.0, 0.0, 100.0), false);
        assert!((rb.linear_velocity.z - 2.0).abs() < 1e-5);

        apply_central_impulse(&mut rb, Vec3::new(0.0, 0.0, 100.0), true);
        assert!((rb.linear_velocity.z - 102.0).abs() < 1e-4);

        let mut animated = RigidBody::new_kinematic(50.0);
        apply_central_impulse(&mut animated, Vec3::X, true);
        assert_eq!(animated.linear_velocity, Vec3::ZERO);
    }

    #[test]
    fn test_clear_forces() {
        let mut world = hecs::World::new();

        let entity = world.spawn((Transform::identity(), GlobalTransform::default(), {
            let mut rb = RigidBody::new_dynamic(1.0);
            rb.force_accumulator = Vec3::new(10.0, 20.0, 30.0);
            rb.torque_accumulator = Vec3::new(1.0, 2.0, 3.0);
            rb
        }));

        clear_forces(&mut world);

        let rb = world.get::<&RigidBody>(entity).unwrap();
        assert_eq!(rb.force_accumulator, Vec3::ZERO);
        assert_eq!(rb.torque_accumulator, Vec3::ZERO);
    }
}
