//! Shared setup helpers for grip benchmarks.
//!
//! ## Running
//!
//!   cargo bench --manifest-path benchmarks/Cargo.toml --bench grip
//!
//! Filter by group:
//!   cargo bench --manifest-path benchmarks/Cargo.toml --bench grip -- scanner

use glam::Vec3;
use grip::ecs::components::physics::{ArticulatedBody, Collider, ColliderShape, RigidBody};
use grip::ecs::components::transform::{GlobalTransform, Transform};
use grip::locomotion::WallContact;

/// Character position used by every scene: 18 cm in front of the wall, facing +X.
pub const CHARACTER_POSITION: Vec3 = Vec3::new(140.0, 96.01, 0.0);

fn spawn_static_box(world: &mut hecs::World, center: Vec3, half_extents: Vec3) -> hecs::Entity {
    let transform = Transform::from_position(center);
    world.spawn((
        transform,
        GlobalTransform::from_transform(&transform),
        RigidBody::new_static(),
        Collider::new(ColliderShape::Box { half_extents }),
    ))
}

/// Ground, a climbable wall at x in [200, 220] and `clutter` extra static pillars
/// spread behind the character, plus the character capsule itself.
pub fn setup_wall_scene(clutter: usize) -> (hecs::World, hecs::Entity) {
    let mut world = hecs::World::new();
    spawn_static_box(&mut world, Vec3::new(0.0, -10.0, 0.0), Vec3::new(5000.0, 10.0, 5000.0));
    spawn_static_box(&mut world, Vec3::new(210.0, 300.0, 0.0), Vec3::new(10.0, 300.0, 2000.0));

    let cols = (clutter as f32).sqrt().ceil().max(1.0) as usize;
    for i in 0..clutter {
        let x = -300.0 - (i % cols) as f32 * 150.0;
        let z = (i / cols) as f32 * 150.0 - 1000.0;
        spawn_static_box(&mut world, Vec3::new(x, 100.0, z), Vec3::new(30.0, 100.0, 30.0));
    }

    let transform = Transform::from_position_yaw(CHARACTER_POSITION, -std::f32::consts::FRAC_PI_2);
    let character = world.spawn((
        transform,
        GlobalTransform::from_transform(&transform),
        RigidBody::new_kinematic(80.0),
        Collider::new(ColliderShape::capsule_with_total_half_height(42.0, 96.0)),
    ));
    (world, character)
}

/// `n` wall contacts of which only the last one faces the character.
pub fn contacts_with_last_climbable(n: usize, entity: hecs::Entity) -> Vec<WallContact> {
    (0..n)
        .map(|i| WallContact {
            normal: if i + 1 == n { Vec3::NEG_X } else { Vec3::Y },
            impact_point: Vec3::new(200.0, 0.0, 0.0),
            distance: 0.0,
            entity,
        })
        .collect()
}

/// `n` animated training dummies packed around the origin, plus an attacker entity.
pub fn setup_dummies(n: usize) -> (hecs::World, hecs::Entity, Vec<hecs::Entity>) {
    let mut world = hecs::World::new();
    let attacker = world.spawn(());
    let dummies = (0..n)
        .map(|i| {
            let transform = Transform::from_position(Vec3::new(i as f32 * 10.0, 96.0, -80.0));
            world.spawn((
                transform,
                GlobalTransform::from_transform(&transform),
                RigidBody::new_kinematic(60.0),
                Collider::new(ColliderShape::Capsule {
                    radius: 25.0,
                    half_height: 50.0,
                }),
                ArticulatedBody::new(),
            ))
        })
        .collect();
    (world, attacker, dummies)
}
