//! Broadphase collision detection using AABB overlap tests.

use crate::ecs::components::physics::{Collider, RigidBody, RigidBodyType};
use crate::ecs::components::transform::GlobalTransform;

use super::collider::PhysicsAabb;

/// Sweep-and-prune broadphase (currently O(n^2) pair-wise AABB test).
#[derive(Default)]
pub struct SweepAndPrune;

/// One collider entry gathered for the broadphase.
#[derive(Debug, Clone, Copy)]
pub struct BroadphaseEntry {
    pub entity: hecs::Entity,
    pub aabb: PhysicsAabb,
    pub body_type: RigidBodyType,
}

impl SweepAndPrune {
    pub fn new() -> Self {
        Self
    }

    /// World-space AABBs for every entity carrying a collider, rigid body and global transform.
    pub fn gather(&self, world: &hecs::World) -> Vec<BroadphaseEntry> {
        world
            .query::<(&Collider, &GlobalTransform, &RigidBody)>()
            .iter()
            .map(|(entity, (collider, transform, rb))| BroadphaseEntry {
                entity,
                aabb: collider
                    .shape
                    .compute_aabb(&transform.with_local_offset(collider.offset)),
                body_type: rb.body_type,
            })
            .collect()
    }

    /// Find all pairs of entities whose AABBs overlap.
    ///
    /// Only pairs where at least one entity is not static are returned.
    pub fn find_pairs(&self, world: &hecs::World) -> Vec<(hecs::Entity, hecs::Entity)> {
        let entries = self.gather(world);

        let mut pairs = Vec::new();

        // O(n^2) brute force - sufficient for small numbers of entities
        for i in 0..entries.len() {
            for j in (i + 1)..entries.len() {
                let a = &entries[i];
                let b = &entries[j];

                // Skip static-static pairs
                if a.body_type == RigidBodyType::Static && b.body_type == RigidBodyType::Static {
                    continue;
                }

                if a.aabb.overlaps(&b.aabb) {
                    pairs.push((a.entity, b.entity));
                }
            }
        }

        pairs
    }

    /// Entities whose AABB overlaps `region`.
    pub fn query_region(&self, world: &hecs::World, region: &PhysicsAabb) -> Vec<BroadphaseEntry> {
        self.gather(world)
            .into_iter()
            .filter(|e| e.aabb.overlaps(region))
            .collect()
    }
}
