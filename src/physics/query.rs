//! Synchronous world queries: capsule sweeps, line traces, and overlaps.
//!
//! Gameplay code depends on the [`SurfaceQuery`] and [`OverlapQuery`] traits and
//! receives an implementation at the call site; [`SceneQuery`] answers them from a
//! borrowed `hecs::World`.

use glam::Vec3;

use crate::ecs::components::physics::{Collider, ColliderShape, RigidBodyType};
use crate::ecs::components::transform::GlobalTransform;

use super::broadphase::{BroadphaseEntry, SweepAndPrune};
use super::collider::PhysicsAabb;
use super::contact::ContactInfo;
use super::narrowphase::{shapes_overlap, RoundedCore};

/// Conservative-advancement and sphere-tracing step limit.
const MAX_MARCH_STEPS: usize = 64;
/// Gap at which a sweep or trace counts as touching (cm).
const CONTACT_TOLERANCE: f32 = 0.05;

/// Which bodies a query may report.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryFilter {
    /// Entity never reported (usually the querying character itself).
    pub exclude: Option<hecs::Entity>,
    /// Only report [`RigidBodyType::Static`] bodies.
    pub static_only: bool,
}

impl QueryFilter {
    /// Static world geometry, ignoring `entity`.
    pub fn static_world_except(entity: hecs::Entity) -> Self {
        Self {
            exclude: Some(entity),
            static_only: true,
        }
    }

    /// Every body except `entity`.
    pub fn all_except(entity: hecs::Entity) -> Self {
        Self {
            exclude: Some(entity),
            static_only: false,
        }
    }

    fn accepts(&self, entry: &BroadphaseEntry) -> bool {
        if self.exclude == Some(entry.entity) {
            return false;
        }
        !self.static_only || entry.body_type == RigidBodyType::Static
    }
}

/// Upright capsule used for sweeps; `half_height` excludes the caps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapsuleProbe {
    pub radius: f32,
    pub half_height: f32,
}

impl CapsuleProbe {
    fn segment_at(&self, center: Vec3) -> (Vec3, Vec3) {
        let h = Vec3::Y * self.half_height;
        (center - h, center + h)
    }

    fn aabb_at(&self, center: Vec3) -> PhysicsAabb {
        let extent = Vec3::new(self.radius, self.half_height + self.radius, self.radius);
        PhysicsAabb {
            min: center - extent,
            max: center + extent,
        }
    }
}

/// One surface touched by a sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepHit {
    pub entity: hecs::Entity,
    /// Surface normal pointing back towards the swept shape.
    pub normal: Vec3,
    /// Closest point on the touched surface.
    pub impact_point: Vec3,
    /// Distance travelled from the sweep start before touching.
    pub distance: f32,
    /// The shape already overlapped the surface at the start of the sweep.
    pub start_penetrating: bool,
}

/// Nearest surface hit by a line trace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceHit {
    pub entity: hecs::Entity,
    pub point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
}

/// Overlap between a capsule and one body, used for depenetration.
#[derive(Debug, Clone, Copy)]
pub struct Penetration {
    pub entity: hecs::Entity,
    /// Normal pointing from the body towards the capsule.
    pub normal: Vec3,
    pub depth: f32,
}

/// Geometry queries used by locomotion.
pub trait SurfaceQuery {
    /// All surfaces touched by a capsule moved from `start` to `end`, nearest first.
    fn sweep_capsule(
        &self,
        capsule: CapsuleProbe,
        start: Vec3,
        end: Vec3,
        filter: &QueryFilter,
    ) -> Vec<SweepHit>;

    /// Nearest surface crossed by the segment `start..end`.
    fn line_trace(&self, start: Vec3, end: Vec3, filter: &QueryFilter) -> Option<TraceHit>;

    /// Bodies currently overlapping a capsule centred at `center`.
    fn capsule_penetrations(
        &self,
        capsule: CapsuleProbe,
        center: Vec3,
        filter: &QueryFilter,
    ) -> Vec<Penetration>;
}

/// Overlap queries used by melee impacts.
pub trait OverlapQuery {
    /// Entities whose colliders overlap `shape` placed at `transform`.
    fn overlapping(
        &self,
        shape: &ColliderShape,
        transform: &GlobalTransform,
        filter: &QueryFilter,
    ) -> Vec<hecs::Entity>;
}

/// [`SurfaceQuery`] and [`OverlapQuery`] over a `hecs::World`.
pub struct SceneQuery<'w> {
    world: &'w hecs::World,
    broadphase: SweepAndPrune,
}

impl<'w> SceneQuery<'w> {
    pub fn new(world: &'w hecs::World) -> Self {
        Self {
            world,
            broadphase: SweepAndPrune::new(),
        }
    }

    /// Broadphase candidates passing `filter`, with their collider and placed transform.
    fn candidates(
        &self,
        region: &PhysicsAabb,
        filter: &QueryFilter,
    ) -> Vec<(hecs::Entity, ColliderShape, GlobalTransform)> {
        self.broadphase
            .query_region(self.world, region)
            .into_iter()
            .filter(|entry| filter.accepts(entry))
            .filter_map(|entry| {
                let collider = self.world.get::<&Collider>(entry.entity).ok()?;
                let transform = self.world.get::<&GlobalTransform>(entry.entity).ok()?;
                Some((
                    entry.entity,
                    collider.shape.clone(),
                    transform.with_local_offset(collider.offset),
                ))
            })
            .collect()
    }
}

impl SurfaceQuery for SceneQuery<'_> {
    fn sweep_capsule(
        &self,
        capsule: CapsuleProbe,
        start: Vec3,
        end: Vec3,
        filter: &QueryFilter,
    ) -> Vec<SweepHit> {
        let travel = end - start;
        let length = travel.length();
        let direction = travel.normalize_or_zero();
        let region = capsule
            .aabb_at(start)
            .union(&capsule.aabb_at(end))
            .expanded(CONTACT_TOLERANCE);

        let mut hits: Vec<SweepHit> = self
            .candidates(&region, filter)
            .into_iter()
            .filter_map(|(entity, shape, transform)| {
                sweep_against(&shape, &transform, capsule, start, direction, length).map(
                    |(distance, prox_normal, point, start_penetrating)| SweepHit {
                        entity,
                        normal: prox_normal,
                        impact_point: point,
                        distance,
                        start_penetrating,
                    },
                )
            })
            .collect();

        // Nearest first, entity bits as a stable tie-break.
        hits.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.entity.to_bits().cmp(&b.entity.to_bits()))
        });
        hits
    }

    fn line_trace(&self, start: Vec3, end: Vec3, filter: &QueryFilter) -> Option<TraceHit> {
        let length = (end - start).length();
        if length < 1e-6 {
            return None;
        }
        let direction = (end - start) / length;
        let region = PhysicsAabb {
            min: start.min(end),
            max: start.max(end),
        }
        .expanded(CONTACT_TOLERANCE);

        self.candidates(&region, filter)
            .into_iter()
            .filter_map(|(entity, shape, transform)| {
                let mut travelled = 0.0f32;
                for _ in 0..MAX_MARCH_STEPS {
                    let point = start + direction * travelled;
                    let prox = shape.signed_distance(point, &transform);
                    if prox.distance <= CONTACT_TOLERANCE {
                        return Some(TraceHit {
                            entity,
                            point: prox.point,
                            normal: prox.normal,
                            distance: travelled,
                        });
                    }
                    travelled += prox.distance;
                    if travelled > length {
                        return None;
                    }
                }
                None
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    fn capsule_penetrations(
        &self,
        capsule: CapsuleProbe,
        center: Vec3,
        filter: &QueryFilter,
    ) -> Vec<Penetration> {
        let (a, b) = capsule.segment_at(center);
        let core = RoundedCore::Segment {
            a,
            b,
            radius: capsule.radius,
        };
        self.candidates(&capsule.aabb_at(center), filter)
            .into_iter()
            .filter_map(|(entity, shape, transform)| {
                let ContactInfo {
                    normal,
                    penetration,
                    ..
                } = core.contact(&shape, &transform)?;
                Some(Penetration {
                    entity,
                    normal: -normal,
                    depth: penetration,
                })
            })
            .collect()
    }
}

impl OverlapQuery for SceneQuery<'_> {
    fn overlapping(
        &self,
        shape: &ColliderShape,
        transform: &GlobalTransform,
        filter: &QueryFilter,
    ) -> Vec<hecs::Entity> {
        let region = shape.compute_aabb(transform);
        self.candidates(&region, filter)
            .into_iter()
            .filter(|(_, other, other_transform)| {
                shapes_overlap(shape, transform, other, other_transform)
            })
            .map(|(entity, _, _)| entity)
            .collect()
    }
}

/// Conservative advancement of a capsule along `direction` against one shape.
///
/// Returns `(distance, normal, impact_point, start_penetrating)`.
fn sweep_against(
    shape: &ColliderShape,
    transform: &GlobalTransform,
    capsule: CapsuleProbe,
    start: Vec3,
    direction: Vec3,
    length: f32,
) -> Option<(f32, Vec3, Vec3, bool)> {
    let mut travelled = 0.0f32;
    for _ in 0..MAX_MARCH_STEPS {
        let (a, b) = capsule.segment_at(start + direction * travelled);
        let (_, prox) = shape.segment_proximity(a, b, transform);
        let gap = prox.distance - capsule.radius;
        if gap <= CONTACT_TOLERANCE {
            let start_penetrating = travelled == 0.0 && gap < 0.0;
            return Some((travelled, prox.normal, prox.point, start_penetrating));
        }
        if direction == Vec3::ZERO {
            return None;
        }
        travelled += gap;
        if travelled > length {
            return None;
        }
    }
    None
}
