//! Climb eligibility test against the current contact set.

use glam::Vec3;

use crate::config::{ClimbConfig, ProbePolicy};
use crate::physics::query::{QueryFilter, SurfaceQuery};

use super::scanner::WallContact;

/// Steepness below this is treated as a floor or ceiling.
const FLAT_SURFACE_EPSILON: f32 = 1e-4;

/// How a climb request was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClimbVerdict {
    /// A contact passed the facing test and the eye-level probe hit the surface.
    Confirmed,
    /// A contact passed the facing test but the probe did not confirm it.
    AngleOnly,
    Rejected,
}

impl ClimbVerdict {
    #[inline]
    pub fn accepted(self) -> bool {
        !matches!(self, ClimbVerdict::Rejected)
    }
}

/// Line trace at eye level, used to confirm a wall is tall enough to climb.
pub struct EyeProbe<'q> {
    pub query: &'q dyn SurfaceQuery,
    /// Character centre.
    pub position: Vec3,
    pub up: Vec3,
    pub filter: QueryFilter,
}

impl EyeProbe<'_> {
    fn hits(&self, forward: Vec3, eye_height: f32, distance: f32) -> bool {
        let start = self.position + self.up * eye_height;
        let end = start + forward * distance;
        self.query.line_trace(start, end, &self.filter).is_some()
    }
}

/// Facing and steepness measures of one contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceFacing {
    pub facing_angle_deg: f32,
    /// 1 for a vertical wall, 0 for a floor or ceiling.
    pub steepness: f32,
}

impl SurfaceFacing {
    pub fn measure(normal: Vec3, forward: Vec3) -> Self {
        let horizontal = Vec3::new(normal.x, 0.0, normal.z).normalize_or_zero();
        let facing_dot = forward.dot(-horizontal).clamp(-1.0, 1.0);
        Self {
            facing_angle_deg: facing_dot.acos().to_degrees(),
            steepness: normal.dot(horizontal),
        }
    }

    #[inline]
    pub fn is_flat(&self) -> bool {
        self.steepness.abs() < FLAT_SURFACE_EPSILON
    }
}

/// Decides whether the character may start climbing.
#[derive(Debug, Clone)]
pub struct ClimbGate {
    config: ClimbConfig,
}

impl ClimbGate {
    pub fn new(config: ClimbConfig) -> Self {
        Self { config }
    }

    /// Eye probe length for a surface of the given steepness.
    pub fn probe_distance(&self, steepness: f32) -> f32 {
        self.config.probe_base_distance * (1.0 + (1.0 - steepness) * 5.0)
    }

    pub fn can_climb(&self, contacts: &[WallContact], forward: Vec3, probe: &EyeProbe<'_>) -> bool {
        self.evaluate(contacts, forward, probe).accepted()
    }

    /// Verdict for the first contact that qualifies, in contact order.
    pub fn evaluate(&self, contacts: &[WallContact], forward: Vec3, probe: &EyeProbe<'_>) -> ClimbVerdict {
        for contact in contacts {
            let facing = SurfaceFacing::measure(contact.normal, forward);
            if facing.is_flat() || facing.facing_angle_deg > self.config.max_facing_angle_deg {
                continue;
            }

            let distance = self.probe_distance(facing.steepness);
            if probe.hits(forward, self.config.eye_height, distance) {
                return ClimbVerdict::Confirmed;
            }
            if self.config.probe_policy == ProbePolicy::Preferred {
                return ClimbVerdict::AngleOnly;
            }
        }
        ClimbVerdict::Rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::query::{CapsuleProbe, Penetration, SweepHit, TraceHit};

    /// Query whose line traces hit only when `trace_hits` is set.
    struct FixedTrace {
        trace_hits: bool,
        entity: hecs::Entity,
    }

    impl SurfaceQuery for FixedTrace {
        fn sweep_capsule(&self, _: CapsuleProbe, _: Vec3, _: Vec3, _: &QueryFilter) -> Vec<SweepHit> {
            Vec::new()
        }

        fn line_trace(&self, start: Vec3, end: Vec3, _: &QueryFilter) -> Option<TraceHit> {
            self.trace_hits.then(|| TraceHit {
                entity: self.entity,
                point: end,
                normal: Vec3::NEG_X,
                distance: (end - start).length(),
            })
        }

        fn capsule_penetrations(&self, _: CapsuleProbe, _: Vec3, _: &QueryFilter) -> Vec<Penetration> {
            Vec::new()
        }
    }

    fn entity() -> hecs::Entity {
        hecs::World::new().spawn(())
    }

    fn contact(normal: Vec3) -> WallContact {
        WallContact {
            normal,
            impact_point: Vec3::new(100.0, 0.0, 0.0),
            distance: 0.0,
            entity: entity(),
        }
    }

    fn verdict(config: ClimbConfig, contacts: &[WallContact], forward: Vec3, trace_hits: bool) -> ClimbVerdict {
        let query = FixedTrace {
            trace_hits,
            entity: entity(),
        };
        let probe = EyeProbe {
            query: &query,
            position: Vec3::ZERO,
            up: Vec3::Y,
            filter: QueryFilter::default(),
        };
        ClimbGate::new(config).evaluate(contacts, forward, &probe)
    }

    #[test]
    fn test_facing_wall_is_confirmed() {
        let contacts = [contact(Vec3::NEG_X)];
        assert_eq!(verdict(ClimbConfig::default(), &contacts, Vec3::X, true), ClimbVerdict::Confirmed);
    }

    #[test]
    fn test_flat_surface_rejected() {
        let contacts = [contact(Vec3::Y)];
        assert_eq!(verdict(ClimbConfig::default(), &contacts, Vec3::X, true), ClimbVerdict::Rejected);
        let ceiling = [contact(Vec3::NEG_Y)];
        assert_eq!(verdict(ClimbConfig::default(), &ceiling, Vec3::X, true), ClimbVerdict::Rejected);
    }

    #[test]
    fn test_empty_contacts_rejected() {
        assert_eq!(verdict(ClimbConfig::default(), &[], Vec3::X, true), ClimbVerdict::Rejected);
    }

    #[test]
    fn test_facing_angle_limit() {
        let contacts = [contact(Vec3::NEG_X)];
        let at = |deg: f32| {
            let r = deg.to_radians();
            Vec3::new(r.cos(), 0.0, r.sin())
        };
        assert!(verdict(ClimbConfig::default(), &contacts, at(20.0), true).accepted());
        assert!(!verdict(ClimbConfig::default(), &contacts, at(30.0), true).accepted());
        assert!(!verdict(ClimbConfig::default(), &contacts, Vec3::NEG_X, true).accepted());
    }

    #[test]
    fn test_probe_policy() {
        let contacts = [contact(Vec3::NEG_X)];
        assert_eq!(verdict(ClimbConfig::default(), &contacts, Vec3::X, false), ClimbVerdict::AngleOnly);

        let required = ClimbConfig {
            probe_policy: ProbePolicy::Required,
            ..ClimbConfig::default()
        };
        assert_eq!(verdict(required, &contacts, Vec3::X, false), ClimbVerdict::Rejected);
    }

    #[test]
    fn test_first_qualifying_contact_decides() {
        let contacts = [contact(Vec3::Y), contact(Vec3::Z), contact(Vec3::NEG_X)];
        assert_eq!(verdict(ClimbConfig::default(), &contacts, Vec3::X, true), ClimbVerdict::Confirmed);
    }

    #[test]
    fn test_gate_is_pure() {
        let contacts = [contact(Vec3::new(-0.8, 0.6, 0.0).normalize())];
        let first = verdict(ClimbConfig::default(), &contacts, Vec3::X, false);
        let second = verdict(ClimbConfig::default(), &contacts, Vec3::X, false);
        assert_eq!(first, second);
    }

    #[test]
    fn test_probe_distance_scales_with_shallowness() {
        let gate = ClimbGate::new(ClimbConfig::default());
        assert_eq!(gate.probe_distance(1.0), 80.0);
        assert!((gate.probe_distance(0.8) - 160.0).abs() < 1e-3);
    }

    #[test]
    fn test_probe_against_scene_wall() {
        use crate::ecs::components::physics::{Collider, ColliderShape, RigidBody};
        use crate::ecs::components::transform::{GlobalTransform, Transform};
        use crate::physics::SceneQuery;

        let mut world = hecs::World::new();
        // Low wall: top at y = 40, below the eye probe at y = 64.
        let transform = Transform::from_position(Vec3::new(110.0, -60.0, 0.0));
        world.spawn((
            transform,
            GlobalTransform::from_transform(&transform),
            RigidBody::new_static(),
            Collider::new(ColliderShape::Box {
                half_extents: Vec3::new(10.0, 100.0, 300.0),
            }),
        ));
        let query = SceneQuery::new(&world);
        let probe = EyeProbe {
            query: &query,
            position: Vec3::new(40.0, 0.0, 0.0),
            up: Vec3::Y,
            filter: QueryFilter::default(),
        };
        let contacts = [contact(Vec3::NEG_X)];
        let gate = ClimbGate::new(ClimbConfig::default());
        assert_eq!(gate.evaluate(&contacts, Vec3::X, &probe), ClimbVerdict::AngleOnly);

        let tall = EyeProbe {
            position: Vec3::new(40.0, -40.0, 0.0),
            ..probe
        };
        assert_eq!(gate.evaluate(&contacts, Vec3::X, &tall), ClimbVerdict::Confirmed);
    }
}
