//! Forward capsule sweep that finds walls in front of the character.

use glam::Vec3;

use crate::config::ScanConfig;
use crate::physics::query::{CapsuleProbe, QueryFilter, SurfaceQuery};

/// One static surface touched by the most recent scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallContact {
    /// Unit surface normal pointing back towards the character.
    pub normal: Vec3,
    pub impact_point: Vec3,
    /// Sweep distance at which the surface was touched.
    pub distance: f32,
    pub entity: hecs::Entity,
}

/// Holds the contact set of the current tick.
///
/// Every [`scan`](Self::scan) replaces the set; a sweep that touches nothing leaves it empty.
pub struct SurfaceScanner {
    owner: hecs::Entity,
    config: ScanConfig,
    contacts: Vec<WallContact>,
}

impl SurfaceScanner {
    /// Scanner for the character `owner`, which its sweeps never report.
    pub fn new(owner: hecs::Entity, config: ScanConfig) -> Self {
        Self {
            owner,
            config,
            contacts: Vec::new(),
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Sweep ahead of `origin` and replace the contact set with what was hit.
    pub fn scan(&mut self, query: &dyn SurfaceQuery, origin: Vec3, forward: Vec3) -> &[WallContact] {
        let forward = forward.normalize_or(Vec3::NEG_Z);
        let start = origin + forward * self.config.start_offset;
        // A zero-length sweep misses some surfaces, so always travel one unit.
        let end = start + forward;

        let probe = CapsuleProbe {
            radius: self.config.radius,
            half_height: self.config.half_height,
        };
        let hits = query.sweep_capsule(probe, start, end, &QueryFilter::static_world_except(self.owner));

        self.contacts.clear();
        self.contacts.extend(hits.into_iter().map(|hit| WallContact {
            normal: hit.normal,
            impact_point: hit.impact_point,
            distance: hit.distance,
            entity: hit.entity,
        }));
        tracing::trace!(contacts = self.contacts.len(), "surface scan");
        &self.contacts
    }

    #[inline]
    pub fn contacts(&self) -> &[WallContact] {
        &self.contacts
    }

    /// Normal of the first contact, if any.
    pub fn surface_normal(&self) -> Option<Vec3> {
        self.contacts.first().map(|c| c.normal)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}
