//! Collider shape geometry: bounding boxes and signed distance queries.
//!
//! Every supported shape is convex, so its signed distance field is a convex
//! function of position. Along any segment the distance therefore has a single
//! minimum, which lets segment and sweep queries use a golden-section search.

use glam::{Mat4, Quat, Vec3};

use crate::ecs::components::physics::ColliderShape;
use crate::ecs::components::transform::GlobalTransform;

/// Iterations of the golden-section search in [`ColliderShape::segment_proximity`].
const SEGMENT_SEARCH_ITERATIONS: usize = 32;
const INV_PHI: f32 = 0.618_034;

/// Axis-aligned bounding box for broadphase collision detection.
#[derive(Debug, Clone, Copy)]
pub struct PhysicsAabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl PhysicsAabb {
    /// Test whether two AABBs overlap.
    #[inline]
    pub fn overlaps(&self, other: &PhysicsAabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Grow the box by `margin` on every side.
    #[inline]
    pub fn expanded(&self, margin: f32) -> PhysicsAabb {
        PhysicsAabb {
            min: self.min - Vec3::splat(margin),
            max: self.max + Vec3::splat(margin),
        }
    }

    /// Smallest box containing both.
    #[inline]
    pub fn union(&self, other: &PhysicsAabb) -> PhysicsAabb {
        PhysicsAabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

/// Closest-surface information for a point query.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceProximity {
    /// Signed distance to the surface: positive outside, negative inside.
    pub distance: f32,
    /// Outward surface normal at the closest feature (unit length).
    pub normal: Vec3,
    /// Closest point on the surface in world space.
    pub point: Vec3,
}

/// Rigid frame of a global transform with its scale split out.
#[derive(Debug, Clone, Copy)]
struct ShapeFrame {
    scale: Vec3,
    rotation: Quat,
    translation: Vec3,
}

impl ShapeFrame {
    fn new(transform: &GlobalTransform) -> Self {
        let (scale, rotation, translation) = transform.0.to_scale_rotation_translation();
        Self {
            scale: scale.abs(),
            rotation,
            translation,
        }
    }

    #[inline]
    fn to_local(&self, point: Vec3) -> Vec3 {
        self.rotation.inverse() * (point - self.translation)
    }

    #[inline]
    fn to_world_point(&self, local: Vec3) -> Vec3 {
        self.rotation * local + self.translation
    }

    #[inline]
    fn to_world_vector(&self, local: Vec3) -> Vec3 {
        self.rotation * local
    }
}

impl ColliderShape {
    /// Compute the world-space AABB for this shape.
    #[inline]
    pub fn compute_aabb(&self, transform: &GlobalTransform) -> PhysicsAabb {
        let mat = transform.0;

        match self {
            ColliderShape::Sphere { radius } => {
                let center = mat.transform_point3(Vec3::ZERO);
                // Extract scale to account for non-uniform scaling
                let scale_x = mat.x_axis.truncate().length();
                let scale_y = mat.y_axis.truncate().length();
                let scale_z = mat.z_axis.truncate().length();
                let max_scale = scale_x.max(scale_y).max(scale_z);
                let world_radius = *radius * max_scale;
                PhysicsAabb {
                    min: center - Vec3::splat(world_radius),
                    max: center + Vec3::splat(world_radius),
                }
            }
            ColliderShape::Box { half_extents } => aabb_from_extents(*half_extents, mat),
            ColliderShape::Capsule {
                radius,
                half_height,
            } => {
                // Treat as bounding box of the capsule
                let extents = Vec3::new(*radius, *half_height + *radius, *radius);
                aabb_from_extents(extents, mat)
            }
        }
    }

    /// Signed distance from a world-space point to this shape's surface.
    pub fn signed_distance(&self, point: Vec3, transform: &GlobalTransform) -> SurfaceProximity {
        let frame = ShapeFrame::new(transform);
        let p = frame.to_local(point);

        let (distance, local_normal) = match self {
            ColliderShape::Sphere { radius } => {
                let r = *radius * frame.scale.max_element();
                let len = p.length();
                let n = if len > 1e-6 { p / len } else { Vec3::Y };
                (len - r, n)
            }
            ColliderShape::Box { half_extents } => box_distance(p, *half_extents * frame.scale),
            ColliderShape::Capsule {
                radius,
                half_height,
            } => {
                let r = *radius * frame.scale.x.max(frame.scale.z);
                let h = *half_height * frame.scale.y;
                let axis_point = Vec3::new(0.0, p.y.clamp(-h, h), 0.0);
                let d = p - axis_point;
                let len = d.length();
                let n = if len > 1e-6 {
                    d / len
                } else if p.y > 0.0 {
                    Vec3::Y
                } else {
                    Vec3::NEG_Y
                };
                (len - r, n)
            }
        };

        let normal = frame.to_world_vector(local_normal).normalize_or_zero();
        let surface_local = p - local_normal * distance;
        SurfaceProximity {
            distance,
            normal,
            point: frame.to_world_point(surface_local),
        }
    }

    /// Closest approach between the segment `a..b` and this shape.
    ///
    /// Returns the segment parameter `t` in `[0, 1]` of the closest point together
    /// with the surface proximity measured from it.
    pub fn segment_proximity(
        &self,
        a: Vec3,
        b: Vec3,
        transform: &GlobalTransform,
    ) -> (f32, SurfaceProximity) {
        let at = |t: f32| self.signed_distance(a + (b - a) * t, transform);

        if (b - a).length_squared() < 1e-12 {
            return (0.0, at(0.0));
        }

        let mut lo = 0.0f32;
        let mut hi = 1.0f32;
        let mut x1 = hi - INV_PHI * (hi - lo);
        let mut x2 = lo + INV_PHI * (hi - lo);
        let mut f1 = at(x1).distance;
        let mut f2 = at(x2).distance;

        for _ in 0..SEGMENT_SEARCH_ITERATIONS {
            if f1 <= f2 {
                hi = x2;
                x2 = x1;
                f2 = f1;
                x1 = hi - INV_PHI * (hi - lo);
                f1 = at(x1).distance;
            } else {
                lo = x1;
                x1 = x2;
                f1 = f2;
                x2 = lo + INV_PHI * (hi - lo);
                f2 = at(x2).distance;
            }
        }

        // Endpoints can win when the minimum sits on the boundary.
        let mut best_t = 0.5 * (lo + hi);
        let mut best = at(best_t);
        for t in [0.0, 1.0] {
            let candidate = at(t);
            if candidate.distance <= best.distance {
                best_t = t;
                best = candidate;
            }
        }
        (best_t, best)
    }
}

/// Signed distance and outward normal for a box centred at the origin.
fn box_distance(p: Vec3, half: Vec3) -> (f32, Vec3) {
    let q = p.abs() - half;
    let outside = q.max(Vec3::ZERO);
    let outside_len = outside.length();

    if outside_len > 0.0 {
        let n = outside * p.signum() / outside_len;
        return (outside_len, n);
    }

    // Inside: the nearest face wins.
    let mut n = Vec3::ZERO;
    let d = q.max_element();
    if d == q.x {
        n.x = p.x.signum();
    } else if d == q.y {
        n.y = p.y.signum();
    } else {
        n.z = p.z.signum();
    }
    (d, n)
}

/// Compute world-space AABB from local half-extents and a transform matrix.
#[inline]
fn aabb_from_extents(half_extents: Vec3, mat: Mat4) -> PhysicsAabb {
    let center = mat.transform_point3(Vec3::ZERO);

    // For each world axis, compute the extent by projecting the local box axes
    let abs_col0 = mat.x_axis.truncate().abs();
    let abs_col1 = mat.y_axis.truncate().abs();
    let abs_col2 = mat.z_axis.truncate().abs();

    let extent = abs_col0 * half_extents.x + abs_col1 * half_extents.y + abs_col2 * half_extents.z;

    PhysicsAabb {
        min: center - extent,
        max: center + extent,
    }
}
