//! Narrowphase collision detection: specialized tests plus a distance-field path.
//!
//! Spheres and capsules are treated as a *core* (a point or a segment) inflated
//! by a radius. Any pair with at least one core is resolved by querying the other
//! shape's signed distance along that core. Box-box pairs use SAT.

use glam::Vec3;

use crate::ecs::components::physics::ColliderShape;
use crate::ecs::components::transform::GlobalTransform;

use super::collider::SurfaceProximity;
use super::contact::ContactInfo;

/// Inner point or segment of a rounded shape, in world space.
#[derive(Debug, Clone, Copy)]
pub enum RoundedCore {
    Point { center: Vec3, radius: f32 },
    Segment { a: Vec3, b: Vec3, radius: f32 },
}

impl RoundedCore {
    /// Core of a sphere or capsule; `None` for boxes.
    pub fn of(shape: &ColliderShape, transform: &GlobalTransform) -> Option<Self> {
        let mat = transform.0;
        match shape {
            ColliderShape::Sphere { radius } => {
                let scale = mat.x_axis.truncate().length();
                Some(RoundedCore::Point {
                    center: mat.transform_point3(Vec3::ZERO),
                    radius: *radius * scale,
                })
            }
            ColliderShape::Capsule {
                radius,
                half_height,
            } => {
                let scale = mat.x_axis.truncate().length();
                Some(RoundedCore::Segment {
                    a: mat.transform_point3(Vec3::new(0.0, -*half_height, 0.0)),
                    b: mat.transform_point3(Vec3::new(0.0, *half_height, 0.0)),
                    radius: *radius * scale,
                })
            }
            ColliderShape::Box { .. } => None,
        }
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        match *self {
            RoundedCore::Point { radius, .. } | RoundedCore::Segment { radius, .. } => radius,
        }
    }

    /// Closest approach of the core to `shape`, before subtracting the core radius.
    pub fn proximity(&self, shape: &ColliderShape, transform: &GlobalTransform) -> SurfaceProximity {
        match *self {
            RoundedCore::Point { center, .. } => shape.signed_distance(center, transform),
            RoundedCore::Segment { a, b, .. } => shape.segment_proximity(a, b, transform).1,
        }
    }

    /// Contact between this core and `shape`, with the normal pointing from the core to the shape.
    pub fn contact(&self, shape: &ColliderShape, transform: &GlobalTransform) -> Option<ContactInfo> {
        let prox = self.proximity(shape, transform);
        let penetration = self.radius() - prox.distance;
        if penetration <= 0.0 {
            return None;
        }
        // prox.normal points out of the shape, towards the core.
        let normal = -prox.normal;
        Some(ContactInfo {
            normal,
            penetration,
            point: prox.point - normal * (penetration * 0.5),
        })
    }
}

/// Specialized sphere-sphere intersection test.
pub fn sphere_sphere(
    shape_a: &ColliderShape,
    transform_a: &GlobalTransform,
    shape_b: &ColliderShape,
    transform_b: &GlobalTransform,
) -> Option<ContactInfo> {
    let (radius_a, radius_b) = match (shape_a, shape_b) {
        (ColliderShape::Sphere { radius: ra }, ColliderShape::Sphere { radius: rb }) => (*ra, *rb),
        _ => return None,
    };

    let center_a = transform_a.0.transform_point3(Vec3::ZERO);
    let center_b = transform_b.0.transform_point3(Vec3::ZERO);

    // Account for scale
    let scale_a = transform_a.0.x_axis.truncate().length();
    let scale_b = transform_b.0.x_axis.truncate().length();
    let world_radius_a = radius_a * scale_a;
    let world_radius_b = radius_b * scale_b;

    let diff = center_b - center_a;
    let dist_sq = diff.length_squared();
    let min_dist = world_radius_a + world_radius_b;

    if dist_sq >= min_dist * min_dist {
        return None;
    }

    let dist = dist_sq.sqrt();
    let normal = if dist > 1e-6 { diff / dist } else { Vec3::Y };

    let penetration = min_dist - dist;
    let point = center_a + normal * (world_radius_a - penetration * 0.5);

    Some(ContactInfo {
        normal,
        penetration,
        point,
    })
}

/// SAT (Separating Axis Theorem) test for box-box collision.
pub fn sat_box_box(
    half_a: Vec3,
    transform_a: glam::Mat4,
    half_b: Vec3,
    transform_b: glam::Mat4,
) -> Option<ContactInfo> {
    let center_a = transform_a.transform_point3(Vec3::ZERO);
    let center_b = transform_b.transform_point3(Vec3::ZERO);

    let axes_a = box_axes(transform_a);
    let axes_b = box_axes(transform_b);
    let half_a_arr = half_a.to_array();
    let half_b_arr = half_b.to_array();

    let t = center_b - center_a;

    // 3 face normals from each box, then the 9 edge-edge cross products.
    let mut candidates: Vec<Vec3> = Vec::with_capacity(15);
    candidates.extend_from_slice(&axes_a);
    candidates.extend_from_slice(&axes_b);
    for a in &axes_a {
        for b in &axes_b {
            let axis = a.cross(*b);
            let len = axis.length();
            if len >= 1e-6 {
                candidates.push(axis / len);
            }
        }
    }

    let mut min_overlap = f32::MAX;
    let mut best_axis = Vec3::ZERO;
    for axis in candidates {
        let overlap = sat_test_axis(axis, &axes_a, &half_a_arr, &axes_b, &half_b_arr, t)?;
        if overlap < min_overlap {
            min_overlap = overlap;
            best_axis = axis;
        }
    }

    // Ensure normal points from A to B
    if best_axis.dot(t) < 0.0 {
        best_axis = -best_axis;
    }

    let reach_a: f32 = (0..3)
        .map(|i| half_a_arr[i] * axes_a[i].dot(best_axis).abs())
        .sum();
    let point = center_a + best_axis * (reach_a - min_overlap * 0.5);

    Some(ContactInfo {
        normal: best_axis,
        penetration: min_overlap,
        point,
    })
}

fn box_axes(transform: glam::Mat4) -> [Vec3; 3] {
    [
        transform.x_axis.truncate().normalize_or_zero(),
        transform.y_axis.truncate().normalize_or_zero(),
        transform.z_axis.truncate().normalize_or_zero(),
    ]
}

/// Test a single SAT axis. Returns Some(overlap) if overlapping, None if separating.
fn sat_test_axis(
    axis: Vec3,
    axes_a: &[Vec3; 3],
    half_a: &[f32; 3],
    axes_b: &[Vec3; 3],
    half_b: &[f32; 3],
    t: Vec3,
) -> Option<f32> {
    let proj_a: f32 = (0..3).map(|i| half_a[i] * axes_a[i].dot(axis).abs()).sum();
    let proj_b: f32 = (0..3).map(|i| half_b[i] * axes_b[i].dot(axis).abs()).sum();

    let dist = t.dot(axis).abs();
    let overlap = proj_a + proj_b - dist;

    if overlap > 0.0 {
        Some(overlap)
    } else {
        None
    }
}

/// Detect collision between two shapes, dispatching to specialized tests where possible.
///
/// The returned normal points from shape A to shape B.
pub fn detect_collision(
    shape_a: &ColliderShape,
    transform_a: &GlobalTransform,
    shape_b: &ColliderShape,
    transform_b: &GlobalTransform,
) -> Option<ContactInfo> {
    // Try specialized tests first
    match (shape_a, shape_b) {
        (ColliderShape::Sphere { .. }, ColliderShape::Sphere { .. }) => {
            sphere_sphere(shape_a, transform_a, shape_b, transform_b)
        }
        (
            ColliderShape::Box {
                half_extents: half_a,
            },
            ColliderShape::Box {
                half_extents: half_b,
            },
        ) => sat_box_box(*half_a, transform_a.0, *half_b, transform_b.0),
        _ => {
            if let Some(core) = RoundedCore::of(shape_a, transform_a) {
                return core.contact(shape_b, transform_b);
            }
            let core = RoundedCore::of(shape_b, transform_b)?;
            core.contact(shape_a, transform_a).map(|info| ContactInfo {
                normal: -info.normal,
                ..info
            })
        }
    }
}

/// Boolean overlap test; touching shapes do not count.
pub fn shapes_overlap(
    shape_a: &ColliderShape,
    transform_a: &GlobalTransform,
    shape_b: &ColliderShape,
    transform_b: &GlobalTransform,
) -> bool {
    detect_collision(shape_a, transform_a, shape_b, transform_b).is_some()
}
