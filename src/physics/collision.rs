//! Collision detection for spheres against the basket, ground and each other
//!
//! Thrown balls are the only moving bodies, so every query here is
//! "sphere vs something". Each query returns the contact normal pointing
//! from the other shape toward the sphere centre, so pushing the sphere along
//! the normal by `penetration` separates the two.

use glam::{Quat, Vec3};

use super::basket::ConvexPolyhedron;
use super::body::{Body, Shape};

/// A single contact between a sphere and another shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Closest point on the other shape
    pub point: Vec3,
    /// Unit normal pointing toward the sphere centre
    pub normal: Vec3,
    /// Overlap depth (positive when touching)
    pub penetration: f32,
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Smallest box containing every point; an empty iterator yields a
    /// degenerate box at the origin
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut iter = points.into_iter();
        let Some(first) = iter.next() else {
            return Self::new(Vec3::ZERO, Vec3::ZERO);
        };
        iter.fold(Self::new(first, first), |acc, p| Self {
            min: acc.min.min(p),
            max: acc.max.max(p),
        })
    }

    /// Inclusive containment test
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

/// Sphere against an infinite plane treated as a solid half-space
pub fn sphere_plane(
    center: Vec3,
    radius: f32,
    plane_point: Vec3,
    plane_normal: Vec3,
) -> Option<Contact> {
    let normal = plane_normal.normalize_or(Vec3::Y);
    let distance = (center - plane_point).dot(normal);
    if distance >= radius {
        return None;
    }
    Some(Contact {
        point: center - normal * distance,
        normal,
        penetration: radius - distance,
    })
}

pub fn sphere_sphere(
    center_a: Vec3,
    radius_a: f32,
    center_b: Vec3,
    radius_b: f32,
) -> Option<Contact> {
    let delta = center_a - center_b;
    let distance = delta.length();
    let reach = radius_a + radius_b;
    if distance >= reach {
        return None;
    }
    // Concentric spheres get pushed straight up
    let normal = delta.try_normalize().unwrap_or(Vec3::Y);
    Some(Contact {
        point: center_b + normal * radius_b,
        normal,
        penetration: reach - distance,
    })
}

/// Sphere against an oriented box
pub fn sphere_cuboid(
    center: Vec3,
    radius: f32,
    box_position: Vec3,
    box_rotation: Quat,
    half_extents: Vec3,
) -> Option<Contact> {
    let inv = box_rotation.inverse();
    let local = inv * (center - box_position);
    let clamped = local.clamp(-half_extents, half_extents);

    if clamped == local {
        // Centre is inside the box: exit through the nearest face
        let depth = half_extents - local.abs();
        let axis = if depth.x <= depth.y && depth.x <= depth.z {
            Vec3::X * local.x.signum()
        } else if depth.y <= depth.z {
            Vec3::Y * local.y.signum()
        } else {
            Vec3::Z * local.z.signum()
        };
        let face_depth = depth.min_element();
        let surface = local + axis * face_depth;
        return Some(Contact {
            point: box_position + box_rotation * surface,
            normal: box_rotation * axis,
            penetration: radius + face_depth,
        });
    }

    let delta = local - clamped;
    let distance = delta.length();
    if distance >= radius {
        return None;
    }
    Some(Contact {
        point: box_position + box_rotation * clamped,
        normal: box_rotation * (delta / distance),
        penetration: radius - distance,
    })
}

/// Closest point to `p` on the segment `a..b`
pub fn closest_point_on_segment(p: Vec3, a: Vec3, b: Vec3) -> Vec3 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return a;
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Closest point to `p` on a planar convex polygon (either winding)
pub fn closest_point_on_polygon(p: Vec3, polygon: &[Vec3]) -> Option<Vec3> {
    if polygon.len() < 3 {
        return None;
    }
    let normal = (polygon[1] - polygon[0])
        .cross(polygon[2] - polygon[0])
        .try_normalize()?;
    let projected = p - normal * (p - polygon[0]).dot(normal);

    let mut positive = 0;
    let mut negative = 0;
    for (i, a) in polygon.iter().enumerate() {
        let b = polygon[(i + 1) % polygon.len()];
        let side = (b - *a).cross(projected - *a).dot(normal);
        if side > 1e-7 {
            positive += 1;
        } else if side < -1e-7 {
            negative += 1;
        }
    }
    if positive == 0 || negative == 0 {
        return Some(projected);
    }

    polygon
        .iter()
        .enumerate()
        .map(|(i, a)| closest_point_on_segment(p, *a, polygon[(i + 1) % polygon.len()]))
        .min_by(|x, y| {
            x.distance_squared(p)
                .partial_cmp(&y.distance_squared(p))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
}

/// Sphere against a thin two-sided polygon
pub fn sphere_polygon(center: Vec3, radius: f32, polygon: &[Vec3]) -> Option<Contact> {
    let closest = closest_point_on_polygon(center, polygon)?;
    let delta = center - closest;
    let distance = delta.length();
    if distance >= radius {
        return None;
    }
    let normal = match delta.try_normalize() {
        Some(n) => n,
        // Centre lies on the polygon: use the face normal
        None => (polygon[1] - polygon[0])
            .cross(polygon[2] - polygon[0])
            .try_normalize()
            .unwrap_or(Vec3::Y),
    };
    Some(Contact {
        point: closest,
        normal,
        penetration: radius - distance,
    })
}

/// Sphere against the listed faces of a polyhedron. Missing faces (open ends)
/// let the sphere through, which is what a basket needs.
pub fn sphere_polyhedron(
    center: Vec3,
    radius: f32,
    poly: &ConvexPolyhedron,
    position: Vec3,
    rotation: Quat,
) -> Option<Contact> {
    (0..poly.faces.len())
        .filter_map(|face| {
            sphere_polygon(center, radius, &poly.face_points(face, position, rotation))
        })
        .max_by(|a, b| {
            a.penetration
                .partial_cmp(&b.penetration)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
}

/// Contact between a sphere body and any other body. Returns `None` when the
/// first body is not a sphere.
pub fn sphere_contact(sphere: &Body, other: &Body) -> Option<Contact> {
    let Shape::Sphere { radius } = sphere.shape else {
        return None;
    };
    let center = sphere.position;

    match &other.shape {
        Shape::Plane => sphere_plane(center, radius, other.position, other.rotation * Vec3::Y),
        Shape::Sphere { radius: other_radius } => {
            sphere_sphere(center, radius, other.position, *other_radius)
        }
        Shape::Cuboid { half_extents } => {
            sphere_cuboid(center, radius, other.position, other.rotation, *half_extents)
        }
        Shape::Polyhedron(poly) => {
            sphere_polyhedron(center, radius, poly, other.position, other.rotation)
        }
    }
}
