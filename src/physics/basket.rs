//! Basket collider geometry
//!
//! Pure geometry, no physics world involved. The basket is approximated by
//! two kinds of static colliders:
//! - a "frame": an N-sided prism built along local Z with an open top, used
//!   as a thin shell (side faces and floor)
//! - one flat box per rim side, standing on the side midpoint and facing
//!   outward, so a ball bouncing off the rim does not slip through corners
//!
//! Offsets and rotations here are in basket space (Y up, origin at the centre
//! of the basket floor).

use std::f32::consts::{FRAC_PI_2, TAU};

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use crate::consts::{WALL_HALF_THICKNESS, WALL_WIDTH_DIVISOR};
use crate::fold_half_turn;

/// A convex polyhedron described by vertices, polygon faces (vertex indices)
/// and the unique axes needed for separating-axis tests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvexPolyhedron {
    pub vertices: Vec<Vec3>,
    pub faces: Vec<Vec<usize>>,
    pub axes: Vec<Vec3>,
}

impl ConvexPolyhedron {
    /// World-space corners of one face
    pub fn face_points(&self, face: usize, position: Vec3, rotation: Quat) -> Vec<Vec3> {
        self.faces
            .get(face)
            .map(|f| {
                f.iter()
                    .filter_map(|&i| self.vertices.get(i))
                    .map(|v| position + rotation * *v)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Build an N-sided cylinder along local Z, centred on the origin.
///
/// Vertices alternate bottom/top for every segment: even indices sit at
/// `z = -height/2`, odd ones at `z = +height/2`. Each side is a quad; the
/// caps are only emitted when not open-ended. With an even segment count
/// opposite sides share an axis, so only half the side normals are kept.
pub fn cylinder_frame(
    radius_top: f32,
    radius_bottom: f32,
    height: f32,
    segments: u32,
    open_top: bool,
    open_bottom: bool,
) -> ConvexPolyhedron {
    let n = segments.max(3) as usize;
    let half = height * 0.5;

    let mut vertices = Vec::with_capacity(2 * n);
    let mut faces = Vec::with_capacity(n + 2);
    let mut axes = Vec::with_capacity(n + 1);
    let mut bottom_face = Vec::with_capacity(n);
    let mut top_face = Vec::with_capacity(n);

    vertices.push(Vec3::new(radius_bottom, 0.0, -half));
    bottom_face.push(0);
    vertices.push(Vec3::new(radius_top, 0.0, half));
    top_face.push(1);

    for i in 0..n {
        let theta = TAU / n as f32 * (i + 1) as f32;
        let theta_mid = TAU / n as f32 * (i as f32 + 0.5);

        if i < n - 1 {
            vertices.push(Vec3::new(
                radius_bottom * theta.cos(),
                radius_bottom * theta.sin(),
                -half,
            ));
            bottom_face.push(2 * i + 2);
            vertices.push(Vec3::new(
                radius_top * theta.cos(),
                radius_top * theta.sin(),
                half,
            ));
            top_face.push(2 * i + 3);

            faces.push(vec![2 * i + 2, 2 * i + 3, 2 * i + 1, 2 * i]);
        } else {
            // Close the ring back onto the first pair
            faces.push(vec![0, 1, 2 * i + 1, 2 * i]);
        }

        if n % 2 == 1 || i < n / 2 {
            axes.push(Vec3::new(theta_mid.cos(), theta_mid.sin(), 0.0));
        }
    }

    axes.push(Vec3::Z);

    if !open_top {
        faces.push(top_face);
    }
    if !open_bottom {
        bottom_face.reverse();
        faces.push(bottom_face);
    }

    ConvexPolyhedron {
        vertices,
        faces,
        axes,
    }
}

/// Which rim side a wall covers. Square baskets name their sides; other
/// segment counts number them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WallSide {
    Top,
    Right,
    Bottom,
    Left,
    Side(u32),
}

/// A flat box collider on one rim side
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RimWall {
    pub side: WallSide,
    /// Centre relative to the basket origin
    pub offset: Vec3,
    /// Yaw about Y; the box's thin (Z) axis becomes the side's outward normal
    pub rotation: Quat,
    pub half_extents: Vec3,
}

/// Map a frame-local angle (XY plane of the Z-up prism) into basket space
fn rim_point(radius: f32, theta: f32) -> Vec3 {
    Vec3::new(radius * theta.cos(), 0.0, -radius * theta.sin())
}

/// One wall per rim side, centred on the side midpoint
pub fn rim_walls(radius: f32, height: f32, segments: u32) -> Vec<RimWall> {
    let n = segments.max(3);
    let half_extents = Vec3::new(radius / WALL_WIDTH_DIVISOR, height, WALL_HALF_THICKNESS);

    (0..n)
        .map(|i| {
            let a = rim_point(radius, TAU / n as f32 * i as f32);
            let b = rim_point(radius, TAU / n as f32 * (i + 1) as f32);
            let offset = (a + b) * 0.5;
            let normal = offset.normalize_or(Vec3::Z);
            let yaw = fold_half_turn(normal.x.atan2(normal.z));

            let side = if n == 4 {
                match i {
                    0 => WallSide::Top,
                    1 => WallSide::Right,
                    2 => WallSide::Bottom,
                    _ => WallSide::Left,
                }
            } else {
                WallSide::Side(i)
            };

            RimWall {
                side,
                offset,
                rotation: Quat::from_rotation_y(yaw),
                half_extents,
            }
        })
        .collect()
}

/// Basket dimensions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BasketDims {
    pub radius: f32,
    pub height: f32,
    pub segments: u32,
}

/// Everything needed to build a basket's colliders
#[derive(Debug, Clone)]
pub struct BasketGeometry {
    pub frame: ConvexPolyhedron,
    /// Frame pose relative to the basket origin
    pub frame_offset: Vec3,
    pub frame_rotation: Quat,
    pub walls: Vec<RimWall>,
}

impl BasketDims {
    /// Build the frame and rim walls
    pub fn geometry(&self) -> BasketGeometry {
        BasketGeometry {
            frame: cylinder_frame(
                self.radius,
                self.radius,
                self.height,
                self.segments,
                true,
                false,
            ),
            // Stand the Z-up prism on the floor, open end facing up
            frame_offset: Vec3::new(0.0, self.height * 0.5, 0.0),
            frame_rotation: Quat::from_rotation_x(-FRAC_PI_2),
            walls: rim_walls(self.radius, self.height, self.segments),
        }
    }

    /// Scoring volume in world space for a basket at the given pose
    pub fn bounds(&self, position: Vec3, orientation: Quat) -> Aabb {
        let r = self.radius;
        let h = self.height;
        let corners = [
            Vec3::new(-r, 0.0, -r),
            Vec3::new(r, 0.0, -r),
            Vec3::new(-r, 0.0, r),
            Vec3::new(r, 0.0, r),
            Vec3::new(-r, h, -r),
            Vec3::new(r, h, -r),
            Vec3::new(-r, h, r),
            Vec3::new(r, h, r),
        ];
        Aabb::from_points(corners.iter().map(|c| position + orientation * *c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_4;

    #[test]
    fn test_square_frame_layout() {
        let frame = cylinder_frame(0.2, 0.2, 0.35, 4, true, false);
        assert_eq!(frame.vertices.len(), 8);
        // Four sides plus the floor, no lid
        assert_eq!(frame.faces.len(), 5);
        assert_eq!(frame.faces[0], vec![2, 3, 1, 0]);
        assert_eq!(frame.faces[3], vec![0, 1, 7, 6]);
        assert_eq!(frame.faces[4], vec![6, 4, 2, 0]);
        // Even segment count: half the side axes plus Z
        assert_eq!(frame.axes.len(), 3);
        assert_eq!(*frame.axes.last().unwrap(), Vec3::Z);
    }

    #[test]
    fn test_frame_vertices_on_rim() {
        let frame = cylinder_frame(0.2, 0.3, 1.0, 6, false, false);
        for (i, v) in frame.vertices.iter().enumerate() {
            let r = if i % 2 == 0 { 0.3 } else { 0.2 };
            let z = if i % 2 == 0 { -0.5 } else { 0.5 };
            assert!((v.truncate().length() - r).abs() < 1e-5);
            assert!((v.z - z).abs() < 1e-6);
        }
        assert_eq!(frame.faces.len(), 8);
    }

    #[test]
    fn test_odd_segments_keep_all_axes() {
        let frame = cylinder_frame(1.0, 1.0, 1.0, 5, false, false);
        assert_eq!(frame.axes.len(), 6);
        for axis in &frame.axes {
            assert!((axis.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_square_walls() {
        let walls = rim_walls(0.2, 0.35, 4);
        assert_eq!(walls.len(), 4);

        let expect = [
            (WallSide::Top, Vec3::new(0.1, 0.0, -0.1), -FRAC_PI_4),
            (WallSide::Right, Vec3::new(-0.1, 0.0, -0.1), FRAC_PI_4),
            (WallSide::Bottom, Vec3::new(-0.1, 0.0, 0.1), -FRAC_PI_4),
            (WallSide::Left, Vec3::new(0.1, 0.0, 0.1), FRAC_PI_4),
        ];
        for (wall, (side, offset, yaw)) in walls.iter().zip(expect) {
            assert_eq!(wall.side, side);
            assert!((wall.offset - offset).length() < 1e-5, "{:?}", wall);
            assert!(wall.rotation.dot(Quat::from_rotation_y(yaw)).abs() > 1.0 - 1e-6);
            assert!((wall.half_extents - Vec3::new(0.2 / 1.8, 0.35, 0.02)).length() < 1e-6);
        }
    }

    #[test]
    fn test_wall_faces_outward() {
        for wall in rim_walls(0.5, 1.0, 7) {
            let thin_axis = wall.rotation * Vec3::Z;
            let outward = wall.offset.normalize();
            assert!(thin_axis.dot(outward).abs() > 0.999);
            assert!(matches!(wall.side, WallSide::Side(_)));
        }
    }

    #[test]
    fn test_frame_stands_upright() {
        let dims = BasketDims {
            radius: 0.2,
            height: 0.35,
            segments: 4,
        };
        let geometry = dims.geometry();
        let top = geometry.frame_offset + geometry.frame_rotation * Vec3::new(0.0, 0.0, 0.175);
        let bottom = geometry.frame_offset + geometry.frame_rotation * Vec3::new(0.0, 0.0, -0.175);
        assert!((top - Vec3::new(0.0, 0.35, 0.0)).length() < 1e-5);
        assert!(bottom.length() < 1e-5);
    }

    #[test]
    fn test_bounds_follow_pose() {
        let dims = BasketDims {
            radius: 0.2,
            height: 0.35,
            segments: 4,
        };
        let bounds = dims.bounds(Vec3::new(1.0, -1.0, -2.0), Quat::IDENTITY);
        assert!(bounds.contains(Vec3::new(1.0, -0.8, -2.0)));
        assert!(!bounds.contains(Vec3::new(1.0, -1.5, -2.0)));
        assert!(!bounds.contains(Vec3::new(1.3, -0.8, -2.0)));
    }
}
