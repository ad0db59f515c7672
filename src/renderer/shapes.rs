//! Wireframe generation for scene meshes
//!
//! Meshes are built as line segments in node-local space, then transformed
//! straight to clip space for the line-list pipeline.

use glam::{Mat4, Vec3, Vec4};
use std::f32::consts::TAU;

use super::scene::{Mesh, Scene};
use super::vertex::{Vertex, colors};
use crate::ar::CameraFrame;

/// Maps OpenGL clip depth [-w, w] to WebGPU's [0, w]
#[rustfmt::skip]
pub const OPENGL_TO_WGPU: Mat4 = Mat4::from_cols_array(&[
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
]);

const BALL_SEGMENTS: u32 = 16;
const RETICLE_SEGMENTS: u32 = 36;
/// Horizontal rings on the basket wall, floor and rim included
const BASKET_RINGS: u32 = 5;

/// A closed polygon as line pairs
fn loop_lines(points: &[Vec3], out: &mut Vec<(Vec3, Vec3)>) {
    for (i, a) in points.iter().enumerate() {
        out.push((*a, points[(i + 1) % points.len()]));
    }
}

/// Circle of `segments` points; `plane` maps (cos, sin) into 3D
fn circle(radius: f32, segments: u32, plane: impl Fn(f32, f32) -> Vec3) -> Vec<Vec3> {
    (0..segments)
        .map(|i| {
            let theta = TAU * i as f32 / segments as f32;
            plane(radius * theta.cos(), radius * theta.sin())
        })
        .collect()
}

/// Basket wall outline: rings from floor to rim plus the vertical edges.
/// Corners sit where the physics frame puts them.
pub fn basket_lines(radius: f32, height: f32, segments: u32) -> Vec<(Vec3, Vec3)> {
    let n = segments.max(3);
    let corner = |i: u32, y: f32| {
        let theta = TAU * i as f32 / n as f32;
        Vec3::new(radius * theta.cos(), y, -radius * theta.sin())
    };

    let mut lines = Vec::with_capacity(((BASKET_RINGS + 1) * n) as usize);
    for ring in 0..BASKET_RINGS {
        let y = height * ring as f32 / (BASKET_RINGS - 1) as f32;
        let points: Vec<Vec3> = (0..n).map(|i| corner(i, y)).collect();
        loop_lines(&points, &mut lines);
    }
    for i in 0..n {
        lines.push((corner(i, 0.0), corner(i, height)));
    }
    lines
}

/// Three great circles
pub fn ball_lines(radius: f32) -> Vec<(Vec3, Vec3)> {
    let mut lines = Vec::with_capacity(3 * BALL_SEGMENTS as usize);
    loop_lines(&circle(radius, BALL_SEGMENTS, |a, b| Vec3::new(a, b, 0.0)), &mut lines);
    loop_lines(&circle(radius, BALL_SEGMENTS, |a, b| Vec3::new(0.0, a, b)), &mut lines);
    loop_lines(&circle(radius, BALL_SEGMENTS, |a, b| Vec3::new(a, 0.0, b)), &mut lines);
    lines
}

/// Two concentric circles lying flat on the surface
pub fn reticle_lines(inner: f32, outer: f32) -> Vec<(Vec3, Vec3)> {
    let mut lines = Vec::with_capacity(2 * RETICLE_SEGMENTS as usize);
    loop_lines(&circle(inner, RETICLE_SEGMENTS, |a, b| Vec3::new(a, 0.0, b)), &mut lines);
    loop_lines(&circle(outer, RETICLE_SEGMENTS, |a, b| Vec3::new(a, 0.0, b)), &mut lines);
    lines
}

fn mesh_lines(mesh: &Mesh) -> (Vec<(Vec3, Vec3)>, [f32; 4]) {
    match *mesh {
        Mesh::Basket {
            radius,
            height,
            segments,
        } => (basket_lines(radius, height, segments), colors::BASKET),
        Mesh::Ball { radius } => (ball_lines(radius), colors::BALL),
        Mesh::Reticle { inner, outer } => (reticle_lines(inner, outer), colors::RETICLE),
    }
}

fn clip(matrix: &Mat4, point: Vec3) -> [f32; 4] {
    let p: Vec4 = *matrix * point.extend(1.0);
    p.to_array()
}

/// Line-list vertices for every visible node, in WebGPU clip space
pub fn scene_vertices(scene: &Scene, camera: &CameraFrame) -> Vec<Vertex> {
    let view_projection = OPENGL_TO_WGPU * camera.view_projection();
    let mut vertices = Vec::new();

    for (id, node) in scene.iter() {
        if !node.visible {
            continue;
        }
        let Some((position, rotation)) = scene.world_transform(id, Some(camera)) else {
            continue;
        };
        let model = Mat4::from_rotation_translation(rotation, position);
        let matrix = view_projection * model;
        let (lines, color) = mesh_lines(&node.mesh);

        vertices.reserve(lines.len() * 2);
        for (a, b) in lines {
            vertices.push(Vertex::new(clip(&matrix, a), color));
            vertices.push(Vertex::new(clip(&matrix, b), color));
        }
    }

    vertices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ar::FloorSession;
    use crate::renderer::scene::Node;

    #[test]
    fn test_basket_corners_match_walls() {
        let lines = basket_lines(0.2, 0.35, 4);
        assert_eq!(lines.len(), 5 * 4 + 4);
        // First vertical edge starts at the theta = 0 corner
        let (bottom, top) = lines[20];
        assert!((bottom - Vec3::new(0.2, 0.0, 0.0)).length() < 1e-6);
        assert!((top - Vec3::new(0.2, 0.35, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_reticle_is_flat() {
        for (a, b) in reticle_lines(0.03, 0.04) {
            assert_eq!(a.y, 0.0);
            assert_eq!(b.y, 0.0);
        }
    }

    #[test]
    fn test_scene_vertices_skip_hidden() {
        let floor = FloorSession::new(1.5, 1.0);
        let mut scene = Scene::new();
        let visible =
            scene.add(Node::new(Mesh::Ball { radius: 0.05 }).at(Vec3::new(0.0, 1.5, -2.0)));
        scene.add(Node::new(Mesh::Ball { radius: 0.05 }).hidden());

        let vertices = scene_vertices(&scene, &floor.camera);
        assert_eq!(vertices.len(), ball_lines(0.05).len() * 2);
        assert!(scene.get(visible).is_some());

        // In front of the camera: inside the WebGPU clip volume
        for v in &vertices {
            let [x, y, z, w] = v.position;
            assert!(w > 0.0);
            assert!(x.abs() <= w && y.abs() <= w);
            assert!(z >= 0.0 && z <= w);
            assert_eq!(v.color, colors::BALL);
        }
    }
}
