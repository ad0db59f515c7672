//! Scene graph
//!
//! A flat list of renderable nodes. Nodes are either placed in world space or
//! anchored to the camera (the ready ball rides along with the device until
//! it is thrown). A node may be linked to a physics body; `sync_from_physics`
//! copies the body pose back through the stored local offset every frame.

use glam::{Quat, Vec3};

use crate::ar::CameraFrame;
use crate::consts::HIDDEN_POSITION;
use crate::physics::{BodyHandle, World};

/// Stable node identifier, never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

/// What a node looks like
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mesh {
    Basket { radius: f32, height: f32, segments: u32 },
    Ball { radius: f32 },
    /// Flat ring lying on a surface
    Reticle { inner: f32, outer: f32 },
}

/// Coordinate space a node's transform is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    World,
    Camera,
}

/// Body this node mirrors. `local_*` is the body's pose relative to the node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyLink {
    pub body: BodyHandle,
    pub local_position: Vec3,
    pub local_rotation: Quat,
}

impl BodyLink {
    pub fn new(body: BodyHandle) -> Self {
        Self {
            body,
            local_position: Vec3::ZERO,
            local_rotation: Quat::IDENTITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub mesh: Mesh,
    pub position: Vec3,
    pub rotation: Quat,
    pub visible: bool,
    pub anchor: Anchor,
    pub link: Option<BodyLink>,
}

impl Node {
    pub fn new(mesh: Mesh) -> Self {
        Self {
            mesh,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            visible: true,
            anchor: Anchor::World,
            link: None,
        }
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn anchored(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self.position = HIDDEN_POSITION;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct Scene {
    /// Sorted by id
    nodes: Vec<(NodeId, Node)>,
    next_id: u32,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.push((id, node));
        id
    }

    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        let index = self.index_of(id)?;
        Some(self.nodes.remove(index).1)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.index_of(id).map(|i| &self.nodes[i].1)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.index_of(id).map(move |i| &mut self.nodes[i].1)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().map(|(id, n)| (*id, n))
    }

    fn index_of(&self, id: NodeId) -> Option<usize> {
        self.nodes.binary_search_by_key(&id, |(i, _)| *i).ok()
    }

    /// Park a node far away and stop drawing it
    pub fn hide(&mut self, id: NodeId) {
        if let Some(node) = self.get_mut(id) {
            node.visible = false;
            node.position = HIDDEN_POSITION;
        }
    }

    pub fn show(&mut self, id: NodeId) {
        if let Some(node) = self.get_mut(id) {
            node.visible = true;
        }
    }

    /// World-space pose of a node. Camera-anchored nodes need a camera.
    pub fn world_transform(
        &self,
        id: NodeId,
        camera: Option<&CameraFrame>,
    ) -> Option<(Vec3, Quat)> {
        let node = self.get(id)?;
        match node.anchor {
            Anchor::World => Some((node.position, node.rotation)),
            Anchor::Camera => {
                let camera = camera?;
                Some((
                    camera.to_world(node.position),
                    camera.orientation * node.rotation,
                ))
            }
        }
    }

    /// Re-parent a camera-anchored node into world space, keeping its
    /// current world pose. Returns that pose.
    pub fn detach_from_camera(&mut self, id: NodeId, camera: &CameraFrame) -> Option<(Vec3, Quat)> {
        let (position, rotation) = self.world_transform(id, Some(camera))?;
        let node = self.get_mut(id)?;
        node.anchor = Anchor::World;
        node.position = position;
        node.rotation = rotation;
        Some((position, rotation))
    }

    /// Copy every linked body's pose into its node
    pub fn sync_from_physics(&mut self, world: &World) {
        for (_, node) in self.nodes.iter_mut() {
            let Some(link) = node.link else {
                continue;
            };
            let Some(body) = world.body(link.body) else {
                continue;
            };
            let rotation = body.rotation * link.local_rotation.inverse();
            node.rotation = rotation;
            node.position = body.position - rotation * link.local_position;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ar::FloorSession;
    use crate::physics::{Body, Shape};
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_detach_keeps_world_pose() {
        let mut floor = FloorSession::new(1.5, 1.0);
        floor.set_pose(Vec3::new(1.0, 1.5, 0.0), Quat::from_rotation_y(FRAC_PI_2));
        let camera = floor.camera;

        let mut scene = Scene::new();
        let id = scene.add(
            Node::new(Mesh::Ball { radius: 0.05 })
                .at(Vec3::new(0.0, 0.0, -1.0))
                .anchored(Anchor::Camera),
        );
        let before = scene.world_transform(id, Some(&camera)).unwrap();
        // Looking down -X after a quarter turn
        assert!((before.0 - Vec3::new(0.0, 1.5, 0.0)).length() < 1e-5);

        let after = scene.detach_from_camera(id, &camera).unwrap();
        assert!((after.0 - before.0).length() < 1e-6);
        assert_eq!(scene.get(id).unwrap().anchor, Anchor::World);
        assert_eq!(scene.world_transform(id, None).unwrap().0, after.0);
    }

    #[test]
    fn test_sync_through_local_offset() {
        let mut world = World::default();
        let offset = Vec3::new(0.0, 0.2, 0.0);
        let local_rotation = Quat::from_rotation_x(-FRAC_PI_2);
        let yaw = Quat::from_rotation_y(0.3);
        let body = world.add_body(
            Body::fixed(Shape::Sphere { radius: 0.1 })
                .with_position(Vec3::new(1.0, 0.0, 0.0) + yaw * offset)
                .with_rotation(yaw * local_rotation),
        );

        let mut scene = Scene::new();
        let id = scene.add(Node::new(Mesh::Ball { radius: 0.1 }));
        scene.get_mut(id).unwrap().link = Some(BodyLink {
            body,
            local_position: offset,
            local_rotation,
        });
        scene.sync_from_physics(&world);

        let node = scene.get(id).unwrap();
        assert!((node.position - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);
        assert!(node.rotation.dot(yaw).abs() > 1.0 - 1e-6);
    }

    #[test]
    fn test_hide_and_remove() {
        let mut scene = Scene::new();
        let a = scene.add(Node::new(Mesh::Ball { radius: 0.05 }));
        let b = scene.add(Node::new(Mesh::Ball { radius: 0.05 }));
        scene.hide(a);
        assert!(!scene.get(a).unwrap().visible);
        assert_eq!(scene.get(a).unwrap().position, HIDDEN_POSITION);

        assert!(scene.remove(b).is_some());
        assert!(scene.get(b).is_none());
        let c = scene.add(Node::new(Mesh::Ball { radius: 0.05 }));
        assert_ne!(b, c);
    }
}
