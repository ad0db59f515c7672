//! Rendering module
//!
//! A scene graph mirrored from physics, drawn as colored wireframes through a
//! WebGPU line-list pipeline over the camera feed.

pub mod scene;
pub mod shapes;
pub mod vertex;
pub mod wireframe;

pub use scene::{Anchor, BodyLink, Mesh, Node, NodeId, Scene};
pub use shapes::scene_vertices;
pub use vertex::Vertex;
pub use wireframe::RenderState;
