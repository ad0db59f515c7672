//! Rigid-body physics
//!
//! A small world stepped once per frame at a fixed timestep. Only spheres
//! move; everything else (ground, basket frame, rim walls) is static.

pub mod basket;
pub mod body;
pub mod collision;
pub mod world;

pub use basket::{
    BasketDims, BasketGeometry, ConvexPolyhedron, RimWall, WallSide, cylinder_frame, rim_walls,
};
pub use body::{Body, BodyHandle, Shape};
pub use collision::{Aabb, Contact, sphere_contact};
pub use world::{CollisionEvent, World};
