//! Rigid bodies and their collision shapes

use glam::{Quat, Vec3};

use super::basket::ConvexPolyhedron;
use crate::consts::{BALL_FRICTION, BALL_RESTITUTION};

/// Stable handle to a body in a `World`. Handles are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub(crate) u32);

impl BodyHandle {
    pub fn id(&self) -> u32 {
        self.0
    }
}

/// Collision shape in body-local space
#[derive(Debug, Clone)]
pub enum Shape {
    /// Infinite half-space below the local XZ plane (normal is local +Y)
    Plane,
    Sphere { radius: f32 },
    Cuboid { half_extents: Vec3 },
    Polyhedron(ConvexPolyhedron),
}

/// A rigid body. Bodies with zero mass are static and never move.
#[derive(Debug, Clone)]
pub struct Body {
    pub position: Vec3,
    pub rotation: Quat,
    pub velocity: Vec3,
    pub shape: Shape,
    pub mass: f32,
    /// Bounciness, combined with the other body's by taking the larger
    pub restitution: f32,
    pub friction: f32,
    /// Fraction of velocity lost per second
    pub linear_damping: f32,
    /// When false the body reports collisions but is never pushed apart
    pub collision_response: bool,
}

impl Body {
    fn new(shape: Shape, mass: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            shape,
            mass: mass.max(0.0),
            restitution: BALL_RESTITUTION,
            friction: BALL_FRICTION,
            linear_damping: 0.0,
            collision_response: true,
        }
    }

    /// A body that never moves (mass 0)
    pub fn fixed(shape: Shape) -> Self {
        Self::new(shape, 0.0)
    }

    /// A body moved by gravity and contacts
    pub fn dynamic(shape: Shape, mass: f32) -> Self {
        Self::new(shape, mass)
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution.clamp(0.0, 1.0);
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction.max(0.0);
        self
    }

    pub fn with_damping(mut self, damping: f32) -> Self {
        self.linear_damping = damping.clamp(0.0, 1.0);
        self
    }

    pub fn with_collision_response(mut self, response: bool) -> Self {
        self.collision_response = response;
        self
    }

    #[inline]
    pub fn is_dynamic(&self) -> bool {
        self.mass > 0.0
    }

    #[inline]
    pub fn inv_mass(&self) -> f32 {
        if self.is_dynamic() { 1.0 / self.mass } else { 0.0 }
    }
}
