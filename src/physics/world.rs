//! Fixed-timestep rigid-body world
//!
//! One `step()` per rendered frame. Integration is semi-implicit Euler;
//! contacts are resolved with a positional correction and a single
//! restitution + friction impulse. Good enough for paper balls.

use glam::Vec3;

use super::body::{Body, BodyHandle};
use super::collision::{Contact, sphere_contact};
use crate::consts::{GRAVITY, SIM_DT};

/// Reported once per participant for every contact in a step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEvent {
    /// The body receiving the event
    pub body: BodyHandle,
    /// The body it touched
    pub other: BodyHandle,
    /// Contact normal pointing toward `body`
    pub normal: Vec3,
}

/// The physics world
#[derive(Debug, Clone)]
pub struct World {
    pub gravity: Vec3,
    /// Fixed step length in seconds
    pub dt: f32,
    /// Sorted by handle for a stable iteration order
    bodies: Vec<(BodyHandle, Body)>,
    events: Vec<CollisionEvent>,
    next_id: u32,
}

impl Default for World {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, GRAVITY, 0.0), SIM_DT)
    }
}

impl World {
    pub fn new(gravity: Vec3, dt: f32) -> Self {
        Self {
            gravity,
            dt,
            bodies: Vec::new(),
            events: Vec::new(),
            next_id: 1,
        }
    }

    pub fn add_body(&mut self, body: Body) -> BodyHandle {
        let handle = BodyHandle(self.next_id);
        self.next_id += 1;
        self.bodies.push((handle, body));
        handle
    }

    /// Remove a body; returns it if it was present
    pub fn remove_body(&mut self, handle: BodyHandle) -> Option<Body> {
        let index = self.index_of(handle)?;
        Some(self.bodies.remove(index).1)
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&Body> {
        self.index_of(handle).map(|i| &self.bodies[i].1)
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        self.index_of(handle).map(move |i| &mut self.bodies[i].1)
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.index_of(handle).is_some()
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BodyHandle, &Body)> {
        self.bodies.iter().map(|(h, b)| (*h, b))
    }

    /// Collisions reported since the last drain
    pub fn drain_collisions(&mut self) -> std::vec::Drain<'_, CollisionEvent> {
        self.events.drain(..)
    }

    fn index_of(&self, handle: BodyHandle) -> Option<usize> {
        self.bodies.binary_search_by_key(&handle, |(h, _)| *h).ok()
    }

    /// Advance the simulation by one fixed step
    pub fn step(&mut self) {
        let dt = self.dt;
        let gravity = self.gravity;

        for (_, body) in self.bodies.iter_mut() {
            if !body.is_dynamic() {
                continue;
            }
            body.velocity += gravity * dt;
            if body.linear_damping > 0.0 {
                body.velocity *= (1.0 - body.linear_damping).powf(dt);
            }
            body.position += body.velocity * dt;
        }

        let count = self.bodies.len();
        for i in 0..count {
            if !self.bodies[i].1.is_dynamic() {
                continue;
            }
            for j in 0..count {
                // Dynamic pairs are visited once, from the lower index
                if i == j || (self.bodies[j].1.is_dynamic() && j < i) {
                    continue;
                }
                let Some(contact) = sphere_contact(&self.bodies[i].1, &self.bodies[j].1) else {
                    continue;
                };

                let (a, b) = (self.bodies[i].0, self.bodies[j].0);
                self.events.push(CollisionEvent {
                    body: a,
                    other: b,
                    normal: contact.normal,
                });
                self.events.push(CollisionEvent {
                    body: b,
                    other: a,
                    normal: -contact.normal,
                });

                let (body_a, body_b) = pair_mut(&mut self.bodies, i, j);
                if body_a.collision_response && body_b.collision_response {
                    resolve_contact(body_a, body_b, &contact);
                }
            }
        }
    }
}

/// Mutable access to two distinct bodies
fn pair_mut(bodies: &mut [(BodyHandle, Body)], i: usize, j: usize) -> (&mut Body, &mut Body) {
    debug_assert_ne!(i, j);
    if i < j {
        let (left, right) = bodies.split_at_mut(j);
        (&mut left[i].1, &mut right[0].1)
    } else {
        let (left, right) = bodies.split_at_mut(i);
        (&mut right[0].1, &mut left[j].1)
    }
}

/// Separate two bodies and apply a bounce + friction impulse.
/// `contact.normal` points from `b` toward `a`.
fn resolve_contact(a: &mut Body, b: &mut Body, contact: &Contact) {
    let inv_a = a.inv_mass();
    let inv_b = b.inv_mass();
    let inv_total = inv_a + inv_b;
    if inv_total <= 0.0 {
        return;
    }
    let n = contact.normal;

    let correction = n * contact.penetration;
    a.position += correction * (inv_a / inv_total);
    b.position -= correction * (inv_b / inv_total);

    let relative = a.velocity - b.velocity;
    let normal_speed = relative.dot(n);
    if normal_speed >= 0.0 {
        return;
    }

    let restitution = a.restitution.max(b.restitution);
    let j = -(1.0 + restitution) * normal_speed / inv_total;
    a.velocity += n * (j * inv_a);
    b.velocity -= n * (j * inv_b);

    // Coulomb friction, capped by the normal impulse
    let relative = a.velocity - b.velocity;
    let tangent = relative - n * relative.dot(n);
    let tangent_speed = tangent.length();
    if tangent_speed > 1e-6 {
        let mu = (a.friction * b.friction).sqrt();
        let jt = (tangent_speed / inv_total).min(mu * j);
        let dir = tangent / tangent_speed;
        a.velocity -= dir * (jt * inv_a);
        b.velocity += dir * (jt * inv_b);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::body::Shape;

    fn ball(position: Vec3) -> Body {
        Body::dynamic(Shape::Sphere { radius: 0.05 }, 0.1).with_position(position)
    }

    #[test]
    fn test_add_remove_keeps_handles_unique() {
        let mut world = World::default();
        let a = world.add_body(Body::fixed(Shape::Plane));
        let b = world.add_body(ball(Vec3::Y));
        assert_ne!(a, b);
        assert_eq!(world.len(), 2);

        assert!(world.remove_body(a).is_some());
        assert!(world.remove_body(a).is_none());
        let c = world.add_body(ball(Vec3::Y));
        assert_ne!(c, a);
        assert!(world.contains(b) && world.contains(c));
    }

    #[test]
    fn test_free_fall() {
        let mut world = World::default();
        let h = world.add_body(ball(Vec3::new(0.0, 10.0, 0.0)));
        for _ in 0..60 {
            world.step();
        }
        let body = world.body(h).unwrap();
        // One second of gravity
        assert!((body.velocity.y - GRAVITY).abs() < 1e-3);
        assert!(body.position.y < 10.0 - 4.5 && body.position.y > 10.0 - 5.5);
    }

    #[test]
    fn test_ground_stops_ball_and_reports() {
        let mut world = World::default();
        let ground = world.add_body(Body::fixed(Shape::Plane));
        let h = world.add_body(ball(Vec3::new(0.0, 0.5, 0.0)));

        let mut touched = false;
        for _ in 0..240 {
            world.step();
            touched |= world
                .drain_collisions()
                .any(|e| e.body == h && e.other == ground);
        }
        assert!(touched);
        let body = world.body(h).unwrap();
        assert!(body.position.y > 0.0 && body.position.y < 0.06);
        assert!(world.body(ground).unwrap().position == Vec3::ZERO);
    }

    #[test]
    fn test_no_response_still_reports() {
        let mut world = World::default();
        let sensor = world.add_body(
            Body::fixed(Shape::Cuboid {
                half_extents: Vec3::splat(1.0),
            })
            .with_collision_response(false),
        );
        let h = world.add_body(ball(Vec3::new(0.0, 0.5, 0.0)).with_velocity(Vec3::ZERO));
        world.step();
        let events: Vec<_> = world.drain_collisions().collect();
        assert!(events.iter().any(|e| e.body == sensor && e.other == h));
        // Not pushed out of the sensor
        assert!(world.body(h).unwrap().position.y < 0.5);
    }

    #[test]
    fn test_balls_bounce_apart() {
        let mut world = World::new(Vec3::ZERO, SIM_DT);
        let a = world.add_body(ball(Vec3::ZERO).with_velocity(Vec3::X));
        let b = world.add_body(ball(Vec3::new(0.12, 0.0, 0.0)).with_velocity(Vec3::NEG_X));
        for _ in 0..10 {
            world.step();
        }
        assert!(world.body(a).unwrap().velocity.x < 0.0);
        assert!(world.body(b).unwrap().velocity.x > 0.0);
    }
}
