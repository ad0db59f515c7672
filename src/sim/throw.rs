//! Throw kinematics
//!
//! Converts a swipe into a launch velocity along the aim ray.

use glam::Vec3;

/// Swipe speed in px/ms. `None` when the elapsed time is not positive.
pub fn swipe_velocity(distance: f32, elapsed_ms: f64) -> Option<f32> {
    if elapsed_ms.is_nan() || elapsed_ms <= 0.0 || !distance.is_finite() {
        return None;
    }
    Some((distance as f64 / elapsed_ms) as f32)
}

/// Unit aim direction, falling back to `fallback` (or -Z) when degenerate
#[inline]
pub fn aim_direction(ray: Vec3, fallback: Vec3) -> Vec3 {
    ray.try_normalize()
        .or_else(|| fallback.try_normalize())
        .unwrap_or(Vec3::NEG_Z)
}

/// Initial ball velocity: forward along the aim plus a little lift
#[inline]
pub fn launch_velocity(direction: Vec3, swipe_velocity: f32, power: f32, lift: f32) -> Vec3 {
    direction * swipe_velocity * power + Vec3::Y * swipe_velocity * lift
}
