//! Paper Toss - an augmented-reality paper toss game
//!
//! Core modules:
//! - `ar`: AR device abstraction (camera pose, surface hit-testing)
//! - `physics`: Rigid-body world, collision shapes, basket collider geometry
//! - `sim`: Game session (placement, throwing, scoring)
//! - `renderer`: Scene graph and WebGPU wireframe pipeline
//! - `platform`: Browser bindings for the AR display
//! - `settings`: Persisted game tuning

pub mod ar;
#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod error;
pub mod physics;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;
#[cfg(target_arch = "wasm32")]
pub mod ui;

pub use error::GameError;
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    use glam::Vec3;

    /// Fixed physics timestep, one step per rendered frame
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Gravity along world Y (m/s²)
    pub const GRAVITY: f32 = -10.0;

    /// Basket defaults (metres)
    pub const BASKET_RADIUS: f32 = 0.2;
    pub const BASKET_HEIGHT: f32 = 0.35;
    pub const BASKET_SEGMENTS: u32 = 4;
    /// Rim walls are slightly wider than a side so neighbouring walls overlap
    pub const WALL_WIDTH_DIVISOR: f32 = 1.8;
    pub const WALL_HALF_THICKNESS: f32 = 0.02;

    /// Paper ball defaults
    pub const BALL_RADIUS: f32 = 0.05;
    pub const BALL_MASS: f32 = 0.1;
    pub const BALL_RESTITUTION: f32 = 0.3;
    pub const BALL_FRICTION: f32 = 0.3;
    /// Ready ball offset in camera space (just below and in front of the lens)
    pub const READY_BALL_OFFSET: Vec3 = Vec3::new(0.0, -0.08, -0.3);

    /// Ball speed (m/s) per unit of swipe velocity (px/ms)
    pub const THROW_POWER: f32 = 12.0;
    /// Upward speed per unit of swipe velocity, added on top of the aim ray
    pub const THROW_LIFT: f32 = 0.5;
    /// Delay before the next ball is readied after a throw
    pub const BALL_RESPAWN_DELAY_MS: f64 = 1000.0;
    /// How long a scored ball stays in the world before it is retired
    pub const BALL_LINGER_MS: f64 = 1500.0;

    /// Consecutive misses per taunt stage
    pub const MISS_TAUNT_THRESHOLD: u32 = 3;
    /// Taunts stop escalating past this stage
    pub const MAX_TAUNT_STAGE: u32 = 3;

    /// Banner auto-hide timeout
    pub const MESSAGE_TIMEOUT_MS: f64 = 5000.0;

    /// Where hidden objects are parked
    pub const HIDDEN_POSITION: Vec3 = Vec3::new(10000.0, 10000.0, 10000.0);
    /// Per-frame easing of the reticle toward its hit pose
    pub const RETICLE_EASING: f32 = 0.25;
    pub const RETICLE_INNER_RADIUS: f32 = 0.03;
    pub const RETICLE_OUTER_RADIUS: f32 = 0.04;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Fold an angle into (-π/2, π/2] (a line's direction, ignoring which way it points)
#[inline]
pub fn fold_half_turn(angle: f32) -> f32 {
    use std::f32::consts::{FRAC_PI_2, PI};
    let mut angle = normalize_angle(angle);
    if angle > FRAC_PI_2 + 1e-6 {
        angle -= PI;
    } else if angle <= -FRAC_PI_2 + 1e-6 {
        angle += PI;
    }
    angle
}

/// Convert page coordinates to viewport-normalized [0, 1] coordinates
#[inline]
pub fn normalize_screen(page: Vec2, viewport: Vec2) -> Vec2 {
    if viewport.x <= 0.0 || viewport.y <= 0.0 {
        return Vec2::splat(0.5);
    }
    (page / viewport).clamp(Vec2::ZERO, Vec2::ONE)
}
