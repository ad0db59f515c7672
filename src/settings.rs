//! Game tuning and preferences
//!
//! Persisted as JSON in LocalStorage. Missing fields fall back to the
//! compile-time defaults in `consts`, so older saved blobs keep loading.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::physics::BasketDims;

/// Game settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Basket ===
    pub basket_radius: f32,
    pub basket_height: f32,
    /// Sides of the basket frame (4 = square)
    pub basket_segments: u32,

    // === Ball ===
    pub ball_radius: f32,
    pub ball_mass: f32,
    /// Bounciness against the basket and floor (0.0 - 1.0)
    pub ball_restitution: f32,
    pub ball_friction: f32,
    /// Fraction of velocity lost per second in flight
    pub ball_damping: f32,
    /// Ball speed per unit of swipe velocity
    pub throw_power: f32,
    /// Upward speed per unit of swipe velocity
    pub throw_lift: f32,
    pub respawn_delay_ms: f64,
    /// How long a scored ball stays visible
    pub ball_linger_ms: f64,

    // === Feedback ===
    pub message_timeout_ms: f64,
    /// Consecutive misses per taunt stage
    pub miss_threshold: u32,

    // === Physics ===
    pub physics_dt: f32,
    pub gravity: f32,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    pub muted: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            basket_radius: BASKET_RADIUS,
            basket_height: BASKET_HEIGHT,
            basket_segments: BASKET_SEGMENTS,

            ball_radius: BALL_RADIUS,
            ball_mass: BALL_MASS,
            ball_restitution: BALL_RESTITUTION,
            ball_friction: BALL_FRICTION,
            ball_damping: 0.0,
            throw_power: THROW_POWER,
            throw_lift: THROW_LIFT,
            respawn_delay_ms: BALL_RESPAWN_DELAY_MS,
            ball_linger_ms: BALL_LINGER_MS,

            message_timeout_ms: MESSAGE_TIMEOUT_MS,
            miss_threshold: MISS_TAUNT_THRESHOLD,

            physics_dt: SIM_DT,
            gravity: GRAVITY,

            master_volume: 0.8,
            muted: false,
        }
    }
}

/// Replace non-finite or out-of-range values with the default
fn clamp_or(value: f32, min: f32, max: f32, default: f32) -> f32 {
    if value.is_finite() { value.clamp(min, max) } else { default }
}

fn clamp_ms(value: f64, max: f64, default: f64) -> f64 {
    if value.is_finite() { value.clamp(0.0, max) } else { default }
}

impl Settings {
    /// Clamp every field into a range the game can run with
    pub fn sanitized(mut self) -> Self {
        let d = Self::default();
        self.basket_radius = clamp_or(self.basket_radius, 0.05, 2.0, d.basket_radius);
        self.basket_height = clamp_or(self.basket_height, 0.05, 2.0, d.basket_height);
        self.basket_segments = self.basket_segments.clamp(3, 32);

        self.ball_radius = clamp_or(self.ball_radius, 0.01, 0.5, d.ball_radius);
        self.ball_mass = clamp_or(self.ball_mass, 0.001, 10.0, d.ball_mass);
        self.ball_restitution = clamp_or(self.ball_restitution, 0.0, 1.0, d.ball_restitution);
        self.ball_friction = clamp_or(self.ball_friction, 0.0, 1.0, d.ball_friction);
        self.ball_damping = clamp_or(self.ball_damping, 0.0, 1.0, d.ball_damping);
        self.throw_power = clamp_or(self.throw_power, 0.0, 100.0, d.throw_power);
        self.throw_lift = clamp_or(self.throw_lift, 0.0, 100.0, d.throw_lift);
        self.respawn_delay_ms = clamp_ms(self.respawn_delay_ms, 60_000.0, d.respawn_delay_ms);
        self.ball_linger_ms = clamp_ms(self.ball_linger_ms, 60_000.0, d.ball_linger_ms);

        self.message_timeout_ms =
            clamp_ms(self.message_timeout_ms, 600_000.0, d.message_timeout_ms);
        self.miss_threshold = self.miss_threshold.max(1);

        self.physics_dt = clamp_or(self.physics_dt, 1.0 / 240.0, 1.0 / 15.0, d.physics_dt);
        self.gravity = clamp_or(self.gravity, -100.0, 0.0, d.gravity);

        self.master_volume = clamp_or(self.master_volume, 0.0, 1.0, d.master_volume);
        self
    }

    pub fn basket_dims(&self) -> BasketDims {
        BasketDims {
            radius: self.basket_radius,
            height: self.basket_height,
            segments: self.basket_segments,
        }
    }

    pub fn gravity_vector(&self) -> Vec3 {
        Vec3::new(0.0, self.gravity, 0.0)
    }

    /// LocalStorage key
    const STORAGE_KEY: &'static str = "paper_toss_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match serde_json::from_str::<Settings>(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings.sanitized();
                    }
                    Err(e) => log::warn!("Ignoring saved settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
