//! Game simulation module
//!
//! All gameplay logic lives here and stays platform independent:
//! - Fixed timestep physics, one step per frame
//! - Seeded RNG only
//! - Stable iteration order (bodies, nodes and balls by id)
//! - Devices reached only through the `ArSession` trait

pub mod scoring;
pub mod session;
pub mod state;
pub mod throw;

pub use scoring::{ScoreState, points_for_distance};
pub use session::Session;
pub use state::{
    Ball, BallOutcome, Basket, CHEER_VARIANTS, GameEvent, InputEvent, Placement, Sound,
    SwipeGesture, Timer, TimerKind,
};
pub use throw::{aim_direction, launch_velocity, swipe_velocity};
