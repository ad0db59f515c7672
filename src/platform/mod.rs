//! Platform bindings
//!
//! Browser-only glue for the AR display. Native builds drive the game through
//! [`crate::ar::FloorSession`] instead.

#[cfg(target_arch = "wasm32")]
pub mod webvr;
