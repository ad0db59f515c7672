//! WebVR display with the AR extension
//!
//! The display object stays on the JS side; Rust only sees packed float
//! arrays. A frame is `position(3) ++ orientation(4) ++ projection(16)` and a
//! hit-test result is one 16-float model matrix per hit.

use js_sys::Float32Array;
use wasm_bindgen::prelude::*;

use crate::ar::{ArSession, CameraFrame, SurfaceHit};
use crate::error::GameError;

#[wasm_bindgen(inline_js = "
    let display = null;
    let frameData = null;

    export async function ar_request_display() {
        if (!navigator.getVRDisplays) {
            throw new Error('navigator.getVRDisplays is unavailable');
        }
        const displays = await navigator.getVRDisplays();
        const ar = displays.find(
            (d) => d.capabilities && d.capabilities.hasPassThroughCamera
        );
        if (!ar) {
            throw new Error('no display with a pass-through camera');
        }
        display = ar;
        frameData = new VRFrameData();
        return display.displayName || 'ar display';
    }

    export function ar_frame_data() {
        if (!display || !display.getFrameData(frameData)) {
            return undefined;
        }
        const pose = frameData.pose;
        if (!pose || !pose.position || !pose.orientation) {
            return undefined;
        }
        const packed = new Float32Array(23);
        packed.set(pose.position, 0);
        packed.set(pose.orientation, 3);
        packed.set(frameData.leftProjectionMatrix, 7);
        return packed;
    }

    export function ar_hit_test(x, y) {
        const hits = display && display.hitTest ? display.hitTest(x, y) : [];
        const packed = new Float32Array(hits.length * 16);
        hits.forEach((hit, i) => packed.set(hit.modelMatrix, i * 16));
        return packed;
    }

    export function ar_render_camera() {
        if (display && typeof window.paperTossRenderCamera === 'function') {
            window.paperTossRenderCamera(display);
        }
    }
")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn ar_request_display() -> Result<JsValue, JsValue>;
    fn ar_frame_data() -> Option<Float32Array>;
    fn ar_hit_test(x: f32, y: f32) -> Float32Array;
    fn ar_render_camera();
}

/// Connected AR display
pub struct WebArSession {
    /// Reused buffer for unpacking frame data
    scratch: Vec<f32>,
}

impl WebArSession {
    /// Find a display with a pass-through camera
    pub async fn connect() -> Result<Self, GameError> {
        match ar_request_display().await {
            Ok(name) => {
                log::info!("AR display connected: {}", name.as_string().unwrap_or_default());
                Ok(Self {
                    scratch: vec![0.0; CameraFrame::PACKED_LEN],
                })
            }
            Err(e) => {
                log::warn!("AR display unavailable: {:?}", e);
                Err(GameError::Unsupported)
            }
        }
    }
}

impl ArSession for WebArSession {
    fn frame(&mut self) -> Option<CameraFrame> {
        let packed = ar_frame_data()?;
        if packed.length() as usize != CameraFrame::PACKED_LEN {
            return None;
        }
        packed.copy_to(&mut self.scratch);
        CameraFrame::from_packed(&self.scratch)
    }

    fn hit_test(&self, x: f32, y: f32) -> Vec<SurfaceHit> {
        ar_hit_test(x, y)
            .to_vec()
            .chunks_exact(16)
            .filter_map(SurfaceHit::from_model_matrix)
            .collect()
    }

    fn render_camera_feed(&mut self) {
        ar_render_camera();
    }
}
