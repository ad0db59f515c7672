//! AR device abstraction
//!
//! The game only needs three things from the device: where the camera is,
//! how it projects, and where real-world surfaces are under a screen point.
//! The browser implementation lives in `platform::webvr`; `FloorSession`
//! simulates a device standing over a flat floor for tests and native runs.

use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

/// Camera pose and projection for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFrame {
    pub position: Vec3,
    pub orientation: Quat,
    /// OpenGL-style projection (clip z in [-w, w])
    pub projection: Mat4,
}

impl CameraFrame {
    /// Floats per packed frame: position (3), orientation quaternion (4),
    /// column-major projection (16)
    pub const PACKED_LEN: usize = 23;

    /// Unpack a frame as delivered by the device bridge
    pub fn from_packed(data: &[f32]) -> Option<Self> {
        if data.len() < Self::PACKED_LEN {
            return None;
        }
        let position = Vec3::from_slice(&data[0..3]);
        let orientation = Quat::from_slice(&data[3..7]);
        let projection = Mat4::from_cols_slice(&data[7..23]);
        if !position.is_finite() || !orientation.is_finite() || !projection.is_finite() {
            return None;
        }
        Some(Self {
            position,
            orientation: Quat::from_vec4(Vec4::from(orientation).try_normalize()?),
            projection,
        })
    }

    /// World-to-camera transform
    pub fn view(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation, self.position).inverse()
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view()
    }

    /// Direction the camera is looking (unit length)
    pub fn forward(&self) -> Vec3 {
        (self.orientation * Vec3::NEG_Z).normalize_or(Vec3::NEG_Z)
    }

    /// Transform a camera-space point into world space
    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.position + self.orientation * local
    }

    /// Un-project a viewport-normalized screen point ([0, 1], y down) into a
    /// world-space ray. The direction is always unit length; a degenerate
    /// projection falls back to the camera forward.
    pub fn screen_ray(&self, screen: Vec2) -> (Vec3, Vec3) {
        let ndc = Vec2::new(screen.x * 2.0 - 1.0, -screen.y * 2.0 + 1.0);
        let inv = self.view_projection().inverse();
        let near = inv.project_point3(Vec3::new(ndc.x, ndc.y, -1.0));
        let far = inv.project_point3(Vec3::new(ndc.x, ndc.y, 1.0));

        match (far - near).try_normalize() {
            Some(dir) if near.is_finite() => (near, dir),
            Some(dir) => (self.position, dir),
            None => (self.position, self.forward()),
        }
    }
}

/// A real-world surface intersection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    pub position: Vec3,
    pub orientation: Quat,
}

impl SurfaceHit {
    /// Decompose a column-major 4x4 model matrix as reported by the device.
    /// Returns `None` for short or non-finite input.
    pub fn from_model_matrix(m: &[f32]) -> Option<Self> {
        if m.len() < 16 {
            return None;
        }
        let matrix = Mat4::from_cols_slice(&m[..16]);
        let (_scale, orientation, position) = matrix.to_scale_rotation_translation();
        if !position.is_finite() || !orientation.is_finite() {
            return None;
        }
        Some(Self {
            position,
            orientation: orientation.normalize(),
        })
    }
}

/// Device pose tracking and surface hit-testing
pub trait ArSession {
    /// Poll the device for this frame's camera. `None` while tracking is not
    /// established.
    fn frame(&mut self) -> Option<CameraFrame>;

    /// Surface hits under a viewport-normalized point, best first
    fn hit_test(&self, x: f32, y: f32) -> Vec<SurfaceHit>;

    /// Draw the pass-through camera image behind the scene
    fn render_camera_feed(&mut self) {}
}

/// Simulated device over an infinite horizontal floor
#[derive(Debug, Clone)]
pub struct FloorSession {
    pub camera: CameraFrame,
    pub floor_height: f32,
    /// Hits further than this are not reported
    pub max_distance: f32,
    pub tracking: bool,
}

impl FloorSession {
    /// Camera at `eye_height` above the floor looking along -Z
    pub fn new(eye_height: f32, aspect: f32) -> Self {
        Self {
            camera: CameraFrame {
                position: Vec3::new(0.0, eye_height, 0.0),
                orientation: Quat::IDENTITY,
                projection: Mat4::perspective_rh_gl(60f32.to_radians(), aspect, 0.01, 100.0),
            },
            floor_height: 0.0,
            max_distance: 20.0,
            tracking: true,
        }
    }

    pub fn set_pose(&mut self, position: Vec3, orientation: Quat) {
        self.camera.position = position;
        self.camera.orientation = orientation;
    }
}

impl ArSession for FloorSession {
    fn frame(&mut self) -> Option<CameraFrame> {
        self.tracking.then_some(self.camera)
    }

    fn hit_test(&self, x: f32, y: f32) -> Vec<SurfaceHit> {
        if !self.tracking {
            return Vec::new();
        }
        let (origin, dir) = self.camera.screen_ray(Vec2::new(x, y));
        // Rays at or above the horizon never reach the floor
        if dir.y >= -1e-4 {
            return Vec::new();
        }
        let t = (self.floor_height - origin.y) / dir.y;
        if t <= 0.0 || t > self.max_distance {
            return Vec::new();
        }
        vec![SurfaceHit {
            position: origin + dir * t,
            orientation: Quat::IDENTITY,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_ray_matches_forward() {
        let session = FloorSession::new(1.5, 0.5625);
        let (_, dir) = session.camera.screen_ray(Vec2::splat(0.5));
        assert!((dir - Vec3::NEG_Z).length() < 1e-4);
        assert!((dir.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_floor_hit_below_center() {
        let session = FloorSession::new(1.5, 0.5625);
        let hits = session.hit_test(0.5, 0.8);
        assert_eq!(hits.len(), 1);
        assert!(hits[0].position.y.abs() < 1e-4);
        assert!(hits[0].position.z < 0.0);
    }

    #[test]
    fn test_no_hit_above_horizon() {
        let session = FloorSession::new(1.5, 0.5625);
        assert!(session.hit_test(0.5, 0.2).is_empty());
        assert!(session.hit_test(0.5, 0.5).is_empty());
    }

    #[test]
    fn test_frame_from_packed() {
        let projection = Mat4::perspective_rh_gl(1.0, 0.5, 0.01, 100.0);
        let mut packed = vec![1.0, 2.0, 3.0, 0.0, 0.0, 0.0, 2.0];
        packed.extend_from_slice(&projection.to_cols_array());
        let frame = CameraFrame::from_packed(&packed).unwrap();
        assert_eq!(frame.position, Vec3::new(1.0, 2.0, 3.0));
        // Orientation is renormalized
        assert_eq!(frame.orientation, Quat::IDENTITY);
        assert_eq!(frame.projection, projection);

        assert!(CameraFrame::from_packed(&packed[..22]).is_none());
        packed[3..7].copy_from_slice(&[0.0; 4]);
        assert!(CameraFrame::from_packed(&packed).is_none());
    }

    #[test]
    fn test_hit_from_model_matrix() {
        let m = Mat4::from_rotation_translation(
            Quat::from_rotation_y(0.3),
            Vec3::new(1.0, -0.5, -2.0),
        );
        let hit = SurfaceHit::from_model_matrix(&m.to_cols_array()).unwrap();
        assert!((hit.position - Vec3::new(1.0, -0.5, -2.0)).length() < 1e-5);
        assert!(hit.orientation.angle_between(Quat::from_rotation_y(0.3)) < 1e-3);
        assert!(SurfaceHit::from_model_matrix(&[0.0; 8]).is_none());
    }
}
