//! Orbit camera with damped controls.

use glam::{Mat4, Vec3};

/// Fraction of pending rotation/zoom applied per [`OrbitCamera::update`].
pub const DAMPING: f32 = 0.05;

const MIN_PITCH: f32 = -1.5;
const MAX_PITCH: f32 = 1.5;

/// Perspective camera orbiting a target point.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    /// Horizontal rotation angle in radians.
    pub yaw: f32,
    /// Vertical rotation angle in radians.
    pub pitch: f32,
    /// Distance from the target point.
    pub distance: f32,
    /// Point the camera orbits around.
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    /// Width over height of the viewport.
    pub aspect: f32,
    min_distance: f32,
    max_distance: f32,
    pending_yaw: f32,
    pending_pitch: f32,
    pending_zoom: f32,
}

impl OrbitCamera {
    /// Camera at `eye` looking at `target`.
    pub fn looking_at(eye: Vec3, target: Vec3) -> Self {
        let offset = eye - target;
        let distance = offset.length().max(f32::EPSILON);
        let pitch = (offset.y / distance).clamp(-1.0, 1.0).asin();
        let yaw = offset.x.atan2(offset.z);

        Self {
            yaw,
            pitch,
            distance,
            target,
            fov_y: 75.0,
            near: 0.1,
            far: 100.0,
            aspect: 16.0 / 9.0,
            min_distance: 0.5,
            max_distance: 40.0,
            pending_yaw: 0.0,
            pending_pitch: 0.0,
            pending_zoom: 0.0,
        }
    }

    /// Calculate the camera's world position.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    /// Calculate the view matrix for rendering.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Track a new viewport size. Zero-sized viewports are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// Queue an orbit by the given angles; applied gradually by [`update`](Self::update).
    pub fn rotate(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.pending_yaw += delta_yaw;
        self.pending_pitch += delta_pitch;
    }

    /// Queue a dolly; positive `amount` moves closer.
    pub fn zoom(&mut self, amount: f32) {
        self.pending_zoom += amount;
    }

    /// Apply a damped share of the queued motion. Call once per frame.
    pub fn update(&mut self) {
        self.yaw += self.pending_yaw * DAMPING;
        self.pitch = (self.pitch + self.pending_pitch * DAMPING).clamp(MIN_PITCH, MAX_PITCH);
        self.distance = (self.distance - self.pending_zoom * DAMPING)
            .clamp(self.min_distance, self.max_distance);

        self.pending_yaw *= 1.0 - DAMPING;
        self.pending_pitch *= 1.0 - DAMPING;
        self.pending_zoom *= 1.0 - DAMPING;
    }

    /// Whether queued motion is still being applied.
    pub fn is_settling(&self) -> bool {
        const EPS: f32 = 1e-4;
        self.pending_yaw.abs() > EPS || self.pending_pitch.abs() > EPS || self.pending_zoom.abs() > EPS
    }
}

impl Default for OrbitCamera {
    /// Slightly above the floor on the `+X` side, looking at the wall.
    fn default() -> Self {
        Self::looking_at(Vec3::new(8.0, 4.0, 0.0), Vec3::new(0.0, 1.0, 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_looking_at_round_trips_position() {
        let cam = OrbitCamera::default();
        assert!((cam.position() - Vec3::new(8.0, 4.0, 0.0)).length() < 1e-4);
        assert_eq!(cam.target, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_default_projection() {
        let cam = OrbitCamera::default();
        assert_eq!(cam.fov_y, 75.0);
        assert_eq!(cam.near, 0.1);
        assert_eq!(cam.far, 100.0);
    }

    #[test]
    fn test_target_projects_to_centre() {
        let cam = OrbitCamera::default();
        let clip = cam.view_proj() * cam.target.extend(1.0);
        let ndc = clip / clip.w;
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
    }

    #[test]
    fn test_rotation_is_damped() {
        let mut cam = OrbitCamera::default();
        let start = cam.yaw;
        cam.rotate(1.0, 0.0);
        cam.update();
        assert!((cam.yaw - start - DAMPING).abs() < 1e-6);
        assert!(cam.is_settling());

        for _ in 0..1000 {
            cam.update();
        }
        assert!(!cam.is_settling());
        assert!((cam.yaw - start - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_pitch_and_zoom_clamped() {
        let mut cam = OrbitCamera::default();
        cam.rotate(0.0, 1000.0);
        cam.zoom(10_000.0);
        for _ in 0..200 {
            cam.update();
        }
        assert!(cam.pitch <= MAX_PITCH);
        assert!(cam.distance >= 0.5);
    }

    #[test]
    fn test_resize_ignores_zero() {
        let mut cam = OrbitCamera::default();
        cam.resize(800, 400);
        assert_eq!(cam.aspect, 2.0);
        cam.resize(0, 400);
        assert_eq!(cam.aspect, 2.0);
    }
}
