use glam::{Vec2, Vec3};

use crate::renderer::camera::Camera;

const MAX_PITCH_DEG: f32 = 89.0;
const SETTLE_EPSILON: f32 = 1e-5;

/// Pointer-driven orbit around the camera target.
///
/// Input only queues motion; [`OrbitControls::update`] applies a damped share
/// of it once per frame, so the camera keeps gliding after the pointer stops.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitControls {
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,

    pending_yaw: f32,
    pending_pitch: f32,
    pending_dolly: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.05,
            rotate_speed: 0.005,
            zoom_speed: 25.0,
            min_distance: 1.0,
            max_distance: 9000.0,

            pending_yaw: 0.0,
            pending_pitch: 0.0,
            pending_dolly: 0.0,
        }
    }
}

impl OrbitControls {
    /// Queues a drag of `delta` pixels.
    pub fn rotate(&mut self, delta: Vec2) {
        self.pending_yaw += delta.x * self.rotate_speed;
        self.pending_pitch -= delta.y * self.rotate_speed;
    }

    /// Queues a scroll of `lines`; positive moves toward the target.
    pub fn dolly(&mut self, lines: f32) {
        self.pending_dolly -= lines * self.zoom_speed;
    }

    pub fn is_settled(&self) -> bool {
        self.pending_yaw == 0.0 && self.pending_pitch == 0.0 && self.pending_dolly == 0.0
    }

    /// Advances damping by one frame. Returns whether the camera moved.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        if self.is_settled() {
            return false;
        }

        let offset = camera.position - camera.target;
        let distance = offset.length();
        if distance <= f32::EPSILON {
            self.stop();
            return false;
        }

        let dir = offset / distance;
        let mut yaw = dir.z.atan2(dir.x);
        let mut pitch = dir.y.clamp(-1.0, 1.0).asin();

        let share = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };
        yaw += self.pending_yaw * share;
        let max_pitch = MAX_PITCH_DEG.to_radians();
        pitch = (pitch + self.pending_pitch * share).clamp(-max_pitch, max_pitch);
        let distance = (distance + self.pending_dolly).clamp(self.min_distance, self.max_distance);

        camera.position = camera.target
            + Vec3::new(
                distance * yaw.cos() * pitch.cos(),
                distance * pitch.sin(),
                distance * yaw.sin() * pitch.cos(),
            );

        self.pending_dolly = 0.0;
        if self.enable_damping {
            self.pending_yaw = settle(self.pending_yaw * (1.0 - self.damping_factor));
            self.pending_pitch = settle(self.pending_pitch * (1.0 - self.damping_factor));
        } else {
            self.pending_yaw = 0.0;
            self.pending_pitch = 0.0;
        }
        true
    }

    pub fn stop(&mut self) {
        self.pending_yaw = 0.0;
        self.pending_pitch = 0.0;
        self.pending_dolly = 0.0;
    }
}

fn settle(v: f32) -> f32 {
    if v.abs() < SETTLE_EPSILON { 0.0 } else { v }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn framed_camera() -> Camera {
        let mut camera = Camera::default();
        camera.look_at(Vec3::new(300.0, -200.0, 150.0), Vec3::new(100.0, 0.0, 0.0));
        camera
    }

    #[test]
    fn idle_controls_leave_camera_alone() {
        let mut camera = framed_camera();
        let before = camera;
        let mut controls = OrbitControls::default();
        for _ in 0..10 {
            assert!(!controls.update(&mut camera));
        }
        assert_eq!(camera, before);
    }

    #[test]
    fn damped_rotation_keeps_distance_and_target() {
        let mut camera = framed_camera();
        let distance = camera.distance();
        let mut controls = OrbitControls::default();
        controls.rotate(Vec2::new(120.0, 0.0));

        assert!(controls.update(&mut camera));
        assert_eq!(camera.target, Vec3::new(100.0, 0.0, 0.0));
        assert!((camera.distance() - distance).abs() < 1e-2);
    }

    #[test]
    fn damping_glides_then_settles() {
        let mut camera = framed_camera();
        let mut controls = OrbitControls::default();
        controls.rotate(Vec2::new(50.0, 10.0));

        let mut frames = 0;
        while controls.update(&mut camera) {
            frames += 1;
            assert!(frames < 10_000);
        }
        assert!(frames > 1);
        assert!(controls.is_settled());
    }

    #[test]
    fn without_damping_motion_is_applied_at_once() {
        let mut camera = framed_camera();
        let mut controls = OrbitControls {
            enable_damping: false,
            ..OrbitControls::default()
        };
        controls.rotate(Vec2::new(10.0, 0.0));
        assert!(controls.update(&mut camera));
        assert!(controls.is_settled());
    }

    #[test]
    fn dolly_is_clamped() {
        let mut camera = framed_camera();
        let mut controls = OrbitControls::default();
        controls.dolly(1_000.0);
        controls.update(&mut camera);
        assert!((camera.distance() - controls.min_distance).abs() < 1e-3);
    }
}
