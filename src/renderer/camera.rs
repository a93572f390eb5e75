use glam::{Mat4, Vec3};

/// Pose before any framing is applied.
pub const DEFAULT_POSITION: Vec3 = Vec3::new(0.0, -200.0, 150.0);

/// Perspective camera orbiting `target`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,

    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: DEFAULT_POSITION,
            target: Vec3::ZERO,
            up: Vec3::Y,

            fov: 45.0_f32.to_radians(),
            aspect: 600.0 / 400.0,
            near: 0.1,
            far: 10000.0,
        }
    }
}

impl Camera {
    pub fn with_aspect(aspect: f32) -> Self {
        Self {
            aspect,
            ..Self::default()
        }
    }

    pub fn look_at(&mut self, position: Vec3, target: Vec3) {
        self.position = position;
        self.target = target;
    }

    pub fn distance(&self) -> f32 {
        self.position.distance(self.target)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn set_aspect(&mut self, width: f32, height: f32) {
        self.aspect = width / height;
    }
}
