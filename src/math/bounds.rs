use glam::{Mat4, Vec3};

use crate::math::mesh::Primitive;

/// Camera offset from the framed centre.
pub const FIT_OFFSET: Vec3 = Vec3::new(200.0, -200.0, 150.0);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb3 {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb3 {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Self::new(first, first), |mut b, p| {
            b.min = b.min.min(p);
            b.max = b.max.max(p);
            b
        }))
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// Box around the eight transformed corners.
    pub fn transformed(&self, transform: Mat4) -> Self {
        let corners = self.corners().map(|c| transform.transform_point3(c));
        let mut out = Self::new(corners[0], corners[0]);
        for c in &corners[1..] {
            out.min = out.min.min(*c);
            out.max = out.max.max(*c);
        }
        out
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraFraming {
    pub target: Vec3,
    pub position: Vec3,
}

/// Frames the camera on the primary primitive.
///
/// `None` when there is nothing to frame, or when the framed box does not fit
/// in `f32`; the caller keeps the camera at its default pose looking at the
/// origin.
pub fn fit_camera(primary: Option<&Primitive>) -> Option<CameraFraming> {
    let bounds = primary?.world_bounds()?;
    let target = bounds.center();
    let position = target + FIT_OFFSET;
    (target.is_finite() && position.is_finite()).then_some(CameraFraming { target, position })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::mesh::LineLoop;

    #[test]
    fn empty_input_has_no_bounds() {
        assert!(Aabb3::from_points(std::iter::empty()).is_none());
        assert!(fit_camera(None).is_none());
        assert!(fit_camera(Some(&Primitive::LineLoop(LineLoop::default()))).is_none());
    }

    #[test]
    fn overflowing_box_is_not_framed() {
        let points = [Vec3::splat(f32::MAX), Vec3::splat(f32::MAX * 0.9)];
        let line = Primitive::LineLoop(LineLoop::from_points(&points));
        assert!(fit_camera(Some(&line)).is_none());
    }

    #[test]
    fn single_point_frames_on_itself() {
        let p = Vec3::new(107.6, -6.9, -3.0);
        let framing = fit_camera(Some(&Primitive::LineLoop(LineLoop::from_points(&[p])))).unwrap();
        assert_eq!(framing.target, p);
        assert_eq!(framing.position, p + FIT_OFFSET);
    }

    #[test]
    fn target_is_box_center_not_mean() {
        let points = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(10.0, 4.0, -2.0),
        ];
        let framing = fit_camera(Some(&Primitive::LineLoop(LineLoop::from_points(&points)))).unwrap();
        assert_eq!(framing.target, Vec3::new(5.0, 2.0, -1.0));
    }

    #[test]
    fn transformed_box_contains_rotated_corners() {
        let b = Aabb3::new(Vec3::ZERO, Vec3::new(2.0, 1.0, 1.0));
        let m = Mat4::from_rotation_z(90f32.to_radians());
        let t = b.transformed(m);
        assert!(t.min.abs_diff_eq(Vec3::new(-1.0, 0.0, 0.0), 1e-5));
        assert!(t.max.abs_diff_eq(Vec3::new(0.0, 2.0, 1.0), 1e-5));
        assert!(t.center().abs_diff_eq(m.transform_point3(b.center()), 1e-5));
    }
}
