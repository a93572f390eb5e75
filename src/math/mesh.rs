use glam::{Mat4, Vec2, Vec3};

use crate::math::bounds::Aabb3;

/// Flat vertex/normal arrays (xyz per vertex) plus a triangle index list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TriangleMesh {
    pub vertices: Vec<f32>,
    pub normals: Vec<f32>,
    pub indices: Vec<u32>,
}

impl TriangleMesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn push_vertex(&mut self, position: Vec3, normal: Vec3) -> u32 {
        let index = self.vertex_count() as u32;
        self.vertices.extend_from_slice(&position.to_array());
        self.normals.extend_from_slice(&normal.to_array());
        index
    }

    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    pub fn positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.vertices.chunks_exact(3).map(Vec3::from_slice)
    }

    pub fn normal_vectors(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.normals.chunks_exact(3).map(Vec3::from_slice)
    }

    /// Copy with `transform` baked into positions and normals.
    pub fn transformed(&self, transform: Mat4) -> TriangleMesh {
        let mut out = TriangleMesh {
            vertices: Vec::with_capacity(self.vertices.len()),
            normals: Vec::with_capacity(self.normals.len()),
            indices: self.indices.clone(),
        };
        for (p, n) in self.positions().zip(self.normal_vectors()) {
            out.push_vertex(
                transform.transform_point3(p),
                transform.transform_vector3(n).normalize_or_zero(),
            );
        }
        out
    }
}

/// Closed polyline. The closing segment back to the first point is implied.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LineLoop {
    pub vertices: Vec<f32>,
}

impl LineLoop {
    pub fn from_points(points: &[Vec3]) -> Self {
        Self {
            vertices: points.iter().flat_map(|p| p.to_array()).collect(),
        }
    }

    pub fn point_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.vertices.chunks_exact(3).map(Vec3::from_slice)
    }

    /// Vertices for a line-strip draw, first point repeated at the end.
    pub fn closed_strip(&self) -> Vec<Vec3> {
        let mut strip: Vec<Vec3> = self.positions().collect();
        if let Some(first) = strip.first().copied() {
            strip.push(first);
        }
        strip
    }
}

/// A footprint swept along local +Z, oriented by `transform`.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtrudedSolid {
    /// Footprint in input order, one vertex per upper-edge point.
    pub footprint: Vec<Vec2>,
    pub depth: f32,
    /// Mesh in local (pre-rotation) space.
    pub mesh: TriangleMesh,
    pub transform: Mat4,
}

impl ExtrudedSolid {
    pub fn world_mesh(&self) -> TriangleMesh {
        self.mesh.transformed(self.transform)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
    Solid(ExtrudedSolid),
    LineLoop(LineLoop),
}

impl Primitive {
    pub fn transform(&self) -> Mat4 {
        match self {
            Primitive::Solid(solid) => solid.transform,
            Primitive::LineLoop(_) => Mat4::IDENTITY,
        }
    }

    pub fn local_bounds(&self) -> Option<Aabb3> {
        match self {
            Primitive::Solid(solid) => Aabb3::from_points(solid.mesh.positions()),
            Primitive::LineLoop(line) => Aabb3::from_points(line.positions()),
        }
    }

    /// Bounds of the local box after the world transform, re-boxed.
    pub fn world_bounds(&self) -> Option<Aabb3> {
        self.local_bounds().map(|b| b.transformed(self.transform()))
    }

    pub fn is_solid(&self) -> bool {
        matches!(self, Primitive::Solid(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_strip_repeats_first_point() {
        let line = LineLoop::from_points(&[Vec3::X, Vec3::Y, Vec3::Z]);
        assert_eq!(line.point_count(), 3);
        assert_eq!(line.closed_strip(), vec![Vec3::X, Vec3::Y, Vec3::Z, Vec3::X]);
    }

    #[test]
    fn empty_loop_has_empty_strip() {
        assert!(LineLoop::from_points(&[]).closed_strip().is_empty());
    }

    #[test]
    fn transformed_mesh_rotates_normals() {
        let mut mesh = TriangleMesh::default();
        mesh.push_vertex(Vec3::new(1.0, 0.0, 0.0), Vec3::Z);
        let turned = mesh.transformed(Mat4::from_rotation_x(-90f32.to_radians()));
        let p = turned.positions().next().unwrap();
        let n = turned.normal_vectors().next().unwrap();
        assert!(p.abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), 1e-6));
        assert!(n.abs_diff_eq(Vec3::Y, 1e-6));
    }
}
