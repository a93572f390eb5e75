use earcutr::earcut;
use glam::{Vec2, Vec3};

use crate::math::mesh::TriangleMesh;

/// Extrusion depth used when no lower edge is given.
pub const DEFAULT_EXTRUSION_DEPTH: f32 = 50.0;

/// Sweeps a closed footprint along +Z from 0 to `depth`.
///
/// Caps are ear-clipped; every footprint edge (including the closing one) gets
/// its own flat-shaded quad. Vertices are not shared between faces so each face
/// keeps a flat normal. A footprint the ear clipper rejects still gets its walls.
pub fn extrude_footprint(footprint: &[Vec2], depth: f32) -> TriangleMesh {
    let mut ring: Vec<Vec2> = footprint.to_vec();
    if signed_area(&ring) < 0.0 {
        ring.reverse();
    }

    let coords: Vec<f64> = ring.iter().flat_map(|p| [p.x as f64, p.y as f64]).collect();
    let cap = earcut(&coords, &[], 2).unwrap_or_else(|e| {
        tracing::warn!(error = ?e, points = ring.len(), "footprint cap triangulation failed");
        Vec::new()
    });

    let mut mesh = TriangleMesh::default();
    push_cap(&mut mesh, &ring, &cap, 0.0, Vec3::NEG_Z);
    push_cap(&mut mesh, &ring, &cap, depth, Vec3::Z);

    let n = ring.len();
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        let edge = b - a;
        let outward = Vec3::new(edge.y, -edge.x, 0.0).normalize_or_zero();

        let a0 = mesh.push_vertex(a.extend(0.0), outward);
        let b0 = mesh.push_vertex(b.extend(0.0), outward);
        let b1 = mesh.push_vertex(b.extend(depth), outward);
        let a1 = mesh.push_vertex(a.extend(depth), outward);
        mesh.push_triangle(a0, b0, b1);
        mesh.push_triangle(a0, b1, a1);
    }

    mesh
}

fn push_cap(mesh: &mut TriangleMesh, ring: &[Vec2], cap: &[usize], z: f32, normal: Vec3) {
    let base = mesh.vertex_count() as u32;
    for p in ring {
        mesh.push_vertex(p.extend(z), normal);
    }
    for tri in cap.chunks_exact(3) {
        let (a, b, c) = (tri[0], tri[1], tri[2]);
        let ccw = (ring[b] - ring[a]).perp_dot(ring[c] - ring[a]) >= 0.0;
        // counter-clockwise when seen from the side the normal points to
        let facing_up = normal.z > 0.0;
        let (b, c) = if ccw == facing_up { (b, c) } else { (c, b) };
        mesh.push_triangle(base + a as u32, base + b as u32, base + c as u32);
    }
}

/// Shoelace area; positive for counter-clockwise rings.
fn signed_area(ring: &[Vec2]) -> f32 {
    let n = ring.len();
    (0..n)
        .map(|i| ring[i].perp_dot(ring[(i + 1) % n]))
        .sum::<f32>()
        * 0.5
}
