//! Closed triangle mesh from a sample grid.
//!
//! The grid samples become the vertex buffer as-is, followed by two synthetic
//! poles on the axis:
//!
//! | index            | vertex                              |
//! |------------------|-------------------------------------|
//! | `i * V + j`      | grid sample `(i, j)`                |
//! | `A * V`          | bottom pole `(0, 0, 0)`             |
//! | `A * V + 1`      | top pole `(0, 0, total_length)`     |
//!
//! Faces come out in a fixed order: the side wall column by column (two
//! triangles per quad), then the top fan, then the bottom fan. All faces are
//! wound counter-clockwise seen from outside, so every interior edge is
//! traversed once in each direction.

use nalgebra::Point3;
use tracing::debug;

use crate::grid::SampleGrid;
use crate::types::{Mesh, Vertex};

/// Indices of the bottom and top poles for a grid of the given size.
///
/// The size must pass [`ImplantParams::validate`](crate::ImplantParams::validate)
/// (or come from a [`SampleGrid`]), which keeps `A * V + 2` within `u32`.
#[inline]
pub fn pole_indices(angular_resolution: usize, vertical_resolution: usize) -> (u32, u32) {
    let base = angular_resolution * vertical_resolution;
    debug_assert!(base < u32::MAX as usize);
    (base as u32, base as u32 + 1)
}

/// Number of faces [`triangulate`] emits for a grid of the given size.
#[inline]
pub fn face_count(angular_resolution: usize, vertical_resolution: usize) -> usize {
    2 * angular_resolution * vertical_resolution.saturating_sub(1) + 2 * angular_resolution
}

/// Stitch the grid into a closed mesh.
///
/// Caps are emitted unconditionally, even though the bottom ring collapses to
/// the origin and its fan is therefore made of zero-area facets.
///
/// Index casts are lossless: a [`SampleGrid`] can only be built for grids
/// whose vertex count, poles included, fits in `u32`.
pub fn triangulate(grid: SampleGrid) -> Mesh {
    let angular = grid.angular_resolution();
    let vertical = grid.vertical_resolution();
    let total_length = grid.total_length();

    let mut mesh = Mesh::with_capacity(grid.len() + 2, face_count(angular, vertical));
    mesh.vertices.extend(
        grid.into_samples()
            .into_iter()
            .map(|sample| Vertex::new(sample.position)),
    );

    let (bottom_pole, top_pole) = pole_indices(angular, vertical);
    mesh.vertices.push(Vertex::new(Point3::origin()));
    mesh.vertices.push(Vertex::from_coords(0.0, 0.0, total_length));

    let idx = |i: usize, j: usize| (i * vertical + j) as u32;

    // Side wall
    for i in 0..angular {
        let i_next = (i + 1) % angular;
        for j in 0..vertical.saturating_sub(1) {
            mesh.faces.push([idx(i, j), idx(i_next, j), idx(i, j + 1)]);
            mesh.faces
                .push([idx(i_next, j), idx(i_next, j + 1), idx(i, j + 1)]);
        }
    }

    // Top fan, normal +z
    let top = vertical.saturating_sub(1);
    for i in 0..angular {
        let i_next = (i + 1) % angular;
        mesh.faces.push([top_pole, idx(i, top), idx(i_next, top)]);
    }

    // Bottom fan, normal -z
    for i in 0..angular {
        let i_next = (i + 1) % angular;
        mesh.faces.push([bottom_pole, idx(i_next, 0), idx(i, 0)]);
    }

    debug!(
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        "Triangulated implant surface"
    );

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ImplantParams;
    use hashbrown::HashMap;

    fn mesh_for(angular: usize, vertical: usize) -> Mesh {
        let params = ImplantParams::default().with_resolution(angular, vertical);
        triangulate(SampleGrid::sample(&params).unwrap())
    }

    #[test]
    fn test_counts() {
        let mesh = mesh_for(8, 10);
        assert_eq!(mesh.vertex_count(), 8 * 10 + 2);
        assert_eq!(mesh.face_count(), 2 * 8 * 9 + 2 * 8);
        assert_eq!(mesh.face_count(), face_count(8, 10));
    }

    #[test]
    fn test_pole_positions() {
        let mesh = mesh_for(6, 5);
        let (bottom, top) = pole_indices(6, 5);
        assert_eq!(mesh.vertices[bottom as usize].position, Point3::origin());
        assert_eq!(
            mesh.vertices[top as usize].position,
            Point3::new(0.0, 0.0, 13.0)
        );
    }

    #[test]
    fn test_every_directed_edge_once() {
        let mesh = mesh_for(12, 20);
        let mut directed: HashMap<(u32, u32), usize> = HashMap::new();
        for face in &mesh.faces {
            for k in 0..3 {
                *directed.entry((face[k], face[(k + 1) % 3])).or_insert(0) += 1;
            }
        }
        for (&(a, b), &count) in &directed {
            assert_eq!(count, 1, "directed edge {}->{} used {} times", a, b, count);
            assert!(
                directed.contains_key(&(b, a)),
                "edge {}->{} has no opposite",
                a,
                b
            );
        }
    }

    #[test]
    fn test_each_pole_in_one_fan() {
        let mesh = mesh_for(9, 7);
        let (bottom, top) = pole_indices(9, 7);
        let bottom_uses = mesh.faces.iter().filter(|f| f.contains(&bottom)).count();
        let top_uses = mesh.faces.iter().filter(|f| f.contains(&top)).count();
        assert_eq!(bottom_uses, 9);
        assert_eq!(top_uses, 9);
    }

    #[test]
    fn test_side_wall_normals_point_outward() {
        let mesh = mesh_for(24, 60);
        let side_faces = 2 * 24 * 59;
        for (face_idx, tri) in mesh.triangles().take(side_faces).enumerate() {
            let Some(normal) = tri.normal() else {
                continue;
            };
            let c = tri.centroid();
            let radial = nalgebra::Vector3::new(c.x, c.y, 0.0);
            assert!(
                normal.dot(&radial) > 0.0,
                "face {} normal {:?} points inward",
                face_idx,
                normal
            );
        }
    }

    #[test]
    fn test_cap_normals() {
        let mesh = mesh_for(10, 8);
        let side_faces = 2 * 10 * 7;
        let triangles: Vec<_> = mesh.triangles().collect();

        for tri in &triangles[side_faces..side_faces + 10] {
            let n = tri.normal().unwrap();
            assert!(n.z > 0.99);
        }
        // Bottom fan sits on a collapsed ring
        for tri in &triangles[side_faces + 10..] {
            assert!(tri.is_degenerate(1e-12));
        }
    }

    #[test]
    fn test_positive_volume() {
        let mesh = mesh_for(32, 80);
        assert!(mesh.signed_volume() > 0.0);
        // Between a 1.75 mm and 2.4 mm cylinder of the same length
        let v = mesh.volume();
        assert!(v > std::f64::consts::PI * 1.75 * 1.75 * 9.0);
        assert!(v < std::f64::consts::PI * 2.4 * 2.4 * 13.0);
    }
}
