//! Optional clean-up passes for generated meshes.
//!
//! The raw triangulation keeps the bottom ring even though every sample on it
//! sits at the origin, which leaves a ring of zero-area facets around the apex.
//! [`weld_apex`] folds that ring into the bottom pole and drops the facets
//! that lost an edge; the mesh stays closed.

use hashbrown::{HashMap, HashSet};
use nalgebra::Point3;
use tracing::{debug, info};

use crate::types::Mesh;

/// Default distance under which vertices are considered coincident.
pub const DEFAULT_WELD_EPSILON: f64 = 1e-9;

/// Weld vertices that are within `epsilon` distance of each other.
///
/// Each cluster is merged into its smallest index. Faces that end up with a
/// repeated index are removed. Returns the number of vertices merged; the
/// merged vertices stay in the buffer until
/// [`remove_unreferenced_vertices`] compacts it.
pub fn weld_vertices(mesh: &mut Mesh, epsilon: f64) -> usize {
    let original_count = mesh.vertices.len();
    if original_count == 0 || !epsilon.is_finite() || epsilon <= 0.0 {
        return 0;
    }

    let cell_size = epsilon * 2.0;

    let mut spatial_hash: HashMap<(i64, i64, i64), Vec<u32>> = HashMap::new();
    for (idx, vertex) in mesh.vertices.iter().enumerate() {
        let cell = pos_to_cell(&vertex.position, cell_size);
        spatial_hash.entry(cell).or_default().push(idx as u32);
    }

    let mut vertex_remap: Vec<u32> = (0..original_count as u32).collect();
    let mut merged_count = 0;

    for (idx, vertex) in mesh.vertices.iter().enumerate() {
        let idx = idx as u32;
        if vertex_remap[idx as usize] != idx {
            continue;
        }

        let (cx, cy, cz) = pos_to_cell(&vertex.position, cell_size);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(candidates) = spatial_hash.get(&(cx + dx, cy + dy, cz + dz)) else {
                        continue;
                    };
                    for &other in candidates {
                        if other <= idx || vertex_remap[other as usize] != other {
                            continue;
                        }
                        let other_pos = &mesh.vertices[other as usize].position;
                        if (vertex.position - other_pos).norm() < epsilon {
                            vertex_remap[other as usize] = idx;
                            merged_count += 1;
                        }
                    }
                }
            }
        }
    }

    if merged_count == 0 {
        return 0;
    }

    let dropped = remap_faces(mesh, &vertex_remap);
    info!(
        "Welded {} vertices (epsilon = {:.1e}), dropped {} collapsed faces",
        merged_count, epsilon, dropped
    );

    merged_count
}

/// Rewrite face indices through `remap` and drop faces that repeat an index.
///
/// Returns the number of faces dropped.
fn remap_faces(mesh: &mut Mesh, remap: &[u32]) -> usize {
    for face in &mut mesh.faces {
        for index in face.iter_mut() {
            *index = remap[*index as usize];
        }
    }
    let face_count = mesh.faces.len();
    mesh.faces
        .retain(|&[i0, i1, i2]| i0 != i1 && i1 != i2 && i0 != i2);
    face_count - mesh.faces.len()
}

/// Remove unreferenced vertices and compact the vertex array.
///
/// Keeps the relative order of the surviving vertices. Returns the number of
/// vertices removed.
pub fn remove_unreferenced_vertices(mesh: &mut Mesh) -> usize {
    let original_count = mesh.vertices.len();

    let referenced: HashSet<u32> = mesh.faces.iter().flatten().copied().collect();
    if referenced.len() == original_count {
        return 0;
    }

    let mut remap: HashMap<u32, u32> = HashMap::with_capacity(referenced.len());
    let mut new_vertices = Vec::with_capacity(referenced.len());
    for (old_idx, vertex) in mesh.vertices.iter().enumerate() {
        if referenced.contains(&(old_idx as u32)) {
            remap.insert(old_idx as u32, new_vertices.len() as u32);
            new_vertices.push(*vertex);
        }
    }

    for face in &mut mesh.faces {
        for index in face.iter_mut() {
            *index = remap[&*index];
        }
    }

    let removed = original_count - new_vertices.len();
    mesh.vertices = new_vertices;

    debug!("Removed {} unreferenced vertices", removed);
    removed
}

/// Fold every vertex closer than `epsilon` to the `pole` vertex into it, then
/// compact the mesh.
///
/// Only the pole's neighbourhood is touched; the rest of the surface keeps its
/// vertices whatever their spacing. Callers pick `epsilon` below the ring
/// spacing so that only the collapsed bottom ring qualifies. A non-finite or
/// non-positive `epsilon`, or a pole out of range, leaves the mesh unchanged.
///
/// Returns `(vertices_merged, vertices_removed)`.
pub fn weld_apex(mesh: &mut Mesh, pole: u32, epsilon: f64) -> (usize, usize) {
    let Some(apex) = mesh.vertices.get(pole as usize).map(|v| v.position) else {
        return (0, 0);
    };
    if !epsilon.is_finite() || epsilon <= 0.0 {
        return (0, 0);
    }

    let mut merged = 0;
    let remap: Vec<u32> = mesh
        .vertices
        .iter()
        .enumerate()
        .map(|(idx, vertex)| {
            let idx = idx as u32;
            if idx != pole && (vertex.position - apex).norm() < epsilon {
                merged += 1;
                pole
            } else {
                idx
            }
        })
        .collect();

    if merged == 0 {
        return (0, 0);
    }

    let dropped = remap_faces(mesh, &remap);
    debug!(merged, dropped, "Folded apex ring into the pole");

    let removed = remove_unreferenced_vertices(mesh);
    (merged, removed)
}

fn pos_to_cell(pos: &Point3<f64>, cell_size: f64) -> (i64, i64, i64) {
    (
        (pos.x / cell_size).floor() as i64,
        (pos.y / cell_size).floor() as i64,
        (pos.z / cell_size).floor() as i64,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::SampleGrid;
    use crate::params::ImplantParams;
    use crate::triangulate::{pole_indices, triangulate};
    use crate::types::Vertex;

    fn raw_implant(angular: usize, vertical: usize) -> Mesh {
        let params = ImplantParams::default().with_resolution(angular, vertical);
        triangulate(SampleGrid::sample(&params).unwrap())
    }

    #[test]
    fn test_weld_merges_duplicates() {
        let mut mesh = Mesh::new();
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(0.0, 1.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(1.0, 1.0, 0.0));
        mesh.faces.push([0, 1, 2]);
        mesh.faces.push([3, 4, 2]);

        assert_eq!(weld_vertices(&mut mesh, 1e-6), 1);
        assert_eq!(mesh.faces[1], [1, 4, 2]);
        assert_eq!(remove_unreferenced_vertices(&mut mesh), 1);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.faces[1], [1, 3, 2]);
    }

    #[test]
    fn test_weld_ignores_displaced_vertex() {
        let mut mesh = raw_implant(8, 6);
        // Only the bottom ring and pole coincide
        let before = mesh.clone();
        mesh.vertices[0].position.x += 1.0;
        let merged = weld_vertices(&mut mesh, 1e-9);
        assert_eq!(merged, 8 - 1);
        assert_ne!(mesh.faces, before.faces);
    }

    #[test]
    fn test_weld_apex_collapses_bottom_ring() {
        let angular = 12;
        let vertical = 20;
        let mut mesh = raw_implant(angular, vertical);
        let (pole, _) = pole_indices(angular, vertical);
        let (merged, removed) = weld_apex(&mut mesh, pole, DEFAULT_WELD_EPSILON);

        // Bottom ring (A vertices) plus the bottom pole fold into one vertex
        assert_eq!(merged, angular);
        assert_eq!(removed, angular);
        assert_eq!(mesh.vertex_count(), angular * vertical + 2 - angular);

        // Lower triangles of the first band and the bottom fan are gone
        let expected_faces = 2 * angular * (vertical - 1) + 2 * angular - 2 * angular;
        assert_eq!(mesh.face_count(), expected_faces);

        for tri in mesh.triangles() {
            assert!(!tri.is_degenerate(1e-12));
        }
    }

    #[test]
    fn test_weld_apex_keeps_mesh_closed() {
        let mut mesh = raw_implant(10, 15);
        let (pole, _) = pole_indices(10, 15);
        weld_apex(&mut mesh, pole, DEFAULT_WELD_EPSILON);

        let mut edges: HashMap<(u32, u32), usize> = HashMap::new();
        for face in &mesh.faces {
            for k in 0..3 {
                let a = face[k];
                let b = face[(k + 1) % 3];
                *edges.entry((a.min(b), a.max(b))).or_insert(0) += 1;
            }
        }
        assert!(edges.values().all(|&count| count == 2));
    }

    #[test]
    fn test_weld_apex_leaves_shaft_rings_alone() {
        // Shaft rings sit 0.1 mm apart, so a general weld at this distance
        // would fold them together; the apex weld only looks at the pole.
        let angular = 8;
        let vertical = 131;
        let mut mesh = raw_implant(angular, vertical);
        let (pole, _) = pole_indices(angular, vertical);
        let (merged, _) = weld_apex(&mut mesh, pole, 0.09);

        assert_eq!(merged, angular);
        assert_eq!(
            mesh.face_count(),
            2 * angular * (vertical - 1) + 2 * angular - 2 * angular
        );
    }

    #[test]
    fn test_weld_apex_ignores_bad_epsilon() {
        let mut mesh = raw_implant(6, 10);
        let before = mesh.clone();
        let (pole, _) = pole_indices(6, 10);

        assert_eq!(weld_apex(&mut mesh, pole, f64::INFINITY), (0, 0));
        assert_eq!(weld_apex(&mut mesh, pole, f64::NAN), (0, 0));
        assert_eq!(weld_apex(&mut mesh, pole, 0.0), (0, 0));
        assert_eq!(weld_apex(&mut mesh, u32::MAX, 1e-9), (0, 0));
        assert_eq!(weld_vertices(&mut mesh, f64::INFINITY), 0);
        assert_eq!(mesh, before);
    }

    #[test]
    fn test_remove_unreferenced_noop() {
        let mut mesh = raw_implant(6, 4);
        assert_eq!(remove_unreferenced_vertices(&mut mesh), 0);
    }
}
