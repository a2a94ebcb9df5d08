//! Mesh validation and reporting.
//!
//! [`validate_mesh`] checks the topological guarantees the triangulator makes
//! (closed, manifold, consistently wound, outward facing) and gathers the
//! measurements printed after generation. [`validate_mesh_data`] catches
//! numerical faults (NaN, infinity, dangling indices) before export.

use hashbrown::HashMap;
use nalgebra::{Point3, Vector3};
use tracing::{debug, info, warn};

use crate::error::{ImplantError, ImplantResult, ValidationIssue};
use crate::types::Mesh;

/// Area under which a face counts as degenerate.
pub const DEGENERATE_AREA: f64 = 1e-12;

/// What [`validate_mesh`] found.
///
/// Topology counts come first, then measurements in millimeters.
#[derive(Debug, Clone)]
pub struct MeshReport {
    /// No edge is used by a single face.
    pub is_watertight: bool,
    /// No edge is used by more than two faces.
    pub is_manifold: bool,
    /// Edges with one incident face.
    pub boundary_edge_count: usize,
    /// Edges with three or more incident faces.
    pub non_manifold_edge_count: usize,
    /// Directed edges used twice, i.e. neighbours wound against each other.
    pub inconsistent_edge_count: usize,
    /// Faces with area below [`DEGENERATE_AREA`].
    pub degenerate_face_count: usize,
    /// Non-degenerate faces whose normal points towards the Z axis.
    pub inward_face_count: usize,
    pub vertex_count: usize,
    pub face_count: usize,
    /// Axis-aligned box, `None` for an empty mesh.
    pub bounds: Option<(Point3<f64>, Point3<f64>)>,
    /// Box extents along x, y, z.
    pub dimensions: Option<(f64, f64, f64)>,
    /// Positive when faces wind outward. Only meaningful when watertight.
    pub signed_volume: f64,
    pub volume: f64,
    pub surface_area: f64,
    /// Negative signed volume.
    pub is_inside_out: bool,
    /// Groups of faces connected through shared vertices.
    pub component_count: usize,
}

impl MeshReport {
    /// Check if mesh passes basic validity checks.
    pub fn is_valid(&self) -> bool {
        self.vertex_count > 0 && self.face_count > 0
    }

    /// Whether every edge pairs with an edge of opposite direction.
    pub fn is_consistently_wound(&self) -> bool {
        self.inconsistent_edge_count == 0
    }

    /// Check if mesh is suitable for 3D printing.
    ///
    /// A printable mesh must be:
    /// - Non-empty
    /// - Watertight (no boundary edges)
    /// - Manifold (no edge shared by more than 2 faces)
    /// - Consistently wound and not inside-out
    pub fn is_printable(&self) -> bool {
        self.is_valid()
            && self.is_watertight
            && self.is_manifold
            && self.is_consistently_wound()
            && !self.is_inside_out
    }

    /// Short status used in generation summaries.
    pub fn status(&self) -> &'static str {
        if !self.is_valid() {
            "empty"
        } else if self.is_printable() {
            "closed"
        } else if !self.is_watertight {
            "open"
        } else {
            "defective"
        }
    }
}

impl std::fmt::Display for MeshReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let flag = |ok: bool| if ok { "yes" } else { "NO" };

        writeln!(f, "Implant mesh ({}):", self.status())?;
        writeln!(
            f,
            "  Vertices: {}  Faces: {}  Components: {}",
            self.vertex_count, self.face_count, self.component_count
        )?;
        if let (Some((min, max)), Some((dx, dy, dz))) = (&self.bounds, &self.dimensions) {
            writeln!(
                f,
                "  Extent: {:.3} x {:.3} x {:.3} mm from ({:.3}, {:.3}, {:.3})",
                dx, dy, dz, min.x, min.y, min.z
            )?;
            writeln!(f, "  Top: ({:.3}, {:.3}, {:.3})", max.x, max.y, max.z)?;
        }
        writeln!(
            f,
            "  Volume: {:.3} mm3 (signed {:.3})  Area: {:.3} mm2",
            self.volume, self.signed_volume, self.surface_area
        )?;
        writeln!(
            f,
            "  Watertight: {} ({} open edges)  Manifold: {} ({} shared by 3+)",
            flag(self.is_watertight),
            self.boundary_edge_count,
            flag(self.is_manifold),
            self.non_manifold_edge_count
        )?;
        writeln!(
            f,
            "  Winding: {} ({} clashing edges, {} inward faces{})",
            if self.is_consistently_wound() {
                "consistent"
            } else {
                "MIXED"
            },
            self.inconsistent_edge_count,
            self.inward_face_count,
            if self.is_inside_out { ", INSIDE-OUT" } else { "" }
        )?;
        writeln!(f, "  Zero-area faces: {}", self.degenerate_face_count)?;
        write!(f, "  Printable: {}", flag(self.is_printable()))
    }
}

/// Undirected and directed edge usage of a face list.
struct EdgeCounts {
    undirected: HashMap<(u32, u32), usize>,
    directed: HashMap<(u32, u32), usize>,
}

impl EdgeCounts {
    fn build(faces: &[[u32; 3]]) -> Self {
        let mut undirected = HashMap::with_capacity(faces.len() * 3 / 2);
        let mut directed = HashMap::with_capacity(faces.len() * 3);
        for face in faces {
            for k in 0..3 {
                let a = face[k];
                let b = face[(k + 1) % 3];
                *undirected.entry((a.min(b), a.max(b))).or_insert(0) += 1;
                *directed.entry((a, b)).or_insert(0) += 1;
            }
        }
        Self {
            undirected,
            directed,
        }
    }

    fn boundary_edge_count(&self) -> usize {
        self.undirected.values().filter(|&&n| n == 1).count()
    }

    fn non_manifold_edge_count(&self) -> usize {
        self.undirected.values().filter(|&&n| n > 2).count()
    }

    fn inconsistent_edge_count(&self) -> usize {
        self.directed.values().filter(|&&n| n > 1).count()
    }
}

/// Count connected components over face adjacency (union-find on vertices).
fn count_components(mesh: &Mesh) -> usize {
    fn find(parent: &mut [u32], mut x: u32) -> u32 {
        while parent[x as usize] != x {
            parent[x as usize] = parent[parent[x as usize] as usize];
            x = parent[x as usize];
        }
        x
    }

    let vertex_count = mesh.vertices.len();
    let mut parent: Vec<u32> = (0..vertex_count as u32).collect();
    let mut used = vec![false; vertex_count];

    for face in &mesh.faces {
        if face.iter().any(|&v| v as usize >= vertex_count) {
            continue;
        }
        for &v in face {
            used[v as usize] = true;
        }
        let root = find(&mut parent, face[0]);
        for &v in &face[1..] {
            let other = find(&mut parent, v);
            if other != root {
                parent[other as usize] = root;
            }
        }
    }

    (0..vertex_count as u32)
        .filter(|&v| used[v as usize] && find(&mut parent, v) == v)
        .count()
}

/// Count non-degenerate faces whose normal points towards the Z axis.
///
/// Faces whose centroid lies on the axis (cap fans collapsing to a point) are
/// skipped, as are faces whose normal is parallel to the axis.
fn count_inward_faces(mesh: &Mesh) -> usize {
    mesh.triangles()
        .filter(|tri| !tri.is_degenerate(DEGENERATE_AREA))
        .filter(|tri| {
            let Some(normal) = tri.normal() else {
                return false;
            };
            let c = tri.centroid();
            let radial = Vector3::new(c.x, c.y, 0.0);
            let distance = radial.norm();
            distance > 1e-9 && normal.dot(&radial) / distance < -1e-9
        })
        .count()
}

/// Validate a mesh and return a report.
///
/// The inward-face check assumes the implant axis is +Z, so run it before
/// applying a placement.
pub fn validate_mesh(mesh: &Mesh) -> MeshReport {
    let edges = EdgeCounts::build(&mesh.faces);

    let boundary_edge_count = edges.boundary_edge_count();
    let non_manifold_edge_count = edges.non_manifold_edge_count();
    let inconsistent_edge_count = edges.inconsistent_edge_count();

    let bounds = mesh.bounds();
    let signed_volume = mesh.signed_volume();
    let degenerate_face_count = mesh
        .triangles()
        .filter(|tri| tri.is_degenerate(DEGENERATE_AREA))
        .count();

    let report = MeshReport {
        is_watertight: boundary_edge_count == 0,
        is_manifold: non_manifold_edge_count == 0,
        boundary_edge_count,
        non_manifold_edge_count,
        inconsistent_edge_count,
        degenerate_face_count,
        inward_face_count: count_inward_faces(mesh),
        vertex_count: mesh.vertex_count(),
        face_count: mesh.face_count(),
        dimensions: bounds.map(|(lo, hi)| {
            let extent = hi - lo;
            (extent.x, extent.y, extent.z)
        }),
        bounds,
        signed_volume,
        volume: signed_volume.abs(),
        surface_area: mesh.surface_area(),
        is_inside_out: signed_volume < 0.0,
        component_count: count_components(mesh),
    };

    if boundary_edge_count > 0 {
        warn!(boundary_edge_count, "Implant surface has open edges");
    }
    if non_manifold_edge_count > 0 {
        warn!(non_manifold_edge_count, "Implant surface has edges shared by 3+ faces");
    }
    if inconsistent_edge_count > 0 {
        warn!(inconsistent_edge_count, "Neighbouring faces are wound against each other");
    }
    if report.inward_face_count > 0 {
        warn!(inward_faces = report.inward_face_count, "Side-wall faces point towards the axis");
    }
    if report.is_inside_out && report.is_watertight {
        warn!(signed_volume, "Implant is inside-out");
    }

    debug!("{}", report);

    report
}

/// Log a summary of mesh validation.
pub fn log_validation(report: &MeshReport) {
    if report.is_printable() {
        info!(
            faces = report.face_count,
            degenerate = report.degenerate_face_count,
            "Mesh is closed and consistently wound"
        );
    } else {
        warn!(
            boundary_edges = report.boundary_edge_count,
            non_manifold_edges = report.non_manifold_edge_count,
            inconsistent_edges = report.inconsistent_edge_count,
            "Mesh failed validation"
        );
    }
}

/// How [`validate_mesh_data`] reacts to bad data.
#[derive(Debug, Clone)]
pub struct ValidationOptions {
    /// Stop with an error at the first issue. Default `true`.
    pub reject_on_invalid: bool,
    /// Stop collecting after this many issues. Default 100.
    pub max_issues: usize,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            reject_on_invalid: true,
            max_issues: 100,
        }
    }
}

impl ValidationOptions {
    /// Record everything, never fail.
    pub fn collect_all() -> Self {
        Self {
            reject_on_invalid: false,
            max_issues: 1000,
        }
    }
}

/// Issues gathered in collecting mode.
#[derive(Debug, Clone, Default)]
pub struct DataValidationResult {
    pub issues: Vec<ValidationIssue>,
    pub invalid_index_count: usize,
    pub nan_count: usize,
    pub infinity_count: usize,
}

impl DataValidationResult {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn issue_count(&self) -> usize {
        self.issues.len()
    }
}

impl std::fmt::Display for DataValidationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_valid() {
            return write!(f, "mesh data is clean");
        }
        write!(
            f,
            "{} data issue(s): {} dangling face indices, {} NaN and {} infinite coordinates",
            self.issue_count(),
            self.invalid_index_count,
            self.nan_count,
            self.infinity_count
        )
    }
}

/// Check a mesh for dangling face indices and non-finite coordinates.
///
/// Returns `Err` on the first issue when `options.reject_on_invalid` is set,
/// otherwise collects up to `options.max_issues` issues.
pub fn validate_mesh_data(
    mesh: &Mesh,
    options: &ValidationOptions,
) -> ImplantResult<DataValidationResult> {
    let mut result = DataValidationResult::default();
    let vertex_count = mesh.vertices.len();

    'vertices: for (vertex_index, vertex) in mesh.vertices.iter().enumerate() {
        let p = vertex.position;
        for (coordinate, value) in [("x", p.x), ("y", p.y), ("z", p.z)] {
            if value.is_finite() {
                continue;
            }
            if options.reject_on_invalid {
                return Err(ImplantError::InvalidCoordinate {
                    vertex_index,
                    coordinate,
                    value,
                });
            }
            if value.is_nan() {
                result.nan_count += 1;
                result.issues.push(ValidationIssue::NaNCoordinate {
                    vertex_index,
                    coordinate,
                });
            } else {
                result.infinity_count += 1;
                result.issues.push(ValidationIssue::InfiniteCoordinate {
                    vertex_index,
                    coordinate,
                    value,
                });
            }
            if result.issues.len() >= options.max_issues {
                break 'vertices;
            }
        }
    }

    'faces: for (face_index, face) in mesh.faces.iter().enumerate() {
        if result.issues.len() >= options.max_issues {
            break;
        }
        for &vertex_index in face {
            if (vertex_index as usize) < vertex_count {
                continue;
            }
            if options.reject_on_invalid {
                return Err(ImplantError::InvalidVertexIndex {
                    face_index,
                    vertex_index,
                    vertex_count,
                });
            }
            result.invalid_index_count += 1;
            result.issues.push(ValidationIssue::InvalidVertexIndex {
                face_index,
                vertex_index,
                vertex_count,
            });
            if result.issues.len() >= options.max_issues {
                break 'faces;
            }
        }
    }

    if result.is_valid() {
        debug!(vertices = vertex_count, "Mesh data is clean");
    } else {
        warn!("{}", result);
    }

    Ok(result)
}

/// Validate mesh data, rejecting on the first issue.
pub fn validate_mesh_data_strict(mesh: &Mesh) -> ImplantResult<()> {
    validate_mesh_data(mesh, &ValidationOptions::default())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::SampleGrid;
    use crate::params::ImplantParams;
    use crate::triangulate::triangulate;
    use crate::types::Vertex;

    fn tetrahedron() -> Mesh {
        let mut mesh = Mesh::new();
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(1.0, 0.0, 0.0));
        mesh.vertices.push(Vertex::from_coords(0.5, 0.866025, 0.0));
        mesh.vertices
            .push(Vertex::from_coords(0.5, 0.288675, 0.816497));

        mesh.faces.push([0, 2, 1]);
        mesh.faces.push([0, 1, 3]);
        mesh.faces.push([1, 2, 3]);
        mesh.faces.push([2, 0, 3]);
        mesh
    }

    fn implant() -> Mesh {
        let params = ImplantParams::default().with_resolution(20, 50);
        triangulate(SampleGrid::sample(&params).unwrap())
    }

    #[test]
    fn test_validate_implant() {
        let report = validate_mesh(&implant());

        assert!(report.is_valid());
        assert!(report.is_watertight);
        assert!(report.is_manifold);
        assert!(report.is_consistently_wound());
        assert!(report.is_printable());
        assert_eq!(report.inward_face_count, 0);
        assert_eq!(report.component_count, 1);
        assert_eq!(report.status(), "closed");
        // Bottom fan plus the lower triangles of the first band
        assert_eq!(report.degenerate_face_count, 2 * 20);
    }

    #[test]
    fn test_validate_open_mesh() {
        let mut mesh = tetrahedron();
        mesh.faces.pop();
        let report = validate_mesh(&mesh);

        assert!(!report.is_watertight);
        assert!(report.is_manifold);
        assert_eq!(report.boundary_edge_count, 3);
        assert_eq!(report.status(), "open");
    }

    #[test]
    fn test_detects_flipped_face() {
        let mut mesh = implant();
        let face = &mut mesh.faces[100];
        face.swap(1, 2);

        let report = validate_mesh(&mesh);
        assert!(report.is_watertight);
        assert_eq!(report.inconsistent_edge_count, 3);
        assert_eq!(report.inward_face_count, 1);
        assert!(!report.is_printable());
        assert_eq!(report.status(), "defective");
    }

    #[test]
    fn test_detects_inside_out() {
        let mut mesh = tetrahedron();
        for face in &mut mesh.faces {
            face.swap(1, 2);
        }
        let report = validate_mesh(&mesh);
        assert!(report.is_watertight);
        assert!(report.is_consistently_wound());
        assert!(report.is_inside_out);
        assert!(!report.is_printable());
    }

    #[test]
    fn test_report_display() {
        let report = validate_mesh(&tetrahedron());
        let output = format!("{}", report);

        assert!(output.starts_with("Implant mesh (closed):"));
        assert!(output.contains("Vertices: 4  Faces: 4"));
        assert!(output.contains("Watertight: yes (0 open edges)"));
        assert!(output.contains("Winding: consistent"));
        assert!(output.contains("Printable: yes"));
    }

    #[test]
    fn test_empty_mesh_is_not_printable() {
        let report = validate_mesh(&Mesh::new());
        assert!(!report.is_valid());
        assert!(report.is_watertight);
        assert!(!report.is_printable());
        assert_eq!(report.status(), "empty");

        // Vertices without faces are just as unusable
        let mut mesh = Mesh::new();
        mesh.vertices.push(Vertex::from_coords(0.0, 0.0, 0.0));
        assert_eq!(validate_mesh(&mesh).status(), "empty");
    }

    #[test]
    fn test_component_count() {
        let mut mesh = tetrahedron();
        let offset = mesh.vertex_count() as u32;
        let copy = tetrahedron();
        mesh.vertices.extend(copy.vertices);
        mesh.faces
            .extend(copy.faces.iter().map(|f| f.map(|v| v + offset)));

        assert_eq!(validate_mesh(&mesh).component_count, 2);
    }

    #[test]
    fn test_data_validation_passes() {
        let result = validate_mesh_data(&implant(), &ValidationOptions::default()).unwrap();
        assert!(result.is_valid());
    }

    #[test]
    fn test_data_validation_rejects_nan() {
        let mut mesh = tetrahedron();
        mesh.vertices[2].position.y = f64::NAN;

        let err = validate_mesh_data_strict(&mesh).unwrap_err();
        assert!(matches!(
            err,
            ImplantError::InvalidCoordinate {
                vertex_index: 2,
                coordinate: "y",
                ..
            }
        ));
    }

    #[test]
    fn test_data_validation_collects_issues() {
        let mut mesh = tetrahedron();
        mesh.vertices[0].position.x = f64::INFINITY;
        mesh.vertices[1].position.z = f64::NAN;
        mesh.faces.push([0, 1, 9]);

        let result = validate_mesh_data(&mesh, &ValidationOptions::collect_all()).unwrap();
        assert_eq!(result.issue_count(), 3);
        assert_eq!(result.infinity_count, 1);
        assert_eq!(result.nan_count, 1);
        assert_eq!(result.invalid_index_count, 1);
        assert!(result.to_string().contains("1 dangling face indices"));
    }

    #[test]
    fn test_data_validation_max_issues() {
        let mut mesh = tetrahedron();
        for v in &mut mesh.vertices {
            v.position.x = f64::NAN;
        }
        let options = ValidationOptions {
            reject_on_invalid: false,
            max_issues: 2,
        };
        let result = validate_mesh_data(&mesh, &options).unwrap();
        assert_eq!(result.issue_count(), 2);
    }
}
