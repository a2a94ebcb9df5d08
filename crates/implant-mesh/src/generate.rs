//! Generation pipeline: parameters → grid → mesh → report.
//!
//! ```
//! use implant_mesh::{ImplantGenerator, ImplantParams};
//!
//! let params = ImplantParams::default().with_resolution(24, 60);
//! let result = ImplantGenerator::new(params)
//!     .parallel(true)
//!     .weld_apex(true)
//!     .generate()
//!     .unwrap();
//!
//! assert!(result.report.is_printable());
//! ```

use std::path::Path;

use tracing::{debug, info};

use crate::error::{ImplantError, ImplantResult};
use crate::grid::SampleGrid;
use crate::io::{MeshFormat, save_mesh, save_mesh_as};
use crate::params::ImplantParams;
use crate::placement::Placement;
use crate::repair::{DEFAULT_WELD_EPSILON, weld_apex};
use crate::tracing_ext::{OperationTimer, log_generation_summary, log_mesh_stats};
use crate::triangulate::{pole_indices, triangulate};
use crate::types::Mesh;
use crate::validate::{MeshReport, log_validation, validate_mesh, validate_mesh_data_strict};

/// Output of [`ImplantGenerator::generate`].
#[derive(Debug, Clone)]
pub struct GenerationResult {
    /// The generated (and possibly placed) mesh.
    pub mesh: Mesh,
    /// Validation report, taken before placement.
    pub report: MeshReport,
    /// Parameters the mesh was generated from.
    pub params: ImplantParams,
    /// Vertices merged by the apex weld (0 when disabled).
    pub vertices_welded: usize,
}

impl GenerationResult {
    /// Save the mesh, choosing the format from the extension.
    pub fn save(&self, path: impl AsRef<Path>) -> ImplantResult<()> {
        save_mesh(&self.mesh, path.as_ref())
    }

    /// Save the mesh in an explicit format.
    pub fn save_as(&self, path: impl AsRef<Path>, format: MeshFormat) -> ImplantResult<()> {
        save_mesh_as(&self.mesh, path.as_ref(), format)
    }
}

/// Fluent builder for implant generation.
///
/// Defaults: sequential sampling, no apex weld, no placement.
#[derive(Debug, Clone)]
pub struct ImplantGenerator {
    params: ImplantParams,
    parallel: bool,
    weld_apex: bool,
    weld_epsilon: f64,
    placement: Option<Placement>,
}

impl ImplantGenerator {
    /// Create a generator for `params`.
    pub fn new(params: ImplantParams) -> Self {
        Self {
            params,
            parallel: false,
            weld_apex: false,
            weld_epsilon: DEFAULT_WELD_EPSILON,
            placement: None,
        }
    }

    /// Sample the grid with rayon. Output is identical either way.
    #[must_use]
    pub fn parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// Collapse the zero-radius bottom ring into a single vertex.
    ///
    /// Removes the zero-area facets at the apex; the mesh stays closed.
    #[must_use]
    pub fn weld_apex(mut self, enabled: bool) -> Self {
        self.weld_apex = enabled;
        self
    }

    /// Distance from the bottom pole under which vertices fold into it.
    ///
    /// Must be finite, positive and below the ring spacing
    /// `total_length / (vertical_resolution - 1)`; [`generate`](Self::generate)
    /// rejects anything else when the weld is enabled.
    #[must_use]
    pub fn weld_epsilon(mut self, epsilon: f64) -> Self {
        self.weld_epsilon = epsilon;
        self
    }

    /// Move the finished implant onto an insertion axis.
    #[must_use]
    pub fn placement(mut self, placement: Placement) -> Self {
        self.placement = Some(placement);
        self
    }

    /// The parameters this generator will use.
    pub fn params(&self) -> &ImplantParams {
        &self.params
    }

    /// Run the pipeline.
    ///
    /// Fails with a parameter error before any sampling if the parameter set is
    /// invalid.
    pub fn generate(self) -> ImplantResult<GenerationResult> {
        let _timer = OperationTimer::new("generate_implant");
        let params = self.params;
        params.validate()?;
        if self.weld_apex {
            check_weld_epsilon(&params, self.weld_epsilon)?;
        }

        let grid = {
            let _timer = OperationTimer::with_grid(
                "sample_grid",
                params.angular_resolution,
                params.vertical_resolution,
            );
            if self.parallel {
                SampleGrid::sample_parallel(&params)?
            } else {
                SampleGrid::sample(&params)?
            }
        };

        let mut mesh = {
            let _timer = OperationTimer::new("triangulate");
            triangulate(grid)
        };
        log_mesh_stats(&mesh, "triangulated");

        let mut vertices_welded = 0;
        if self.weld_apex {
            let (pole, _) = pole_indices(params.angular_resolution, params.vertical_resolution);
            let (merged, removed) = weld_apex(&mut mesh, pole, self.weld_epsilon);
            debug!(merged, removed, "Apex weld finished");
            vertices_welded = merged;
        }

        validate_mesh_data_strict(&mesh)?;
        let report = validate_mesh(&mesh);
        log_validation(&report);

        if let Some(placement) = &self.placement {
            placement.apply(&mut mesh, params.total_length)?;
            info!(
                start = ?placement.start,
                end = ?placement.end,
                "Placed implant on insertion axis"
            );
        }

        log_generation_summary(&params, &mesh, &report);

        Ok(GenerationResult {
            mesh,
            report,
            params,
            vertices_welded,
        })
    }
}

/// The apex weld may only reach the collapsed bottom ring: every other vertex
/// is at least one ring spacing away from the pole.
fn check_weld_epsilon(params: &ImplantParams, epsilon: f64) -> ImplantResult<()> {
    if !epsilon.is_finite() || epsilon <= 0.0 {
        return Err(ImplantError::invalid_parameter(
            "weld_epsilon",
            epsilon,
            "must be finite and positive",
        ));
    }
    let spacing = params.total_length / (params.vertical_resolution - 1) as f64;
    if epsilon >= spacing {
        return Err(ImplantError::invalid_parameter(
            "weld_epsilon",
            epsilon,
            format!("must be below the ring spacing ({:.4} mm)", spacing),
        ));
    }
    Ok(())
}

/// Generate the implant mesh for `params` with default settings.
pub fn generate_implant(params: &ImplantParams) -> ImplantResult<Mesh> {
    Ok(ImplantGenerator::new(params.clone()).generate()?.mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use nalgebra::Point3;

    fn params() -> ImplantParams {
        ImplantParams::default().with_resolution(16, 48)
    }

    #[test]
    fn test_generate_defaults() {
        let result = ImplantGenerator::new(params()).generate().unwrap();
        assert_eq!(result.mesh.face_count(), params().expected_triangle_count());
        assert_eq!(result.mesh.vertex_count(), params().expected_vertex_count());
        assert!(result.report.is_printable());
        assert_eq!(result.vertices_welded, 0);
    }

    #[test]
    fn test_invalid_params_fail_before_sampling() {
        let bad = params().with_thread_band(9.0, 3.0);
        let err = ImplantGenerator::new(bad).generate().unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidOrdering);
    }

    #[test]
    fn test_parallel_is_identical() {
        let sequential = generate_implant(&params()).unwrap();
        let parallel = ImplantGenerator::new(params())
            .parallel(true)
            .generate()
            .unwrap()
            .mesh;
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_weld_apex() {
        let result = ImplantGenerator::new(params())
            .weld_apex(true)
            .generate()
            .unwrap();
        assert_eq!(result.vertices_welded, 16);
        assert_eq!(result.report.degenerate_face_count, 0);
        assert!(result.report.is_printable());
        assert_eq!(
            result.mesh.face_count(),
            params().expected_triangle_count() - 2 * 16
        );
    }

    #[test]
    fn test_weld_epsilon_must_be_finite_and_positive() {
        for epsilon in [f64::INFINITY, f64::NAN, 0.0, -1e-6] {
            let err = ImplantGenerator::new(params())
                .weld_apex(true)
                .weld_epsilon(epsilon)
                .generate()
                .unwrap_err();
            assert_eq!(err.code(), ErrorCode::InvalidParameter);
        }
    }

    #[test]
    fn test_weld_epsilon_must_stay_below_ring_spacing() {
        // 13 mm over 47 gaps: rings are ~0.277 mm apart
        let err = ImplantGenerator::new(params())
            .weld_apex(true)
            .weld_epsilon(0.3)
            .generate()
            .unwrap_err();
        assert!(err.is_parameter_error());

        let result = ImplantGenerator::new(params())
            .weld_apex(true)
            .weld_epsilon(0.1)
            .generate()
            .unwrap();
        assert_eq!(result.vertices_welded, 16);
        assert_eq!(
            result.mesh.face_count(),
            params().expected_triangle_count() - 2 * 16
        );
    }

    #[test]
    fn test_weld_epsilon_unchecked_without_weld() {
        let result = ImplantGenerator::new(params())
            .weld_epsilon(f64::INFINITY)
            .generate()
            .unwrap();
        assert_eq!(result.mesh.face_count(), params().expected_triangle_count());
    }

    #[test]
    fn test_placement_puts_collar_on_entry_point() {
        let p = params();
        let placement = Placement::new(Point3::new(10.0, 0.0, 0.0), Point3::new(10.0, 5.0, 0.0));
        let result = ImplantGenerator::new(p.clone())
            .placement(placement)
            .generate()
            .unwrap();

        let (bottom, top) = pole_indices(p.angular_resolution, p.vertical_resolution);
        let collar_top = result.mesh.vertices[top as usize].position;
        let apex = result.mesh.vertices[bottom as usize].position;
        assert!((collar_top - Point3::new(10.0, 0.0, 0.0)).norm() < 1e-9);
        assert!((apex - Point3::new(10.0, 13.0, 0.0)).norm() < 1e-9);

        let (min, max) = result.mesh.bounds().unwrap();
        assert!(min.y > -1e-9);
        assert!((max.y - 13.0).abs() < 1e-9);
        assert!(result.report.is_printable());
    }

    #[test]
    fn test_bad_placement() {
        let placement = Placement::new(Point3::origin(), Point3::origin());
        let err = ImplantGenerator::new(params())
            .placement(placement)
            .generate()
            .unwrap_err();
        assert!(err.is_parameter_error());
    }
}
