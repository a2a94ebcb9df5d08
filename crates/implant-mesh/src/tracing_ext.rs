//! Tracing helpers for the generation pipeline.
//!
//! The library only emits events; installing a subscriber is up to the
//! application. Useful filters:
//!
//! - `RUST_LOG=implant_mesh=info`: one line per stage plus the summary
//! - `RUST_LOG=implant_mesh=debug`: grid, triangulation and validation detail
//! - `RUST_LOG=implant_mesh::timing=info`: stage timings only

use std::time::Instant;
use tracing::span::EnteredSpan;
use tracing::{Span, debug, info};

use crate::params::ImplantParams;
use crate::types::Mesh;
use crate::validate::MeshReport;

/// A timer that logs the duration of a pipeline stage on drop.
///
/// The stage span is entered for the timer's lifetime, so events emitted by
/// the stage nest under `implant_stage`. Keep timers strictly scoped (inner
/// timers dropped before outer ones).
///
/// ```
/// use implant_mesh::tracing_ext::OperationTimer;
///
/// {
///     let _timer = OperationTimer::new("sample_grid");
///     // ... work ...
/// } // logs under `implant_mesh::timing`
/// ```
pub struct OperationTimer {
    name: &'static str,
    start: Instant,
    span: EnteredSpan,
}

impl OperationTimer {
    /// Start timing `name`.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!("implant_stage", stage = name);
        debug!(target: "implant_mesh::timing", stage = name, "Starting stage");
        Self {
            name,
            start: Instant::now(),
            span: span.entered(),
        }
    }

    /// Start timing a stage that works on a grid of the given size.
    pub fn with_grid(name: &'static str, angular: usize, vertical: usize) -> Self {
        let span = tracing::info_span!(
            "implant_stage",
            stage = name,
            angular = angular,
            vertical = vertical
        );
        debug!(
            target: "implant_mesh::timing",
            stage = name,
            angular = angular,
            vertical = vertical,
            "Starting stage"
        );
        Self {
            name,
            start: Instant::now(),
            span: span.entered(),
        }
    }

    /// Elapsed time in milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// The span covering this stage.
    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        info!(
            target: "implant_mesh::timing",
            stage = self.name,
            elapsed_ms = format!("{:.2}", self.elapsed_ms()),
            "Stage completed"
        );
    }
}

/// Log mesh size and extent at debug level.
pub fn log_mesh_stats(mesh: &Mesh, context: &str) {
    let (min_bounds, max_bounds) = mesh.bounds().unwrap_or_default();
    let dims = max_bounds - min_bounds;

    debug!(
        target: "implant_mesh::mesh_state",
        context = context,
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        dimensions = format!("{:.2} x {:.2} x {:.2}", dims.x, dims.y, dims.z),
        "Mesh state"
    );
}

/// Log the post-generation summary: nominal size, mesh size, validation status.
pub fn log_generation_summary(params: &ImplantParams, mesh: &Mesh, report: &MeshReport) {
    info!(
        target: "implant_mesh::summary",
        diameter_mm = format!("{:.2}", params.approximate_diameter()),
        length_mm = format!("{:.2}", params.total_length),
        triangles = mesh.face_count(),
        vertices = mesh.vertex_count(),
        status = report.status(),
        "Implant generated"
    );
}
