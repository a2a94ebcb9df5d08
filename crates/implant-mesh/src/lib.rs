//! Procedural mesh generation for screw-shaped dental implant bodies.
//!
//! The implant is a body of revolution around +Z: an elliptical apex taper at
//! the bottom, a cylindrical shaft carrying a helical thread, and a linearly
//! flared collar at the top. The crate samples that profile on a regular
//! (angle × height) grid, stitches the grid into a closed, outward-wound
//! triangle mesh with a fan cap at each end, and exports it as STL or OBJ.
//!
//! # Pipeline
//!
//! | Stage     | Module          | Output                  |
//! |-----------|-----------------|-------------------------|
//! | Parameters| [`params`]      | [`ImplantParams`]       |
//! | Profile   | [`profile`]     | radius at (z, θ)        |
//! | Sampling  | [`grid`]        | [`SampleGrid`]          |
//! | Stitching | [`triangulate`] | [`Mesh`]                |
//! | Export    | [`io`]          | STL / OBJ file          |
//!
//! [`ImplantGenerator`] runs all stages, validates the result and optionally
//! welds the apex and moves the implant onto an insertion axis.
//!
//! # Units and Coordinates
//!
//! **All lengths are in millimeters.** The apex sits at the origin and the
//! collar top at `(0, 0, total_length)`. Face winding is counter-clockwise
//! seen from outside, so normals point outward by the right-hand rule.
//!
//! # Quick Start
//!
//! ```no_run
//! use implant_mesh::{ImplantGenerator, ImplantParams};
//!
//! let params = ImplantParams::load("implant.toml").unwrap();
//! let result = ImplantGenerator::new(params).generate().unwrap();
//!
//! println!("{}", result.report);
//! result.save("implant.stl").unwrap();
//! ```
//!
//! # Step by step
//!
//! ```
//! use implant_mesh::{ImplantParams, SampleGrid, triangulate};
//!
//! let params = ImplantParams::default().with_resolution(32, 100);
//! params.validate().unwrap();
//!
//! let grid = SampleGrid::sample(&params).unwrap();
//! let mesh = triangulate(grid);
//!
//! assert_eq!(mesh.face_count(), params.expected_triangle_count());
//! assert!(mesh.validate().is_printable());
//! ```
//!
//! # Logging
//!
//! Every stage emits `tracing` events; see [`tracing_ext`] for targets.

mod error;
mod types;

pub mod generate;
pub mod grid;
pub mod io;
pub mod params;
pub mod placement;
pub mod profile;
pub mod repair;
pub mod tracing_ext;
pub mod triangulate;
pub mod validate;

pub use error::{ErrorCode, ImplantError, ImplantResult, RecoverySuggestion, ValidationIssue};
pub use types::{Mesh, Triangle, Vertex};

pub use generate::{GenerationResult, ImplantGenerator, generate_implant};
pub use grid::{GridSample, SampleGrid};
pub use io::{
    MeshFormat, save_mesh, save_mesh_as, save_obj, save_stl, save_stl_ascii, write_obj,
    write_stl, write_stl_ascii,
};
pub use params::{ImplantParams, THREAD_FADE_LENGTH};
pub use placement::Placement;
pub use profile::{ImplantProfile, Region, RingProfile};
pub use repair::{remove_unreferenced_vertices, weld_apex, weld_vertices};
pub use triangulate::triangulate;
pub use validate::{
    DataValidationResult, MeshReport, ValidationOptions, validate_mesh, validate_mesh_data,
};

// Convenience methods on Mesh
impl Mesh {
    /// Save the mesh, auto-detecting the format from the extension.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> ImplantResult<()> {
        io::save_mesh(self, path.as_ref())
    }

    /// Validate the mesh and return a report.
    pub fn validate(&self) -> MeshReport {
        validate::validate_mesh(self)
    }
}
