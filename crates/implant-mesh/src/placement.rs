//! Positioning a generated implant in a scene.
//!
//! The generator always builds the implant along +Z with the apex at the
//! origin and the collar top at `(0, 0, total_length)`. A [`Placement`] moves
//! it onto an insertion axis picked as two points: the collar top lands on
//! `start` (the entry point) and the body runs from there towards `end`, apex
//! first into the bone. The implant keeps its own length; `end` only supplies
//! the direction.

use nalgebra::{Isometry3, Point3, Rotation3, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{ImplantError, ImplantResult};
use crate::types::Mesh;

/// Axes shorter than this are rejected.
const MIN_AXIS_LENGTH: f64 = 1e-9;

/// Insertion axis from the entry point towards the apex.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Where the collar top goes.
    pub start: [f64; 3],
    /// A point in the insertion direction.
    pub end: [f64; 3],
}

impl Placement {
    pub fn new(start: Point3<f64>, end: Point3<f64>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Unit direction from `start` towards `end`.
    pub fn direction(&self) -> ImplantResult<Vector3<f64>> {
        let axis = Point3::from(self.end) - Point3::from(self.start);
        let length = axis.norm();
        if !length.is_finite() {
            return Err(ImplantError::invalid_parameter(
                "placement",
                length,
                "start and end must be finite points",
            ));
        }
        if length < MIN_AXIS_LENGTH {
            return Err(ImplantError::invalid_parameter(
                "placement",
                length,
                "start and end must be distinct points",
            ));
        }
        Ok(axis / length)
    }

    /// Rigid transform from the generator frame onto this axis.
    ///
    /// `(0, 0, total_length)` maps to `start` and the apex to
    /// `start + total_length * direction`.
    pub fn isometry(&self, total_length: f64) -> ImplantResult<Isometry3<f64>> {
        if !total_length.is_finite() || total_length <= 0.0 {
            return Err(ImplantError::invalid_parameter(
                "total_length",
                total_length,
                "must be finite and positive",
            ));
        }
        let direction = self.direction()?;
        let rotation = rotation_from_down(&direction);
        // R·(0, 0, L) = -L·direction, so the collar top lands on start
        let offset = Vector3::from(self.start) + direction * total_length;
        Ok(Isometry3::from_parts(
            Translation3::from(offset),
            UnitQuaternion::from_rotation_matrix(&rotation),
        ))
    }

    /// Transform `mesh`, built for `total_length`, in place.
    pub fn apply(&self, mesh: &mut Mesh, total_length: f64) -> ImplantResult<()> {
        let isometry = self.isometry(total_length)?;
        mesh.transform(&isometry);
        Ok(())
    }
}

/// Rotation taking -Z (collar towards apex) onto `direction` (unit length).
///
/// `rotation_between` has no unique answer for opposite vectors; a half turn
/// about X is used there.
fn rotation_from_down(direction: &Vector3<f64>) -> Rotation3<f64> {
    Rotation3::rotation_between(&-Vector3::z(), direction)
        .unwrap_or_else(|| Rotation3::from_axis_angle(&Vector3::x_axis(), std::f64::consts::PI))
}
