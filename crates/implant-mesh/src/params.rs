//! Implant parameter set: dimensions, thread settings and grid resolution.
//!
//! All lengths are in millimeters. Heights are measured along the implant
//! axis from the apex (z = 0) to the top of the collar (z = `total_length`).
//!
//! ```text
//!  z = total_length        ┌──────┐  collar_top_radius
//!                         /        \       (collar, linear flare)
//!  total - collar_height  │        │
//!  thread_end_height      │ ////// │
//!                         │ ////// │       (shaft, helical thread)
//!  thread_start_height    │        │
//!  apex_length            \        /
//!                          \      /        (apex, elliptical taper)
//!  z = 0                     ────
//! ```
//!
//! # Configuration files
//!
//! Parameters can be loaded from TOML or JSON. Missing keys take their
//! default value, unknown keys are rejected:
//!
//! ```
//! use implant_mesh::ImplantParams;
//!
//! let params = ImplantParams::from_toml_str(
//!     r#"
//!     total_length = 11.5
//!     thread_end_height = 8.8
//!     angular_resolution = 64
//!     "#,
//! )
//! .unwrap();
//!
//! assert_eq!(params.angular_resolution, 64);
//! assert_eq!(params.body_radius, 2.0);
//! assert!(params.validate().is_ok());
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ImplantError, ImplantResult};

/// Length of the band over which the thread fades in above
/// `thread_start_height` and fades out below `thread_end_height`.
pub const THREAD_FADE_LENGTH: f64 = 1.0;

/// Minimum number of samples around the circumference.
pub const MIN_ANGULAR_RESOLUTION: usize = 3;

/// Minimum number of rings along the axis.
pub const MIN_VERTICAL_RESOLUTION: usize = 2;

/// Geometric and resolution parameters of a screw-shaped implant body.
///
/// Valid parameter sets satisfy
/// `0 < apex_length < thread_start_height < thread_end_height < total_length - collar_height < total_length`.
/// Use [`ImplantParams::validate`] before sampling; the generator does this
/// automatically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImplantParams {
    /// Overall length from apex to collar top.
    pub total_length: f64,
    /// Radius of the cylindrical shaft before thread modulation.
    pub body_radius: f64,
    /// Height of the flared collar at the top.
    pub collar_height: f64,
    /// Radius at the very top of the collar.
    pub collar_top_radius: f64,
    /// Height of the elliptical apex taper at the bottom.
    pub apex_length: f64,
    /// Axial distance between thread crests.
    pub thread_pitch: f64,
    /// Radial amplitude of the thread. Zero gives a smooth shaft.
    pub thread_depth: f64,
    /// Height where the threaded band begins.
    pub thread_start_height: f64,
    /// Height where the threaded band ends.
    pub thread_end_height: f64,
    /// Number of samples around the circumference.
    pub angular_resolution: usize,
    /// Number of rings from apex to collar top, both ends included.
    pub vertical_resolution: usize,
}

impl Default for ImplantParams {
    /// A 4 mm diameter, 13 mm long implant.
    fn default() -> Self {
        let total_length = 13.0;
        let collar_height = 2.5;
        let apex_length = 2.0;
        Self {
            total_length,
            body_radius: 2.0,
            collar_height,
            collar_top_radius: 2.4,
            apex_length,
            thread_pitch: 1.2,
            thread_depth: 0.25,
            thread_start_height: apex_length + 0.5,
            thread_end_height: total_length - collar_height - 0.2,
            angular_resolution: 80,
            vertical_resolution: 300,
        }
    }
}

impl ImplantParams {
    /// Create the default parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Builder-style setters
    // =========================================================================

    /// Set the overall length.
    #[must_use]
    pub fn with_total_length(mut self, total_length: f64) -> Self {
        self.total_length = total_length;
        self
    }

    /// Set the shaft radius.
    #[must_use]
    pub fn with_body_radius(mut self, body_radius: f64) -> Self {
        self.body_radius = body_radius;
        self
    }

    /// Set the collar height and top radius.
    #[must_use]
    pub fn with_collar(mut self, height: f64, top_radius: f64) -> Self {
        self.collar_height = height;
        self.collar_top_radius = top_radius;
        self
    }

    /// Set the apex taper length.
    #[must_use]
    pub fn with_apex_length(mut self, apex_length: f64) -> Self {
        self.apex_length = apex_length;
        self
    }

    /// Set thread pitch and depth.
    #[must_use]
    pub fn with_thread(mut self, pitch: f64, depth: f64) -> Self {
        self.thread_pitch = pitch;
        self.thread_depth = depth;
        self
    }

    /// Set the threaded band.
    #[must_use]
    pub fn with_thread_band(mut self, start_height: f64, end_height: f64) -> Self {
        self.thread_start_height = start_height;
        self.thread_end_height = end_height;
        self
    }

    /// Set the sampling grid resolution.
    #[must_use]
    pub fn with_resolution(mut self, angular: usize, vertical: usize) -> Self {
        self.angular_resolution = angular;
        self.vertical_resolution = vertical;
        self
    }

    // =========================================================================
    // Derived quantities
    // =========================================================================

    /// Height where the collar begins.
    #[inline]
    pub fn collar_start_height(&self) -> f64 {
        self.total_length - self.collar_height
    }

    /// Nominal diameter reported in diagnostics.
    #[inline]
    pub fn approximate_diameter(&self) -> f64 {
        2.0 * self.body_radius
    }

    /// Upper bound on the radius anywhere on the surface.
    pub fn max_radius(&self) -> f64 {
        (self.body_radius + self.thread_depth.max(0.0)).max(self.collar_top_radius)
    }

    /// Number of triangles the triangulator emits for this resolution:
    /// two per side-wall quad plus one per cap segment at each end.
    pub fn expected_triangle_count(&self) -> usize {
        let a = self.angular_resolution;
        let v = self.vertical_resolution;
        2 * a * v.saturating_sub(1) + 2 * a
    }

    /// Number of vertices: every grid node plus the two poles.
    pub fn expected_vertex_count(&self) -> usize {
        self.angular_resolution * self.vertical_resolution + 2
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Check every value and the longitudinal ordering.
    ///
    /// Nothing is clamped: the first violation is returned as an error.
    pub fn validate(&self) -> ImplantResult<()> {
        let positive = [
            ("total_length", self.total_length),
            ("body_radius", self.body_radius),
            ("collar_height", self.collar_height),
            ("collar_top_radius", self.collar_top_radius),
            ("apex_length", self.apex_length),
            ("thread_pitch", self.thread_pitch),
            ("thread_start_height", self.thread_start_height),
            ("thread_end_height", self.thread_end_height),
        ];
        for (name, value) in positive {
            if !value.is_finite() {
                return Err(ImplantError::invalid_parameter(name, value, "must be finite"));
            }
            if value <= 0.0 {
                return Err(ImplantError::invalid_parameter(
                    name,
                    value,
                    "must be positive",
                ));
            }
        }

        if !self.thread_depth.is_finite() || self.thread_depth < 0.0 {
            return Err(ImplantError::invalid_parameter(
                "thread_depth",
                self.thread_depth,
                "must be finite and non-negative",
            ));
        }
        if self.thread_depth >= self.body_radius {
            return Err(ImplantError::invalid_parameter(
                "thread_depth",
                self.thread_depth,
                format!(
                    "must be smaller than body_radius ({}) so thread troughs keep a positive radius",
                    self.body_radius
                ),
            ));
        }

        if self.angular_resolution < MIN_ANGULAR_RESOLUTION {
            return Err(ImplantError::invalid_parameter(
                "angular_resolution",
                self.angular_resolution as f64,
                format!("must be at least {}", MIN_ANGULAR_RESOLUTION),
            ));
        }
        if self.vertical_resolution < MIN_VERTICAL_RESOLUTION {
            return Err(ImplantError::invalid_parameter(
                "vertical_resolution",
                self.vertical_resolution as f64,
                format!("must be at least {}", MIN_VERTICAL_RESOLUTION),
            ));
        }
        check_index_range(self.angular_resolution, self.vertical_resolution)?;

        let collar_start = self.collar_start_height();
        let chain = [
            ("apex_length", self.apex_length, "thread_start_height", self.thread_start_height),
            (
                "thread_start_height",
                self.thread_start_height,
                "thread_end_height",
                self.thread_end_height,
            ),
            (
                "thread_end_height",
                self.thread_end_height,
                "total_length - collar_height",
                collar_start,
            ),
        ];
        for (lower_name, lower, upper_name, upper) in chain {
            if lower >= upper {
                return Err(ImplantError::invalid_ordering(format!(
                    "{} ({}) must be below {} ({})",
                    lower_name, lower, upper_name, upper
                )));
            }
        }

        debug!(
            total_length = self.total_length,
            body_radius = self.body_radius,
            angular_resolution = self.angular_resolution,
            vertical_resolution = self.vertical_resolution,
            "Implant parameters validated"
        );

        Ok(())
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    /// Parse parameters from a TOML string.
    pub fn from_toml_str(toml_str: &str) -> ImplantResult<Self> {
        toml::from_str(toml_str)
            .map_err(|e| ImplantError::config_parse("<string>", e.to_string()))
    }

    /// Parse parameters from a JSON string.
    pub fn from_json_str(json_str: &str) -> ImplantResult<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| ImplantError::config_parse("<string>", e.to_string()))
    }

    /// Serialize to pretty TOML.
    pub fn to_toml_string(&self) -> ImplantResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| ImplantError::config_parse("<string>", e.to_string()))
    }

    /// Serialize to pretty JSON.
    pub fn to_json_string(&self) -> ImplantResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ImplantError::config_parse("<string>", e.to_string()))
    }

    /// Load parameters from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> ImplantResult<Self> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|e| ImplantError::io_read(path, e))?;
        let params =
            toml::from_str(&contents).map_err(|e| ImplantError::config_parse(path, e.to_string()))?;
        debug!("Loaded implant parameters from {:?}", path);
        Ok(params)
    }

    /// Load parameters from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> ImplantResult<Self> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|e| ImplantError::io_read(path, e))?;
        let params = serde_json::from_str(&contents)
            .map_err(|e| ImplantError::config_parse(path, e.to_string()))?;
        debug!("Loaded implant parameters from {:?}", path);
        Ok(params)
    }

    /// Load parameters from a `.toml` or `.json` file, chosen by extension.
    ///
    /// The result is parsed but not validated.
    pub fn load(path: impl AsRef<Path>) -> ImplantResult<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase());

        match extension.as_deref() {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(ImplantError::unsupported_format(extension)),
        }
    }

    /// Write parameters to a `.toml` or `.json` file.
    pub fn save(&self, path: impl AsRef<Path>) -> ImplantResult<()> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase());

        let contents = match extension.as_deref() {
            Some("toml") => self.to_toml_string()?,
            Some("json") => self.to_json_string()?,
            _ => return Err(ImplantError::unsupported_format(extension)),
        };

        std::fs::write(path, contents).map_err(|e| ImplantError::io_write(path, e))
    }
}

/// Face indices are `u32`: every grid node plus the two poles must be
/// addressable.
pub(crate) fn check_index_range(angular: usize, vertical: usize) -> ImplantResult<()> {
    let vertex_count = angular.checked_mul(vertical).and_then(|n| n.checked_add(2));
    if vertex_count.is_none_or(|n| u32::try_from(n).is_err()) {
        return Err(ImplantError::invalid_parameter(
            "vertical_resolution",
            vertical as f64,
            "grid too large: vertex indices would overflow u32",
        ));
    }
    Ok(())
}
