//! Regular (angle × height) sampling of the implant profile.
//!
//! The grid is built in one pass and never mutated afterwards. Samples are
//! stored column-major: all heights of angle 0 first, then angle 1, and so on,
//! so that sample `(i, j)` lives at `i * vertical_resolution + j`. The
//! triangulator relies on this layout to reuse the grid as its vertex buffer.

use std::f64::consts::TAU;

use nalgebra::Point3;
use rayon::prelude::*;
use tracing::debug;

use crate::error::{ImplantError, ImplantResult};
use crate::params::{ImplantParams, check_index_range};
use crate::profile::{ImplantProfile, RingProfile};

/// One evaluated grid node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSample {
    /// Height along the axis.
    pub height: f64,
    /// Angle around the axis, in `[0, 2π)`.
    pub angle: f64,
    /// Profile radius at this node.
    pub radius: f64,
    /// Cartesian position `(r cos θ, r sin θ, z)`.
    pub position: Point3<f64>,
}

/// Immutable grid of profile samples.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleGrid {
    angular_resolution: usize,
    vertical_resolution: usize,
    total_length: f64,
    samples: Vec<GridSample>,
}

impl SampleGrid {
    /// Sample the profile of `params` on a single thread.
    ///
    /// Parameters are not validated here; call [`ImplantParams::validate`]
    /// first unless you deliberately evaluate an out-of-range set. Only a grid
    /// too large for `u32` mesh indices is refused.
    pub fn sample(params: &ImplantParams) -> ImplantResult<Self> {
        let (profile, rings) = Self::prepare(params)?;
        let angular = params.angular_resolution;

        let mut samples = Vec::with_capacity(angular * rings.len());
        for i in 0..angular {
            samples.extend(sample_column(&rings, angle_at(i, angular))?);
        }

        debug!(
            samples = samples.len(),
            collar_start = profile.collar_start(),
            "Sampled implant grid"
        );

        Ok(Self {
            angular_resolution: angular,
            vertical_resolution: rings.len(),
            total_length: params.total_length,
            samples,
        })
    }

    /// Sample the profile with one rayon task per angular column.
    ///
    /// The result is identical to [`SampleGrid::sample`].
    pub fn sample_parallel(params: &ImplantParams) -> ImplantResult<Self> {
        let (_, rings) = Self::prepare(params)?;
        let angular = params.angular_resolution;

        let columns: Vec<Vec<GridSample>> = (0..angular)
            .into_par_iter()
            .map(|i| sample_column(&rings, angle_at(i, angular)))
            .collect::<ImplantResult<_>>()?;

        let samples: Vec<GridSample> = columns.into_iter().flatten().collect();

        debug!(
            samples = samples.len(),
            threads = rayon::current_num_threads(),
            "Sampled implant grid in parallel"
        );

        Ok(Self {
            angular_resolution: angular,
            vertical_resolution: rings.len(),
            total_length: params.total_length,
            samples,
        })
    }

    /// Ring profiles for every height, computed once and shared by all columns.
    fn prepare(params: &ImplantParams) -> ImplantResult<(ImplantProfile, Vec<RingProfile>)> {
        let vertical = params.vertical_resolution;
        check_index_range(params.angular_resolution, vertical)?;

        let profile = ImplantProfile::new(params);
        let rings = (0..vertical)
            .map(|j| profile.ring(height_at(j, vertical, params.total_length)))
            .collect();
        Ok((profile, rings))
    }

    /// Number of angular columns.
    #[inline]
    pub fn angular_resolution(&self) -> usize {
        self.angular_resolution
    }

    /// Number of rings, bottom and top included.
    #[inline]
    pub fn vertical_resolution(&self) -> usize {
        self.vertical_resolution
    }

    /// Height of the top ring.
    #[inline]
    pub fn total_length(&self) -> f64 {
        self.total_length
    }

    /// Flat index of sample `(angular_index, vertical_index)`.
    #[inline]
    pub fn index(&self, angular_index: usize, vertical_index: usize) -> usize {
        angular_index * self.vertical_resolution + vertical_index
    }

    /// Sample at `(angular_index, vertical_index)`, if in range.
    pub fn get(&self, angular_index: usize, vertical_index: usize) -> Option<&GridSample> {
        if angular_index >= self.angular_resolution || vertical_index >= self.vertical_resolution {
            return None;
        }
        self.samples.get(self.index(angular_index, vertical_index))
    }

    /// All samples in storage order.
    pub fn samples(&self) -> &[GridSample] {
        &self.samples
    }

    /// Number of samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Largest sampled radius.
    pub fn max_radius(&self) -> f64 {
        self.samples.iter().map(|s| s.radius).fold(0.0, f64::max)
    }

    /// Consume the grid, returning its samples in storage order.
    pub fn into_samples(self) -> Vec<GridSample> {
        self.samples
    }
}

/// Angle of column `i` out of `angular` (half-open, no seam duplicate).
#[inline]
fn angle_at(i: usize, angular: usize) -> f64 {
    TAU * i as f64 / angular as f64
}

/// Height of ring `j` out of `vertical` (both ends included).
#[inline]
fn height_at(j: usize, vertical: usize, total_length: f64) -> f64 {
    if vertical < 2 {
        return 0.0;
    }
    total_length * j as f64 / (vertical - 1) as f64
}

fn sample_column(rings: &[RingProfile], angle: f64) -> ImplantResult<Vec<GridSample>> {
    let (sin, cos) = angle.sin_cos();
    rings
        .iter()
        .map(|ring| {
            let radius = ring.radius_at(angle);
            if !radius.is_finite() {
                return Err(ImplantError::NonFiniteRadius {
                    height: ring.height,
                    angle,
                    radius,
                });
            }
            Ok(GridSample {
                height: ring.height,
                angle,
                radius,
                position: Point3::new(radius * cos, radius * sin, ring.height),
            })
        })
        .collect()
}
