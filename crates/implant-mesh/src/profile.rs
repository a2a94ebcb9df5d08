//! Radius profile of the implant surface.
//!
//! The surface is a body of revolution around the z axis whose radius depends
//! on the height and, inside the threaded band, on the angle. Each height falls
//! in exactly one [`Region`]; the thread is an additive layer on top of the
//! shaft radius.
//!
//! Evaluation is split in two steps so the region dispatch happens once per
//! ring rather than once per sample:
//!
//! ```
//! use implant_mesh::{ImplantParams, ImplantProfile, Region};
//!
//! let params = ImplantParams::default();
//! let profile = ImplantProfile::new(&params);
//!
//! let ring = profile.ring(6.0);
//! assert_eq!(ring.region, Region::Shaft);
//!
//! // Same value as the one-shot evaluation
//! assert_eq!(ring.radius_at(1.0), profile.radius(6.0, 1.0));
//! ```

use std::f64::consts::TAU;

use crate::params::{ImplantParams, THREAD_FADE_LENGTH};

/// Exponent shaping the thread crest (flatter and wider than a sine).
const CREST_EXPONENT: f64 = 0.8;

/// Exponent shaping the thread trough.
const TROUGH_EXPONENT: f64 = 2.5;

/// Longitudinal region of the implant body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// Elliptical taper closing the bottom of the implant.
    Apex,
    /// Cylindrical body, carrying the thread.
    Shaft,
    /// Linear flare at the top.
    Collar,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Apex => "apex",
            Region::Shaft => "shaft",
            Region::Collar => "collar",
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Profile evaluator for one parameter set.
///
/// Copies the few scalars it needs, so it can be shared across threads and
/// outlive the parameters it was built from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImplantProfile {
    total_length: f64,
    body_radius: f64,
    collar_height: f64,
    collar_top_radius: f64,
    apex_length: f64,
    thread_pitch: f64,
    thread_depth: f64,
    thread_start_height: f64,
    thread_end_height: f64,
}

/// Everything about a ring at a fixed height that does not depend on the angle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingProfile {
    /// Height of the ring.
    pub height: f64,
    /// Region the height falls in.
    pub region: Region,
    /// Region radius before thread modulation.
    pub base_radius: f64,
    /// Thread amplitude at this height (`thread_depth * fade`). Zero outside
    /// the threaded band.
    pub thread_amplitude: f64,
    /// Helical phase contributed by the height (`height / thread_pitch`).
    pub axial_phase: f64,
}

impl RingProfile {
    /// Radius of the ring at `angle` (radians).
    #[inline]
    pub fn radius_at(&self, angle: f64) -> f64 {
        if self.thread_amplitude == 0.0 {
            return self.base_radius;
        }
        let phase = self.axial_phase - angle / TAU;
        self.base_radius + self.thread_amplitude * thread_shape((TAU * phase).sin())
    }

    /// Whether the thread modulates this ring.
    #[inline]
    pub fn is_threaded(&self) -> bool {
        self.thread_amplitude != 0.0
    }
}

impl ImplantProfile {
    /// Build the evaluator. Parameters are taken as-is: validation is the
    /// caller's job.
    pub fn new(params: &ImplantParams) -> Self {
        Self {
            total_length: params.total_length,
            body_radius: params.body_radius,
            collar_height: params.collar_height,
            collar_top_radius: params.collar_top_radius,
            apex_length: params.apex_length,
            thread_pitch: params.thread_pitch,
            thread_depth: params.thread_depth,
            thread_start_height: params.thread_start_height,
            thread_end_height: params.thread_end_height,
        }
    }

    /// Height where the collar begins.
    #[inline]
    pub fn collar_start(&self) -> f64 {
        self.total_length - self.collar_height
    }

    /// Classify a height. Apex wins over collar when both apply.
    pub fn region(&self, height: f64) -> Region {
        if height < self.apex_length {
            Region::Apex
        } else if height > self.collar_start() {
            Region::Collar
        } else {
            Region::Shaft
        }
    }

    /// Region radius at `height`, ignoring the thread.
    pub fn base_radius(&self, height: f64) -> f64 {
        match self.region(height) {
            Region::Apex => {
                let ratio = height / self.apex_length;
                let radicand = (1.0 - (1.0 - ratio).powi(2)).clamp(0.0, 1.0);
                self.body_radius * radicand.sqrt()
            }
            Region::Collar => {
                let progress = (height - self.collar_start()) / self.collar_height;
                self.body_radius + (self.collar_top_radius - self.body_radius) * progress
            }
            Region::Shaft => self.body_radius,
        }
    }

    /// Fade factor of the thread at `height`, in `[0, 1]`.
    ///
    /// Zero outside the open band `(thread_start_height, thread_end_height)`
    /// and outside the shaft. Ramps linearly over [`THREAD_FADE_LENGTH`] at
    /// both ends; where the ramps overlap the smaller one applies.
    pub fn thread_fade(&self, height: f64) -> f64 {
        if height <= self.thread_start_height || height >= self.thread_end_height {
            return 0.0;
        }
        if self.region(height) != Region::Shaft {
            return 0.0;
        }
        let fade_in = (height - self.thread_start_height) / THREAD_FADE_LENGTH;
        let fade_out = (self.thread_end_height - height) / THREAD_FADE_LENGTH;
        fade_in.min(fade_out).clamp(0.0, 1.0)
    }

    /// Angle-independent part of the profile at `height`.
    pub fn ring(&self, height: f64) -> RingProfile {
        let region = self.region(height);
        let fade = self.thread_fade(height);
        RingProfile {
            height,
            region,
            base_radius: self.base_radius(height),
            thread_amplitude: self.thread_depth * fade,
            axial_phase: height / self.thread_pitch,
        }
    }

    /// Radius at `height` and `angle` (radians).
    pub fn radius(&self, height: f64, angle: f64) -> f64 {
        self.ring(height).radius_at(angle)
    }
}

/// Asymmetric thread shape applied to a sine wave in `[-1, 1]`.
///
/// Positive lobes are raised to 0.8 (broad crest), negative lobes to 2.5
/// (narrow, shallow trough).
#[inline]
pub fn thread_shape(wave: f64) -> f64 {
    if wave > 0.0 {
        wave.powf(CREST_EXPONENT)
    } else {
        -wave.abs().powf(TROUGH_EXPONENT)
    }
}
