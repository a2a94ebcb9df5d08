//! Property-based tests for the implant profile and mesh.
//!
//! These use proptest to generate random valid parameter sets and verify the
//! geometric guarantees hold for all of them.
//!
//! Run with: cargo test -p implant-mesh -- proptest

use hashbrown::HashMap;
use implant_mesh::{ImplantParams, ImplantProfile, Region, SampleGrid, triangulate};
use proptest::prelude::*;
use std::f64::consts::TAU;

// =============================================================================
// Strategies
// =============================================================================

/// Generate a parameter set satisfying the longitudinal ordering.
fn arb_params() -> impl Strategy<Value = ImplantParams> {
    (
        (1.0..3.0f64, 0.0..0.4f64, 0.3..2.0f64),
        (0.5..3.0f64, 0.1..2.0f64, 0.5..8.0f64),
        (0.1..2.0f64, 0.5..3.0f64, 0.5..4.0f64),
    )
        .prop_map(
            |(
                (body_radius, depth_ratio, thread_pitch),
                (apex_length, apex_gap, band),
                (collar_gap, collar_height, collar_top_radius),
            )| {
                let thread_start_height = apex_length + apex_gap;
                let thread_end_height = thread_start_height + band;
                let total_length = thread_end_height + collar_gap + collar_height;
                ImplantParams {
                    total_length,
                    body_radius,
                    collar_height,
                    collar_top_radius,
                    apex_length,
                    thread_pitch,
                    thread_depth: body_radius * depth_ratio,
                    thread_start_height,
                    thread_end_height,
                    angular_resolution: 12,
                    vertical_resolution: 24,
                }
            },
        )
}

fn arb_angle() -> impl Strategy<Value = f64> {
    0.0..TAU
}

// =============================================================================
// Profile properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn proptest_generated_params_are_valid(params in arb_params()) {
        prop_assert!(params.validate().is_ok());
    }

    #[test]
    fn proptest_radius_is_continuous_at_boundaries(params in arb_params(), angle in arb_angle()) {
        let profile = ImplantProfile::new(&params);
        let eps = 1e-9;
        let boundaries = [
            params.apex_length,
            params.thread_start_height,
            params.thread_end_height,
            params.collar_start_height(),
        ];
        for z in boundaries {
            let below = profile.radius(z - eps, angle);
            let above = profile.radius(z + eps, angle);
            prop_assert!(
                (below - above).abs() < 1e-6,
                "jump of {} at z = {}",
                (below - above).abs(),
                z
            );
        }
    }

    #[test]
    fn proptest_radius_is_non_negative(
        params in arb_params(),
        t in 0.0..=1.0f64,
        angle in arb_angle(),
    ) {
        let profile = ImplantProfile::new(&params);
        let r = profile.radius(t * params.total_length, angle);
        prop_assert!(r >= 0.0);
        prop_assert!(r <= params.max_radius() + 1e-12);
    }

    #[test]
    fn proptest_apex_closes(params in arb_params(), angle in arb_angle()) {
        let profile = ImplantProfile::new(&params);
        prop_assert!(profile.radius(0.0, angle).abs() < 1e-12);
    }

    #[test]
    fn proptest_collar_is_monotonic(
        params in arb_params(),
        a in 0.0..=1.0f64,
        b in 0.0..=1.0f64,
        angle in arb_angle(),
    ) {
        let profile = ImplantProfile::new(&params);
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let start = params.collar_start_height();
        let z_lo = start + params.collar_height * lo;
        let z_hi = start + params.collar_height * hi;
        let r_lo = profile.radius(z_lo, angle);
        let r_hi = profile.radius(z_hi, angle);

        if params.collar_top_radius >= params.body_radius {
            prop_assert!(r_lo <= r_hi + 1e-12);
        } else {
            prop_assert!(r_lo + 1e-12 >= r_hi);
        }
    }

    #[test]
    fn proptest_no_thread_outside_shaft(params in arb_params(), t in 0.0..=1.0f64) {
        let profile = ImplantProfile::new(&params);
        let z = t * params.total_length;
        if profile.region(z) != Region::Shaft {
            prop_assert_eq!(profile.thread_fade(z), 0.0);
        }
    }
}

// =============================================================================
// Mesh properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(40))]

    #[test]
    fn proptest_mesh_is_closed_and_consistent(
        params in arb_params(),
        angular in 3usize..24,
        vertical in 2usize..30,
    ) {
        let params = params.with_resolution(angular, vertical);
        let mesh = triangulate(SampleGrid::sample(&params).unwrap());

        prop_assert_eq!(mesh.face_count(), 2 * angular * (vertical - 1) + 2 * angular);

        let mut directed: HashMap<(u32, u32), usize> = HashMap::new();
        for face in &mesh.faces {
            for k in 0..3 {
                *directed.entry((face[k], face[(k + 1) % 3])).or_insert(0) += 1;
            }
        }
        for (&(a, b), &count) in &directed {
            prop_assert_eq!(count, 1);
            prop_assert!(directed.contains_key(&(b, a)));
        }
    }

    #[test]
    fn proptest_mesh_volume_is_positive(params in arb_params()) {
        let mesh = triangulate(SampleGrid::sample(&params).unwrap());
        prop_assert!(mesh.signed_volume() > 0.0);
    }

    #[test]
    fn proptest_parallel_sampling_matches(params in arb_params()) {
        let sequential = SampleGrid::sample(&params).unwrap();
        let parallel = SampleGrid::sample_parallel(&params).unwrap();
        prop_assert_eq!(sequential, parallel);
    }
}
