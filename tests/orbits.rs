use std::f64::consts::PI;

use cosmogen::common::constants::MU_SUN;
use cosmogen::common::vector::{self, Vector3};
use cosmogen::common::{RandomSource, SeededRandom};
use cosmogen::orbits::{ClassicalElements, Orbit, OrbitError, PropagationSettings};

fn elements(periapsis: f64, eccentricity: f64, inclination: f64) -> ClassicalElements {
    ClassicalElements {
        periapsis,
        eccentricity,
        inclination,
        ascending_node: 1.2,
        argument_of_periapsis: 0.7,
        true_anomaly: 0.4,
    }
}

fn relative_error(a: &Vector3, b: &Vector3) -> f64 {
    vector::distance(a, b) / vector::norm(b)
}

fn energy(mu: f64, r: &Vector3, v: &Vector3) -> f64 {
    vector::dot(v, v) / 2.0 - mu / vector::norm(r)
}

#[test]
fn one_period_returns_to_initial_state() {
    let orbit = Orbit::from_elements(MU_SUN, elements(1.0e11, 0.3, 0.5)).unwrap();
    let (r, v) = orbit.state_at(orbit.period());
    assert!(relative_error(&r, &orbit.position()) < 1e-6);
    assert!(relative_error(&v, &orbit.velocity()) < 1e-6);
}

#[test]
fn zero_elapsed_time_reproduces_epoch_state() {
    let orbit = Orbit::from_elements(MU_SUN, elements(1.0e11, 0.3, 0.5)).unwrap();
    let (r, v) = orbit.state_at(0.0);
    assert!(relative_error(&r, &orbit.position()) < 1e-6);
    assert!(relative_error(&v, &orbit.velocity()) < 1e-6);
}

#[test]
fn derived_quantities_match_elements() {
    let orbit = Orbit::from_elements(MU_SUN, elements(1.0e11, 0.3, 0.5)).unwrap();
    let a = 1.0e11 / 0.7;
    assert!((orbit.semi_major_axis() - a).abs() / a < 1e-12);
    assert!((orbit.apoapsis() - a * 1.3).abs() / a < 1e-12);
    let period = 2.0 * PI * (a.powi(3) / MU_SUN).sqrt();
    assert!((orbit.period() - period).abs() / period < 1e-12);
    assert!((orbit.specific_energy() + MU_SUN / (2.0 * a)).abs() < 1e-6 * MU_SUN / a);
}

#[test]
fn state_vectors_round_trip_through_elements() {
    let original = Orbit::from_elements(MU_SUN, elements(7.0e10, 0.45, 1.1)).unwrap();
    let derived =
        Orbit::from_state_vectors(MU_SUN, original.position(), original.velocity()).unwrap();
    assert_eq!(derived.position(), original.position());
    assert!((derived.eccentricity() - 0.45).abs() < 1e-9);
    assert!((derived.inclination() - 1.1).abs() < 1e-9);
    assert!((derived.periapsis() - 7.0e10).abs() / 7.0e10 < 1e-9);

    let rebuilt = Orbit::from_elements(MU_SUN, *derived.elements()).unwrap();
    assert!(relative_error(&rebuilt.position(), &original.position()) < 1e-6);
    assert!(relative_error(&rebuilt.velocity(), &original.velocity()) < 1e-6);
}

#[test]
fn equatorial_circular_state_is_handled() {
    let r = 1.5e11;
    let speed = (MU_SUN / r).sqrt();
    let orbit = Orbit::from_state_vectors(MU_SUN, [r, 0.0, 0.0], [0.0, speed, 0.0]).unwrap();
    assert!(orbit.eccentricity() < 1e-9);
    assert!(orbit.inclination().abs() < 1e-12);
    let (position, _) = orbit.state_at(orbit.period() / 4.0);
    assert!(vector::approx_eq(&position, &[0.0, r, 0.0], 1e-6));
}

#[test]
fn out_of_range_elements_are_rejected() {
    let base = elements(1.0e11, 0.3, 0.5);
    let cases = [
        ("eccentricity", ClassicalElements { eccentricity: -0.1, ..base }),
        ("inclination", ClassicalElements { inclination: PI, ..base }),
        ("ascending_node", ClassicalElements { ascending_node: 2.0 * PI, ..base }),
        ("argument_of_periapsis", ClassicalElements { argument_of_periapsis: -0.1, ..base }),
        ("true_anomaly", ClassicalElements { true_anomaly: 7.0, ..base }),
    ];
    for (expected, bad) in cases {
        match Orbit::from_elements(MU_SUN, bad) {
            Err(OrbitError::InvalidOrbitalParameter { name, .. }) => assert_eq!(name, expected),
            other => panic!("{expected}: expected rejection, got {other:?}"),
        }
    }
    assert!(matches!(
        Orbit::from_elements(0.0, base),
        Err(OrbitError::InvalidGravitationalParameter(_))
    ));
}

#[test]
fn radial_state_is_degenerate() {
    assert!(matches!(
        Orbit::from_state_vectors(MU_SUN, [1.0e11, 0.0, 0.0], [3.0e4, 0.0, 0.0]),
        Err(OrbitError::DegenerateState)
    ));
}

#[test]
fn parabolic_orbit_uses_periapsis_as_semi_major_axis() {
    let orbit = Orbit::from_elements(MU_SUN, elements(1.0e11, 1.0, 0.2)).unwrap();
    assert_eq!(orbit.semi_major_axis(), 1.0e11);
    assert!(orbit.period().is_infinite());
    let h0 = orbit.specific_angular_momentum();
    let (r, v) = orbit.state_at(3.0e7);
    assert!(relative_error(&vector::cross(&r, &v), &h0) < 1e-8);
    assert!(vector::norm(&r) > vector::norm(&orbit.position()));
}

#[test]
fn hyperbolic_propagation_conserves_energy() {
    let orbit = Orbit::from_elements(MU_SUN, elements(5.0e10, 1.8, 0.3)).unwrap();
    let e0 = energy(MU_SUN, &orbit.position(), &orbit.velocity());
    for dt in [1.0e5, 1.0e7, 1.0e9] {
        let propagated = orbit.propagate(dt, &PropagationSettings::default());
        assert!(propagated.converged, "dt {dt}");
        let e = energy(MU_SUN, &propagated.position, &propagated.velocity);
        assert!((e - e0).abs() / e0.abs() < 1e-7, "dt {dt}: {e} vs {e0}");
    }
}

#[test]
fn hyperbolic_propagation_runs_backwards() {
    for eccentricity in [1.5, 2.0, 5.0] {
        let orbit = Orbit::from_elements(
            MU_SUN,
            ClassicalElements {
                true_anomaly: 0.0,
                ..elements(1.0e11, eccentricity, 0.3)
            },
        )
        .unwrap();
        let e0 = energy(MU_SUN, &orbit.position(), &orbit.velocity());
        for dt in [-1.0e8, -1.0e9] {
            let propagated = orbit.propagate(dt, &PropagationSettings::default());
            assert!(propagated.converged, "e {eccentricity}, dt {dt}");
            assert!(propagated.iterations < 16, "e {eccentricity}, dt {dt}");
            let e = energy(MU_SUN, &propagated.position, &propagated.velocity);
            assert!((e - e0).abs() / e0.abs() < 1e-7, "e {eccentricity}, dt {dt}");
            // Before periapsis the body is inbound.
            assert!(vector::dot(&propagated.position, &propagated.velocity) < 0.0);
        }

        let later = orbit.advanced(1.0e9).unwrap();
        let (r, v) = later.state_at(-1.0e9);
        assert!(relative_error(&r, &orbit.position()) < 1e-6, "e {eccentricity}");
        assert!(relative_error(&v, &orbit.velocity()) < 1e-6, "e {eccentricity}");
    }
}

#[test]
fn backwards_propagation_undoes_forwards() {
    let orbit = Orbit::from_elements(MU_SUN, elements(1.0e11, 0.6, 0.9)).unwrap();
    let later = orbit.advanced(1.0e7).unwrap();
    let (r, v) = later.state_at(-1.0e7);
    assert!(relative_error(&r, &orbit.position()) < 1e-6);
    assert!(relative_error(&v, &orbit.velocity()) < 1e-6);
}

#[test]
fn iteration_cap_returns_flagged_estimate() {
    let orbit = Orbit::from_elements(MU_SUN, elements(1.0e11, 0.5, 0.5)).unwrap();
    let settings = PropagationSettings {
        tolerance: 1e-15,
        max_iterations: 1,
    };
    let propagated = orbit.propagate(orbit.period() / 3.0, &settings);
    assert!(!propagated.converged);
    assert_eq!(propagated.iterations, 1);
    assert!(propagated.position.iter().all(|c| c.is_finite()));
}

#[test]
fn eccentricity_placement_keeps_distance() {
    let mut rng = SeededRandom::seed_from(3);
    let position = [4.0e10, -9.0e10, 2.0e10];
    for _ in 0..20 {
        let e = rng.uniform_range(0.0, 0.9);
        let orbit = Orbit::from_eccentricity_and_position(MU_SUN, e, position, &mut rng).unwrap();
        assert!(relative_error(&orbit.position(), &position) < 1e-9);
        assert!((orbit.eccentricity() - e).abs() < 1e-12);
        let rebuilt =
            Orbit::from_state_vectors(MU_SUN, orbit.position(), orbit.velocity()).unwrap();
        assert!((rebuilt.eccentricity() - e).abs() < 1e-6);
    }
}
