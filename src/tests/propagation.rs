use core::f64::consts::TAU;

use glam::DVec3;

use super::{assertions::*, iss, periapsis_state, seeders::*, EARTH_MU};
use crate::{
    classical_to_cartesian, d_to_m_near_parabolic, delta_t_from_nu, m_to_d_near_parabolic,
    nu_from_delta_t, parabolic_to_mean, s_x, vallado_fg, ClassicalElements, Cowell,
    CowellOptions, Danby, Farnocchia, Gooding, InputError, KernelError, Markley, Mikkola,
    NewtonOptions, Pimienta, Propagator, PropagatorKind, RecSeries, RecSeriesTermination,
    StateVectors, Vallado, NEAR_PARABOLIC_DELTA,
};

const PROPAGATION_ITERATIONS: usize = 200;

type Named = (&'static str, Box<dyn Propagator>);

fn boxed(name: &'static str, propagator: impl Propagator + 'static) -> Named {
    (name, Box::new(propagator))
}

fn elliptic_propagators() -> Vec<Named> {
    vec![
        boxed("farnocchia", Farnocchia::default()),
        boxed("vallado", Vallado::default()),
        boxed("mikkola", Mikkola),
        boxed("markley", Markley),
        boxed("pimienta", Pimienta),
        boxed("gooding", Gooding::default()),
        boxed("danby", Danby::default()),
        boxed("recseries", RecSeries::default()),
        boxed("cowell", Cowell::new()),
    ]
}

fn hyperbolic_propagators() -> Vec<Named> {
    vec![
        boxed("farnocchia", Farnocchia::default()),
        boxed("vallado", Vallado::default()),
        boxed("mikkola", Mikkola),
        boxed("danby", Danby::default()),
        boxed("cowell", Cowell::new()),
    ]
}

fn assert_all_agree(
    propagators: &[Named],
    mu: f64,
    state: &StateVectors,
    tof: f64,
    rtol: f64,
    what: &str,
) {
    let reference = Farnocchia::default().propagate(mu, state, tof).unwrap();

    for (name, propagator) in propagators {
        let propagated = propagator
            .propagate(mu, state, tof)
            .unwrap_or_else(|err| panic!("{name} failed on {what}: {err}"));

        assert_almost_eq_state(&reference, &propagated, rtol, &format!("{name} on {what}"));
    }
}

#[test]
fn iss_one_hour() {
    assert_all_agree(
        &elliptic_propagators(),
        EARTH_MU,
        &iss(),
        3600.0,
        1e-7,
        "ISS after one hour",
    );
}

#[test]
fn inclined_ellipse() {
    let elements = ClassicalElements::new(10000.0, 0.3, 0.5, 1.0, 2.0, 0.5);
    let state = classical_to_cartesian(EARTH_MU, &elements);

    assert_all_agree(
        &elliptic_propagators(),
        EARTH_MU,
        &state,
        4000.0,
        1e-7,
        "inclined ellipse",
    );
}

#[test]
fn random_ellipses() {
    let propagators = elliptic_propagators();

    for _ in 0..PROPAGATION_ITERATIONS {
        let elements = random_mildly_elliptic();
        let mu = random_mu();
        let state = classical_to_cartesian(mu, &elements);
        let period = elements.period(mu).unwrap();
        let tof = rand::random_range(-2.0..2.0) * period;

        // Cowell is too slow for a random sweep
        assert_all_agree(
            &propagators[..propagators.len() - 1],
            mu,
            &state,
            tof,
            1e-6,
            &format!("{elements:?} over {tof}"),
        );
    }
}

#[test]
fn random_eccentric_ellipses() {
    let propagators: Vec<Named> = elliptic_propagators()
        .into_iter()
        .filter(|(name, _)| !matches!(*name, "recseries" | "cowell"))
        .collect();

    for _ in 0..PROPAGATION_ITERATIONS {
        let elements = random_highly_elliptic();
        let mu = random_mu();
        let state = classical_to_cartesian(mu, &elements);
        let period = elements.period(mu).unwrap();
        let tof = rand::random_range(-2.0..2.0) * period;

        assert_all_agree(
            &propagators,
            mu,
            &state,
            tof,
            1e-6,
            &format!("{elements:?} over {tof}"),
        );
    }
}

#[test]
fn hyperbola() {
    assert_all_agree(
        &hyperbolic_propagators(),
        EARTH_MU,
        &periapsis_state(1.5),
        3600.0,
        1e-7,
        "hyperbola after one hour",
    );

    let elements = ClassicalElements::new(20000.0, 3.0, 1.0, 0.5, 0.2, -1.0);
    let state = classical_to_cartesian(EARTH_MU, &elements);
    assert_all_agree(
        &hyperbolic_propagators(),
        EARTH_MU,
        &state,
        10000.0,
        1e-7,
        "inbound hyperbola",
    );
}

#[test]
fn near_parabolic() {
    let cowell = Cowell::new();

    for ecc in [0.999, 1.001] {
        for tof in [100.0, 3600.0] {
            let state = periapsis_state(ecc);

            let farnocchia = Farnocchia::default().propagate(EARTH_MU, &state, tof).unwrap();
            let integrated = cowell.propagate(EARTH_MU, &state, tof).unwrap();

            assert_almost_eq_state(
                &integrated,
                &farnocchia,
                1e-7,
                &format!("e = {ecc} after {tof}"),
            );
        }
    }
}

#[test]
fn circular_quarter_orbit() {
    let state = periapsis_state(0.0);
    let period = TAU * (7000.0f64.powi(3) / EARTH_MU).sqrt();

    for (name, propagator) in elliptic_propagators() {
        let propagated = propagator.propagate(EARTH_MU, &state, period / 4.0).unwrap();

        assert_almost_eq_vec3(
            propagated.position,
            DVec3::new(0.0, 7000.0, 0.0),
            1e-3,
            &format!("{name} after a quarter period"),
        );
    }
}

#[test]
fn forward_then_backward() {
    let state = iss();

    for (name, propagator) in elliptic_propagators() {
        let there = propagator.propagate(EARTH_MU, &state, 2000.0).unwrap();
        let back = propagator.propagate(EARTH_MU, &there, -2000.0).unwrap();

        assert_almost_eq_state(&state, &back, 1e-7, &format!("{name} round trip"));
    }
}

#[test]
fn zero_time_of_flight() {
    let state = iss();

    for (name, propagator) in elliptic_propagators() {
        let propagated = propagator.propagate(EARTH_MU, &state, 0.0).unwrap();

        assert_almost_eq_state(&state, &propagated, 1e-7, &format!("{name} at tof = 0"));
    }
}

#[test]
fn regime_rejection() {
    let hyperbolic = periapsis_state(1.5);
    let elliptic_only: [(&str, &dyn Propagator); 4] = [
        ("markley", &Markley),
        ("pimienta", &Pimienta),
        ("gooding", &Gooding::default()),
        ("recseries", &RecSeries::default()),
    ];

    for (name, propagator) in elliptic_only {
        let result = propagator.propagate(EARTH_MU, &hyperbolic, 100.0);

        assert!(
            matches!(
                result,
                Err(KernelError::Input(InputError::UnsupportedEccentricity { .. }))
            ),
            "{name} accepted a hyperbola: {result:?}"
        );
    }
}

#[test]
fn invalid_gravitational_parameter() {
    for (name, propagator) in elliptic_propagators() {
        let result = propagator.propagate(0.0, &iss(), 100.0);

        assert!(
            matches!(
                result,
                Err(KernelError::Input(InputError::InvalidArgument { name: "mu", .. }))
            ),
            "{name} accepted mu = 0: {result:?}"
        );
    }
}

#[test]
fn propagator_kinds() {
    assert!(PropagatorKind::ALL.supports(1.0));
    assert!(PropagatorKind::ELLIPTIC.supports(0.0));
    assert!(!PropagatorKind::ELLIPTIC.supports(1.0));
    assert!(!Mikkola.kind().supports(1.0));
    assert!(Danby::default().kind().supports(4.0));
    assert!(PropagatorKind::ALL.contains(Markley.kind()));
    assert_eq!(
        PropagatorKind::ELLIPTIC | PropagatorKind::PARABOLIC | PropagatorKind::HYPERBOLIC,
        PropagatorKind::ALL
    );

    let err = Markley.kind().check("markley", 1.2).unwrap_err();
    assert!(matches!(
        err,
        InputError::UnsupportedEccentricity {
            algorithm: "markley",
            ..
        }
    ));
}

#[test]
fn near_parabolic_series() {
    assert_almost_eq(s_x(1.0, 0.0), 1.0 - 1.0 / 3.0, "S(0)");

    // At e = 1 the series collapses to Barker's equation
    for d in [-2.0, -0.3, 0.0, 0.7, 3.0] {
        assert_almost_eq(
            d_to_m_near_parabolic(d, 1.0),
            parabolic_to_mean(d),
            &format!("M at D = {d}"),
        );
    }

    for ecc in [0.995, 1.005] {
        for d in [-0.5, 0.1, 0.4] {
            let m = d_to_m_near_parabolic(d, ecc);
            let solved = m_to_d_near_parabolic(m, ecc, NewtonOptions::ELLIPTIC).unwrap();

            assert_almost_eq(solved, d, &format!("D → M → D for e = {ecc}"));
        }
    }
}

#[test]
fn time_since_periapsis_round_trips() {
    let q = 7000.0;

    for ecc in [0.0, 0.5, 0.995, 1.0, 1.005, 2.0] {
        for nu in [-1.0, 0.3, 1.0] {
            let delta_t = delta_t_from_nu(nu, ecc, EARTH_MU, q, NEAR_PARABOLIC_DELTA).unwrap();
            let back = nu_from_delta_t(delta_t, ecc, EARTH_MU, q, NEAR_PARABOLIC_DELTA).unwrap();

            assert_almost_eq(back, nu, &format!("ν → Δt → ν for e = {ecc}"));
        }
    }
}

#[test]
fn beyond_the_asymptotes() {
    let result = delta_t_from_nu(2.5, 2.0, EARTH_MU, 7000.0, NEAR_PARABOLIC_DELTA);

    assert!(
        matches!(result, Err(InputError::InvalidArgument { name: "nu", .. })),
        "{result:?}"
    );
}

#[test]
fn lagrange_coefficients() {
    let coefficients = vallado_fg(EARTH_MU, &iss(), 3600.0, 350).unwrap();

    assert_almost_eq_tol(coefficients.wronskian(), 1.0, 1e-7, "f ġ - ḟ g");
}

#[test]
fn recseries_terminations() {
    let state = classical_to_cartesian(
        EARTH_MU,
        &ClassicalElements::new(10000.0, 0.3, 0.5, 1.0, 2.0, 0.5),
    );

    let starved = RecSeries {
        numiter: 1,
        ..RecSeries::default()
    };
    let result = starved.propagate(EARTH_MU, &state, 1000.0);
    assert!(
        matches!(result, Err(KernelError::Convergence(_))),
        "{result:?}"
    );

    // A fixed order never fails, it is only approximate
    let fixed = RecSeries {
        termination: RecSeriesTermination::Order,
        order: 40,
        ..RecSeries::default()
    };
    let reference = Farnocchia::default().propagate(EARTH_MU, &state, 1000.0).unwrap();
    let approximate = fixed.propagate(EARTH_MU, &state, 1000.0).unwrap();
    assert_almost_eq_state(&reference, &approximate, 1e-6, "fixed-order recseries");
}

#[test]
fn recseries_budget_at_high_eccentricity() {
    let state = periapsis_state(0.99);

    let result = RecSeries::default().propagate(EARTH_MU, &state, 100.0);
    assert!(
        matches!(result, Err(KernelError::Convergence(_))),
        "{result:?}"
    );

    let patient = RecSeries {
        numiter: 10_000,
        ..RecSeries::default()
    };
    let reference = Farnocchia::default().propagate(EARTH_MU, &state, 100.0).unwrap();
    let propagated = patient.propagate(EARTH_MU, &state, 100.0).unwrap();
    assert_almost_eq_state(&reference, &propagated, 1e-4, "recseries with a raised budget");
}

#[test]
fn cowell_step_budget() {
    let starved = Cowell::new().with_options(CowellOptions {
        max_steps: 3,
        ..CowellOptions::default()
    });

    let result = starved.propagate(EARTH_MU, &iss(), 3600.0);

    assert!(
        matches!(result, Err(KernelError::Convergence(_))),
        "{result:?}"
    );
}

#[test]
fn cowell_perturbation() {
    let state = iss();

    let null = Cowell::new().with_perturbation(|_t: f64, _r: DVec3, _v: DVec3| DVec3::ZERO);
    let pure = Cowell::new().propagate(EARTH_MU, &state, 1800.0).unwrap();
    let with_null = null.propagate(EARTH_MU, &state, 1800.0).unwrap();
    assert_almost_eq_state(&pure, &with_null, 1e-12, "null perturbation");

    // Thrusting along the velocity raises the orbit
    let push = Cowell::new().with_perturbation(|_t: f64, _r: DVec3, v: DVec3| v.normalize() * 1e-5);
    let pushed = push.propagate(EARTH_MU, &state, 1800.0).unwrap();
    let energy =
        |s: &StateVectors| s.velocity.length_squared() / 2.0 - EARTH_MU / s.position.length();
    assert!(energy(&pushed) > energy(&pure));
}
