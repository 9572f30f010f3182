use core::f64::consts::{FRAC_PI_2, PI};

use super::{assertions::*, RANDOM_ITERATIONS};
use crate::{
    eccentric_to_mean, eccentric_to_true, flight_path_angle, flight_path_angle_vector,
    hyperbolic_to_mean, hyperbolic_to_true, mean_to_eccentric, mean_to_eccentric_broadcast,
    mean_to_eccentric_vector, mean_to_hyperbolic, mean_to_parabolic, mean_to_parabolic_vector,
    parabolic_to_mean, parabolic_to_true, true_to_eccentric, true_to_eccentric_vector,
    true_to_hyperbolic, true_to_parabolic, Anomaly, AnomalyKind, Broadcast, InputError,
    KernelError, Regime,
};

/// (eccentricity, eccentric anomaly, true anomaly), in degrees.
const ELLIPTIC_ANGLES: [(f64, f64, f64); 5] = [
    (0.0, 0.0, 0.0),
    (0.05, 10.52321, 11.05994),
    (0.10, 54.67466, 59.49810),
    (0.35, 142.27123, 153.32411),
    (0.61, 161.87359, 171.02189),
];

#[test]
fn elliptic_reference_angles() {
    for (ecc, ecc_anomaly, nu) in ELLIPTIC_ANGLES {
        let (ecc_anomaly, nu) = (ecc_anomaly.to_radians(), nu.to_radians());

        assert_almost_eq(
            true_to_eccentric(nu, ecc),
            ecc_anomaly,
            &format!("E from ν for e = {ecc}"),
        );
        assert_almost_eq(
            eccentric_to_true(ecc_anomaly, ecc),
            nu,
            &format!("ν from E for e = {ecc}"),
        );
    }
}

#[test]
fn vallado_kepler_examples() {
    // Vallado, examples 2-1 and 2-3
    let m = 235.4f64.to_radians();

    let ecc_anomaly = mean_to_eccentric(m, 0.4).unwrap();
    assert_almost_eq_tol(ecc_anomaly, 3.848_661_745, 1e-8, "E for e = 0.4");

    let hyp_anomaly = mean_to_hyperbolic(m, 2.4).unwrap();
    assert_almost_eq_tol(hyp_anomaly, 1.601_376_144, 1e-6, "F for e = 2.4");
}

#[test]
fn barker_solution() {
    assert_almost_eq_tol(
        mean_to_parabolic(0.5),
        0.466_220_523_910_773_45,
        1e-12,
        "D for M = 0.5",
    );

    for _ in 0..RANDOM_ITERATIONS {
        let m = rand::random_range(-100.0..100.0);
        let d = mean_to_parabolic(m);

        assert_almost_eq(parabolic_to_mean(d), m, &format!("Barker round trip of {m}"));
    }
}

#[test]
fn elliptic_round_trips() {
    for _ in 0..RANDOM_ITERATIONS {
        let ecc = rand::random_range(0.0..0.9);
        let nu = rand::random_range(-3.1..3.1);

        let ecc_anomaly = true_to_eccentric(nu, ecc);
        assert_almost_eq(eccentric_to_true(ecc_anomaly, ecc), nu, "ν → E → ν");

        let m = eccentric_to_mean(ecc_anomaly, ecc);
        let solved = mean_to_eccentric(m, ecc).unwrap();
        assert_almost_eq(solved, ecc_anomaly, &format!("E → M → E for e = {ecc}"));
    }
}

#[test]
fn hyperbolic_round_trips() {
    for _ in 0..RANDOM_ITERATIONS {
        let ecc: f64 = rand::random_range(1.05..8.0);
        let nu_max = 0.95 * (-1.0 / ecc).acos();
        let nu = rand::random_range(-nu_max..nu_max);

        let hyp_anomaly = true_to_hyperbolic(nu, ecc);
        assert_almost_eq(hyperbolic_to_true(hyp_anomaly, ecc), nu, "ν → F → ν");

        let m = hyperbolic_to_mean(hyp_anomaly, ecc);
        let solved = mean_to_hyperbolic(m, ecc).unwrap();
        assert_almost_eq(solved, hyp_anomaly, &format!("F → M → F for e = {ecc}"));
    }
}

#[test]
fn parabolic_anomaly() {
    assert_almost_eq(true_to_parabolic(FRAC_PI_2), 1.0, "D at ν = 90°");
    assert_almost_eq(parabolic_to_true(1.0), FRAC_PI_2, "ν at D = 1");
}

#[test]
fn half_angle_results_stay_in_principal_range() {
    for nu in [-3.0 * PI + 0.1, 2.5 * PI, 7.0] {
        let ecc_anomaly = true_to_eccentric(nu, 0.3);
        assert!(
            -PI < ecc_anomaly && ecc_anomaly <= PI,
            "E = {ecc_anomaly} for ν = {nu}"
        );
    }
}

#[test]
fn flight_path_angles() {
    assert_eq!(flight_path_angle(1.2, 0.0), 0.0);
    assert_almost_eq(flight_path_angle(0.0, 0.7), 0.0, "at periapsis");
    assert_almost_eq(
        flight_path_angle(FRAC_PI_2, 0.5),
        0.5f64.atan(),
        "at ν = 90°, e = 0.5",
    );
    assert_almost_eq(
        flight_path_angle(-FRAC_PI_2, 0.5),
        -(0.5f64.atan()),
        "at ν = -90°, e = 0.5",
    );
}

#[test]
fn regimes() {
    assert_eq!(Regime::of(0.0), Regime::Circular);
    assert_eq!(Regime::of(1e-12), Regime::Elliptic);
    assert_eq!(Regime::of(1.0), Regime::Parabolic);
    assert_eq!(Regime::of(1.0 + 1e-12), Regime::Hyperbolic);
    assert_eq!(Regime::of(-0.5), Regime::Elliptic);
    assert_eq!(Regime::of(f64::NAN), Regime::Hyperbolic);
    assert!(Regime::Circular.is_closed());
    assert!(!Regime::Parabolic.is_closed());
}

#[test]
fn vector_length_mismatch() {
    let result = true_to_eccentric_vector(&[0.1, 0.2], &[0.1, 0.2, 0.3]);

    assert_eq!(result, Err(InputError::LengthMismatch { left: 2, right: 3 }));

    let result = flight_path_angle_vector(&[0.1], &[]);
    assert_eq!(result, Err(InputError::LengthMismatch { left: 1, right: 0 }));
}

#[test]
fn vector_matches_scalar() {
    let nus = [0.1, 1.0, -2.0, 3.0];
    let eccs = [0.0, 0.2, 0.5, 0.9];

    let vector = true_to_eccentric_vector(&nus, &eccs).unwrap();

    for ((nu, ecc), ecc_anomaly) in nus.iter().zip(eccs).zip(vector) {
        assert_eq!(ecc_anomaly, true_to_eccentric(*nu, ecc));
    }

    let ms = [0.0, 1.0, -30.0];
    let ds = mean_to_parabolic_vector(&ms);
    assert_eq!(ds.len(), ms.len());
    assert_eq!(ds[1], mean_to_parabolic(1.0));
}

#[test]
fn vector_failures_stay_per_element() {
    let solved = mean_to_eccentric_vector(&[0.5, f64::NAN, 2.0], &[0.1, 0.1, 0.1]).unwrap();

    assert!(solved[0].is_ok());
    assert!(solved[1].is_err());
    assert!(solved[2].is_ok());
}

#[test]
fn broadcasting() {
    let eccs = [0.1, 0.2, 0.3];
    let ms = [0.4, 0.5];

    let scalar = mean_to_eccentric_broadcast(Broadcast::Scalar(1.0), Broadcast::Scalar(0.1)).unwrap();
    assert_eq!(scalar.len(), 1);

    let spread = mean_to_eccentric_broadcast(Broadcast::Slice(&eccs), Broadcast::Scalar(0.2)).unwrap();
    assert_eq!(spread.len(), 3);

    let mismatch = mean_to_eccentric_broadcast(Broadcast::Slice(&ms), Broadcast::Slice(&eccs));
    assert_eq!(
        mismatch,
        Err(InputError::LengthMismatch { left: 2, right: 3 })
    );
}

#[test]
fn anomaly_conversions() {
    let nu = Anomaly::new(AnomalyKind::True, 1.0);

    let mean = nu.convert(AnomalyKind::Mean, 0.3).unwrap();
    assert_eq!(mean.kind, AnomalyKind::Mean);

    let back = mean.convert(AnomalyKind::True, 0.3).unwrap();
    assert_almost_eq(back.value, 1.0, "ν → M → ν");

    let hyperbolic = nu.convert(AnomalyKind::Hyperbolic, 1.5).unwrap();
    assert_almost_eq(hyperbolic.value, true_to_hyperbolic(1.0, 1.5), "ν → F");

    let same = nu.convert(AnomalyKind::True, 5.0).unwrap();
    assert_eq!(same, nu);
}

#[test]
fn anomaly_kind_outside_its_regime() {
    let ecc_anomaly = Anomaly::new(AnomalyKind::Eccentric, 0.5);

    let result = ecc_anomaly.convert(AnomalyKind::True, 1.5);
    assert!(
        matches!(
            result,
            Err(KernelError::Input(InputError::UnsupportedEccentricity { .. }))
        ),
        "{result:?}"
    );

    let result = Anomaly::new(AnomalyKind::True, 0.5).convert(AnomalyKind::Parabolic, 0.5);
    assert!(result.is_err(), "{result:?}");

    // Even without a change of kind
    let result = ecc_anomaly.convert(AnomalyKind::Eccentric, 3.0);
    assert!(
        matches!(
            result,
            Err(KernelError::Input(InputError::UnsupportedEccentricity { .. }))
        ),
        "{result:?}"
    );

    let hyp_anomaly = Anomaly::new(AnomalyKind::Hyperbolic, 0.5);
    assert!(hyp_anomaly.convert(AnomalyKind::Hyperbolic, 0.5).is_err());
    assert_eq!(
        hyp_anomaly.convert(AnomalyKind::Hyperbolic, 2.0).unwrap(),
        hyp_anomaly
    );
}
