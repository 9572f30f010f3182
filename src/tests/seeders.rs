use core::f64::consts::TAU;

use crate::ClassicalElements;

pub(super) fn random_mu() -> f64 {
    rand::random_range(1e3..1e6)
}

fn random_inclination() -> f64 {
    if rand::random_bool(0.5) {
        rand::random_range(0.01..3.1)
    } else {
        0.0
    }
}

pub(super) fn random_circular() -> ClassicalElements {
    ClassicalElements::new(
        rand::random_range(1e3..1e5),
        0.0,
        random_inclination(),
        rand::random_range(0.0..TAU),
        rand::random_range(0.0..TAU),
        rand::random_range(0.0..TAU),
    )
}

pub(super) fn random_elliptic() -> ClassicalElements {
    ClassicalElements::new(
        rand::random_range(1e3..1e5),
        rand::random_range(0.01..0.9),
        random_inclination(),
        rand::random_range(0.0..TAU),
        rand::random_range(0.0..TAU),
        rand::random_range(0.0..TAU),
    )
}

pub(super) fn random_highly_elliptic() -> ClassicalElements {
    ClassicalElements {
        ecc: rand::random_range(0.5..0.99),
        ..random_elliptic()
    }
}

/// Elliptic, but mild enough for the fixed-point series solvers.
pub(super) fn random_mildly_elliptic() -> ClassicalElements {
    ClassicalElements {
        ecc: rand::random_range(0.01..0.5),
        ..random_elliptic()
    }
}

pub(super) fn random_hyperbolic() -> ClassicalElements {
    let ecc: f64 = rand::random_range(1.1..5.0);
    // Stay well inside the asymptotes
    let nu_max = 0.9 * (-1.0 / ecc).acos();

    ClassicalElements::new(
        rand::random_range(1e3..1e5),
        ecc,
        random_inclination(),
        rand::random_range(0.0..TAU),
        rand::random_range(0.0..TAU),
        rand::random_range(-nu_max..nu_max),
    )
}

pub(super) fn random_nonparabolic() -> ClassicalElements {
    const FNS: &[fn() -> ClassicalElements] =
        &[random_circular, random_elliptic, random_hyperbolic];

    let i = rand::random_range(0..FNS.len());

    FNS[i]()
}

pub(super) fn random_nonparabolic_iter(iters: usize) -> impl Iterator<Item = ClassicalElements> {
    (0..iters).map(|_| random_nonparabolic())
}
