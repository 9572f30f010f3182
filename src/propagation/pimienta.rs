//! Pimienta's approach to the elliptic Kepler equation: rewrite it in
//! `x = sin(E / 3)`, where it becomes nearly polynomial, solve the leading
//! cubic in closed form, then polish.
//!
//! Reference: Pimienta-Peñalver and Crassidis, "Accurate Kepler equation
//! solver without transcendental function evaluations", Journal of the
//! Astronautical Sciences 60 (2013).

use crate::{
    angles::{eccentric_to_mean, eccentric_to_true, true_to_eccentric},
    math::wrap_to_pi,
    solvers::{keplers_equation, keplers_equation_derivative},
    ConvergenceFailure, KernelError, StateVectors,
};

use super::{propagate_elements, Propagator, PropagatorKind};

/// Odd Taylor coefficients of `3 asin(x)`, from `x` up to `x^15`.
const THREE_ASIN: [f64; 8] = [
    3.0,
    1.0 / 2.0,
    9.0 / 40.0,
    15.0 / 112.0,
    35.0 / 384.0,
    189.0 / 2816.0,
    693.0 / 13312.0,
    429.0 / 10240.0,
];

/// Newton steps on the truncated polynomial.
const POLYNOMIAL_STEPS: u32 = 2;

/// Cap on the exact fifth-order corrections.
const MAX_CORRECTIONS: u32 = 6;

/// Corrections smaller than this end the polishing.
const CORRECTION_TOL: f64 = 1e-14;

/// `3 asin(x)` truncated at `x^15`, and its derivative.
fn three_asin_series(x: f64) -> (f64, f64) {
    let x2 = x * x;
    let mut value = 0.0;
    let mut derivative = 0.0;
    // x^(2j), so that x^(2j + 1) = x_even * x
    let mut x_even = 1.0;

    for (j, coefficient) in THREE_ASIN.iter().enumerate() {
        value += coefficient * x_even * x;
        derivative += coefficient * (2 * j + 1) as f64 * x_even;
        x_even *= x2;
    }

    (value, derivative)
}

/// Solves the elliptic Kepler equation for `E` with `M` in `[-π, π]`.
fn solve(m: f64, ecc: f64) -> Result<f64, ConvergenceFailure> {
    // With sin(E) = 3x - 4x³ and 3 asin(x) ≈ 3x + x³ / 2, the Kepler
    // equation becomes c3 x³ + c1 x = M.
    let c1 = 3.0 * (1.0 - ecc);
    let c3 = 0.5 + 4.0 * ecc;
    let a = c1 / c3;
    let b = -m / c3;
    let y = (b * b / 4.0 + a * a * a / 27.0).sqrt();
    let mut x = (-b / 2.0 + y).cbrt() - (b / 2.0 + y).cbrt();

    for _ in 0..POLYNOMIAL_STEPS {
        let (series, series_prime) = three_asin_series(x);
        let residual = series - ecc * (3.0 * x - 4.0 * x * x * x) - m;
        let slope = series_prime - ecc * (3.0 - 12.0 * x * x);
        x -= residual / slope;
    }

    let mut ecc_anomaly = 3.0 * x.clamp(-1.0, 1.0).asin();

    for _ in 0..MAX_CORRECTIONS {
        let (sin, cos) = ecc_anomaly.sin_cos();
        let f = keplers_equation(m, ecc_anomaly, ecc);
        let f1 = keplers_equation_derivative(ecc_anomaly, ecc);
        let (f2, f3, f4) = (ecc * sin, ecc * cos, -ecc * sin);

        let u1 = -f / f1;
        let u2 = -f / (f1 + 0.5 * f2 * u1);
        let u3 = -f / (f1 + 0.5 * f2 * u2 + f3 * u2 * u2 / 6.0);
        let u4 = -f / (f1 + 0.5 * f2 * u3 + f3 * u3 * u3 / 6.0 + f4 * u3 * u3 * u3 / 24.0);

        ecc_anomaly += u4;

        if u4.abs() < CORRECTION_TOL {
            return Ok(ecc_anomaly);
        }
    }

    log::debug!("pimienta: corrections did not settle (E = {ecc_anomaly})");

    Err(ConvergenceFailure {
        iterations: MAX_CORRECTIONS,
        last_estimate: ecc_anomaly,
    })
}

/// Advances the true anomaly by `tof` with Pimienta's method.
///
/// # Unchecked Operation
/// Meaningful only for `0 <= e < 1`.
///
/// # Errors
/// Returns a [`ConvergenceFailure`] if the final corrections do not
/// settle.
pub fn pimienta_coe(mu: f64, p: f64, ecc: f64, nu: f64, tof: f64) -> Result<f64, KernelError> {
    let mean_anomaly0 = eccentric_to_mean(true_to_eccentric(nu, ecc), ecc);
    let semi_major_axis = p / (1.0 - ecc * ecc);
    let mean_motion = (mu / semi_major_axis.powi(3)).sqrt();
    let m = wrap_to_pi(mean_anomaly0 + mean_motion * tof);

    Ok(eccentric_to_true(solve(m, ecc)?, ecc))
}

/// Pimienta's propagator, for elliptic orbits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pimienta;

impl Propagator for Pimienta {
    fn kind(&self) -> PropagatorKind {
        PropagatorKind::ELLIPTIC
    }

    fn propagate(
        &self,
        mu: f64,
        state: &StateVectors,
        tof: f64,
    ) -> Result<StateVectors, KernelError> {
        propagate_elements("pimienta", self.kind(), mu, state, |elements| {
            pimienta_coe(mu, elements.p, elements.ecc, elements.nu, tof)
        })
    }
}
