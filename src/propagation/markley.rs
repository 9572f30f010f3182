//! Markley's non-iterative solution of the elliptic Kepler equation.
//!
//! Reference: Markley, "Kepler equation solver", Celestial Mechanics and
//! Dynamical Astronomy 63 (1995).

use core::f64::consts::PI;

use crate::{
    angles::{eccentric_to_mean, eccentric_to_true, true_to_eccentric},
    math::wrap_to_pi,
    solvers::{keplers_equation, keplers_equation_derivative},
    KernelError, StateVectors,
};

use super::{propagate_elements, Propagator, PropagatorKind};

/// Advances the true anomaly by `tof` with Markley's method: a Padé
/// approximation of `sin(E)` turns the Kepler equation into a cubic, whose
/// root is polished by one fifth-order correction.
///
/// # Unchecked Operation
/// Meaningful only for `0 <= e < 1`.
pub fn markley_coe(mu: f64, p: f64, ecc: f64, nu: f64, tof: f64) -> f64 {
    let mean_anomaly0 = eccentric_to_mean(true_to_eccentric(nu, ecc), ecc);
    let semi_major_axis = p / (1.0 - ecc * ecc);
    let mean_motion = (mu / semi_major_axis.powi(3)).sqrt();
    let m = wrap_to_pi(mean_anomaly0 + mean_motion * tof);

    // Equation (20)
    let alpha = (3.0 * PI * PI + 1.6 * (PI - m.abs()) / (1.0 + ecc)) / (PI * PI - 6.0);

    // Equation (5)
    let d = 3.0 * (1.0 - ecc) + alpha * ecc;

    // Equations (9) and (10)
    let q = 2.0 * alpha * d * (1.0 - ecc) - m * m;
    let r = 3.0 * alpha * d * (d - 1.0 + ecc) * m + m * m * m;

    // Equation (14)
    let w = (r.abs() + (q * q * q + r * r).sqrt()).powf(2.0 / 3.0);

    // Equation (15), where w vanishes only for a circular orbit at m = 0
    let ecc_anomaly = if w == 0.0 {
        m / d
    } else {
        (2.0 * r * w / (w * w + w * q + q * q) + m) / d
    };

    // Equation (26)
    let f0 = keplers_equation(m, ecc_anomaly, ecc);
    let f1 = keplers_equation_derivative(ecc_anomaly, ecc);
    let f2 = ecc * ecc_anomaly.sin();
    let f3 = ecc * ecc_anomaly.cos();
    let f4 = -f2;

    // Equation (22)
    let delta3 = -f0 / (f1 - 0.5 * f0 * f2 / f1);
    let delta4 = -f0 / (f1 + 0.5 * delta3 * f2 + f3 * delta3 * delta3 / 6.0);
    let delta5 = -f0
        / (f1
            + 0.5 * delta4 * f2
            + f3 * delta4 * delta4 / 6.0
            + f4 * delta4 * delta4 * delta4 / 24.0);

    eccentric_to_true(ecc_anomaly + delta5, ecc)
}

/// Markley's propagator, for elliptic orbits.
///
/// Never iterates, so it never fails to converge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Markley;

impl Propagator for Markley {
    fn kind(&self) -> PropagatorKind {
        PropagatorKind::ELLIPTIC
    }

    fn propagate(
        &self,
        mu: f64,
        state: &StateVectors,
        tof: f64,
    ) -> Result<StateVectors, KernelError> {
        propagate_elements("markley", self.kind(), mu, state, |elements| {
            Ok(markley_coe(mu, elements.p, elements.ecc, elements.nu, tof))
        })
    }
}
