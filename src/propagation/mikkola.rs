//! Mikkola's cubic approximation followed by a fifth-order correction.
//!
//! Reference: Mikkola, "A cubic approximation for Kepler's equation",
//! Celestial Mechanics 40 (1987).

use crate::{
    angles::{
        eccentric_to_mean, eccentric_to_true, hyperbolic_to_mean, hyperbolic_to_true,
        true_to_eccentric, true_to_hyperbolic,
    },
    math::{sinhcosh, wrap_to_pi},
    KernelError, StateVectors,
};

use super::{propagate_elements, Propagator, PropagatorKind};

/// Advances the true anomaly by `tof` with Mikkola's method.
///
/// Elliptic mean anomalies are wrapped into `[-π, π)` before solving.
///
/// # Unchecked Operation
/// Parabolic orbits are not supported; [`Mikkola`] rejects them before
/// reaching this function.
pub fn mikkola_coe(mu: f64, p: f64, ecc: f64, nu: f64, tof: f64) -> f64 {
    let semi_major_axis = p / (1.0 - ecc * ecc);
    let mean_motion = (mu / semi_major_axis.abs().powi(3)).sqrt();
    let elliptic = ecc < 1.0;

    // Equation (9a)
    let (alpha, mean_anomaly0) = if elliptic {
        (
            (1.0 - ecc) / (4.0 * ecc + 0.5),
            eccentric_to_mean(true_to_eccentric(nu, ecc), ecc),
        )
    } else {
        (
            (ecc - 1.0) / (4.0 * ecc + 0.5),
            hyperbolic_to_mean(true_to_hyperbolic(nu, ecc), ecc),
        )
    };

    let mut m = mean_anomaly0 + mean_motion * tof;
    if elliptic {
        m = wrap_to_pi(m);
    }

    // Equation (9b)
    let beta = m / 2.0 / (4.0 * ecc + 0.5);
    let z = (beta + beta.signum() * (beta * beta + alpha * alpha * alpha).sqrt()).cbrt();
    let mut s = z - alpha / z;

    // Initial correction
    let s2 = s * s;
    s += if elliptic {
        -0.078 * s2 * s2 * s / (1.0 + ecc)
    } else {
        0.071 * s2 * s2 * s / (1.0 + 0.45 * s2) / (1.0 + 4.0 * s2) / ecc
    };

    let (anomaly, f, f1, f2, f3, f4, f5) = if elliptic {
        let anomaly = m + ecc * (3.0 * s - 4.0 * s * s * s);
        let (sin, cos) = anomaly.sin_cos();
        (
            anomaly,
            anomaly - ecc * sin - m,
            1.0 - ecc * cos,
            ecc * sin,
            ecc * cos,
            -ecc * sin,
            -ecc * cos,
        )
    } else {
        let anomaly = 3.0 * (s + (1.0 + s * s).sqrt()).ln();
        let (sinh, cosh) = sinhcosh(anomaly);
        (
            anomaly,
            -anomaly + ecc * sinh - m,
            -1.0 + ecc * cosh,
            ecc * sinh,
            ecc * cosh,
            ecc * sinh,
            ecc * cosh,
        )
    };

    // Taylor expansion up to fifth order
    let u1 = -f / f1;
    let u2 = -f / (f1 + 0.5 * f2 * u1);
    let u3 = -f / (f1 + 0.5 * f2 * u2 + f3 * u2 * u2 / 6.0);
    let u4 = -f / (f1 + 0.5 * f2 * u3 + f3 * u3 * u3 / 6.0 + f4 * u3 * u3 * u3 / 24.0);
    let u5 = -f
        / (f1
            + 0.5 * f2 * u4
            + f3 * u4 * u4 / 6.0
            + f4 * u4 * u4 * u4 / 24.0
            + f5 * u4 * u4 * u4 * u4 / 120.0);

    let anomaly = anomaly + u5;

    if elliptic {
        eccentric_to_true(anomaly, ecc)
    } else {
        hyperbolic_to_true(anomaly, ecc)
    }
}

/// Mikkola's propagator, for elliptic and hyperbolic orbits.
///
/// Never iterates, so it never fails to converge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mikkola;

impl Propagator for Mikkola {
    fn kind(&self) -> PropagatorKind {
        PropagatorKind::ELLIPTIC | PropagatorKind::HYPERBOLIC
    }

    fn propagate(
        &self,
        mu: f64,
        state: &StateVectors,
        tof: f64,
    ) -> Result<StateVectors, KernelError> {
        propagate_elements("mikkola", self.kind(), mu, state, |elements| {
            Ok(mikkola_coe(mu, elements.p, elements.ecc, elements.nu, tof))
        })
    }
}
