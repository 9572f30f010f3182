//! Gooding's iteration on the elliptic Kepler equation, written in terms
//! of `psi = E - M`.
//!
//! Reference: Gooding and Odell, "The hyperbolic Kepler equation (and the
//! elliptic equation revisited)", Celestial Mechanics 44 (1988).

use crate::{
    angles::{eccentric_to_mean, eccentric_to_true, true_to_eccentric},
    ConvergenceFailure, KernelError, StateVectors,
};

use super::{propagate_elements, Propagator, PropagatorKind};

/// Default iteration cap.
pub const GOODING_MAX_ITERS: u32 = 150;

/// Default tolerance on the squared residual.
pub const GOODING_RTOL: f64 = 1e-8;

/// Advances the true anomaly by `tof` with Gooding's method.
///
/// The iteration stops once the squared residual drops under `rtol`.
///
/// # Unchecked Operation
/// Meaningful only for `0 <= e < 1`.
///
/// # Errors
/// Returns a [`ConvergenceFailure`] when `numiter` iterations were not
/// enough.
pub fn gooding_coe(
    mu: f64,
    p: f64,
    ecc: f64,
    nu: f64,
    tof: f64,
    numiter: u32,
    rtol: f64,
) -> Result<f64, KernelError> {
    let mean_anomaly0 = eccentric_to_mean(true_to_eccentric(nu, ecc), ecc);
    let semi_major_axis = p / (1.0 - ecc * ecc);
    let mean_motion = (mu / semi_major_axis.abs().powi(3)).sqrt();
    let m = mean_anomaly0 + mean_motion * tof;

    let (sin_m, cos_m) = m.sin_cos();
    let c = ecc * cos_m;
    let s = ecc * sin_m;
    let mut psi = s / (1.0 - 2.0 * c + ecc * ecc).sqrt();
    let mut f: f64 = 1.0;
    let mut iterations = 0;

    while f * f >= rtol {
        if iterations > numiter {
            log::debug!("gooding: no convergence within {numiter} steps (psi = {psi})");
            return Err(ConvergenceFailure {
                iterations,
                last_estimate: m + psi,
            }
            .into());
        }

        let (eta, xi) = psi.sin_cos();
        let fd = (1.0 - c * xi) + s * eta;
        let fdd = c * eta + s * xi;
        f = psi - fdd;
        psi -= f * fd / (fd * fd - 0.5 * f * fdd);
        iterations += 1;
    }

    Ok(eccentric_to_true(m + psi, ecc))
}

/// Gooding's propagator, for elliptic orbits.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Gooding {
    /// Maximum number of iterations.
    pub numiter: u32,
    /// Tolerance on the squared residual.
    pub rtol: f64,
}

impl Default for Gooding {
    fn default() -> Self {
        Self {
            numiter: GOODING_MAX_ITERS,
            rtol: GOODING_RTOL,
        }
    }
}

impl Propagator for Gooding {
    fn kind(&self) -> PropagatorKind {
        PropagatorKind::ELLIPTIC
    }

    fn propagate(
        &self,
        mu: f64,
        state: &StateVectors,
        tof: f64,
    ) -> Result<StateVectors, KernelError> {
        propagate_elements("gooding", self.kind(), mu, state, |elements| {
            gooding_coe(
                mu,
                elements.p,
                elements.ecc,
                elements.nu,
                tof,
                self.numiter,
                self.rtol,
            )
        })
    }
}
