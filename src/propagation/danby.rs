//! Danby's method: a third-order Householder iteration on the Kepler
//! equation, seeded close to the root.
//!
//! Reference: Danby, "The solution of Kepler's equation, III",
//! Celestial Mechanics 40 (1987).

use core::f64::consts::TAU;

use crate::{
    angles::{
        eccentric_to_mean, eccentric_to_true, hyperbolic_to_mean, mean_to_eccentric,
        true_to_eccentric, true_to_hyperbolic,
    },
    ConvergenceFailure, KernelError, Regime, StateVectors,
};

use super::{propagate_elements, Propagator, PropagatorKind};

/// Default iteration cap.
pub const DANBY_MAX_ITERS: u32 = 20;

/// Default tolerance on the Kepler equation residual.
pub const DANBY_RTOL: f64 = 1e-8;

/// Advances the true anomaly by `tof` with Danby's method.
///
/// # Unchecked Operation
/// Parabolic orbits are not supported; [`Danby`] rejects them before
/// reaching this function.
///
/// # Errors
/// Returns a [`ConvergenceFailure`] when the residual is still above
/// `rtol` after `numiter` iterations.
pub fn danby_coe(
    mu: f64,
    p: f64,
    ecc: f64,
    nu: f64,
    tof: f64,
    numiter: u32,
    rtol: f64,
) -> Result<f64, KernelError> {
    let semi_major_axis = p / (1.0 - ecc * ecc);
    let mean_motion = (mu / semi_major_axis.abs().powi(3)).sqrt();

    let elliptic = ecc < 1.0;

    let (xma, mut anomaly) = match Regime::of(ecc) {
        Regime::Circular => {
            let mean_anomaly = eccentric_to_mean(true_to_eccentric(nu, ecc), ecc);
            let mean_anomaly = mean_anomaly + mean_motion * tof;
            return Ok(eccentric_to_true(mean_to_eccentric(mean_anomaly, ecc)?, ecc));
        }
        Regime::Elliptic => {
            let mean_anomaly = eccentric_to_mean(true_to_eccentric(nu, ecc), ecc);
            let xma = (mean_anomaly + mean_motion * tof).rem_euclid(TAU);
            (xma, xma + 0.85 * xma.sin().signum() * ecc)
        }
        Regime::Parabolic | Regime::Hyperbolic => {
            let mean_anomaly = hyperbolic_to_mean(true_to_hyperbolic(nu, ecc), ecc);
            let xma = mean_anomaly + mean_motion * tof;
            // Odd in the mean anomaly, so that both branches start close
            (xma, xma.signum() * (2.0 * xma.abs() / ecc + 1.8).ln())
        }
    };

    for _ in 0..=numiter {
        let (f, fp, fpp, fppp) = if elliptic {
            let (sin, cos) = anomaly.sin_cos();
            let (s, c) = (ecc * sin, ecc * cos);
            (anomaly - s - xma, 1.0 - c, s, c)
        } else {
            let (s, c) = (ecc * anomaly.sinh(), ecc * anomaly.cosh());
            (s - anomaly - xma, c - 1.0, s, c)
        };

        if f.abs() <= rtol {
            let (sta, cta) = if elliptic {
                (
                    (1.0 - ecc * ecc).sqrt() * anomaly.sin(),
                    anomaly.cos() - ecc,
                )
            } else {
                (
                    (ecc * ecc - 1.0).sqrt() * anomaly.sinh(),
                    ecc - anomaly.cosh(),
                )
            };

            return Ok(sta.atan2(cta));
        }

        let delta = -f / fp;
        let delta_star = -f / (fp + 0.5 * delta * fpp);
        let delta_k = -f / (fp + 0.5 * delta_star * fpp + delta_star * delta_star * fppp / 6.0);
        anomaly += delta_k;
    }

    log::debug!("danby: no convergence within {numiter} steps");

    Err(ConvergenceFailure {
        iterations: numiter,
        last_estimate: anomaly,
    }
    .into())
}

/// Danby's propagator, for elliptic and hyperbolic orbits.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Danby {
    /// Maximum number of iterations.
    pub numiter: u32,
    /// Tolerance on the Kepler equation residual.
    pub rtol: f64,
}

impl Default for Danby {
    fn default() -> Self {
        Self {
            numiter: DANBY_MAX_ITERS,
            rtol: DANBY_RTOL,
        }
    }
}

impl Propagator for Danby {
    fn kind(&self) -> PropagatorKind {
        PropagatorKind::ELLIPTIC | PropagatorKind::HYPERBOLIC
    }

    fn propagate(
        &self,
        mu: f64,
        state: &StateVectors,
        tof: f64,
    ) -> Result<StateVectors, KernelError> {
        propagate_elements("danby", self.kind(), mu, state, |elements| {
            danby_coe(
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
