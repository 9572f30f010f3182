//! Universal-variable propagation with the Lagrange coefficients.
//!
//! Reference: Vallado, "Fundamentals of Astrodynamics and Applications",
//! 4th edition, algorithm 8 (KEPLER).

use crate::{
    math::{stumpff_c2, stumpff_c3},
    ConvergenceFailure, KernelError, StateVectors,
};

use super::{check_mu, Propagator, PropagatorKind};

/// Default iteration cap of the universal Kepler equation.
pub const VALLADO_MAX_ITERS: u32 = 350;

/// Step tolerance on the universal variable.
const UNIVERSAL_TOL: f64 = 1e-7;

/// Largest acceptable deviation of `f ġ - ḟ g` from 1.
const WRONSKIAN_TOL: f64 = 1e-5;

/// The Lagrange coefficients mapping an initial state to a later one:
///
/// ```text
/// r = f r0 + g v0
/// v = ḟ r0 + ġ v0
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LagrangeCoefficients {
    /// Coefficient of `r0` in the position.
    pub f: f64,
    /// Coefficient of `v0` in the position.
    pub g: f64,
    /// Coefficient of `r0` in the velocity.
    pub fdot: f64,
    /// Coefficient of `v0` in the velocity.
    pub gdot: f64,
}

impl LagrangeCoefficients {
    /// `f ġ - ḟ g`, which equals 1 for an exact two-body solution.
    pub fn wronskian(&self) -> f64 {
        self.f * self.gdot - self.fdot * self.g
    }

    /// Applies the coefficients to an initial state.
    pub fn apply(&self, state: &StateVectors) -> StateVectors {
        StateVectors {
            position: self.f * state.position + self.g * state.velocity,
            velocity: self.fdot * state.position + self.gdot * state.velocity,
        }
    }
}

/// Solves the universal Kepler equation and returns the Lagrange
/// coefficients for a transfer of duration `tof`.
///
/// # Errors
/// Returns a [`ConvergenceFailure`] when `numiter` Newton steps on the
/// universal variable were not enough.
pub fn vallado_fg(
    mu: f64,
    state: &StateVectors,
    tof: f64,
    numiter: u32,
) -> Result<LagrangeCoefficients, ConvergenceFailure> {
    let r0 = state.position;
    let v0 = state.velocity;

    let dot_r0v0 = r0.dot(v0);
    let norm_r0 = r0.length();
    let sqrt_mu = mu.sqrt();
    // Reciprocal of the semi-major axis
    let alpha = -v0.length_squared() / mu + 2.0 / norm_r0;

    let mut xi_new = if alpha > 0.0 {
        sqrt_mu * tof * alpha
    } else if alpha < 0.0 {
        let sign = tof.signum();
        sign * (-1.0 / alpha).sqrt()
            * ((-2.0 * mu * alpha * tof)
                / (dot_r0v0 + sign * (-mu / alpha).sqrt() * (1.0 - norm_r0 * alpha)))
                .ln()
    } else {
        // Conservative parabolic guess
        sqrt_mu * tof / norm_r0
    };

    let mut converged = None;

    for _ in 0..numiter {
        let xi = xi_new;
        let psi = xi * xi * alpha;
        let c2_psi = stumpff_c2(psi);
        let c3_psi = stumpff_c3(psi);

        let norm_r = xi * xi * c2_psi
            + dot_r0v0 / sqrt_mu * xi * (1.0 - psi * c3_psi)
            + norm_r0 * (1.0 - psi * c2_psi);

        xi_new = xi
            + (sqrt_mu * tof
                - xi * xi * xi * c3_psi
                - dot_r0v0 / sqrt_mu * xi * xi * c2_psi
                - norm_r0 * xi * (1.0 - psi * c3_psi))
                / norm_r;

        if (xi_new - xi).abs() < UNIVERSAL_TOL {
            converged = Some((xi, psi, c2_psi, c3_psi, norm_r));
            break;
        }
    }

    let Some((xi, psi, c2_psi, c3_psi, norm_r)) = converged else {
        log::debug!("vallado: no convergence within {numiter} steps (xi = {xi_new})");
        return Err(ConvergenceFailure {
            iterations: numiter,
            last_estimate: xi_new,
        });
    };

    Ok(LagrangeCoefficients {
        f: 1.0 - xi * xi / norm_r0 * c2_psi,
        g: tof - xi * xi * xi / sqrt_mu * c3_psi,
        fdot: sqrt_mu / (norm_r * norm_r0) * xi * (psi * c3_psi - 1.0),
        gdot: 1.0 - xi * xi / norm_r * c2_psi,
    })
}

/// Vallado's universal-variable propagator. Handles every regime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vallado {
    /// Maximum number of Newton steps on the universal variable.
    pub numiter: u32,
}

impl Default for Vallado {
    fn default() -> Self {
        Self {
            numiter: VALLADO_MAX_ITERS,
        }
    }
}

impl Propagator for Vallado {
    fn kind(&self) -> PropagatorKind {
        PropagatorKind::ALL
    }

    fn propagate(
        &self,
        mu: f64,
        state: &StateVectors,
        tof: f64,
    ) -> Result<StateVectors, KernelError> {
        check_mu(mu)?;

        let coefficients = vallado_fg(mu, state, tof, self.numiter)?;

        let deviation = (coefficients.wronskian() - 1.0).abs();
        if deviation >= WRONSKIAN_TOL {
            log::warn!("vallado: f gdot - fdot g deviates from 1 by {deviation}");
        }

        Ok(coefficients.apply(state))
    }
}
