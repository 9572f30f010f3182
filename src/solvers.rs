//! Newton iteration on the Kepler-type equations.
//!
//! The solver never panics and never returns a silently wrong value:
//! running out of iterations is reported as a [`ConvergenceFailure`]
//! for that one value only.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use core::f64::consts::PI;

use crate::ConvergenceFailure;

/// Default absolute step tolerance of the Newton iteration.
pub const NEWTON_TOL: f64 = 1.48e-8;

/// Default iteration cap for the elliptic Kepler equation.
pub const ELLIPTIC_MAX_ITERS: u32 = 50;

/// Default iteration cap for the hyperbolic Kepler equation.
///
/// The hyperbolic equation converges more slowly at high eccentricity,
/// hence the larger budget.
pub const HYPERBOLIC_MAX_ITERS: u32 = 100;

/// Tunables of a Newton iteration.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NewtonOptions {
    /// The iteration stops once two consecutive iterates are
    /// closer than this.
    pub tol: f64,
    /// Maximum number of Newton steps.
    pub max_iters: u32,
}

impl NewtonOptions {
    /// Defaults for the elliptic Kepler equation.
    pub const ELLIPTIC: Self = Self {
        tol: NEWTON_TOL,
        max_iters: ELLIPTIC_MAX_ITERS,
    };

    /// Defaults for the hyperbolic Kepler equation.
    pub const HYPERBOLIC: Self = Self {
        tol: NEWTON_TOL,
        max_iters: HYPERBOLIC_MAX_ITERS,
    };
}

impl Default for NewtonOptions {
    fn default() -> Self {
        Self::ELLIPTIC
    }
}

/// Finds a root of `f` with Newton's method, starting from `x0`.
///
/// Iterates `x_(n+1) = x_n - f(x_n) / f'(x_n)` until two consecutive
/// iterates are closer than `options.tol`.
///
/// # Errors
/// Returns a [`ConvergenceFailure`] when `options.max_iters` steps were not
/// enough, or when an iterate stops being finite.
///
/// # Example
/// ```
/// use twobody_kernel::{newton, NewtonOptions};
///
/// let root = newton(|x| x * x - 2.0, |x| 2.0 * x, 1.0, NewtonOptions::default()).unwrap();
/// assert!((root - 2f64.sqrt()).abs() < 1e-12);
/// ```
pub fn newton(
    f: impl Fn(f64) -> f64,
    fprime: impl Fn(f64) -> f64,
    x0: f64,
    options: NewtonOptions,
) -> Result<f64, ConvergenceFailure> {
    let mut p0 = x0;

    for iteration in 0..options.max_iters {
        let step = f(p0) / fprime(p0);
        let p = p0 - step;

        if !p.is_finite() {
            log::debug!("newton: non-finite iterate after {} steps", iteration + 1);
            return Err(ConvergenceFailure {
                iterations: iteration + 1,
                last_estimate: p0,
            });
        }

        if (p - p0).abs() < options.tol {
            log::trace!("newton: converged in {} steps", iteration + 1);
            return Ok(p);
        }

        p0 = p;
    }

    log::debug!(
        "newton: no convergence within {} steps (x = {p0})",
        options.max_iters
    );

    Err(ConvergenceFailure {
        iterations: options.max_iters,
        last_estimate: p0,
    })
}

#[inline]
pub(crate) fn keplers_equation(
    mean_anomaly: f64,
    eccentric_anomaly: f64,
    eccentricity: f64,
) -> f64 {
    eccentric_anomaly - (eccentricity * eccentric_anomaly.sin()) - mean_anomaly
}
#[inline]
pub(crate) fn keplers_equation_derivative(eccentric_anomaly: f64, eccentricity: f64) -> f64 {
    1.0 - (eccentricity * eccentric_anomaly.cos())
}
#[inline]
pub(crate) fn keplers_equation_hyperbolic(
    mean_anomaly: f64,
    hyperbolic_anomaly: f64,
    eccentricity: f64,
) -> f64 {
    eccentricity * hyperbolic_anomaly.sinh() - hyperbolic_anomaly - mean_anomaly
}
#[inline]
pub(crate) fn keplers_equation_hyperbolic_derivative(
    hyperbolic_anomaly: f64,
    eccentricity: f64,
) -> f64 {
    eccentricity * hyperbolic_anomaly.cosh() - 1.0
}

/// Initial guess for the elliptic Kepler equation.
///
/// The seed is asymmetric: `M - e` on `(-π, 0)` and above `π`,
/// `M + e` everywhere else. It is an empirical choice and the
/// reference results of the propagators are calibrated against it.
#[inline]
pub fn elliptic_seed(mean_anomaly: f64, eccentricity: f64) -> f64 {
    if (-PI < mean_anomaly && mean_anomaly < 0.0) || PI < mean_anomaly {
        mean_anomaly - eccentricity
    } else {
        mean_anomaly + eccentricity
    }
}

/// Solves `E - e sin(E) = M` for the eccentric anomaly `E`.
///
/// # Unchecked Operation
/// This function does not check whether or not the eccentricity is
/// actually elliptic (`0 <= e < 1`).
///
/// # Errors
/// Returns a [`ConvergenceFailure`] when the Newton iteration runs out of
/// iterations.
pub fn kepler_elliptic(
    mean_anomaly: f64,
    eccentricity: f64,
    options: NewtonOptions,
) -> Result<f64, ConvergenceFailure> {
    newton(
        |e| keplers_equation(mean_anomaly, e, eccentricity),
        |e| keplers_equation_derivative(e, eccentricity),
        elliptic_seed(mean_anomaly, eccentricity),
        options,
    )
}

/// Solves `e sinh(F) - F = M` for the hyperbolic anomaly `F`.
///
/// The iteration starts at `F0 = asinh(M / e)`.
///
/// # Unchecked Operation
/// This function does not check whether or not the eccentricity is
/// actually hyperbolic (`e > 1`).
///
/// # Errors
/// Returns a [`ConvergenceFailure`] when the Newton iteration runs out of
/// iterations.
pub fn kepler_hyperbolic(
    mean_anomaly: f64,
    eccentricity: f64,
    options: NewtonOptions,
) -> Result<f64, ConvergenceFailure> {
    newton(
        |f| keplers_equation_hyperbolic(mean_anomaly, f, eccentricity),
        |f| keplers_equation_hyperbolic_derivative(f, eccentricity),
        (mean_anomaly / eccentricity).asinh(),
        options,
    )
}
