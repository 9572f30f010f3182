//! Farnocchia's method: time of flight from the anomaly and back, with a
//! dedicated series in the near-parabolic band.
//!
//! Reference: Farnocchia, Bracali Cioci, Milani, "Robust resolution of
//! Kepler's equation in all eccentricity regimes", Celestial Mechanics and
//! Dynamical Astronomy 116 (2013).

use crate::{
    angles::{
        eccentric_to_mean, eccentric_to_true, hyperbolic_to_mean, hyperbolic_to_true,
        mean_to_eccentric, mean_to_hyperbolic, mean_to_parabolic, parabolic_to_mean,
        parabolic_to_true, true_to_eccentric, true_to_hyperbolic, true_to_parabolic,
    },
    math::wrap_to_pi,
    newton, InputError, KernelError, NewtonOptions, StateVectors,
};

use super::{propagate_elements, Propagator, PropagatorKind};

/// Default half-width of the near-parabolic eccentricity band.
pub const NEAR_PARABOLIC_DELTA: f64 = 1e-2;

/// Absolute tolerance at which the `S(x)` series are truncated.
const SERIES_ATOL: f64 = 1e-12;

/// Upper bound on the number of terms of the `S(x)` series.
/// Only reached when `|x|` is very close to 1.
const SERIES_MAX_TERMS: u32 = 10_000;

/// Sums `coefficient(k) * x^k` until a term changes the sum by less
/// than [`SERIES_ATOL`]. Diverges, and gives NaN, for `|x| >= 1`.
fn series(x: f64, coefficient: impl Fn(f64) -> f64) -> f64 {
    if x.abs() >= 1.0 {
        return f64::NAN;
    }

    let mut sum = 0.0;
    let mut x_k = 1.0;

    for k in 0..SERIES_MAX_TERMS {
        let term = coefficient(k as f64) * x_k;
        sum += term;
        if term.abs() < SERIES_ATOL {
            break;
        }
        x_k *= x;
    }

    sum
}

/// The near-parabolic series `S(x) = Σ (e - 1 / (2k + 3)) x^k`.
///
/// Requires `|x| < 1`, NaN otherwise.
pub fn s_x(ecc: f64, x: f64) -> f64 {
    series(x, |k| ecc - 1.0 / (2.0 * k + 3.0))
}

/// `Σ (e - 1 / (2k + 3)) (2k + 3) x^k`, the series appearing in the
/// derivative of [`d_to_m_near_parabolic`] once its terms are rearranged.
///
/// Requires `|x| < 1`.
pub fn ds_x_alt(ecc: f64, x: f64) -> f64 {
    series(x, |k| (ecc - 1.0 / (2.0 * k + 3.0)) * (2.0 * k + 3.0))
}

/// `Σ (e - 1 / (2k + 3)) (2k + 3) (2k + 2) x^k`.
///
/// Requires `|x| < 1`.
pub fn d2s_x_alt(ecc: f64, x: f64) -> f64 {
    series(x, |k| {
        (ecc - 1.0 / (2.0 * k + 3.0)) * (2.0 * k + 3.0) * (2.0 * k + 2.0)
    })
}

/// Gets the near-parabolic mean anomaly from the parabolic anomaly.
///
/// ```text
/// x = (e - 1) / (e + 1) D²
/// M = sqrt(2 / (1 + e)) D + sqrt(2 / (1 + e)³) D³ S(x)
/// ```
pub fn d_to_m_near_parabolic(par_anomaly: f64, ecc: f64) -> f64 {
    let x = (ecc - 1.0) / (ecc + 1.0) * par_anomaly * par_anomaly;

    (2.0 / (1.0 + ecc)).sqrt() * par_anomaly
        + (2.0 / (1.0 + ecc).powi(3)).sqrt() * par_anomaly.powi(3) * s_x(ecc, x)
}

/// Residual of the near-parabolic Kepler equation.
pub fn kepler_equation_near_parabolic(par_anomaly: f64, mean_anomaly: f64, ecc: f64) -> f64 {
    d_to_m_near_parabolic(par_anomaly, ecc) - mean_anomaly
}

/// Derivative of [`kepler_equation_near_parabolic`] with respect to `D`.
pub fn kepler_equation_prime_near_parabolic(
    par_anomaly: f64,
    _mean_anomaly: f64,
    ecc: f64,
) -> f64 {
    let d2 = par_anomaly * par_anomaly;
    let x = (ecc - 1.0) / (ecc + 1.0) * d2;

    (2.0 / (1.0 + ecc)).sqrt() + (2.0 / (1.0 + ecc).powi(3)).sqrt() * d2 * ds_x_alt(ecc, x)
}

/// Solves the near-parabolic Kepler equation for the parabolic anomaly,
/// starting from the exact parabolic solution.
///
/// # Errors
/// Returns a [`ConvergenceFailure`][crate::ConvergenceFailure] if the
/// Newton iteration does not converge.
pub fn m_to_d_near_parabolic(
    mean_anomaly: f64,
    ecc: f64,
    options: NewtonOptions,
) -> Result<f64, KernelError> {
    Ok(newton(
        |d| kepler_equation_near_parabolic(d, mean_anomaly, ecc),
        |d| kepler_equation_prime_near_parabolic(d, mean_anomaly, ecc),
        mean_to_parabolic(mean_anomaly),
        options,
    )?)
}

/// Gets the time elapsed since periapsis at a true anomaly `nu` in
/// `[-π, π)`.
///
/// `q` is the periapsis distance and `delta` the half-width of the
/// near-parabolic band.
///
/// # Errors
/// Returns [`InputError::InvalidArgument`] when a hyperbolic trajectory
/// never reaches `nu` (beyond its asymptotes).
pub fn delta_t_from_nu(
    nu: f64,
    ecc: f64,
    mu: f64,
    q: f64,
    delta: f64,
) -> Result<f64, InputError> {
    let elliptic_motion = || (mu * (1.0 - ecc).powi(3) / q.powi(3)).sqrt();
    let parabolic_motion = || (mu / (2.0 * q.powi(3))).sqrt();
    let hyperbolic_motion = || (mu * (ecc - 1.0).powi(3) / q.powi(3)).sqrt();

    let (mean_anomaly, mean_motion) = if ecc < 1.0 - delta {
        let ecc_anomaly = true_to_eccentric(nu, ecc);
        (eccentric_to_mean(ecc_anomaly, ecc), elliptic_motion())
    } else if ecc < 1.0 {
        let ecc_anomaly = true_to_eccentric(nu, ecc);
        if delta <= 1.0 - ecc * ecc_anomaly.cos() {
            (eccentric_to_mean(ecc_anomaly, ecc), elliptic_motion())
        } else {
            let par_anomaly = true_to_parabolic(nu);
            (d_to_m_near_parabolic(par_anomaly, ecc), parabolic_motion())
        }
    } else if ecc == 1.0 {
        (parabolic_to_mean(true_to_parabolic(nu)), parabolic_motion())
    } else if 1.0 + ecc * nu.cos() < 0.0 {
        return Err(InputError::InvalidArgument {
            name: "nu",
            reason: "the true anomaly lies beyond the asymptotes of the hyperbola",
        });
    } else if ecc <= 1.0 + delta {
        let hyp_anomaly = true_to_hyperbolic(nu, ecc);
        if delta <= ecc * hyp_anomaly.cosh() - 1.0 {
            (hyperbolic_to_mean(hyp_anomaly, ecc), hyperbolic_motion())
        } else {
            let par_anomaly = true_to_parabolic(nu);
            (d_to_m_near_parabolic(par_anomaly, ecc), parabolic_motion())
        }
    } else {
        let hyp_anomaly = true_to_hyperbolic(nu, ecc);
        (hyperbolic_to_mean(hyp_anomaly, ecc), hyperbolic_motion())
    };

    Ok(mean_anomaly / mean_motion)
}

/// Gets the true anomaly reached `delta_t` after periapsis.
///
/// Inverse of [`delta_t_from_nu`]. Elliptic results are wrapped, so
/// several revolutions may be hidden in `delta_t`.
///
/// # Errors
/// Returns a [`ConvergenceFailure`][crate::ConvergenceFailure] if the
/// underlying Kepler equation could not be solved.
pub fn nu_from_delta_t(
    delta_t: f64,
    ecc: f64,
    mu: f64,
    q: f64,
    delta: f64,
) -> Result<f64, KernelError> {
    let elliptic_motion = (mu * (1.0 - ecc).abs().powi(3) / q.powi(3)).sqrt();
    let hyperbolic_motion = (mu * (ecc - 1.0).abs().powi(3) / q.powi(3)).sqrt();
    let parabolic_motion = (mu / (2.0 * q.powi(3))).sqrt();

    let near_parabolic = |mean_anomaly: f64| -> Result<f64, KernelError> {
        let par_anomaly = m_to_d_near_parabolic(mean_anomaly, ecc, NewtonOptions::ELLIPTIC)?;
        Ok(parabolic_to_true(par_anomaly))
    };
    let strong_elliptic = |mean_anomaly: f64| -> Result<f64, KernelError> {
        let ecc_anomaly = mean_to_eccentric(wrap_to_pi(mean_anomaly), ecc)?;
        Ok(eccentric_to_true(ecc_anomaly, ecc))
    };
    let strong_hyperbolic = |mean_anomaly: f64| -> Result<f64, KernelError> {
        let hyp_anomaly = mean_to_hyperbolic(mean_anomaly, ecc)?;
        Ok(hyperbolic_to_true(hyp_anomaly, ecc))
    };

    if ecc < 1.0 - delta {
        strong_elliptic(elliptic_motion * delta_t)
    } else if ecc < 1.0 {
        let ecc_anomaly_delta = ((1.0 - delta) / ecc).acos();
        let mean_anomaly = elliptic_motion * delta_t;

        if eccentric_to_mean(ecc_anomaly_delta, ecc) <= mean_anomaly.abs() {
            strong_elliptic(mean_anomaly)
        } else {
            near_parabolic(parabolic_motion * delta_t)
        }
    } else if ecc == 1.0 {
        Ok(parabolic_to_true(mean_to_parabolic(parabolic_motion * delta_t)))
    } else if ecc <= 1.0 + delta {
        let hyp_anomaly_delta = ((1.0 + delta) / ecc).acosh();
        let mean_anomaly = hyperbolic_motion * delta_t;

        if hyperbolic_to_mean(hyp_anomaly_delta, ecc) <= mean_anomaly.abs() {
            strong_hyperbolic(mean_anomaly)
        } else {
            near_parabolic(parabolic_motion * delta_t)
        }
    } else {
        strong_hyperbolic(hyperbolic_motion * delta_t)
    }
}

/// Advances the true anomaly by `tof` with Farnocchia's method.
///
/// # Errors
/// See [`delta_t_from_nu`] and [`nu_from_delta_t`].
pub fn farnocchia_coe(
    mu: f64,
    p: f64,
    ecc: f64,
    nu: f64,
    tof: f64,
    delta: f64,
) -> Result<f64, KernelError> {
    let q = p / (1.0 + ecc);

    let delta_t0 = delta_t_from_nu(wrap_to_pi(nu), ecc, mu, q, delta)?;
    nu_from_delta_t(delta_t0 + tof, ecc, mu, q, delta)
}

/// Farnocchia's propagator. Handles every regime, including the
/// neighbourhood of `e = 1` where the other solvers lose precision.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Farnocchia {
    /// Half-width of the eccentricity band around 1 in which the
    /// near-parabolic series is used.
    pub delta: f64,
}

impl Default for Farnocchia {
    fn default() -> Self {
        Self {
            delta: NEAR_PARABOLIC_DELTA,
        }
    }
}

impl Propagator for Farnocchia {
    fn kind(&self) -> PropagatorKind {
        PropagatorKind::ALL
    }

    fn propagate(
        &self,
        mu: f64,
        state: &StateVectors,
        tof: f64,
    ) -> Result<StateVectors, KernelError> {
        propagate_elements("farnocchia", self.kind(), mu, state, |elements| {
            farnocchia_coe(mu, elements.p, elements.ecc, elements.nu, tof, self.delta)
        })
    }
}
