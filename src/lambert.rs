//! Solvers for Lambert's problem: find the orbit connecting two positions
//! in a given time of flight.
//!
//! Two solvers are provided:
//! - [`izzo`]: Householder iterations on Izzo's `x` variable, with
//!   multi-revolution support.
//! - [`vallado`]: bisection on the universal variable `psi`, single
//!   revolution only.
//!
//! Both return a list of [`LambertSolution`]s. A branch that does not
//! converge is left out of the list rather than reported as an error, so
//! an empty list means no feasible transfer was found.

use core::f64::consts::PI;

use glam::DVec3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    math::{stumpff_c2, stumpff_c3},
    ConvergenceFailure, InputError,
};

/// Default iteration cap of [`izzo`].
pub const IZZO_MAX_ITERS: u32 = 35;

/// Default iteration cap of [`vallado`]. The bisection halves an interval
/// of width `8π²` at each step, hence the larger budget.
pub const VALLADO_MAX_ITERS: u32 = 100;

/// Default relative tolerance of both solvers.
pub const LAMBERT_RTOL: f64 = 1e-8;

/// Sine of the smallest transfer angle accepted, below which the two
/// positions are considered collinear.
const COLLINEARITY_TOL: f64 = 1e-12;

/// Tunables of the Lambert solvers.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LambertOptions {
    /// Maximum number of complete revolutions to look for.
    pub revs: u32,
    /// Whether the transfer goes counterclockwise around the `z` axis.
    pub prograde: bool,
    /// For multi-revolution transfers, keep only the low path (`Some(true)`),
    /// only the high path (`Some(false)`), or both (`None`).
    pub low_path: Option<bool>,
    /// Maximum number of iterations per branch.
    pub numiter: u32,
    /// Convergence tolerance.
    pub rtol: f64,
}

impl LambertOptions {
    /// Defaults for [`izzo`].
    pub const IZZO: Self = Self {
        revs: 0,
        prograde: true,
        low_path: None,
        numiter: IZZO_MAX_ITERS,
        rtol: LAMBERT_RTOL,
    };

    /// Defaults for [`vallado`].
    pub const VALLADO: Self = Self {
        numiter: VALLADO_MAX_ITERS,
        ..Self::IZZO
    };
}

impl Default for LambertOptions {
    fn default() -> Self {
        Self::IZZO
    }
}

/// One solution of Lambert's problem.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LambertSolution {
    /// Velocity at the first position.
    pub v1: DVec3,
    /// Velocity at the second position.
    pub v2: DVec3,
    /// Number of complete revolutions of the transfer.
    pub revs: u32,
    /// Whether this is the low path branch. Always `true` for
    /// single-revolution transfers.
    pub low_path: bool,
}

fn validate(mu: f64, r1: DVec3, r2: DVec3, tof: f64) -> Result<(), InputError> {
    if !(mu > 0.0 && mu.is_finite()) {
        return Err(InputError::InvalidArgument {
            name: "mu",
            reason: "the gravitational parameter must be positive and finite",
        });
    }
    if !(tof > 0.0 && tof.is_finite()) {
        return Err(InputError::InvalidArgument {
            name: "tof",
            reason: "the time of flight must be positive and finite",
        });
    }

    let (r1_norm, r2_norm) = (r1.length(), r2.length());
    if r1_norm == 0.0 || r2_norm == 0.0 {
        return Err(InputError::InvalidArgument {
            name: "r1, r2",
            reason: "positions must not be at the attractor",
        });
    }
    if r1.cross(r2).length() < COLLINEARITY_TOL * r1_norm * r2_norm {
        return Err(InputError::InvalidArgument {
            name: "r1, r2",
            reason: "positions are collinear, the transfer plane is undefined",
        });
    }

    Ok(())
}

/// Solves Lambert's problem with Izzo's algorithm.
///
/// Every feasible transfer with up to `options.revs` complete revolutions
/// is returned: the single-revolution one first, then both branches of
/// every multi-revolution count, low path first (see
/// [`LambertOptions::low_path`] to keep only one of them).
///
/// Reference: Izzo, "Revisiting Lambert's problem", Celestial Mechanics
/// and Dynamical Astronomy 121 (2015).
///
/// # Errors
/// Returns [`InputError::InvalidArgument`] if `mu` or `tof` is not
/// positive, or if the positions are collinear.
///
/// # Example
/// ```
/// use glam::DVec3;
/// use twobody_kernel::lambert::{izzo, LambertOptions};
///
/// // Vallado, example 7-5
/// let mu = 3.986004418e5;
/// let r1 = DVec3::new(15945.34, 0.0, 0.0);
/// let r2 = DVec3::new(12214.83399, 10249.46731, 0.0);
///
/// let solutions = izzo(mu, r1, r2, 76.0 * 60.0, &LambertOptions::default()).unwrap();
/// let v1 = solutions[0].v1;
///
/// assert!((v1 - DVec3::new(2.058925, 2.915956, 0.0)).length() < 1e-4);
/// ```
pub fn izzo(
    mu: f64,
    r1: DVec3,
    r2: DVec3,
    tof: f64,
    options: &LambertOptions,
) -> Result<Vec<LambertSolution>, InputError> {
    validate(mu, r1, r2, tof)?;

    // Chord and semiperimeter
    let c_norm = (r2 - r1).length();
    let (r1_norm, r2_norm) = (r1.length(), r2.length());
    let s = (r1_norm + r2_norm + c_norm) * 0.5;

    // Versors
    let i_r1 = r1 / r1_norm;
    let i_r2 = r2 / r2_norm;
    let i_h = i_r1.cross(i_r2).normalize();

    // Geometry of the problem
    let mut ll = (1.0 - (c_norm / s).min(1.0)).sqrt();

    let (mut i_t1, mut i_t2) = if i_h.z < 0.0 {
        ll = -ll;
        (i_r1.cross(i_h), i_r2.cross(i_h))
    } else {
        (i_h.cross(i_r1), i_h.cross(i_r2))
    };

    if !options.prograde {
        ll = -ll;
        i_t1 = -i_t1;
        i_t2 = -i_t2;
    }

    // Non-dimensional time of flight
    let t = (2.0 * mu / s.powi(3)).sqrt() * tof;

    let gamma = (mu * s / 2.0).sqrt();
    let rho = (r1_norm - r2_norm) / c_norm;
    let sigma = (1.0 - rho * rho).sqrt();

    let reconstruct = |x: f64, revs: u32, low_path: bool| {
        let y = compute_y(x, ll);

        let v_r1 = gamma * ((ll * y - x) - rho * (ll * y + x)) / r1_norm;
        let v_r2 = -gamma * ((ll * y - x) + rho * (ll * y + x)) / r2_norm;
        let v_t1 = gamma * sigma * (y + ll * x) / r1_norm;
        let v_t2 = gamma * sigma * (y + ll * x) / r2_norm;

        LambertSolution {
            v1: v_r1 * i_r1 + v_t1 * i_t1,
            v2: v_r2 * i_r2 + v_t2 * i_t2,
            revs,
            low_path,
        }
    };

    let max_revs = max_revolutions(t, ll, options);
    if options.revs > max_revs {
        log::debug!(
            "izzo: {} revolutions requested, at most {max_revs} are feasible",
            options.revs
        );
    }

    let mut solutions = Vec::new();

    for revs in 0..=options.revs.min(max_revs) {
        let branches: &[bool] = match (revs, options.low_path) {
            (0, _) => &[true],
            (_, Some(true)) => &[true],
            (_, Some(false)) => &[false],
            (_, None) => &[true, false],
        };

        for &low_path in branches {
            let x0 = initial_guess(t, ll, revs, low_path);

            match householder(x0, t, ll, revs, options.rtol, options.numiter) {
                Ok(x) => solutions.push(reconstruct(x, revs, low_path)),
                Err(failure) => log::debug!(
                    "izzo: dropping the {revs}-revolution {} path branch: {failure}",
                    if low_path { "low" } else { "high" }
                ),
            }
        }
    }

    Ok(solutions)
}

/// Gauss hypergeometric function `2F1(3, 1, 5/2, x)`, by its series.
fn hyp2f1b(x: f64) -> f64 {
    if x >= 1.0 {
        return f64::INFINITY;
    }

    let mut res = 1.0;
    let mut term = 1.0;
    let mut ii = 0.0;

    loop {
        term *= (3.0 + ii) * (1.0 + ii) / (2.5 + ii) * x / (ii + 1.0);
        let res_old = res;
        res += term;
        if res_old == res {
            return res;
        }
        ii += 1.0;
    }
}

fn compute_y(x: f64, ll: f64) -> f64 {
    (1.0 - ll * ll * (1.0 - x * x)).sqrt()
}

fn compute_psi(x: f64, y: f64, ll: f64) -> f64 {
    if (-1.0..1.0).contains(&x) {
        // Elliptic
        (x * y + ll * (1.0 - x * x)).clamp(-1.0, 1.0).acos()
    } else if x > 1.0 {
        // Hyperbolic
        ((y - x * ll) * (x * x - 1.0).sqrt()).asinh()
    } else {
        0.0
    }
}

/// Non-dimensional time of flight at `x`, minus `t0`.
fn tof_equation_y(x: f64, y: f64, t0: f64, ll: f64, revs: u32) -> f64 {
    let t = if revs == 0 && 0.6f64.sqrt() < x && x < 1.4f64.sqrt() {
        // Battin's series, well conditioned around x = 1
        let eta = y - ll * x;
        let s_1 = (1.0 - ll - x * eta) * 0.5;
        let q = 4.0 / 3.0 * hyp2f1b(s_1);
        (eta.powi(3) * q + 4.0 * ll * eta) * 0.5
    } else {
        let psi = compute_psi(x, y, ll);
        ((psi + revs as f64 * PI) / (1.0 - x * x).abs().sqrt() - x + ll * y) / (1.0 - x * x)
    };

    t - t0
}

fn tof_equation(x: f64, t0: f64, ll: f64, revs: u32) -> f64 {
    tof_equation_y(x, compute_y(x, ll), t0, ll, revs)
}

/// First, second and third derivatives of the time of flight.
fn tof_derivatives(x: f64, y: f64, t: f64, ll: f64) -> (f64, f64, f64) {
    let umx2 = 1.0 - x * x;
    let l2 = ll * ll;
    let l3 = l2 * ll;
    let l5 = l3 * l2;

    let dt = (3.0 * t * x - 2.0 + 2.0 * l3 * x / y) / umx2;
    let ddt = (3.0 * t + 5.0 * x * dt + 2.0 * (1.0 - l2) * l3 / y.powi(3)) / umx2;
    let dddt = (7.0 * x * ddt + 8.0 * dt - 6.0 * (1.0 - l2) * l5 * x / y.powi(5)) / umx2;

    (dt, ddt, dddt)
}

/// Largest number of revolutions feasible in the non-dimensional time `t`.
fn max_revolutions(t: f64, ll: f64, options: &LambertOptions) -> u32 {
    let mut max_revs = (t / PI).floor() as u32;
    let t_00 = ll.acos() + ll * (1.0 - ll * ll).sqrt();

    if max_revs > 0 && t < t_00 + max_revs as f64 * PI {
        match minimum_tof(ll, max_revs, options.rtol, options.numiter) {
            Ok(t_min) if t >= t_min => {}
            Ok(_) => max_revs -= 1,
            Err(failure) => {
                log::debug!("izzo: minimum time of flight not found ({failure})");
                max_revs -= 1;
            }
        }
    }

    max_revs
}

/// Minimum non-dimensional time of flight of a multi-revolution transfer,
/// found by Halley iterations on `dT/dx = 0`.
fn minimum_tof(ll: f64, revs: u32, tol: f64, numiter: u32) -> Result<f64, ConvergenceFailure> {
    // Start at x > 0 to stay away from ll = -1
    let mut p0 = 0.1;

    for _ in 0..numiter {
        let y = compute_y(p0, ll);
        let t = tof_equation_y(p0, y, 0.0, ll, revs);
        let (dt, ddt, dddt) = tof_derivatives(p0, y, t, ll);

        if ddt == 0.0 {
            break;
        }

        let p = p0 - 2.0 * dt * ddt / (2.0 * ddt * ddt - dt * dddt);
        if (p - p0).abs() < tol {
            return Ok(tof_equation(p, 0.0, ll, revs));
        }
        p0 = p;
    }

    Err(ConvergenceFailure {
        iterations: numiter,
        last_estimate: p0,
    })
}

fn initial_guess(t: f64, ll: f64, revs: u32, low_path: bool) -> f64 {
    if revs == 0 {
        let t_0 = ll.acos() + ll * (1.0 - ll * ll).sqrt();
        let t_1 = 2.0 * (1.0 - ll.powi(3)) / 3.0;

        if t >= t_0 {
            (t_0 / t).powf(2.0 / 3.0) - 1.0
        } else if t < t_1 {
            5.0 / 2.0 * t_1 / t * (t_1 - t) / (1.0 - ll.powi(5)) + 1.0
        } else {
            // The piecewise expression right after equation (30) of the
            // paper is incorrect, this is the corrected one
            ((2f64).ln() * (t / t_0).ln() / (t_1 / t_0).ln()).exp() - 1.0
        }
    } else {
        let revs = revs as f64;
        let left = ((revs * PI + PI) / (8.0 * t)).powf(2.0 / 3.0);
        let right = ((8.0 * t) / (revs * PI)).powf(2.0 / 3.0);
        let x_0l = (left - 1.0) / (left + 1.0);
        let x_0r = (right - 1.0) / (right + 1.0);

        if low_path {
            x_0l.max(x_0r)
        } else {
            x_0l.min(x_0r)
        }
    }
}

/// Householder (quartic) iterations on the time of flight equation.
fn householder(
    mut p0: f64,
    t0: f64,
    ll: f64,
    revs: u32,
    tol: f64,
    numiter: u32,
) -> Result<f64, ConvergenceFailure> {
    for _ in 0..numiter {
        let y = compute_y(p0, ll);
        let fval = tof_equation_y(p0, y, t0, ll, revs);
        let t = fval + t0;
        let (fder, fder2, fder3) = tof_derivatives(p0, y, t, ll);

        let p = p0
            - fval * (fder * fder - fval * fder2 / 2.0)
                / (fder * (fder * fder - fval * fder2) + fder3 * fval * fval / 6.0);

        if !p.is_finite() {
            break;
        }
        if (p - p0).abs() < tol {
            return Ok(p);
        }
        p0 = p;
    }

    Err(ConvergenceFailure {
        iterations: numiter,
        last_estimate: p0,
    })
}

/// Solves Lambert's problem with Vallado's universal-variable bisection.
///
/// Only single-revolution transfers are supported, so the returned list
/// holds at most one solution.
///
/// Reference: Vallado, "Fundamentals of Astrodynamics and Applications",
/// 4th edition, algorithm 58.
///
/// # Errors
/// Returns [`InputError::InvalidArgument`] if `mu` or `tof` is not
/// positive, if the positions are collinear, or if `options.revs > 0`.
pub fn vallado(
    mu: f64,
    r1: DVec3,
    r2: DVec3,
    tof: f64,
    options: &LambertOptions,
) -> Result<Vec<LambertSolution>, InputError> {
    validate(mu, r1, r2, tof)?;

    if options.revs > 0 {
        return Err(InputError::InvalidArgument {
            name: "revs",
            reason: "vallado only solves single-revolution transfers",
        });
    }

    let (r1_norm, r2_norm) = (r1.length(), r2.length());
    let norm_product = r1_norm * r2_norm;
    let norm_sum = r1_norm + r2_norm;
    let sqrt_mu = mu.sqrt();

    // Direction of motion: short way when the transfer matches the
    // requested sense around z
    let t_m = if (r1.cross(r2).z >= 0.0) == options.prograde {
        1.0
    } else {
        -1.0
    };

    let cos_dnu = r1.dot(r2) / norm_product;
    let a = t_m * (norm_product * (1.0 + cos_dnu)).sqrt();

    let y_of = |psi: f64| norm_sum + a * (psi * stumpff_c3(psi) - 1.0) / stumpff_c2(psi).sqrt();

    let mut psi = 0.0;
    let mut psi_low = -4.0 * PI * PI;
    let mut psi_up = 4.0 * PI * PI;
    let mut converged = None;

    for _ in 0..options.numiter {
        let mut y = y_of(psi);

        if a > 0.0 {
            // Raise psi until y becomes positive
            let mut guard = 0;
            while y < 0.0 && guard < options.numiter {
                psi_low = psi;
                psi = 0.8 * (1.0 / stumpff_c3(psi))
                    * (1.0 - norm_product * stumpff_c2(psi).sqrt() / a);
                y = y_of(psi);
                guard += 1;
            }
        }

        let xi = (y / stumpff_c2(psi)).sqrt();
        let tof_new = (xi.powi(3) * stumpff_c3(psi) + a * y.sqrt()) / sqrt_mu;

        if ((tof_new - tof) / tof).abs() < options.rtol {
            converged = Some(y);
            break;
        }

        if tof_new <= tof {
            psi_low = psi;
        } else {
            psi_up = psi;
        }
        psi = (psi_up + psi_low) / 2.0;
    }

    let Some(y) = converged else {
        log::debug!("vallado: no convergence within {} steps (psi = {psi})", options.numiter);
        return Ok(Vec::new());
    };

    let f = 1.0 - y / r1_norm;
    let g = a * (y / mu).sqrt();
    let gdot = 1.0 - y / r2_norm;

    Ok(vec![LambertSolution {
        v1: (r2 - f * r1) / g,
        v2: (gdot * r2 - r1) / g,
        revs: 0,
        low_path: true,
    }])
}
