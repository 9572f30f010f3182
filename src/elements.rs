//! Conversions between classical orbital elements, state vectors and
//! modified equinoctial elements.
//!
//! All functions take the gravitational parameter `mu` (also written `k`)
//! by value. The crate is unit-agnostic: lengths, times and `mu` only need
//! to agree with each other.

use core::f64::consts::{PI, TAU};

use glam::{DMat3, DVec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{signed_atan2, wrap_to_tau, InputError, StateVectors};

/// Eccentricities and inclinations below this are treated as zero when
/// recovering elements from state vectors.
pub const CLASSIFICATION_TOL: f64 = 1e-8;

/// Inclinations closer than this to π are rejected by the modified
/// equinoctial conversions.
pub const EQUINOCTIAL_SINGULARITY_TOL: f64 = 1e-12;

/// The classical orbital elements, with the semi-latus rectum in place of
/// the semi-major axis so that parabolas are representable.
///
/// # Conventions
/// Some angles are undefined at the boundaries of the element set. When
/// recovered from state vectors:
/// - equatorial orbits report `raan = 0`, and `argp` becomes the
///   longitude of periapsis;
/// - circular orbits report `argp = 0`, and `nu` becomes the argument
///   of latitude;
/// - circular equatorial orbits report `raan = argp = 0`, and `nu` becomes
///   the true longitude.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClassicalElements {
    /// Semi-latus rectum. Always positive.
    pub p: f64,
    /// Eccentricity. Never negative.
    pub ecc: f64,
    /// Inclination, in radians, between 0 and π.
    pub inc: f64,
    /// Right ascension of the ascending node, in radians.
    pub raan: f64,
    /// Argument of periapsis, in radians.
    pub argp: f64,
    /// True anomaly, in radians.
    pub nu: f64,
}

impl ClassicalElements {
    /// Creates a new element set.
    pub fn new(p: f64, ecc: f64, inc: f64, raan: f64, argp: f64, nu: f64) -> Self {
        Self {
            p,
            ecc,
            inc,
            raan,
            argp,
            nu,
        }
    }

    /// Gets the semi-major axis, `a = p / (1 - e²)`.
    ///
    /// Negative for hyperbolic orbits, infinite for parabolic ones.
    pub fn semi_major_axis(&self) -> f64 {
        self.p / (1.0 - self.ecc * self.ecc)
    }

    /// Gets the mean motion, `n = sqrt(mu / |a|³)`.
    ///
    /// For parabolic orbits the parabolic mean motion `2 sqrt(mu / p³)`
    /// is returned instead.
    pub fn mean_motion(&self, mu: f64) -> f64 {
        if self.ecc == 1.0 {
            2.0 * (mu / self.p.powi(3)).sqrt()
        } else {
            (mu / self.semi_major_axis().abs().powi(3)).sqrt()
        }
    }

    /// Gets the orbital period, or `None` if the orbit is open.
    pub fn period(&self, mu: f64) -> Option<f64> {
        if self.ecc < 1.0 {
            Some(TAU / self.mean_motion(mu))
        } else {
            None
        }
    }

    /// Converts these elements into state vectors.
    ///
    /// See [`classical_to_cartesian`].
    pub fn to_state_vectors(&self, mu: f64) -> StateVectors {
        classical_to_cartesian(mu, self)
    }
}

impl StateVectors {
    /// Recovers the classical elements of the trajectory passing through
    /// these state vectors.
    ///
    /// See [`cartesian_to_classical`].
    pub fn to_classical(&self, mu: f64) -> ClassicalElements {
        cartesian_to_classical(mu, self)
    }
}

/// The modified equinoctial elements.
///
/// Nonsingular for circular and equatorial orbits, but singular for
/// retrograde equatorial ones (`inc = π`).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModifiedEquinoctialElements {
    /// Semi-latus rectum.
    pub p: f64,
    /// `e cos(raan + argp)`
    pub f: f64,
    /// `e sin(raan + argp)`
    pub g: f64,
    /// `tan(inc / 2) cos(raan)`
    pub h: f64,
    /// `tan(inc / 2) sin(raan)`
    pub k: f64,
    /// True longitude, `raan + argp + nu`, in radians.
    pub l: f64,
}

/// Gets the state vectors in the perifocal (PQW) frame.
///
/// ```text
/// r = p / (1 + e cos ν) [cos ν, sin ν, 0]
/// v = sqrt(mu / p) [-sin ν, e + cos ν, 0]
/// ```
///
/// Learn more about the PQW system: <https://en.wikipedia.org/wiki/Perifocal_coordinate_system>
pub fn rv_pqw(mu: f64, p: f64, ecc: f64, nu: f64) -> (DVec3, DVec3) {
    let (sin_nu, cos_nu) = nu.sin_cos();

    let position = DVec3::new(cos_nu, sin_nu, 0.0) * (p / (1.0 + ecc * cos_nu));
    let velocity = DVec3::new(-sin_nu, ecc + cos_nu, 0.0) * (mu / p).sqrt();

    (position, velocity)
}

/// Gets the rotation from the perifocal frame into the inertial frame,
/// `Rz(raan) Rx(inc) Rz(argp)`.
pub fn coe_rotation_matrix(inc: f64, raan: f64, argp: f64) -> DMat3 {
    DMat3::from_rotation_z(raan) * DMat3::from_rotation_x(inc) * DMat3::from_rotation_z(argp)
}

/// Converts classical orbital elements into state vectors.
///
/// # Example
/// ```
/// use twobody_kernel::{classical_to_cartesian, ClassicalElements};
///
/// let circular = ClassicalElements::new(7000.0, 0.0, 0.0, 0.0, 0.0, 0.0);
/// let state = classical_to_cartesian(398600.4418, &circular);
///
/// assert!((state.position.x - 7000.0).abs() < 1e-9);
/// assert!((state.velocity.y - (398600.4418f64 / 7000.0).sqrt()).abs() < 1e-12);
/// ```
pub fn classical_to_cartesian(mu: f64, elements: &ClassicalElements) -> StateVectors {
    let (position, velocity) = rv_pqw(mu, elements.p, elements.ecc, elements.nu);
    let rotation = coe_rotation_matrix(elements.inc, elements.raan, elements.argp);

    StateVectors {
        position: rotation * position,
        velocity: rotation * velocity,
    }
}

/// Recovers the classical orbital elements from state vectors, using
/// [`CLASSIFICATION_TOL`] to detect circular and equatorial orbits.
///
/// See [`cartesian_to_classical_with_tol`].
pub fn cartesian_to_classical(mu: f64, state: &StateVectors) -> ClassicalElements {
    cartesian_to_classical_with_tol(mu, state, CLASSIFICATION_TOL)
}

/// Recovers the classical orbital elements from state vectors.
///
/// An orbit is treated as circular when its eccentricity is below `tol`,
/// and as equatorial when its inclination is within `tol` of 0 or π.
/// The undefined angles then follow the conventions documented on
/// [`ClassicalElements`].
///
/// All the angles except the inclination are returned in `[0, 2π)`.
///
/// # Constraints
/// The position must not be at the origin, and the angular momentum
/// must not be zero. If this constraint is breached, you may get invalid
/// values such as infinities or NaNs.
pub fn cartesian_to_classical_with_tol(
    mu: f64,
    state: &StateVectors,
    tol: f64,
) -> ClassicalElements {
    // Reference:
    // Vallado, "Fundamentals of Astrodynamics and Applications", algorithm 9 (RV2COE)
    let r = state.position;
    let v = state.velocity;

    // Step 1: Orbital angular momentum
    let h = r.cross(v);
    let h_len = h.length();

    // Step 2: Node vector, n = z × h
    let n = DVec3::new(-h.y, h.x, 0.0);

    // Step 3: Eccentricity vector, e = (v × h) / mu - r / |r|
    let e = v.cross(h) / mu - r / r.length();
    let ecc = e.length();

    let p = h_len * h_len / mu;
    let inc = h.truncate().length().atan2(h.z);

    let circular = ecc < tol;
    let equatorial = inc < tol || PI - inc < tol;

    let (raan, argp, nu) = match (equatorial, circular) {
        (true, true) => {
            // True longitude, from the x axis to r
            let nu = signed_atan2(r.y, r.x, r.y * h.z);
            (0.0, 0.0, nu)
        }
        (true, false) => {
            // Longitude of periapsis, from the x axis to e
            let argp = signed_atan2(e.y, e.x, e.y * h.z);
            let nu = signed_atan2(e.cross(r).length(), e.dot(r), r.dot(v));
            (0.0, argp, nu)
        }
        (false, true) => {
            let raan = signed_atan2(n.y, n.x, n.y);
            // Argument of latitude, from n to r
            let nu = signed_atan2(n.cross(r).length(), n.dot(r), r.z);
            (raan, 0.0, nu)
        }
        (false, false) => {
            let raan = signed_atan2(n.y, n.x, n.y);
            let argp = signed_atan2(n.cross(e).length(), n.dot(e), e.z);
            let nu = signed_atan2(e.cross(r).length(), e.dot(r), r.dot(v));
            (raan, argp, nu)
        }
    };

    ClassicalElements {
        p,
        ecc,
        inc,
        raan,
        argp,
        nu,
    }
}

/// Converts classical orbital elements into modified equinoctial elements.
///
/// ```text
/// f = e cos(raan + argp)      h = tan(inc / 2) cos(raan)
/// g = e sin(raan + argp)      k = tan(inc / 2) sin(raan)
/// L = raan + argp + ν
/// ```
///
/// # Errors
/// Returns [`InputError::EquinoctialSingularity`] when the inclination is
/// 180 degrees, where `h` and `k` are undefined.
pub fn classical_to_equinoctial(
    elements: &ClassicalElements,
) -> Result<ModifiedEquinoctialElements, InputError> {
    if (PI - elements.inc).abs() < EQUINOCTIAL_SINGULARITY_TOL {
        return Err(InputError::EquinoctialSingularity {
            inclination: elements.inc,
        });
    }

    let lonper = elements.raan + elements.argp;
    let (sin_lonper, cos_lonper) = lonper.sin_cos();
    let (sin_raan, cos_raan) = elements.raan.sin_cos();
    let tan_half_inc = (elements.inc * 0.5).tan();

    Ok(ModifiedEquinoctialElements {
        p: elements.p,
        f: elements.ecc * cos_lonper,
        g: elements.ecc * sin_lonper,
        h: tan_half_inc * cos_raan,
        k: tan_half_inc * sin_raan,
        l: lonper + elements.nu,
    })
}

/// Converts modified equinoctial elements back into classical elements.
///
/// The angles are returned in `[0, 2π)`. Equatorial orbits get
/// `raan = 0`, matching [`cartesian_to_classical`].
pub fn equinoctial_to_classical(elements: &ModifiedEquinoctialElements) -> ClassicalElements {
    let ecc = elements.f.hypot(elements.g);
    let inc = 2.0 * elements.h.hypot(elements.k).atan();

    let lonper = wrap_to_tau(elements.g.atan2(elements.f));
    let raan = wrap_to_tau(elements.k.atan2(elements.h));

    ClassicalElements {
        p: elements.p,
        ecc,
        inc,
        raan,
        argp: wrap_to_tau(lonper - raan),
        nu: wrap_to_tau(elements.l - lonper),
    }
}

/// Converts modified equinoctial elements directly into state vectors.
///
/// Reference: Betts, "Practical Methods for Optimal Control and
/// Estimation Using Nonlinear Programming", section 6.3.
pub fn equinoctial_to_cartesian(
    mu: f64,
    elements: &ModifiedEquinoctialElements,
) -> StateVectors {
    let ModifiedEquinoctialElements { p, f, g, h, k, l } = *elements;

    let (sin_l, cos_l) = l.sin_cos();
    let alpha2 = h * h - k * k;
    let s2 = 1.0 + h * h + k * k;
    let w = 1.0 + f * cos_l + g * sin_l;
    let radius = p / w;
    let hk2 = 2.0 * h * k;

    let position = DVec3::new(
        cos_l + alpha2 * cos_l + hk2 * sin_l,
        sin_l - alpha2 * sin_l + hk2 * cos_l,
        2.0 * (h * sin_l - k * cos_l),
    ) * (radius / s2);

    let velocity = DVec3::new(
        sin_l + alpha2 * sin_l - hk2 * cos_l + g - hk2 * f + alpha2 * g,
        -cos_l + alpha2 * cos_l + hk2 * sin_l - f + hk2 * g + alpha2 * f,
        -2.0 * (h * cos_l + k * sin_l + f * h + g * k),
    ) * (-(mu / p).sqrt() / s2);

    StateVectors { position, velocity }
}

/// Recovers modified equinoctial elements from state vectors.
///
/// # Errors
/// Returns [`InputError::EquinoctialSingularity`] for retrograde
/// equatorial trajectories.
pub fn cartesian_to_equinoctial(
    mu: f64,
    state: &StateVectors,
) -> Result<ModifiedEquinoctialElements, InputError> {
    classical_to_equinoctial(&cartesian_to_classical(mu, state))
}
