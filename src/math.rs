//! Scalar helpers shared by the converters and propagators.

use core::f64::consts::{PI, TAU};

/// Half-width of the band around `psi = 0` in which the Stumpff
/// functions are evaluated through their power series.
const STUMPFF_SERIES_BAND: f64 = 1.0;

/// Upper bound on the number of series terms in [`stumpff_c2`] and
/// [`stumpff_c3`]. Inside the series band the terms shrink factorially,
/// so this is never reached in practice.
const STUMPFF_MAX_TERMS: u32 = 64;

/// Recovers an angle over the full `[0, 2π)` range.
///
/// `y` and `x` are the sine-like and cosine-like parts of the angle
/// (usually the magnitude of a cross product and a dot product), and
/// `sign_reference` decides which half of the circle the angle lies in:
/// a negative reference mirrors the principal `[0, π]` value into `(π, 2π)`.
///
/// Only the magnitude of `y` is used, so the sign convention lives entirely
/// in `sign_reference`.
///
/// # Example
/// ```
/// use twobody_kernel::signed_atan2;
/// use std::f64::consts::{FRAC_PI_2, PI};
///
/// assert_eq!(signed_atan2(1.0, 0.0, 1.0), FRAC_PI_2);
/// assert_eq!(signed_atan2(1.0, 0.0, -1.0), 3.0 * FRAC_PI_2);
/// assert_eq!(signed_atan2(0.0, 1.0, -1.0), 0.0);
/// assert_eq!(signed_atan2(0.0, -1.0, 1.0), PI);
/// ```
#[inline]
pub fn signed_atan2(y: f64, x: f64, sign_reference: f64) -> f64 {
    let principal = y.abs().atan2(x);

    if sign_reference >= 0.0 {
        principal
    } else {
        (TAU - principal) % TAU
    }
}

/// Wraps an angle into `[-π, π)`.
#[inline]
pub fn wrap_to_pi(angle: f64) -> f64 {
    (angle + PI).rem_euclid(TAU) - PI
}

/// Wraps an angle into `[0, 2π)`.
#[inline]
pub fn wrap_to_tau(angle: f64) -> f64 {
    angle.rem_euclid(TAU)
}

/// `(sinh(x), cosh(x))` from a single pair of exponentials.
#[inline]
pub fn sinhcosh(x: f64) -> (f64, f64) {
    let e_x = x.exp();
    let e_neg_x = (-x).exp();

    ((e_x - e_neg_x) * 0.5, (e_x + e_neg_x) * 0.5)
}

/// The second Stumpff function, `c2(psi)`.
///
/// ```text
/// c2(psi) = (1 - cos(sqrt(psi))) / psi        psi > 0
///         = (cosh(sqrt(-psi)) - 1) / (-psi)   psi < 0
///         = sum_k (-psi)^k / (2k + 2)!        near zero
/// ```
pub fn stumpff_c2(psi: f64) -> f64 {
    if psi > STUMPFF_SERIES_BAND {
        (1.0 - psi.sqrt().cos()) / psi
    } else if psi < -STUMPFF_SERIES_BAND {
        ((-psi).sqrt().cosh() - 1.0) / -psi
    } else {
        // term_k = term_(k-1) * (-psi) / ((2k + 1)(2k + 2))
        let mut res = 0.5;
        let mut term = 0.5;

        for k in 1..STUMPFF_MAX_TERMS {
            let k = k as f64;
            term *= -psi / ((2.0 * k + 1.0) * (2.0 * k + 2.0));
            let next = res + term;
            if next == res {
                break;
            }
            res = next;
        }

        res
    }
}

/// The third Stumpff function, `c3(psi)`.
///
/// ```text
/// c3(psi) = (sqrt(psi) - sin(sqrt(psi))) / psi^(3/2)          psi > 0
///         = (sinh(sqrt(-psi)) - sqrt(-psi)) / (-psi)^(3/2)    psi < 0
///         = sum_k (-psi)^k / (2k + 3)!                        near zero
/// ```
pub fn stumpff_c3(psi: f64) -> f64 {
    if psi > STUMPFF_SERIES_BAND {
        let sqrt_psi = psi.sqrt();
        (sqrt_psi - sqrt_psi.sin()) / (psi * sqrt_psi)
    } else if psi < -STUMPFF_SERIES_BAND {
        let sqrt_neg_psi = (-psi).sqrt();
        (sqrt_neg_psi.sinh() - sqrt_neg_psi) / (-psi * sqrt_neg_psi)
    } else {
        // term_k = term_(k-1) * (-psi) / ((2k + 2)(2k + 3))
        let mut res = 1.0 / 6.0;
        let mut term = 1.0 / 6.0;

        for k in 1..STUMPFF_MAX_TERMS {
            let k = k as f64;
            term *= -psi / ((2.0 * k + 2.0) * (2.0 * k + 3.0));
            let next = res + term;
            if next == res {
                break;
            }
            res = next;
        }

        res
    }
}
