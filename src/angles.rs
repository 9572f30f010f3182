//! Conversions between the true, eccentric, hyperbolic, parabolic and
//! mean anomalies.
//!
//! Every conversion is closed-form except for
//! [`mean_to_eccentric`] and [`mean_to_hyperbolic`], which solve the
//! Kepler equation iteratively (see [`newton`][crate::newton]).
//!
//! Results of the half-angle formulas are restricted to `(-π, π]` no matter
//! the input. The mean anomaly side is never wrapped: whatever range the
//! caller supplies is carried through.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    solvers::{kepler_elliptic, kepler_hyperbolic, NewtonOptions},
    ConvergenceFailure, InputError, KernelError,
};

/// The shape of a conic, derived from its eccentricity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Regime {
    /// `e == 0`
    Circular,
    /// `0 < e < 1`
    Elliptic,
    /// `e == 1`
    Parabolic,
    /// `e > 1`
    Hyperbolic,
}

impl Regime {
    /// Classifies an eccentricity.
    ///
    /// # Example
    /// ```
    /// use twobody_kernel::Regime;
    ///
    /// assert_eq!(Regime::of(0.0), Regime::Circular);
    /// assert_eq!(Regime::of(0.5), Regime::Elliptic);
    /// assert_eq!(Regime::of(1.0), Regime::Parabolic);
    /// assert_eq!(Regime::of(3.2), Regime::Hyperbolic);
    /// ```
    ///
    /// # Unchecked Operation
    /// This function does not check whether or not the eccentricity is
    /// valid. A negative eccentricity is classified as elliptic and a NaN
    /// as hyperbolic.
    pub fn of(ecc: f64) -> Self {
        if ecc == 0.0 {
            Regime::Circular
        } else if ecc < 1.0 {
            Regime::Elliptic
        } else if ecc == 1.0 {
            Regime::Parabolic
        } else {
            Regime::Hyperbolic
        }
    }

    /// Whether the orbit is closed (circular or elliptic).
    pub fn is_closed(self) -> bool {
        matches!(self, Regime::Circular | Regime::Elliptic)
    }
}

/// Gets the eccentric anomaly from the true anomaly.
///
/// ```text
/// E = 2 atan(sqrt((1 - e) / (1 + e)) tan(ν / 2))
/// ```
///
/// The result lies in `(-π, π]` no matter the value of the true anomaly.
///
/// # Unchecked Operation
/// Meaningful only for `0 <= e < 1`.
pub fn true_to_eccentric(nu: f64, ecc: f64) -> f64 {
    2.0 * (((1.0 - ecc) / (1.0 + ecc)).sqrt() * (nu * 0.5).tan()).atan()
}

/// Gets the true anomaly from the eccentric anomaly.
///
/// ```text
/// ν = 2 atan(sqrt((1 + e) / (1 - e)) tan(E / 2))
/// ```
///
/// The result lies in `(-π, π]` no matter the value of the eccentric anomaly.
///
/// # Unchecked Operation
/// Meaningful only for `0 <= e < 1`.
pub fn eccentric_to_true(ecc_anomaly: f64, ecc: f64) -> f64 {
    2.0 * (((1.0 + ecc) / (1.0 - ecc)).sqrt() * (ecc_anomaly * 0.5).tan()).atan()
}

/// Gets the hyperbolic anomaly from the true anomaly.
///
/// ```text
/// F = 2 atanh(sqrt((e - 1) / (e + 1)) tan(ν / 2))
/// ```
///
/// The hyperbolic anomaly is only continuous if the true anomaly lies
/// in `(-π, π]`, which holds anyway for the physically reachable part of
/// a hyperbola. No wrapping is performed.
///
/// # Unchecked Operation
/// Meaningful only for `e > 1`.
pub fn true_to_hyperbolic(nu: f64, ecc: f64) -> f64 {
    2.0 * (((ecc - 1.0) / (ecc + 1.0)).sqrt() * (nu * 0.5).tan()).atanh()
}

/// Gets the true anomaly from the hyperbolic anomaly.
///
/// ```text
/// ν = 2 atan(sqrt((e + 1) / (e - 1)) tanh(F / 2))
/// ```
///
/// # Unchecked Operation
/// Meaningful only for `e > 1`.
pub fn hyperbolic_to_true(hyp_anomaly: f64, ecc: f64) -> f64 {
    2.0 * (((ecc + 1.0) / (ecc - 1.0)).sqrt() * (hyp_anomaly * 0.5).tanh()).atan()
}

/// Gets the parabolic anomaly from the true anomaly.
///
/// ```text
/// D = tan(ν / 2)
/// ```
///
/// The parabolic anomaly is only continuous if the true anomaly lies
/// in `(-π, π]`. No validation or wrapping is performed.
pub fn true_to_parabolic(nu: f64) -> f64 {
    (nu * 0.5).tan()
}

/// Gets the true anomaly from the parabolic anomaly, `ν = 2 atan(D)`.
pub fn parabolic_to_true(par_anomaly: f64) -> f64 {
    2.0 * par_anomaly.atan()
}

/// Gets the mean anomaly from the eccentric anomaly, using the plain
/// Kepler equation `M = E - e sin(E)`.
///
/// The mean anomaly lies outside of `(-π, π]` if the eccentric anomaly does.
pub fn eccentric_to_mean(ecc_anomaly: f64, ecc: f64) -> f64 {
    ecc_anomaly - ecc * ecc_anomaly.sin()
}

/// Gets the mean anomaly from the hyperbolic anomaly, `M = e sinh(F) - F`.
pub fn hyperbolic_to_mean(hyp_anomaly: f64, ecc: f64) -> f64 {
    ecc * hyp_anomaly.sinh() - hyp_anomaly
}

/// Gets the mean anomaly from the parabolic anomaly (Barker's equation),
/// `M = D + D³ / 3`.
///
/// This "mean anomaly" is not an angle: it reaches π near ν = 120° and
/// grows without bound after that.
pub fn parabolic_to_mean(par_anomaly: f64) -> f64 {
    par_anomaly + par_anomaly.powi(3) / 3.0
}

/// Gets the eccentric anomaly from the mean anomaly by solving the
/// elliptic Kepler equation with the default [`NewtonOptions::ELLIPTIC`].
///
/// # Errors
/// Returns a [`ConvergenceFailure`] if the Newton iteration runs out of
/// iterations.
///
/// # Example
/// ```
/// use twobody_kernel::{eccentric_to_mean, mean_to_eccentric};
///
/// let ecc_anomaly = mean_to_eccentric(65f64.to_radians(), 0.35).unwrap();
/// assert!((ecc_anomaly.to_degrees() - 84.976494).abs() < 1e-5);
/// assert!((eccentric_to_mean(ecc_anomaly, 0.35) - 65f64.to_radians()).abs() < 1e-12);
/// ```
pub fn mean_to_eccentric(mean_anomaly: f64, ecc: f64) -> Result<f64, ConvergenceFailure> {
    kepler_elliptic(mean_anomaly, ecc, NewtonOptions::ELLIPTIC)
}

/// Gets the hyperbolic anomaly from the mean anomaly by solving the
/// hyperbolic Kepler equation with the default [`NewtonOptions::HYPERBOLIC`].
///
/// # Errors
/// Returns a [`ConvergenceFailure`] if the Newton iteration runs out of
/// iterations.
pub fn mean_to_hyperbolic(mean_anomaly: f64, ecc: f64) -> Result<f64, ConvergenceFailure> {
    kepler_hyperbolic(mean_anomaly, ecc, NewtonOptions::HYPERBOLIC)
}

/// Gets the parabolic anomaly from the mean anomaly.
///
/// This is the exact cubic solution of Barker's equation (Battin):
///
/// ```text
/// B = 3M / 2
/// A = (B + sqrt(1 + B²))^(2/3)
/// D = 2AB / (1 + A + A²)
/// ```
pub fn mean_to_parabolic(mean_anomaly: f64) -> f64 {
    let b = 1.5 * mean_anomaly;
    let a = (b + (1.0 + b * b).sqrt()).powf(2.0 / 3.0);

    2.0 * a * b / (1.0 + a + a * a)
}

/// Gets the flight path angle at a true anomaly.
///
/// ```text
/// φ = atan2(e sin(ν), 1 + e cos(ν))
/// ```
pub fn flight_path_angle(nu: f64, ecc: f64) -> f64 {
    let (sin_nu, cos_nu) = nu.sin_cos();
    (ecc * sin_nu).atan2(1.0 + ecc * cos_nu)
}

/// Maps `f` over two sequences of equal length.
///
/// # Errors
/// Returns [`InputError::LengthMismatch`] if the lengths differ.
pub fn zip_checked<T>(
    values: &[f64],
    eccentricities: &[f64],
    f: impl Fn(f64, f64) -> T,
) -> Result<Vec<T>, InputError> {
    if values.len() != eccentricities.len() {
        return Err(InputError::LengthMismatch {
            left: values.len(),
            right: eccentricities.len(),
        });
    }

    Ok(values
        .iter()
        .zip(eccentricities)
        .map(|(&value, &ecc)| f(value, ecc))
        .collect())
}

macro_rules! elementwise {
    ( $( $vector:ident => $scalar:ident $( : $arity:tt )? ),* $(,)? ) => {
        $(
            elementwise!(@make $vector, $scalar $( : $arity )?);
        )*
    };

    (@make $vector:ident, $scalar:ident) => {
        #[doc = concat!("Element-wise [`", stringify!($scalar), "`].")]
        pub fn $vector(values: &[f64]) -> Vec<f64> {
            values.iter().map(|&value| $scalar(value)).collect()
        }
    };

    (@make $vector:ident, $scalar:ident : 2) => {
        #[doc = concat!("Element-wise [`", stringify!($scalar), "`] over equal-length slices.")]
        ///
        /// # Errors
        /// Returns [`InputError::LengthMismatch`] if the slices differ in length.
        pub fn $vector(values: &[f64], eccentricities: &[f64]) -> Result<Vec<f64>, InputError> {
            zip_checked(values, eccentricities, $scalar)
        }
    };
}

elementwise!(
    true_to_eccentric_vector => true_to_eccentric: 2,
    eccentric_to_true_vector => eccentric_to_true: 2,
    true_to_hyperbolic_vector => true_to_hyperbolic: 2,
    hyperbolic_to_true_vector => hyperbolic_to_true: 2,
    eccentric_to_mean_vector => eccentric_to_mean: 2,
    hyperbolic_to_mean_vector => hyperbolic_to_mean: 2,
    flight_path_angle_vector => flight_path_angle: 2,
    true_to_parabolic_vector => true_to_parabolic,
    parabolic_to_true_vector => parabolic_to_true,
    parabolic_to_mean_vector => parabolic_to_mean,
    mean_to_parabolic_vector => mean_to_parabolic,
);

/// Element-wise [`mean_to_eccentric`] over equal-length slices.
///
/// Each element is solved on its own: a diverging element becomes an
/// `Err` in its own slot and does not affect the others.
///
/// # Errors
/// Returns [`InputError::LengthMismatch`] if the slices differ in length.
pub fn mean_to_eccentric_vector(
    mean_anomalies: &[f64],
    eccentricities: &[f64],
) -> Result<Vec<Result<f64, ConvergenceFailure>>, InputError> {
    zip_checked(mean_anomalies, eccentricities, mean_to_eccentric)
}

/// Element-wise [`mean_to_hyperbolic`] over equal-length slices.
///
/// Each element is solved on its own: a diverging element becomes an
/// `Err` in its own slot and does not affect the others.
///
/// # Errors
/// Returns [`InputError::LengthMismatch`] if the slices differ in length.
pub fn mean_to_hyperbolic_vector(
    mean_anomalies: &[f64],
    eccentricities: &[f64],
) -> Result<Vec<Result<f64, ConvergenceFailure>>, InputError> {
    zip_checked(mean_anomalies, eccentricities, mean_to_hyperbolic)
}

/// A parameter that is either one value shared by every element,
/// or one value per element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Broadcast<'a> {
    /// The same value for every element.
    Scalar(f64),
    /// One value per element.
    Slice(&'a [f64]),
}

impl Broadcast<'_> {
    fn len(&self) -> Option<usize> {
        match self {
            Broadcast::Scalar(_) => None,
            Broadcast::Slice(values) => Some(values.len()),
        }
    }

    fn get(&self, index: usize) -> f64 {
        match self {
            Broadcast::Scalar(value) => *value,
            Broadcast::Slice(values) => values[index],
        }
    }
}

impl From<f64> for Broadcast<'_> {
    fn from(value: f64) -> Self {
        Broadcast::Scalar(value)
    }
}

impl<'a> From<&'a [f64]> for Broadcast<'a> {
    fn from(values: &'a [f64]) -> Self {
        Broadcast::Slice(values)
    }
}

/// Maps `f` over two broadcast parameters.
///
/// Two scalars give a single result; a scalar next to a slice is repeated
/// for every element of the slice; two slices must have the same length.
///
/// # Errors
/// Returns [`InputError::LengthMismatch`] if two slices differ in length.
pub fn broadcast_with<T>(
    a: Broadcast<'_>,
    b: Broadcast<'_>,
    f: impl Fn(f64, f64) -> T,
) -> Result<Vec<T>, InputError> {
    let len = match (a.len(), b.len()) {
        (None, None) => 1,
        (Some(len), None) | (None, Some(len)) => len,
        (Some(left), Some(right)) if left == right => left,
        (Some(left), Some(right)) => return Err(InputError::LengthMismatch { left, right }),
    };

    Ok((0..len).map(|i| f(a.get(i), b.get(i))).collect())
}

/// [`mean_to_eccentric`] with scalar-or-slice arguments.
///
/// # Errors
/// Returns [`InputError::LengthMismatch`] if two slices differ in length.
///
/// # Example
/// ```
/// use twobody_kernel::{mean_to_eccentric_broadcast, Broadcast};
///
/// let eccs = [0.1, 0.2, 0.3];
/// let solved = mean_to_eccentric_broadcast(Broadcast::Scalar(1.0), Broadcast::Slice(&eccs)).unwrap();
/// assert_eq!(solved.len(), 3);
/// ```
pub fn mean_to_eccentric_broadcast(
    mean_anomaly: Broadcast<'_>,
    ecc: Broadcast<'_>,
) -> Result<Vec<Result<f64, ConvergenceFailure>>, InputError> {
    broadcast_with(mean_anomaly, ecc, mean_to_eccentric)
}

/// [`mean_to_hyperbolic`] with scalar-or-slice arguments.
///
/// # Errors
/// Returns [`InputError::LengthMismatch`] if two slices differ in length.
pub fn mean_to_hyperbolic_broadcast(
    mean_anomaly: Broadcast<'_>,
    ecc: Broadcast<'_>,
) -> Result<Vec<Result<f64, ConvergenceFailure>>, InputError> {
    broadcast_with(mean_anomaly, ecc, mean_to_hyperbolic)
}

/// The kinds of anomaly an angle along a conic can be expressed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AnomalyKind {
    /// Grows linearly with time. Its definition depends on the regime.
    Mean,
    /// Angle from periapsis to the body, seen from the focus.
    True,
    /// Elliptic (and circular) orbits only.
    Eccentric,
    /// Hyperbolic orbits only.
    Hyperbolic,
    /// Parabolic orbits only.
    Parabolic,
}

/// An angle tagged with the kind of anomaly it is.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Anomaly {
    /// What kind of anomaly `value` is.
    pub kind: AnomalyKind,
    /// The angle, in radians.
    pub value: f64,
}

impl Anomaly {
    /// Creates a new tagged anomaly.
    pub fn new(kind: AnomalyKind, value: f64) -> Self {
        Self { kind, value }
    }

    /// Converts this anomaly into another kind, for an orbit of
    /// eccentricity `ecc`.
    ///
    /// The conversion goes through the true anomaly.
    ///
    /// # Errors
    /// - [`InputError::UnsupportedEccentricity`] if either kind does not
    ///   exist in the regime of `ecc` (e.g. an eccentric anomaly on a
    ///   hyperbola).
    /// - [`ConvergenceFailure`] if a mean anomaly had to be solved for and
    ///   the iteration did not converge.
    ///
    /// # Example
    /// ```
    /// use twobody_kernel::{Anomaly, AnomalyKind};
    ///
    /// let mean = Anomaly::new(AnomalyKind::Mean, 0.5);
    /// let parabolic = mean.convert(AnomalyKind::Parabolic, 1.0).unwrap();
    /// assert!((parabolic.value - 0.46622052391077345).abs() < 1e-12);
    /// ```
    pub fn convert(self, target: AnomalyKind, ecc: f64) -> Result<Anomaly, KernelError> {
        check_kind(self.kind, Regime::of(ecc), ecc)?;

        if self.kind == target {
            return Ok(self);
        }

        let nu = self.to_true(ecc)?;
        let regime = Regime::of(ecc);
        check_kind(target, regime, ecc)?;

        let value = match target {
            AnomalyKind::True => nu,
            AnomalyKind::Eccentric => true_to_eccentric(nu, ecc),
            AnomalyKind::Hyperbolic => true_to_hyperbolic(nu, ecc),
            AnomalyKind::Parabolic => true_to_parabolic(nu),
            AnomalyKind::Mean => match regime {
                Regime::Circular | Regime::Elliptic => {
                    eccentric_to_mean(true_to_eccentric(nu, ecc), ecc)
                }
                Regime::Parabolic => parabolic_to_mean(true_to_parabolic(nu)),
                Regime::Hyperbolic => hyperbolic_to_mean(true_to_hyperbolic(nu, ecc), ecc),
            },
        };

        Ok(Anomaly::new(target, value))
    }

    fn to_true(self, ecc: f64) -> Result<f64, KernelError> {
        let regime = Regime::of(ecc);
        check_kind(self.kind, regime, ecc)?;

        Ok(match self.kind {
            AnomalyKind::True => self.value,
            AnomalyKind::Eccentric => eccentric_to_true(self.value, ecc),
            AnomalyKind::Hyperbolic => hyperbolic_to_true(self.value, ecc),
            AnomalyKind::Parabolic => parabolic_to_true(self.value),
            AnomalyKind::Mean => match regime {
                Regime::Circular | Regime::Elliptic => {
                    eccentric_to_true(mean_to_eccentric(self.value, ecc)?, ecc)
                }
                Regime::Parabolic => parabolic_to_true(mean_to_parabolic(self.value)),
                Regime::Hyperbolic => hyperbolic_to_true(mean_to_hyperbolic(self.value, ecc)?, ecc),
            },
        })
    }
}

fn check_kind(kind: AnomalyKind, regime: Regime, ecc: f64) -> Result<(), InputError> {
    let (supported, requirement) = match kind {
        AnomalyKind::Mean | AnomalyKind::True => (true, ""),
        AnomalyKind::Eccentric => (regime.is_closed(), "eccentric anomaly needs 0 <= e < 1"),
        AnomalyKind::Hyperbolic => (regime == Regime::Hyperbolic, "hyperbolic anomaly needs e > 1"),
        AnomalyKind::Parabolic => (regime == Regime::Parabolic, "parabolic anomaly needs e == 1"),
    };

    if supported {
        Ok(())
    } else {
        Err(InputError::UnsupportedEccentricity {
            algorithm: "anomaly conversion",
            ecc,
            supported: requirement,
        })
    }
}
