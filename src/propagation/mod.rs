//! Interchangeable two-body propagators.
//!
//! Every propagator implements [`Propagator`]: given the gravitational
//! parameter, an initial [`StateVectors`] and a time of flight, it returns
//! the state vectors after that time. No propagator keeps state between
//! calls, so the same instance can be shared freely across threads.
//!
//! Most of them work on the classical elements: the initial state is
//! converted with [`cartesian_to_classical`], the true anomaly is advanced
//! by solving a Kepler-type equation, and the result is converted back with
//! [`classical_to_cartesian`]. [`Vallado`] works on the universal variable
//! and the Lagrange coefficients directly, and [`Cowell`] integrates the
//! equations of motion numerically.
//!
//! # Example
//! ```
//! use glam::DVec3;
//! use twobody_kernel::{Farnocchia, Markley, Propagator, StateVectors};
//!
//! let mu = 398600.4418;
//! let iss = StateVectors {
//!     position: DVec3::new(859.07256, -4137.20368, 5295.56871),
//!     velocity: DVec3::new(7.37289205, 2.08223573, 0.439999794),
//! };
//!
//! let propagators: [&dyn Propagator; 2] = [&Farnocchia::default(), &Markley];
//! let states: Vec<_> = propagators
//!     .iter()
//!     .map(|p| p.propagate(mu, &iss, 3600.0).unwrap())
//!     .collect();
//!
//! let drift = (states[0].position - states[1].position).length();
//! assert!(drift < 1e-3);
//! ```

mod cowell;
mod danby;
mod farnocchia;
mod gooding;
mod markley;
mod mikkola;
mod pimienta;
mod recseries;
mod vallado;

use core::ops::BitOr;

use crate::{
    cartesian_to_classical, classical_to_cartesian, ClassicalElements, InputError, KernelError,
    Regime, StateVectors,
};

pub use cowell::{Cowell, CowellOptions, Perturbation};
pub use danby::{danby_coe, Danby};
pub use farnocchia::{
    d2s_x_alt, d_to_m_near_parabolic, delta_t_from_nu, ds_x_alt, farnocchia_coe,
    kepler_equation_near_parabolic, kepler_equation_prime_near_parabolic, m_to_d_near_parabolic,
    nu_from_delta_t, s_x, Farnocchia, NEAR_PARABOLIC_DELTA,
};
pub use gooding::{gooding_coe, Gooding};
pub use markley::{markley_coe, Markley};
pub use mikkola::{mikkola_coe, Mikkola};
pub use pimienta::{pimienta_coe, Pimienta};
pub use recseries::{recseries_coe, RecSeries, RecSeriesTermination};
pub use vallado::{vallado_fg, LagrangeCoefficients, Vallado};

/// The orbit regimes a propagator accepts, as a set of flags.
///
/// Circular orbits count as [`ELLIPTIC`][Self::ELLIPTIC].
///
/// # Example
/// ```
/// use twobody_kernel::PropagatorKind;
///
/// let kind = PropagatorKind::ELLIPTIC | PropagatorKind::HYPERBOLIC;
/// assert!(kind.supports(0.3));
/// assert!(kind.supports(2.0));
/// assert!(!kind.supports(1.0));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PropagatorKind(u8);

impl PropagatorKind {
    /// Closed orbits, `0 <= e < 1`.
    pub const ELLIPTIC: Self = Self(0b001);
    /// Parabolic trajectories, `e == 1`.
    pub const PARABOLIC: Self = Self(0b010);
    /// Hyperbolic trajectories, `e > 1`.
    pub const HYPERBOLIC: Self = Self(0b100);
    /// Every regime.
    pub const ALL: Self = Self(0b111);

    /// Whether every flag of `other` is also set in `self`.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// The flag matching a regime.
    pub const fn of_regime(regime: Regime) -> Self {
        match regime {
            Regime::Circular | Regime::Elliptic => Self::ELLIPTIC,
            Regime::Parabolic => Self::PARABOLIC,
            Regime::Hyperbolic => Self::HYPERBOLIC,
        }
    }

    /// Whether an orbit of eccentricity `ecc` falls in this set.
    pub fn supports(self, ecc: f64) -> bool {
        self.contains(Self::of_regime(Regime::of(ecc)))
    }

    fn describe(self) -> &'static str {
        match self.0 {
            0b001 => "elliptic only, 0 <= e < 1",
            0b010 => "parabolic only, e == 1",
            0b100 => "hyperbolic only, e > 1",
            0b011 => "elliptic and parabolic, 0 <= e <= 1",
            0b101 => "elliptic and hyperbolic, e != 1",
            0b110 => "parabolic and hyperbolic, e >= 1",
            0b111 => "every regime",
            _ => "no regime",
        }
    }

    /// Rejects an eccentricity outside of this set.
    ///
    /// # Errors
    /// Returns [`InputError::UnsupportedEccentricity`] naming `algorithm`.
    pub fn check(self, algorithm: &'static str, ecc: f64) -> Result<(), InputError> {
        if self.supports(ecc) {
            Ok(())
        } else {
            Err(InputError::UnsupportedEccentricity {
                algorithm,
                ecc,
                supported: self.describe(),
            })
        }
    }
}

impl BitOr for PropagatorKind {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// A two-body propagator.
///
/// Implementors are interchangeable: any of them can be handed the same
/// arguments, and all of them should agree on the result within their
/// convergence tolerance, as long as the orbit is inside their
/// [`kind`][Propagator::kind].
pub trait Propagator {
    /// The regimes this propagator can handle.
    fn kind(&self) -> PropagatorKind;

    /// Advances `state` by `tof` under the gravitational parameter `mu`.
    ///
    /// A negative time of flight propagates backwards.
    ///
    /// # Errors
    /// - [`InputError::UnsupportedEccentricity`] if the orbit lies outside
    ///   of [`kind`][Propagator::kind].
    /// - [`InputError::InvalidArgument`] if `mu` is not positive.
    /// - A [`ConvergenceFailure`][crate::ConvergenceFailure] if an internal
    ///   iteration ran out of its budget.
    fn propagate(&self, mu: f64, state: &StateVectors, tof: f64)
        -> Result<StateVectors, KernelError>;
}

pub(crate) fn check_mu(mu: f64) -> Result<(), InputError> {
    if mu > 0.0 && mu.is_finite() {
        Ok(())
    } else {
        Err(InputError::InvalidArgument {
            name: "mu",
            reason: "the gravitational parameter must be positive and finite",
        })
    }
}

/// Shared driver of the element-based propagators: converts to classical
/// elements, checks the regime, advances the true anomaly with `advance`,
/// and converts back.
pub(crate) fn propagate_elements(
    algorithm: &'static str,
    kind: PropagatorKind,
    mu: f64,
    state: &StateVectors,
    advance: impl FnOnce(&ClassicalElements) -> Result<f64, KernelError>,
) -> Result<StateVectors, KernelError> {
    check_mu(mu)?;

    let elements = cartesian_to_classical(mu, state);
    kind.check(algorithm, elements.ecc)?;

    let nu = advance(&elements)?;
    log::trace!("{algorithm}: nu {} -> {nu}", elements.nu);

    Ok(classical_to_cartesian(mu, &ClassicalElements { nu, ..elements }))
}
