//! # Two-body kernel
//! This library crate contains the numerical core of two-body orbital
//! mechanics: the Kepler equation in all of its forms, conversions between
//! orbital element sets, a family of interchangeable propagators, and
//! Lambert solvers.
//!
//! Everything is a pure function of its inputs. Nothing here keeps state
//! between calls, and nothing deals with physical units: lengths, times
//! and the gravitational parameter only have to be mutually consistent
//! (e.g. km, s and km³/s²). Angles are always in radians.
//!
//! ## Getting started
//! The crate is organized in five parts:
//! - Anomaly conversions ([`true_to_eccentric`], [`mean_to_hyperbolic`],
//!   [`Anomaly::convert`], ...), with element-wise variants over slices.
//! - The Kepler equation solvers ([`newton`], [`kepler_elliptic`],
//!   [`kepler_hyperbolic`]) those conversions are built upon.
//! - Element conversions between [`StateVectors`], [`ClassicalElements`]
//!   and [`ModifiedEquinoctialElements`].
//! - The [`Propagator`] trait and its implementors: [`Farnocchia`],
//!   [`Vallado`], [`Mikkola`], [`Markley`], [`Pimienta`], [`Gooding`],
//!   [`Danby`], [`RecSeries`] and [`Cowell`].
//! - The [`lambert`] module, with Izzo's and Vallado's Lambert solvers.
//!
//! Failures are reported through [`KernelError`], which is either an
//! [`InputError`] (the arguments were rejected) or a
//! [`ConvergenceFailure`] (an iteration ran out of budget).
//!
//! ## Example
//!
//! ```rust
//! use glam::DVec3;
//!
//! use twobody_kernel::{ClassicalElements, Farnocchia, Propagator, StateVectors};
//!
//! # fn main() {
//! let mu = 398600.4418;
//! let state = StateVectors {
//!     position: DVec3::new(7000.0, 0.0, 0.0),
//!     velocity: DVec3::new(0.0, (mu / 7000.0f64).sqrt(), 0.0),
//! };
//!
//! // A circular orbit comes back to where it started after one period
//! let period = state.to_classical(mu).period(mu).unwrap();
//! let after = Farnocchia::default().propagate(mu, &state, period).unwrap();
//!
//! assert!((after.position - state.position).length() < 1e-6);
//! # }
//! ```

#![warn(missing_docs)]

mod angles;
mod elements;
mod error;
pub mod lambert;
mod math;
mod propagation;
mod solvers;

use glam::DVec3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub use angles::{
    broadcast_with, eccentric_to_mean, eccentric_to_mean_vector, eccentric_to_true,
    eccentric_to_true_vector, flight_path_angle, flight_path_angle_vector, hyperbolic_to_mean,
    hyperbolic_to_mean_vector, hyperbolic_to_true, hyperbolic_to_true_vector,
    mean_to_eccentric, mean_to_eccentric_broadcast, mean_to_eccentric_vector,
    mean_to_hyperbolic, mean_to_hyperbolic_broadcast, mean_to_hyperbolic_vector,
    mean_to_parabolic, mean_to_parabolic_vector, parabolic_to_mean, parabolic_to_mean_vector,
    parabolic_to_true, parabolic_to_true_vector, true_to_eccentric, true_to_eccentric_vector,
    true_to_hyperbolic, true_to_hyperbolic_vector, true_to_parabolic, true_to_parabolic_vector,
    zip_checked, Anomaly, AnomalyKind, Broadcast, Regime,
};
pub use elements::{
    cartesian_to_classical, cartesian_to_classical_with_tol, cartesian_to_equinoctial,
    classical_to_cartesian, classical_to_equinoctial, coe_rotation_matrix,
    equinoctial_to_cartesian, equinoctial_to_classical, rv_pqw, ClassicalElements,
    ModifiedEquinoctialElements, CLASSIFICATION_TOL, EQUINOCTIAL_SINGULARITY_TOL,
};
pub use error::{ConvergenceFailure, InputError, KernelError};
pub use lambert::{LambertOptions, LambertSolution};
pub use math::{signed_atan2, sinhcosh, stumpff_c2, stumpff_c3, wrap_to_pi, wrap_to_tau};
pub use propagation::{
    d2s_x_alt, d_to_m_near_parabolic, danby_coe, delta_t_from_nu, ds_x_alt, farnocchia_coe,
    gooding_coe, kepler_equation_near_parabolic, kepler_equation_prime_near_parabolic,
    m_to_d_near_parabolic, markley_coe, mikkola_coe, nu_from_delta_t, pimienta_coe,
    recseries_coe, s_x, vallado_fg, Cowell, CowellOptions, Danby, Farnocchia, Gooding,
    LagrangeCoefficients, Markley, Mikkola, Perturbation, Pimienta, Propagator, PropagatorKind,
    RecSeries, RecSeriesTermination, Vallado, NEAR_PARABOLIC_DELTA,
};
pub use solvers::{
    elliptic_seed, kepler_elliptic, kepler_hyperbolic, newton, NewtonOptions,
    ELLIPTIC_MAX_ITERS, HYPERBOLIC_MAX_ITERS, NEWTON_TOL,
};

/// A struct representing a position and velocity relative to the attractor.
///
/// The position vector is in length units, while the velocity vector is in
/// length units per time unit, consistent with the gravitational parameter
/// they are used with.
///
/// State vectors can be turned into classical elements, see
/// [`to_classical`][Self::to_classical].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StateVectors {
    /// The 3D position at a point in the orbit.
    pub position: DVec3,
    /// The 3D velocity at a point in the orbit.
    pub velocity: DVec3,
}

#[cfg(test)]
mod tests;
