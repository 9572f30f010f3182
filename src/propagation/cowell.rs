//! Cowell's method: direct numerical integration of the equations of
//! motion, with an optional perturbing acceleration.
//!
//! The integrator is the embedded Dormand–Prince 5(4) pair with adaptive
//! step-size control.
//!
//! Reference: Hairer, Nørsett, Wanner, "Solving Ordinary Differential
//! Equations I: Nonstiff Problems", section II.5.

use glam::DVec3;

use crate::{ConvergenceFailure, KernelError, StateVectors};

use super::{check_mu, Propagator, PropagatorKind};

/// Default relative tolerance of the integrator.
pub const COWELL_RTOL: f64 = 1e-11;

/// Default absolute tolerance of the integrator.
pub const COWELL_ATOL: f64 = 1e-12;

/// Default cap on the number of attempted steps.
pub const COWELL_MAX_STEPS: u32 = 1_000_000;

// Dormand–Prince nodes and coefficients
const C2: f64 = 1.0 / 5.0;
const C3: f64 = 3.0 / 10.0;
const C4: f64 = 4.0 / 5.0;
const C5: f64 = 8.0 / 9.0;

const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;

// Fifth-order weights, also the last stage
const B1: f64 = 35.0 / 384.0;
const B3: f64 = 500.0 / 1113.0;
const B4: f64 = 125.0 / 192.0;
const B5: f64 = -2187.0 / 6784.0;
const B6: f64 = 11.0 / 84.0;

// Fifth minus fourth-order weights
const E1: f64 = 71.0 / 57600.0;
const E3: f64 = -71.0 / 16695.0;
const E4: f64 = 71.0 / 1920.0;
const E5: f64 = -17253.0 / 339200.0;
const E6: f64 = 22.0 / 525.0;
const E7: f64 = -1.0 / 40.0;

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 10.0;

/// An external acceleration acting on top of the central body.
///
/// Implemented for every `Fn(t, position, velocity) -> acceleration`,
/// where `t` is the time elapsed since the initial state.
pub trait Perturbation {
    /// The perturbing acceleration at time `t` and state `(position, velocity)`.
    fn acceleration(&self, t: f64, position: DVec3, velocity: DVec3) -> DVec3;
}

impl<F> Perturbation for F
where
    F: Fn(f64, DVec3, DVec3) -> DVec3,
{
    fn acceleration(&self, t: f64, position: DVec3, velocity: DVec3) -> DVec3 {
        self(t, position, velocity)
    }
}

/// Tunables of the Cowell integrator.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CowellOptions {
    /// Relative tolerance on every state component.
    pub rtol: f64,
    /// Absolute tolerance on every state component.
    pub atol: f64,
    /// Maximum number of attempted steps, accepted or rejected.
    pub max_steps: u32,
}

impl Default for CowellOptions {
    fn default() -> Self {
        Self {
            rtol: COWELL_RTOL,
            atol: COWELL_ATOL,
            max_steps: COWELL_MAX_STEPS,
        }
    }
}

/// Cowell's propagator. Handles every regime, and is the only propagator
/// accepting a perturbing acceleration.
///
/// # Example
/// ```
/// use glam::DVec3;
/// use twobody_kernel::{Cowell, Propagator, StateVectors};
///
/// let mu = 398600.4418;
/// let state = StateVectors {
///     position: DVec3::new(7000.0, 0.0, 0.0),
///     velocity: DVec3::new(0.0, 7.5, 0.0),
/// };
///
/// // A tiny constant thrust along the velocity
/// let thrust = |_t: f64, _r: DVec3, v: DVec3| v.normalize() * 1e-7;
/// let thrusting = Cowell::new().with_perturbation(thrust);
///
/// let coasting = Cowell::new().propagate(mu, &state, 600.0).unwrap();
/// let boosted = thrusting.propagate(mu, &state, 600.0).unwrap();
///
/// assert!(boosted.velocity.length() > coasting.velocity.length());
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cowell<P = fn(f64, DVec3, DVec3) -> DVec3> {
    /// Integrator tunables.
    pub options: CowellOptions,
    /// Extra acceleration, if any.
    pub perturbation: Option<P>,
}

impl Cowell {
    /// A pure two-body Cowell propagator with the default tolerances.
    pub fn new() -> Self {
        Self {
            options: CowellOptions::default(),
            perturbation: None,
        }
    }
}

impl Default for Cowell {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Cowell<P> {
    /// Replaces the integrator tunables.
    pub fn with_options(mut self, options: CowellOptions) -> Self {
        self.options = options;
        self
    }

    /// Adds a perturbing acceleration.
    pub fn with_perturbation<Q: Perturbation>(self, perturbation: Q) -> Cowell<Q> {
        Cowell {
            options: self.options,
            perturbation: Some(perturbation),
        }
    }
}

/// Position and velocity, or their time derivatives.
type Phase = (DVec3, DVec3);

impl<P: Perturbation> Cowell<P> {
    fn derivative(&self, mu: f64, t: f64, (r, v): Phase) -> Phase {
        let r_len = r.length();
        let mut acceleration = -mu / (r_len * r_len * r_len) * r;

        if let Some(perturbation) = &self.perturbation {
            acceleration += perturbation.acceleration(t, r, v);
        }

        (v, acceleration)
    }

    fn error_norm(&self, y: Phase, y_new: Phase, error: Phase) -> f64 {
        let scale = |a: DVec3, b: DVec3| {
            DVec3::splat(self.options.atol) + self.options.rtol * a.abs().max(b.abs())
        };

        let r_err = error.0 / scale(y.0, y_new.0);
        let v_err = error.1 / scale(y.1, y_new.1);

        ((r_err.length_squared() + v_err.length_squared()) / 6.0).sqrt()
    }

    fn integrate(&self, mu: f64, y0: Phase, tof: f64) -> Result<Phase, ConvergenceFailure> {
        let direction = tof.signum();
        let total = tof.abs();

        let mut t = 0.0;
        let mut y = y0;
        let mut h = (0.01 * y0.0.length() / y0.1.length()).min(total);
        let mut k1 = self.derivative(mu, 0.0, y);

        for _ in 0..self.options.max_steps {
            if t >= total {
                return Ok(y);
            }
            let last = h >= total - t;
            if last {
                h = total - t;
            }

            let step = |k: &[(f64, Phase)]| -> Phase {
                k.iter().fold(y, |(r, v), (a, (dr, dv))| {
                    (r + direction * h * a * *dr, v + direction * h * a * *dv)
                })
            };
            let time = |c: f64| direction * (t + c * h);

            let k2 = self.derivative(mu, time(C2), step(&[(A21, k1)]));
            let k3 = self.derivative(mu, time(C3), step(&[(A31, k1), (A32, k2)]));
            let k4 = self.derivative(mu, time(C4), step(&[(A41, k1), (A42, k2), (A43, k3)]));
            let k5 = self.derivative(
                mu,
                time(C5),
                step(&[(A51, k1), (A52, k2), (A53, k3), (A54, k4)]),
            );
            let k6 = self.derivative(
                mu,
                time(1.0),
                step(&[(A61, k1), (A62, k2), (A63, k3), (A64, k4), (A65, k5)]),
            );
            let y_new = step(&[(B1, k1), (B3, k3), (B4, k4), (B5, k5), (B6, k6)]);
            let k7 = self.derivative(mu, time(1.0), y_new);

            let error = [(E1, k1), (E3, k3), (E4, k4), (E5, k5), (E6, k6), (E7, k7)]
                .iter()
                .fold((DVec3::ZERO, DVec3::ZERO), |(r, v), (e, (dr, dv))| {
                    (r + h * e * *dr, v + h * e * *dv)
                });

            let error_norm = self.error_norm(y, y_new, error);

            if error_norm <= 1.0 {
                t = if last { total } else { t + h };
                y = y_new;
                k1 = k7;
            }

            let factor = if error_norm == 0.0 {
                MAX_FACTOR
            } else {
                (SAFETY * error_norm.powf(-0.2)).clamp(MIN_FACTOR, MAX_FACTOR)
            };
            h *= factor;

            if !h.is_finite() || h <= f64::EPSILON * t.max(1.0) {
                log::debug!("cowell: step size collapsed at t = {t}");
                break;
            }
        }

        if t >= total {
            return Ok(y);
        }

        log::debug!("cowell: stopped at t = {t} of {total}");

        Err(ConvergenceFailure {
            iterations: self.options.max_steps,
            last_estimate: direction * t,
        })
    }
}

impl<P: Perturbation> Propagator for Cowell<P> {
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

        if tof == 0.0 {
            return Ok(*state);
        }

        let (position, velocity) = self.integrate(mu, (state.position, state.velocity), tof)?;

        Ok(StateVectors { position, velocity })
    }
}
