//! Recursive series solution of the elliptic Kepler equation, iterating
//! the fixed point `E = M + e sin(E)`.
//!
//! Reference: Charles and Tatum, "The convergence of Newton-Raphson
//! iteration with Kepler's equation", Celestial Mechanics and Dynamical
//! Astronomy 69 (1998).

use core::f64::consts::TAU;

use crate::{
    angles::{eccentric_to_mean, eccentric_to_true, true_to_eccentric},
    ConvergenceFailure, KernelError, Regime, StateVectors,
};

use super::{propagate_elements, Propagator, PropagatorKind};

/// Default order when running a fixed number of terms.
pub const RECSERIES_ORDER: u32 = 8;

/// Default iteration cap when running to a tolerance.
pub const RECSERIES_MAX_ITERS: u32 = 100;

/// Default relative tolerance between consecutive iterates.
pub const RECSERIES_RTOL: f64 = 1e-8;

/// When the recursion stops.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RecSeriesTermination {
    /// Stop once two iterates agree to the relative tolerance (absolute
    /// below `|E| = 1`), or fail after the iteration cap.
    Rtol,
    /// Always run exactly the configured order. Never fails, but the
    /// accuracy is only about `e^order`.
    Order,
}

/// Advances the true anomaly by `tof` with the recursive series.
///
/// # Unchecked Operation
/// Meaningful only for `0 <= e < 1`.
///
/// # Errors
/// With [`RecSeriesTermination::Rtol`], returns a [`ConvergenceFailure`]
/// when `numiter` iterations were not enough.
#[allow(clippy::too_many_arguments)]
pub fn recseries_coe(
    mu: f64,
    p: f64,
    ecc: f64,
    nu: f64,
    tof: f64,
    termination: RecSeriesTermination,
    order: u32,
    numiter: u32,
    rtol: f64,
) -> Result<f64, KernelError> {
    let semi_major_axis = p / (1.0 - ecc * ecc);
    let mean_motion = (mu / semi_major_axis.abs().powi(3)).sqrt();

    if Regime::of(ecc) == Regime::Circular {
        // M = E = ν on a circle
        return Ok((nu + mean_motion * tof).rem_euclid(TAU));
    }

    let mean_anomaly0 = eccentric_to_mean(true_to_eccentric(nu, ecc), ecc);
    let m = (mean_anomaly0 + mean_motion * tof).rem_euclid(TAU);

    let iterations = match termination {
        RecSeriesTermination::Rtol => numiter,
        RecSeriesTermination::Order => order,
    };

    let mut ecc_anomaly = m + ecc;

    for _ in 0..iterations {
        let next = m + ecc * ecc_anomaly.sin();

        if termination == RecSeriesTermination::Rtol
            && (next - ecc_anomaly).abs() < rtol * ecc_anomaly.abs().max(1.0)
        {
            return Ok(eccentric_to_true(next, ecc));
        }

        ecc_anomaly = next;
    }

    match termination {
        RecSeriesTermination::Order => Ok(eccentric_to_true(ecc_anomaly, ecc)),
        RecSeriesTermination::Rtol => {
            log::debug!("recseries: no convergence within {numiter} terms");
            Err(ConvergenceFailure {
                iterations: numiter,
                last_estimate: ecc_anomaly,
            }
            .into())
        }
    }
}

/// The recursive series propagator, for elliptic orbits.
///
/// The fixed point `E = M + e sin(E)` contracts by about `e` per term
/// near periapsis, so it needs roughly `ln(rtol) / ln(e)` iterations.
/// With the default budget of [`RECSERIES_MAX_ITERS`] this limits
/// [`RecSeriesTermination::Rtol`] to eccentricities up to about 0.8;
/// above that, raise `numiter` or expect a [`ConvergenceFailure`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecSeries {
    /// When to stop the recursion.
    pub termination: RecSeriesTermination,
    /// Number of terms with [`RecSeriesTermination::Order`].
    pub order: u32,
    /// Iteration cap with [`RecSeriesTermination::Rtol`].
    pub numiter: u32,
    /// Relative tolerance with [`RecSeriesTermination::Rtol`].
    pub rtol: f64,
}

impl Default for RecSeries {
    fn default() -> Self {
        Self {
            termination: RecSeriesTermination::Rtol,
            order: RECSERIES_ORDER,
            numiter: RECSERIES_MAX_ITERS,
            rtol: RECSERIES_RTOL,
        }
    }
}

impl Propagator for RecSeries {
    fn kind(&self) -> PropagatorKind {
        PropagatorKind::ELLIPTIC
    }

    fn propagate(
        &self,
        mu: f64,
        state: &StateVectors,
        tof: f64,
    ) -> Result<StateVectors, KernelError> {
        propagate_elements("recseries", self.kind(), mu, state, |elements| {
            recseries_coe(
                mu,
                elements.p,
                elements.ecc,
                elements.nu,
                tof,
                self.termination,
                self.order,
                self.numiter,
                self.rtol,
            )
        })
    }
}
