use thiserror::Error;

/// An error caused by the arguments handed to a conversion, propagator,
/// or Lambert solver.
///
/// These are surfaced immediately and never coerced into a value.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    /// Two sequences that are processed element-wise have different lengths.
    #[error("length mismatch: {left} values against {right} values")]
    LengthMismatch {
        /// Length of the first sequence.
        left: usize,
        /// Length of the second sequence.
        right: usize,
    },

    /// The eccentricity lies outside of what the algorithm can handle.
    #[error("{algorithm} does not support eccentricity {ecc} ({supported})")]
    UnsupportedEccentricity {
        /// Name of the rejecting algorithm.
        algorithm: &'static str,
        /// The offending eccentricity.
        ecc: f64,
        /// Human readable description of the supported range.
        supported: &'static str,
    },

    /// The modified equinoctial set is undefined for retrograde
    /// equatorial orbits, since `h` and `k` grow with `tan(inc / 2)`.
    #[error(
        "Cannot compute modified equinoctial set for 180 degrees orbit inclination \
         due to `h` and `k` singularity (inclination = {inclination} rad)"
    )]
    EquinoctialSingularity {
        /// The offending inclination, in radians.
        inclination: f64,
    },

    /// An argument is out of its domain (non-positive time of flight,
    /// non-positive gravitational parameter, degenerate geometry, ...).
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument {
        /// Name of the argument.
        name: &'static str,
        /// Why the argument was rejected.
        reason: &'static str,
    },
}

/// A root-finding iteration ran out of its iteration budget.
///
/// This is returned per value, so that callers processing many values
/// at once can tell exactly which ones failed.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("no convergence after {iterations} iterations (last estimate {last_estimate})")]
pub struct ConvergenceFailure {
    /// Number of iterations that were spent.
    pub iterations: u32,
    /// The last iterate, kept for diagnostics.
    pub last_estimate: f64,
}

/// Why a conversion or propagation did not produce a value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KernelError {
    /// The initial state or the tunables were rejected.
    #[error(transparent)]
    Input(#[from] InputError),
    /// An internal root-finding step did not converge.
    #[error(transparent)]
    Convergence(#[from] ConvergenceFailure),
}
