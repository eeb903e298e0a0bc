//! Error types for the seats-kernel crate.

use seats_arima::ArimaError;
use seats_decompose::DecomposeError;
use seats_estimate::EstimateError;

/// Error type for a failed decomposition run.
///
/// Only fatal conditions are errors. Corrected parameters, approximations,
/// noisy models and per-component estimation failures are recorded as
/// [`Note`](crate::Note)s on the result instead.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DecompositionError {
    /// Returned when no decomposable model was found within the bound on
    /// decomposition attempts.
    #[error("model is not decomposable after {attempts} decomposition attempts")]
    NonDecomposable {
        /// Number of decomposition attempts made.
        attempts: usize,
    },

    /// Returned when a configuration parameter is invalid.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the problem.
        reason: String,
    },

    /// Wrapped error from the seats-decompose crate.
    #[error(transparent)]
    Decompose(#[from] DecomposeError),

    /// Wrapped error from the seats-estimate crate.
    #[error(transparent)]
    Estimate(#[from] EstimateError),

    /// Wrapped error from the seats-arima crate.
    #[error(transparent)]
    Arima(#[from] ArimaError),
}
