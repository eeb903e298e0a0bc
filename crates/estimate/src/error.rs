//! Error types for the seats-estimate crate.

use seats_arima::ArimaError;

/// Error type for all fallible operations in the seats-estimate crate.
///
/// Only invalid inputs are reported here. Numeric breakdowns while
/// estimating a single component are absorbed by the estimators, which
/// return zeros for that component and list it in
/// [`ComponentEstimates::fallbacks()`](crate::ComponentEstimates::fallbacks).
#[derive(Debug, Clone, thiserror::Error)]
pub enum EstimateError {
    /// Polynomial or ARIMA primitive error.
    #[error(transparent)]
    Arima(#[from] ArimaError),

    /// Returned when the model has no component to estimate.
    #[error("unobserved-components model has no components")]
    NoComponents,

    /// Returned when the series is too short for the model.
    #[error("series too short: got {n} observations, need at least {min}")]
    SeriesTooShort {
        /// Number of observations provided.
        n: usize,
        /// Minimum number of observations required.
        min: usize,
    },

    /// Returned when a signal's AR polynomial is not a factor of the model's.
    #[error("signal AR polynomial does not divide the model AR polynomial")]
    IncompatibleSignal,

    /// Returned when the series contains non-finite values.
    #[error("series contains non-finite values")]
    NonFiniteSeries,

    /// Returned when a log decomposition is requested for a series with
    /// non-positive values.
    #[error("log transformation needs positive values, found {0}")]
    NonPositiveValue(f64),

    /// Returned when an estimation error variance is materially negative.
    #[error("negative error variance {variance:e} at index {index}")]
    NegativeVariance {
        /// Position in the extended series.
        index: usize,
        /// The offending variance.
        variance: f64,
    },

    /// Returned when sequences that must align have different lengths.
    #[error("length mismatch: expected {expected}, got {got}")]
    LengthMismatch {
        /// Expected length.
        expected: usize,
        /// Actual length.
        got: usize,
    },
}
