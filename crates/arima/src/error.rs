//! Error types for the seats-arima crate.

/// Error type for all fallible operations in the seats-arima crate.
///
/// Covers input validation, model specification problems and the numeric
/// failures (singular systems, invalid spectra, optimizer breakdowns) that
/// can occur in the polynomial and ARIMA primitives.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ArimaError {
    /// Returned when the input data is empty.
    #[error("input data is empty")]
    EmptyData,

    /// Returned when the input data has fewer observations than required.
    #[error("insufficient data: got {n} observations, need at least {min}")]
    InsufficientData {
        /// Number of observations provided.
        n: usize,
        /// Minimum number of observations required.
        min: usize,
    },

    /// Returned when the input data contains non-finite values (NaN or infinity).
    #[error("input data contains non-finite values")]
    NonFiniteData,

    /// Returned when the (differenced) input data has zero variance.
    #[error("input data is constant (zero variance)")]
    ConstantData,

    /// Returned when an operation requires a stationary model.
    #[error("model is non-stationary")]
    NonStationary,

    /// Returned when the number of coefficients does not match the order.
    #[error("{block} has {got} coefficients, order requires {expected}")]
    CoefficientCount {
        /// Name of the coefficient block.
        block: &'static str,
        /// Number of coefficients required by the order.
        expected: usize,
        /// Number of coefficients provided.
        got: usize,
    },

    /// Returned when a seasonal part is requested for a non-seasonal period.
    #[error("seasonal orders require a period greater than 1, got {0}")]
    InvalidPeriod(usize),

    /// Returned when a variance is negative or not finite.
    #[error("invalid innovation variance: {0}")]
    InvalidVariance(f64),

    /// Returned when a dense linear system has no unique solution.
    #[error("singular linear system of size {0}")]
    SingularMatrix(usize),

    /// Returned when a pseudo-spectrum is negative somewhere in [0, pi].
    #[error("pseudo-spectrum is not non-negative")]
    NegativeSpectrum,

    /// Returned when the optimization algorithm fails to converge.
    #[error("optimisation failed to converge")]
    OptimizationFailed,
}
