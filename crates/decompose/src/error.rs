//! Error types for the seats-decompose crate.

use seats_arima::ArimaError;

/// Error type for all fallible operations in the seats-decompose crate.
///
/// A model that admits no canonical decomposition is not an error here:
/// the decomposer reports it with `None` and the caller escalates to the
/// approximator.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DecomposeError {
    /// Polynomial or ARIMA primitive error.
    #[error(transparent)]
    Arima(#[from] ArimaError),

    /// Returned when a tolerance lies outside its admissible range.
    #[error("invalid {name}: {value}")]
    InvalidTolerance {
        /// Name of the configuration value.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_arima_transparent() {
        let err = DecomposeError::from(ArimaError::NegativeSpectrum);
        assert_eq!(err.to_string(), "pseudo-spectrum is not non-negative");
    }

    #[test]
    fn error_invalid_tolerance() {
        let err = DecomposeError::InvalidTolerance {
            name: "xl",
            value: 1.5,
        };
        assert_eq!(err.to_string(), "invalid xl: 1.5");
    }

    #[test]
    fn error_is_std_error() {
        fn assert_impl<T: std::error::Error>() {}
        assert_impl::<DecomposeError>();
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DecomposeError>();
    }
}
