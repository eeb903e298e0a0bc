//! Configuration of the decomposition kernel.

use seats_decompose::{ApproximatorConfig, DecomposerConfig, ValidatorConfig};
use seats_estimate::{BiasCorrection, EstimationMethod, Horizons, Transformation};

use crate::error::DecompositionError;

/// Shortest horizon used when none is configured.
const MIN_DEFAULT_HORIZON: usize = 12;

/// Master configuration of a [`Kernel`](crate::Kernel).
///
/// Defaults: the default validator, decomposer and approximator
/// configurations, forecast and backcast horizons of `max(period, 12)`,
/// the Burman estimator, legacy bias correction and no transformation.
///
/// # Example
///
/// ```ignore
/// let config = KernelConfig::new()
///     .with_transformation(Transformation::Log)
///     .with_forecasts(24);
/// assert_eq!(config.horizons(12), Horizons::new(24, 12));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KernelConfig {
    validator: ValidatorConfig,
    decomposer: DecomposerConfig,
    approximator: ApproximatorConfig,
    /// Forecast horizon (None = `max(period, 12)`).
    forecasts: Option<usize>,
    /// Backcast horizon (None = `max(period, 12)`).
    backcasts: Option<usize>,
    estimation: EstimationMethod,
    bias_correction: BiasCorrection,
    transformation: Transformation,
}

impl KernelConfig {
    /// Creates a configuration with the defaults.
    pub fn new() -> Self {
        Self {
            validator: ValidatorConfig::default(),
            decomposer: DecomposerConfig::default(),
            approximator: ApproximatorConfig::default(),
            forecasts: None,
            backcasts: None,
            estimation: EstimationMethod::default(),
            bias_correction: BiasCorrection::default(),
            transformation: Transformation::default(),
        }
    }

    /// Sets the MA validation parameters.
    pub fn with_validator(mut self, validator: ValidatorConfig) -> Self {
        self.validator = validator;
        self
    }

    /// Sets the canonical decomposition parameters.
    pub fn with_decomposer(mut self, decomposer: DecomposerConfig) -> Self {
        self.decomposer = decomposer;
        self
    }

    /// Sets the approximation policy and its round bound.
    pub fn with_approximator(mut self, approximator: ApproximatorConfig) -> Self {
        self.approximator = approximator;
        self
    }

    /// Sets the number of forecasts of every component.
    pub fn with_forecasts(mut self, forecasts: usize) -> Self {
        self.forecasts = Some(forecasts);
        self
    }

    /// Sets the number of backcasts of every component.
    pub fn with_backcasts(mut self, backcasts: usize) -> Self {
        self.backcasts = Some(backcasts);
        self
    }

    /// Selects the components estimator.
    pub fn with_estimation(mut self, estimation: EstimationMethod) -> Self {
        self.estimation = estimation;
        self
    }

    /// Sets the bias correction of log decompositions.
    pub fn with_bias_correction(mut self, bias_correction: BiasCorrection) -> Self {
        self.bias_correction = bias_correction;
        self
    }

    /// Sets the transformation applied to the series before decomposition.
    pub fn with_transformation(mut self, transformation: Transformation) -> Self {
        self.transformation = transformation;
        self
    }

    /// Returns the validator configuration.
    pub fn validator(&self) -> ValidatorConfig {
        self.validator
    }

    /// Returns the decomposer configuration.
    pub fn decomposer(&self) -> DecomposerConfig {
        self.decomposer
    }

    /// Returns the approximator configuration.
    pub fn approximator(&self) -> ApproximatorConfig {
        self.approximator
    }

    /// Returns the explicitly configured forecast horizon, if any.
    pub fn forecasts(&self) -> Option<usize> {
        self.forecasts
    }

    /// Returns the explicitly configured backcast horizon, if any.
    pub fn backcasts(&self) -> Option<usize> {
        self.backcasts
    }

    /// Returns the components estimator.
    pub fn estimation(&self) -> EstimationMethod {
        self.estimation
    }

    /// Returns the bias correction.
    pub fn bias_correction(&self) -> BiasCorrection {
        self.bias_correction
    }

    /// Returns the transformation.
    pub fn transformation(&self) -> Transformation {
        self.transformation
    }

    /// Resolves the horizons for a series of the given period.
    pub fn horizons(&self, period: usize) -> Horizons {
        let fallback = period.max(MIN_DEFAULT_HORIZON);
        Horizons::new(
            self.forecasts.unwrap_or(fallback),
            self.backcasts.unwrap_or(fallback),
        )
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), DecompositionError> {
        if self.approximator.max_rounds() == 0 {
            return Err(DecompositionError::InvalidConfig {
                reason: "max_rounds must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_horizons_follow_period() {
        let config = KernelConfig::default();
        assert_eq!(config.horizons(4), Horizons::symmetric(12));
        assert_eq!(config.horizons(12), Horizons::symmetric(12));
        assert_eq!(config.horizons(24), Horizons::symmetric(24));
    }

    #[test]
    fn explicit_horizons_override_period() {
        let config = KernelConfig::new().with_forecasts(36).with_backcasts(0);
        assert_eq!(config.horizons(12), Horizons::new(36, 0));
        assert_eq!(config.forecasts(), Some(36));
    }

    #[test]
    fn builder_sets_strategies() {
        let config = KernelConfig::new()
            .with_estimation(EstimationMethod::Kalman)
            .with_bias_correction(BiasCorrection::None)
            .with_transformation(Transformation::Log);
        assert_eq!(config.estimation(), EstimationMethod::Kalman);
        assert_eq!(config.bias_correction(), BiasCorrection::None);
        assert_eq!(config.transformation(), Transformation::Log);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_rounds_rejected() {
        let config = KernelConfig::new()
            .with_approximator(ApproximatorConfig::new().with_max_rounds(0));
        assert!(matches!(
            config.validate(),
            Err(DecompositionError::InvalidConfig { .. })
        ));
    }
}
