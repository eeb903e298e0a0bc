//! The decomposition pipeline.
//!
//! Every phase takes the immutable output of the previous one and returns
//! a new value; diagnostics accumulate in a side list of [`Note`]s.

use std::sync::Arc;

use seats_arima::{MaximumLikelihood, ModelEstimator, SarimaModel};
use seats_decompose::{
    ComponentType, ModelApproximator, ModelDecomposer, ModelValidator, UcarimaModel,
};
use seats_estimate::{
    BiasCorrector, ComponentDecomposition, EstimateError, MeanEffect, series_estimate,
};
use tracing::{debug, info, warn};

use crate::config::KernelConfig;
use crate::error::DecompositionError;
use crate::result::{Note, SeatsResults};

/// Seasonal innovation variance, relative to the model's, above which
/// seasonality counts as significant.
const SEASONAL_SIGNIFICANCE: f64 = 1e-3;

/// Output of the validation phase.
struct Validated {
    model: SarimaModel,
    cut_off: bool,
}

/// Output of the decomposition phase.
struct Decomposed {
    model: SarimaModel,
    ucm: UcarimaModel,
    rounds: usize,
    cut_off: bool,
}

/// Output of the estimation phase.
struct Estimated {
    mean: Option<MeanEffect>,
    initial: ComponentDecomposition,
}

/// Runs validation, decomposition, approximation, estimation and bias
/// correction for one series at a time.
///
/// A kernel holds no per-series state, so one instance can process
/// independent series concurrently.
///
/// # Example
///
/// ```ignore
/// let kernel = Kernel::new(KernelConfig::default())?;
/// let results = kernel.process(&SarimaModel::airline(12, -0.4, -0.6), &series)?;
/// let sa = results.decomposition().get(SeriesKind::SeasonallyAdjusted);
/// ```
pub struct Kernel {
    config: KernelConfig,
    validator: ModelValidator,
    decomposer: ModelDecomposer,
    approximator: ModelApproximator,
}

impl std::fmt::Debug for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kernel")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Kernel {
    /// Creates a kernel that re-estimates approximated models by exact
    /// maximum likelihood.
    ///
    /// # Errors
    ///
    /// Returns [`DecompositionError`] when the configuration is invalid.
    pub fn new(config: KernelConfig) -> Result<Self, DecompositionError> {
        Self::with_estimator(config, Arc::new(MaximumLikelihood))
    }

    /// Creates a kernel with a custom re-estimation collaborator.
    ///
    /// # Errors
    ///
    /// Returns [`DecompositionError`] when the configuration is invalid.
    pub fn with_estimator(
        config: KernelConfig,
        estimator: Arc<dyn ModelEstimator>,
    ) -> Result<Self, DecompositionError> {
        config.validate()?;
        Ok(Self {
            validator: ModelValidator::new(config.validator())?,
            decomposer: ModelDecomposer::new(config.decomposer())?,
            approximator: ModelApproximator::new(config.approximator(), estimator),
            config,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Decomposes `series` under `model`.
    ///
    /// # Pipeline Order
    ///
    /// 1. **Transformation**: the series is logged in log mode
    /// 2. **Validation**: MA roots are brought inside the admissible region
    /// 3. **Decomposition**: decomposition and approximation alternate until
    ///    the model decomposes or the round bound is reached
    /// 4. **Estimation**: the mean effect is removed, the components are
    ///    estimated and the mean effect is credited to the trend
    /// 5. **Bias correction**: the final decomposition in levels
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`DecompositionError::NonDecomposable`] | no decomposable model within the bound |
    /// | [`DecompositionError::Estimate`] | non-positive values in log mode, non-finite or too short series |
    /// | [`DecompositionError::Decompose`] | validator failure |
    #[tracing::instrument(skip(self, model, series), fields(spec = %model.spec(), n = series.len()))]
    pub fn process(
        &self,
        model: &SarimaModel,
        series: &[f64],
    ) -> Result<SeatsResults, DecompositionError> {
        if series.iter().any(|x| !x.is_finite()) {
            return Err(EstimateError::NonFiniteSeries.into());
        }
        let transformed = self.config.transformation().apply(series)?;
        let mut notes = Vec::new();

        let validated = self.validate(model, &mut notes)?;
        let decomposed = self.decompose(validated, &transformed, &mut notes)?;
        let estimated = self.estimate(&decomposed, &transformed, &mut notes)?;

        let decomposition = self.corrector().correct(&estimated.initial);
        info!(
            mode = ?decomposition.mode(),
            error = decomposition.recombination_error(),
            "bias corrected"
        );

        let seasonality_significant = is_seasonality_significant(&decomposed.ucm);
        Ok(SeatsResults::new(
            model.clone(),
            decomposed.model,
            decomposed.ucm,
            estimated.mean.map(|m| m.mu()),
            decomposed.cut_off,
            decomposed.rounds,
            seasonality_significant,
            estimated.initial,
            decomposition,
            notes,
        ))
    }

    fn validate(
        &self,
        model: &SarimaModel,
        notes: &mut Vec<Note>,
    ) -> Result<Validated, DecompositionError> {
        let validation = self.validator.validate(model)?;
        let cut_off = !validation.is_valid();
        if cut_off {
            warn!(spec = %model.spec(), "parameters cut off");
            notes.push(Note::ParametersCutOff);
        } else {
            info!("model valid");
        }
        Ok(Validated {
            model: validation.into_model(),
            cut_off,
        })
    }

    fn decompose(
        &self,
        validated: Validated,
        series: &[f64],
        notes: &mut Vec<Note>,
    ) -> Result<Decomposed, DecompositionError> {
        let max_rounds = self.approximator.config().max_rounds();
        let mut model = validated.model;
        let mut cut_off = validated.cut_off;
        let mut attempts = 0;
        while attempts < max_rounds {
            attempts += 1;
            if let Some(ucm) = self.decomposer.decompose(&model) {
                info!(
                    attempts,
                    components = ucm.components().len(),
                    additivity = ucm.additivity_error(),
                    "model decomposed"
                );
                if ucm.is_noisy() {
                    warn!(added_variance = ucm.noise(), "noisy model used");
                    notes.push(Note::NoisyModel {
                        added_variance: ucm.noise(),
                    });
                }
                return Ok(Decomposed {
                    model,
                    ucm,
                    rounds: attempts - 1,
                    cut_off,
                });
            }
            if attempts == max_rounds {
                break;
            }
            let Some(approximation) = self.approximator.approximate(&model, series) else {
                break;
            };
            let step = approximation.step();
            let orders = approximation.model().spec();
            info!(round = attempts, %step, %orders, "model replaced by an approximation");
            notes.push(Note::ModelApproximated { step, orders });

            let validation = self.validator.validate(approximation.model())?;
            if !validation.is_valid() {
                warn!(spec = %orders, "parameters of the approximation cut off");
                notes.push(Note::ParametersCutOff);
                cut_off = true;
            }
            model = validation.into_model();
        }
        warn!(attempts, "no decomposable model found");
        Err(DecompositionError::NonDecomposable { attempts })
    }

    fn estimate(
        &self,
        decomposed: &Decomposed,
        series: &[f64],
        notes: &mut Vec<Note>,
    ) -> Result<Estimated, DecompositionError> {
        let aggregate = decomposed.ucm.aggregate();
        let horizons = self.config.horizons(decomposed.model.period());
        let mean = if decomposed.model.mean() {
            let effect = MeanEffect::estimate(aggregate.delta(), series)?;
            debug!(mu = effect.mu(), "mean effect");
            Some(effect)
        } else {
            None
        };
        let centered = match &mean {
            Some(effect) => effect.remove(series),
            None => series.to_vec(),
        };

        let estimator = self.config.estimation().estimator();
        let mut estimates = estimator.estimate(&decomposed.ucm, &centered, horizons)?;
        let mut observed = series_estimate(aggregate, &centered, horizons)?;
        if let Some(effect) = &mean {
            let path = effect.extended(series.len(), horizons);
            estimates = estimates.with_effect(ComponentType::Trend, &path);
            observed = observed.shifted(&path);
        }
        for &component in estimates.fallbacks() {
            notes.push(Note::EstimationFallback { component });
        }
        info!(
            method = %self.config.estimation(),
            forecasts = horizons.forecasts,
            backcasts = horizons.backcasts,
            "components estimated"
        );

        Ok(Estimated {
            mean,
            initial: self.corrector().initial(&observed, &estimates),
        })
    }

    fn corrector(&self) -> BiasCorrector {
        BiasCorrector::new(self.config.transformation(), self.config.bias_correction())
    }
}

fn is_seasonality_significant(ucm: &UcarimaModel) -> bool {
    let total = ucm.aggregate().innovation_variance();
    ucm.component(ComponentType::Seasonal)
        .is_some_and(|c| c.model().innovation_variance() >= SEASONAL_SIGNIFICANCE * total)
}
