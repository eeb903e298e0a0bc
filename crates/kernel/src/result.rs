//! Result types of a decomposition run.

use std::fmt;

use seats_arima::{SarimaModel, SarimaSpec};
use seats_decompose::{ApproximationStep, ComponentType, UcarimaModel};
use seats_estimate::ComponentDecomposition;

/// Diagnostic recorded while a decomposition ran to completion.
#[derive(Clone, Debug, PartialEq)]
pub enum Note {
    /// The validator corrected MA roots or dropped negligible coefficients.
    ParametersCutOff,
    /// The model was replaced by an approximation.
    ModelApproximated {
        /// Cascade step that produced the replacement.
        step: ApproximationStep,
        /// Orders of the replacement model.
        orders: SarimaSpec,
    },
    /// The decomposition only exists for the model plus white noise.
    NoisyModel {
        /// Variance of the added noise.
        added_variance: f64,
    },
    /// A component could not be estimated and was set to zero.
    EstimationFallback {
        /// The affected component.
        component: ComponentType,
    },
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ParametersCutOff => f.write_str("parameters cut off"),
            Self::ModelApproximated { step, orders } => {
                write!(f, "model replaced by an approximation ({step}): {orders}")
            }
            Self::NoisyModel { added_variance } => {
                write!(f, "noisy model used (added variance {added_variance:.6})")
            }
            Self::EstimationFallback { component } => {
                write!(f, "{component} estimation failed, set to zero")
            }
        }
    }
}

/// Outcome of [`Kernel::process()`](crate::Kernel::process).
#[derive(Clone, Debug)]
pub struct SeatsResults {
    original_model: SarimaModel,
    model: SarimaModel,
    ucarima: UcarimaModel,
    /// Constant of the differenced series, when the model has a mean.
    mean_effect: Option<f64>,
    parameters_cut_off: bool,
    rounds: usize,
    seasonality_significant: bool,
    initial: ComponentDecomposition,
    decomposition: ComponentDecomposition,
    notes: Vec<Note>,
}

impl SeatsResults {
    /// Creates a new result bundle.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        original_model: SarimaModel,
        model: SarimaModel,
        ucarima: UcarimaModel,
        mean_effect: Option<f64>,
        parameters_cut_off: bool,
        rounds: usize,
        seasonality_significant: bool,
        initial: ComponentDecomposition,
        decomposition: ComponentDecomposition,
        notes: Vec<Note>,
    ) -> Self {
        Self {
            original_model,
            model,
            ucarima,
            mean_effect,
            parameters_cut_off,
            rounds,
            seasonality_significant,
            initial,
            decomposition,
            notes,
        }
    }

    /// Returns the model passed to the kernel.
    pub fn original_model(&self) -> &SarimaModel {
        &self.original_model
    }

    /// Returns the model that was finally decomposed.
    pub fn model(&self) -> &SarimaModel {
        &self.model
    }

    /// Returns the unobserved-components model.
    pub fn ucarima(&self) -> &UcarimaModel {
        &self.ucarima
    }

    /// Returns whether the final model carries a mean.
    pub fn mean_correction(&self) -> bool {
        self.model.mean()
    }

    /// Returns the estimated constant of the differenced series, if any.
    pub fn mean_effect(&self) -> Option<f64> {
        self.mean_effect
    }

    /// Returns the innovation variance of the final model.
    pub fn innovation_variance(&self) -> f64 {
        self.model.innovation_variance()
    }

    /// Returns whether the validator corrected the model.
    pub fn parameters_cut_off(&self) -> bool {
        self.parameters_cut_off
    }

    /// Returns whether the model was replaced by an approximation.
    pub fn model_changed(&self) -> bool {
        self.rounds > 0
    }

    /// Returns the number of approximation rounds.
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Returns whether the seasonal component is significant.
    pub fn seasonality_significant(&self) -> bool {
        self.seasonality_significant
    }

    /// Returns the decomposition before bias correction.
    pub fn initial(&self) -> &ComponentDecomposition {
        &self.initial
    }

    /// Returns the bias-corrected decomposition.
    pub fn decomposition(&self) -> &ComponentDecomposition {
        &self.decomposition
    }

    /// Consumes self and returns the bias-corrected decomposition.
    pub fn into_decomposition(self) -> ComponentDecomposition {
        self.decomposition
    }

    /// Returns the diagnostics in the order they were raised.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_display() {
        let note = Note::ModelApproximated {
            step: ApproximationStep::Seasonal,
            orders: SarimaSpec::airline(12),
        };
        assert_eq!(
            note.to_string(),
            "model replaced by an approximation (app_seas): (0,1,1)(0,1,1)_12"
        );
        assert_eq!(Note::ParametersCutOff.to_string(), "parameters cut off");
        let noisy = Note::NoisyModel {
            added_variance: 0.0125,
        };
        assert_eq!(
            noisy.to_string(),
            "noisy model used (added variance 0.012500)"
        );
    }
}
