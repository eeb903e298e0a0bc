//! Unobserved-components ARIMA models.

use std::fmt;

use seats_arima::{ArimaModel, PseudoSpectrum, SymmetricFilter};

/// Tag of an unobserved component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentType {
    /// Low-frequency component, including the zero-frequency unit roots.
    Trend,
    /// Component carrying the seasonal frequencies.
    Seasonal,
    /// White-noise component.
    Irregular,
    /// Stationary transitory component (AR roots selected by neither the
    /// trend nor the seasonal selector, or a pure MA remainder).
    Cycle,
    /// Component of unknown nature.
    Undefined,
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Trend => "trend",
            Self::Seasonal => "seasonal",
            Self::Irregular => "irregular",
            Self::Cycle => "cycle",
            Self::Undefined => "undefined",
        };
        f.write_str(name)
    }
}

/// One component of a [`UcarimaModel`].
#[derive(Clone, Debug, PartialEq)]
pub struct UcComponent {
    kind: ComponentType,
    model: ArimaModel,
}

impl UcComponent {
    /// Creates a component.
    pub fn new(kind: ComponentType, model: ArimaModel) -> Self {
        Self { kind, model }
    }

    /// Returns the component tag.
    pub fn kind(&self) -> ComponentType {
        self.kind
    }

    /// Returns the component model.
    pub fn model(&self) -> &ArimaModel {
        &self.model
    }
}

/// An ARIMA model written as a sum of independent component models.
///
/// `aggregate` is the model the components add up to. In noisy mode it
/// differs from the model that was decomposed by white noise of variance
/// [`UcarimaModel::noise()`].
#[derive(Clone, Debug, PartialEq)]
pub struct UcarimaModel {
    aggregate: ArimaModel,
    components: Vec<UcComponent>,
    noise: f64,
}

impl UcarimaModel {
    /// Creates a UCARIMA model.
    pub fn new(aggregate: ArimaModel, components: Vec<UcComponent>, noise: f64) -> Self {
        Self {
            aggregate,
            components,
            noise,
        }
    }

    /// Returns the aggregate model.
    pub fn aggregate(&self) -> &ArimaModel {
        &self.aggregate
    }

    /// Returns the components in canonical order.
    pub fn components(&self) -> &[UcComponent] {
        &self.components
    }

    /// Returns the first component with tag `kind`.
    pub fn component(&self, kind: ComponentType) -> Option<&UcComponent> {
        self.components.iter().find(|c| c.kind == kind)
    }

    /// Returns the variance of the white noise added in noisy mode.
    pub fn noise(&self) -> f64 {
        self.noise
    }

    /// Returns `true` when noise was added to make the model decomposable.
    pub fn is_noisy(&self) -> bool {
        self.noise > 0.0
    }

    /// Returns the tags in component order.
    pub fn kinds(&self) -> Vec<ComponentType> {
        self.components.iter().map(|c| c.kind).collect()
    }

    /// Sum of the spectra of the components accepted by `keep`.
    pub fn signal_spectrum(&self, keep: impl Fn(ComponentType) -> bool) -> PseudoSpectrum {
        self.components
            .iter()
            .filter(|c| keep(c.kind))
            .fold(PseudoSpectrum::zero(), |acc, c| acc.plus(&c.model.spectrum()))
    }

    /// Largest discrepancy between the summed component spectra and the
    /// aggregate spectrum, relative to the aggregate numerator scale.
    ///
    /// Both sides are compared over a common denominator, so the check is
    /// exact at the poles of non-stationary models.
    pub fn additivity_error(&self) -> f64 {
        let sum = self.signal_spectrum(|_| true);
        let target = self.aggregate.spectrum();
        let lhs = sum
            .numerator()
            .times(&SymmetricFilter::of(target.denominator()));
        let rhs = target
            .numerator()
            .times(&SymmetricFilter::of(sum.denominator()));
        let n = lhs.degree().max(rhs.degree());
        let scale = (0..=n)
            .map(|k| rhs.get(k).abs())
            .fold(f64::MIN_POSITIVE, f64::max);
        (0..=n)
            .map(|k| (lhs.get(k) - rhs.get(k)).abs() / scale)
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seats_arima::Polynomial;

    fn random_walk_plus_noise() -> UcarimaModel {
        // (1-B) x = (1 - θB) a, x = level + noise
        let level = ArimaModel::new(
            Polynomial::one(),
            Polynomial::difference(1),
            Polynomial::one(),
            1.0,
        );
        let noise = ArimaModel::white_noise(0.5);
        // σ²(1 + θ²) = 1 + 2·0.5, σ²θ = 0.5
        let theta = 2.0 - 3.0_f64.sqrt();
        let variance = 0.5 / theta;
        let aggregate = ArimaModel::new(
            Polynomial::one(),
            Polynomial::difference(1),
            Polynomial::from_lags(&[-theta]),
            variance,
        );
        UcarimaModel::new(
            aggregate,
            vec![
                UcComponent::new(ComponentType::Trend, level),
                UcComponent::new(ComponentType::Irregular, noise),
            ],
            0.0,
        )
    }

    #[test]
    fn local_level_is_additive() {
        let ucm = random_walk_plus_noise();
        assert!(ucm.additivity_error() < 1e-12);
        assert!(!ucm.is_noisy());
    }

    #[test]
    fn wrong_variance_is_detected() {
        let ucm = random_walk_plus_noise();
        let broken = UcarimaModel::new(
            ucm.aggregate().with_innovation_variance(1.0),
            ucm.components().to_vec(),
            0.0,
        );
        assert!(broken.additivity_error() > 1e-3);
    }

    #[test]
    fn component_lookup() {
        let ucm = random_walk_plus_noise();
        assert!(ucm.component(ComponentType::Trend).is_some());
        assert!(ucm.component(ComponentType::Seasonal).is_none());
        assert_eq!(
            ucm.kinds(),
            vec![ComponentType::Trend, ComponentType::Irregular]
        );
    }

    #[test]
    fn display_names() {
        assert_eq!(ComponentType::Seasonal.to_string(), "seasonal");
        assert_eq!(ComponentType::Irregular.to_string(), "irregular");
    }
}
