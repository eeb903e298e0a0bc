//! Estimated component series and named decompositions.

use std::collections::BTreeMap;
use std::fmt;

use seats_decompose::ComponentType;

/// Numbers of forecasts and backcasts to produce.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Horizons {
    /// Number of values past the end of the sample.
    pub forecasts: usize,
    /// Number of values before the start of the sample.
    pub backcasts: usize,
}

impl Horizons {
    /// Creates horizons.
    pub fn new(forecasts: usize, backcasts: usize) -> Self {
        Self {
            forecasts,
            backcasts,
        }
    }

    /// Same number of forecasts and backcasts.
    pub fn symmetric(h: usize) -> Self {
        Self::new(h, h)
    }

    /// Length of the sample extended on both sides.
    pub fn extended_len(&self, n: usize) -> usize {
        self.backcasts + n + self.forecasts
    }
}

/// One estimated series: in-sample values, forecasts and backcasts, each
/// with standard errors.
///
/// Backcasts are stored in time order, the last one immediately preceding
/// the first observation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SeriesEstimate {
    values: Vec<f64>,
    stdev: Vec<f64>,
    forecasts: Vec<f64>,
    forecast_stdev: Vec<f64>,
    backcasts: Vec<f64>,
    backcast_stdev: Vec<f64>,
}

impl SeriesEstimate {
    /// Splits sequences covering `backcasts | sample | forecasts` into an
    /// estimate.
    ///
    /// `stdev` must have the same length as `extended`.
    pub fn from_extended(extended: &[f64], stdev: &[f64], horizons: Horizons) -> Self {
        let n = extended.len() - horizons.backcasts - horizons.forecasts;
        let (b, rest) = extended.split_at(horizons.backcasts);
        let (v, f) = rest.split_at(n);
        let (sb, srest) = stdev.split_at(horizons.backcasts);
        let (sv, sf) = srest.split_at(n);
        Self {
            values: v.to_vec(),
            stdev: sv.to_vec(),
            forecasts: f.to_vec(),
            forecast_stdev: sf.to_vec(),
            backcasts: b.to_vec(),
            backcast_stdev: sb.to_vec(),
        }
    }

    /// An all-zero estimate.
    pub fn zeros(n: usize, horizons: Horizons) -> Self {
        let len = horizons.extended_len(n);
        Self::from_extended(&vec![0.0; len], &vec![0.0; len], horizons)
    }

    /// In-sample values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Standard errors of the in-sample values.
    pub fn stdev(&self) -> &[f64] {
        &self.stdev
    }

    /// Forecasts.
    pub fn forecasts(&self) -> &[f64] {
        &self.forecasts
    }

    /// Standard errors of the forecasts.
    pub fn forecast_stdev(&self) -> &[f64] {
        &self.forecast_stdev
    }

    /// Backcasts, in time order.
    pub fn backcasts(&self) -> &[f64] {
        &self.backcasts
    }

    /// Standard errors of the backcasts.
    pub fn backcast_stdev(&self) -> &[f64] {
        &self.backcast_stdev
    }

    /// Returns the horizons of the estimate.
    pub fn horizons(&self) -> Horizons {
        Horizons::new(self.forecasts.len(), self.backcasts.len())
    }

    /// Values over `backcasts | sample | forecasts`.
    pub fn extended(&self) -> Vec<f64> {
        [&self.backcasts[..], &self.values, &self.forecasts].concat()
    }

    /// Standard errors over `backcasts | sample | forecasts`.
    pub fn extended_stdev(&self) -> Vec<f64> {
        [&self.backcast_stdev[..], &self.stdev, &self.forecast_stdev].concat()
    }

    /// Applies `f` to every value and `g(value, stdev)` to every standard
    /// error.
    pub(crate) fn map(&self, f: impl Fn(f64) -> f64, g: impl Fn(f64, f64) -> f64) -> Self {
        let values = self.extended();
        let stdev = self.extended_stdev();
        let mapped: Vec<f64> = values.iter().map(|v| f(*v)).collect();
        let mapped_stdev: Vec<f64> = values.iter().zip(&stdev).map(|(v, s)| g(*v, *s)).collect();
        Self::from_extended(&mapped, &mapped_stdev, self.horizons())
    }

    /// Adds `effect` (over `backcasts | sample | forecasts`) to the values.
    pub fn shifted(&self, effect: &[f64]) -> Self {
        let values: Vec<f64> = self
            .extended()
            .iter()
            .zip(effect)
            .map(|(a, b)| a + b)
            .collect();
        Self::from_extended(&values, &self.extended_stdev(), self.horizons())
    }

    /// Combines the values of two aligned estimates; standard errors are
    /// taken from `stdev`.
    pub(crate) fn combine(
        &self,
        other: &SeriesEstimate,
        f: impl Fn(f64, f64) -> f64,
        stdev: &[f64],
    ) -> Self {
        let values: Vec<f64> = self
            .extended()
            .iter()
            .zip(other.extended())
            .map(|(a, b)| f(*a, b))
            .collect();
        Self::from_extended(&values, stdev, self.horizons())
    }
}

/// Raw estimates of the components of a UCARIMA model, in the scale of the
/// (possibly log-transformed, mean-corrected) series.
#[derive(Clone, Debug, PartialEq)]
pub struct ComponentEstimates {
    horizons: Horizons,
    components: Vec<(ComponentType, SeriesEstimate)>,
    seasonally_adjusted: SeriesEstimate,
    fallbacks: Vec<ComponentType>,
}

impl ComponentEstimates {
    /// Bundles component estimates.
    pub fn new(
        horizons: Horizons,
        components: Vec<(ComponentType, SeriesEstimate)>,
        seasonally_adjusted: SeriesEstimate,
        fallbacks: Vec<ComponentType>,
    ) -> Self {
        Self {
            horizons,
            components,
            seasonally_adjusted,
            fallbacks,
        }
    }

    /// Returns the horizons.
    pub fn horizons(&self) -> Horizons {
        self.horizons
    }

    /// Returns the estimates in component order.
    pub fn components(&self) -> &[(ComponentType, SeriesEstimate)] {
        &self.components
    }

    /// Returns the estimate of the first component of type `kind`.
    pub fn component(&self, kind: ComponentType) -> Option<&SeriesEstimate> {
        self.components
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, e)| e)
    }

    /// Returns the estimate of the seasonally adjusted signal.
    pub fn seasonally_adjusted(&self) -> &SeriesEstimate {
        &self.seasonally_adjusted
    }

    /// Returns the components whose estimation failed and were zeroed.
    pub fn fallbacks(&self) -> &[ComponentType] {
        &self.fallbacks
    }

    /// Adds `effect` (over `backcasts | sample | forecasts`) to the
    /// component `kind` and to the seasonally adjusted signal.
    ///
    /// The component is created when the model has none of that type.
    pub fn with_effect(mut self, kind: ComponentType, effect: &[f64]) -> Self {
        if let Some((_, e)) = self.components.iter_mut().find(|(k, _)| *k == kind) {
            *e = e.shifted(effect);
        } else {
            let zeros = vec![0.0; effect.len()];
            let estimate = SeriesEstimate::from_extended(effect, &zeros, self.horizons);
            self.components.insert(0, (kind, estimate));
        }
        self.seasonally_adjusted = self.seasonally_adjusted.shifted(effect);
        self
    }
}

/// Name of a series in a [`ComponentDecomposition`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SeriesKind {
    /// The observed series, with its forecasts and backcasts.
    Series,
    /// Trend.
    Trend,
    /// Seasonal component.
    Seasonal,
    /// Series without the seasonal component.
    SeasonallyAdjusted,
    /// Irregular component.
    Irregular,
    /// Transitory component.
    Cycle,
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Series => "series",
            Self::Trend => "trend",
            Self::Seasonal => "seasonal",
            Self::SeasonallyAdjusted => "sa",
            Self::Irregular => "irregular",
            Self::Cycle => "cycle",
        };
        f.write_str(name)
    }
}

/// How the components combine into the series.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecompositionMode {
    /// `series = trend + seasonal + cycle + irregular`.
    Additive,
    /// `series = trend · seasonal · cycle · irregular`.
    Multiplicative,
}

/// Named component series of a decomposed series.
#[derive(Clone, Debug, PartialEq)]
pub struct ComponentDecomposition {
    mode: DecompositionMode,
    series: BTreeMap<SeriesKind, SeriesEstimate>,
}

impl ComponentDecomposition {
    /// Creates an empty decomposition.
    pub fn new(mode: DecompositionMode) -> Self {
        Self {
            mode,
            series: BTreeMap::new(),
        }
    }

    /// Returns the combination mode.
    pub fn mode(&self) -> DecompositionMode {
        self.mode
    }

    /// Returns the series `kind`, if present.
    pub fn get(&self, kind: SeriesKind) -> Option<&SeriesEstimate> {
        self.series.get(&kind)
    }

    /// Iterates over the series in [`SeriesKind`] order.
    pub fn iter(&self) -> impl Iterator<Item = (SeriesKind, &SeriesEstimate)> {
        self.series.iter().map(|(k, v)| (*k, v))
    }

    pub(crate) fn insert(&mut self, kind: SeriesKind, estimate: SeriesEstimate) {
        self.series.insert(kind, estimate);
    }

    /// Largest in-sample discrepancy between the series and the combination
    /// of its components.
    pub fn recombination_error(&self) -> f64 {
        let Some(series) = self.get(SeriesKind::Series) else {
            return 0.0;
        };
        let parts = [
            SeriesKind::Trend,
            SeriesKind::Seasonal,
            SeriesKind::Irregular,
            SeriesKind::Cycle,
        ];
        let neutral = match self.mode {
            DecompositionMode::Additive => 0.0,
            DecompositionMode::Multiplicative => 1.0,
        };
        (0..series.values().len())
            .map(|t| {
                let combined = parts
                    .iter()
                    .filter_map(|k| self.get(*k))
                    .fold(neutral, |acc, e| match self.mode {
                        DecompositionMode::Additive => acc + e.values()[t],
                        DecompositionMode::Multiplicative => acc * e.values()[t],
                    });
                (combined - series.values()[t]).abs()
            })
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extended_round_trip() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let stdev = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6];
        let e = SeriesEstimate::from_extended(&values, &stdev, Horizons::new(1, 2));
        assert_eq!(e.backcasts(), &[1.0, 2.0]);
        assert_eq!(e.values(), &[3.0, 4.0, 5.0]);
        assert_eq!(e.forecasts(), &[6.0]);
        assert_eq!(e.forecast_stdev(), &[0.6]);
        assert_eq!(e.extended(), values.to_vec());
        assert_eq!(e.extended_stdev(), stdev.to_vec());
    }

    #[test]
    fn zeros_have_requested_shape() {
        let e = SeriesEstimate::zeros(10, Horizons::symmetric(3));
        assert_eq!(e.values().len(), 10);
        assert_eq!(e.forecasts().len(), 3);
        assert_eq!(e.backcast_stdev().len(), 3);
    }

    #[test]
    fn effect_goes_to_component_and_sa() {
        let h = Horizons::new(1, 0);
        let trend = SeriesEstimate::from_extended(&[1.0, 1.0, 1.0], &[0.0; 3], h);
        let sa = trend.clone();
        let estimates = ComponentEstimates::new(h, vec![(ComponentType::Trend, trend)], sa, vec![])
            .with_effect(ComponentType::Trend, &[0.5, 1.0, 1.5]);
        let t = estimates.component(ComponentType::Trend).unwrap();
        assert_eq!(t.values(), &[1.5, 2.0]);
        assert_eq!(t.forecasts(), &[2.5]);
        assert_eq!(estimates.seasonally_adjusted().values(), &[1.5, 2.0]);
    }

    #[test]
    fn effect_creates_missing_component() {
        let h = Horizons::default();
        let sa = SeriesEstimate::zeros(2, h);
        let estimates = ComponentEstimates::new(h, vec![], sa, vec![])
            .with_effect(ComponentType::Trend, &[4.0, 5.0]);
        assert_eq!(estimates.components().len(), 1);
        assert_eq!(estimates.component(ComponentType::Trend).unwrap().values(), &[4.0, 5.0]);
    }

    #[test]
    fn recombination_of_additive_parts() {
        let h = Horizons::default();
        let mut d = ComponentDecomposition::new(DecompositionMode::Additive);
        let est = |v: &[f64]| SeriesEstimate::from_extended(v, &vec![0.0; v.len()], h);
        d.insert(SeriesKind::Series, est(&[3.0, 5.0]));
        d.insert(SeriesKind::Trend, est(&[2.0, 4.0]));
        d.insert(SeriesKind::Irregular, est(&[1.0, 1.5]));
        assert!((d.recombination_error() - 0.5).abs() < 1e-15);
    }

    #[test]
    fn series_kind_names() {
        assert_eq!(SeriesKind::SeasonallyAdjusted.to_string(), "sa");
        assert_eq!(SeriesKind::Trend.to_string(), "trend");
    }
}
