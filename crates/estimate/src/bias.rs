//! From raw component estimates to the final decomposition.
//!
//! The initial decomposition is additive in the scale the model was fitted
//! in. The final one is in the scale of the observed series: unchanged for
//! level series, exponentiated and rebalanced for log series. In both cases
//! the seasonally adjusted series and the irregular are rebuilt from the
//! identities
//!
//! | Mode | Seasonally adjusted | Irregular |
//! |------|---------------------|-----------|
//! | additive | `series - seasonal` | `sa - trend - cycle` |
//! | multiplicative | `series / seasonal` | `sa / (trend · cycle)` |
//!
//! so the final components recombine exactly into the series.

use std::fmt;

use seats_decompose::ComponentType;
use tracing::debug;

use crate::components::{
    ComponentDecomposition, ComponentEstimates, DecompositionMode, SeriesEstimate, SeriesKind,
};
use crate::error::EstimateError;

/// Transformation applied to the series before modelling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Transformation {
    /// The series is modelled as is; components add up.
    #[default]
    Level,
    /// The logarithm of the series is modelled; components multiply.
    Log,
}

impl Transformation {
    /// Applies the transformation to `series`.
    ///
    /// # Errors
    ///
    /// [`EstimateError::NonPositiveValue`] for a non-positive value in log
    /// mode.
    pub fn apply(self, series: &[f64]) -> Result<Vec<f64>, EstimateError> {
        match self {
            Self::Level => Ok(series.to_vec()),
            Self::Log => series
                .iter()
                .map(|x| {
                    if *x > 0.0 {
                        Ok(x.ln())
                    } else {
                        Err(EstimateError::NonPositiveValue(*x))
                    }
                })
                .collect(),
        }
    }

    /// How the components of a transformed series combine.
    pub fn mode(self) -> DecompositionMode {
        match self {
            Self::Level => DecompositionMode::Additive,
            Self::Log => DecompositionMode::Multiplicative,
        }
    }
}

impl fmt::Display for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Level => f.write_str("level"),
            Self::Log => f.write_str("log"),
        }
    }
}

/// Bias correction of log decompositions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BiasCorrection {
    /// Plain exponentials.
    None,
    /// Seasonal and irregular factors are rescaled to an in-sample mean of
    /// one and the trend absorbs the scale.
    #[default]
    Legacy,
}

/// Builds the initial and final decompositions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BiasCorrector {
    transformation: Transformation,
    correction: BiasCorrection,
}

impl BiasCorrector {
    /// Creates a corrector.
    pub fn new(transformation: Transformation, correction: BiasCorrection) -> Self {
        Self {
            transformation,
            correction,
        }
    }

    /// Returns the transformation.
    pub fn transformation(&self) -> Transformation {
        self.transformation
    }

    /// Returns the bias correction policy.
    pub fn correction(&self) -> BiasCorrection {
        self.correction
    }

    /// Additive decomposition in the transformed scale.
    ///
    /// `series` is the transformed series with its forecasts and backcasts.
    /// Components missing from the model are reported as zeros; a cycle is
    /// reported only when the model has one, with any undefined component
    /// folded into it.
    pub fn initial(
        &self,
        series: &SeriesEstimate,
        estimates: &ComponentEstimates,
    ) -> ComponentDecomposition {
        let n = series.values().len();
        let horizons = estimates.horizons();
        let or_zeros = |kind| {
            estimates
                .component(kind)
                .cloned()
                .unwrap_or_else(|| SeriesEstimate::zeros(n, horizons))
        };

        let mut d = ComponentDecomposition::new(DecompositionMode::Additive);
        d.insert(SeriesKind::Series, series.clone());
        d.insert(SeriesKind::Trend, or_zeros(ComponentType::Trend));
        d.insert(SeriesKind::Seasonal, or_zeros(ComponentType::Seasonal));
        d.insert(SeriesKind::Irregular, or_zeros(ComponentType::Irregular));
        d.insert(
            SeriesKind::SeasonallyAdjusted,
            estimates.seasonally_adjusted().clone(),
        );

        let transitory: Vec<&SeriesEstimate> = [ComponentType::Cycle, ComponentType::Undefined]
            .iter()
            .filter_map(|k| estimates.component(*k))
            .collect();
        if let Some((first, rest)) = transitory.split_first() {
            let cycle = rest.iter().fold((*first).clone(), |acc, e| {
                let stdev: Vec<f64> = acc
                    .extended_stdev()
                    .iter()
                    .zip(e.extended_stdev())
                    .map(|(a, b)| a.hypot(b))
                    .collect();
                acc.combine(e, |a, b| a + b, &stdev)
            });
            d.insert(SeriesKind::Cycle, cycle);
        }
        d
    }

    /// Final decomposition in the scale of the observed series.
    pub fn correct(&self, initial: &ComponentDecomposition) -> ComponentDecomposition {
        match self.transformation {
            Transformation::Level => level(initial),
            Transformation::Log => self.log(initial),
        }
    }

    fn log(&self, initial: &ComponentDecomposition) -> ComponentDecomposition {
        let exp = |kind| initial.get(kind).map(log_normal);
        let (Some(series), Some(trend), Some(seasonal), Some(irregular), Some(sa)) = (
            exp(SeriesKind::Series),
            exp(SeriesKind::Trend),
            exp(SeriesKind::Seasonal),
            exp(SeriesKind::Irregular),
            exp(SeriesKind::SeasonallyAdjusted),
        ) else {
            return initial.clone();
        };
        let cycle = exp(SeriesKind::Cycle);

        let (cs, ci) = match self.correction {
            BiasCorrection::None => (1.0, 1.0),
            BiasCorrection::Legacy => (in_sample_mean(&seasonal), in_sample_mean(&irregular)),
        };
        debug!(seasonal_factor = cs, irregular_factor = ci, "log bias correction");
        let scale = |e: &SeriesEstimate, k: f64| e.map(|v| v * k, |_, s| s * k);
        let seasonal = scale(&seasonal, 1.0 / cs);
        let trend = scale(&trend, cs * ci);
        let irregular_stdev = scale(&irregular, 1.0 / ci).extended_stdev();
        let sa = series.combine(&seasonal, |y, s| y / s, &scale(&sa, cs).extended_stdev());
        let trend_cycle = match &cycle {
            Some(c) => trend.combine(c, |t, c| t * c, &trend.extended_stdev()),
            None => trend.clone(),
        };
        let irregular = sa.combine(&trend_cycle, |a, l| a / l, &irregular_stdev);

        let mut d = ComponentDecomposition::new(DecompositionMode::Multiplicative);
        d.insert(SeriesKind::Series, series);
        d.insert(SeriesKind::Trend, trend);
        d.insert(SeriesKind::Seasonal, seasonal);
        d.insert(SeriesKind::SeasonallyAdjusted, sa);
        d.insert(SeriesKind::Irregular, irregular);
        if let Some(c) = cycle {
            d.insert(SeriesKind::Cycle, c);
        }
        d
    }
}

/// Level series: components are kept, the identities are enforced.
fn level(initial: &ComponentDecomposition) -> ComponentDecomposition {
    let (Some(series), Some(trend), Some(seasonal), Some(irregular), Some(sa)) = (
        initial.get(SeriesKind::Series),
        initial.get(SeriesKind::Trend),
        initial.get(SeriesKind::Seasonal),
        initial.get(SeriesKind::Irregular),
        initial.get(SeriesKind::SeasonallyAdjusted),
    ) else {
        return initial.clone();
    };
    let cycle = initial.get(SeriesKind::Cycle);

    let sa = series.combine(seasonal, |y, s| y - s, &sa.extended_stdev());
    let trend_cycle = match cycle {
        Some(c) => trend.combine(c, |t, c| t + c, &trend.extended_stdev()),
        None => trend.clone(),
    };
    let irregular = sa.combine(&trend_cycle, |a, l| a - l, &irregular.extended_stdev());

    let mut d = ComponentDecomposition::new(DecompositionMode::Additive);
    d.insert(SeriesKind::Series, series.clone());
    d.insert(SeriesKind::Trend, trend.clone());
    d.insert(SeriesKind::Seasonal, seasonal.clone());
    d.insert(SeriesKind::SeasonallyAdjusted, sa);
    d.insert(SeriesKind::Irregular, irregular);
    if let Some(c) = cycle {
        d.insert(SeriesKind::Cycle, c.clone());
    }
    d
}

/// `exp` of an estimate; standard errors follow the log-normal law
/// `sd = exp(v) · sqrt(exp(s²) - 1)`.
fn log_normal(e: &SeriesEstimate) -> SeriesEstimate {
    e.map(f64::exp, |v, s| v.exp() * (s * s).exp_m1().max(0.0).sqrt())
}

fn in_sample_mean(e: &SeriesEstimate) -> f64 {
    let values = e.values();
    if values.is_empty() {
        return 1.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    use crate::components::Horizons;

    fn est(values: &[f64]) -> SeriesEstimate {
        let stdev = vec![0.1; values.len()];
        SeriesEstimate::from_extended(values, &stdev, Horizons::new(1, 0))
    }

    /// Log-scale estimates of a 4-point series plus one forecast.
    fn estimates() -> (SeriesEstimate, ComponentEstimates) {
        let trend = [4.6, 4.61, 4.62, 4.63, 4.64];
        let seasonal = [0.1, -0.05, -0.08, 0.02, 0.1];
        let irregular = [0.01, -0.02, 0.0, 0.015, 0.0];
        let series: Vec<f64> = (0..5).map(|t| trend[t] + seasonal[t] + irregular[t]).collect();
        let sa: Vec<f64> = (0..5).map(|t| trend[t] + irregular[t]).collect();
        let components = vec![
            (ComponentType::Trend, est(&trend)),
            (ComponentType::Seasonal, est(&seasonal)),
            (ComponentType::Irregular, est(&irregular)),
        ];
        let e = ComponentEstimates::new(Horizons::new(1, 0), components, est(&sa), vec![]);
        (est(&series), e)
    }

    #[test]
    fn initial_is_additive_and_complete() {
        let (series, e) = estimates();
        let d = BiasCorrector::default().initial(&series, &e);
        assert_eq!(d.mode(), DecompositionMode::Additive);
        assert!(d.get(SeriesKind::Cycle).is_none());
        assert!(d.recombination_error() < 1e-12);
    }

    #[test]
    fn level_enforces_identities() {
        let (series, e) = estimates();
        let corrector = BiasCorrector::new(Transformation::Level, BiasCorrection::Legacy);
        let d = corrector.correct(&corrector.initial(&series, &e));
        assert!(d.recombination_error() < 1e-12);
        let sa = d.get(SeriesKind::SeasonallyAdjusted).unwrap();
        let seasonal = d.get(SeriesKind::Seasonal).unwrap();
        assert_abs_diff_eq!(sa.values()[2] + seasonal.values()[2], series.values()[2]);
    }

    #[test]
    fn log_legacy_normalizes_factors() {
        let (series, e) = estimates();
        let corrector = BiasCorrector::new(Transformation::Log, BiasCorrection::Legacy);
        let d = corrector.correct(&corrector.initial(&series, &e));
        assert_eq!(d.mode(), DecompositionMode::Multiplicative);
        assert!(d.recombination_error() < 1e-10);

        let seasonal = d.get(SeriesKind::Seasonal).unwrap();
        let mean = seasonal.values().iter().sum::<f64>() / 4.0;
        assert_abs_diff_eq!(mean, 1.0, epsilon = 1e-12);
        let y = d.get(SeriesKind::Series).unwrap();
        assert_abs_diff_eq!(y.values()[0], (4.6_f64 + 0.1 + 0.01).exp(), epsilon = 1e-9);
    }

    #[test]
    fn log_without_correction_is_plain_exponential() {
        let (series, e) = estimates();
        let corrector = BiasCorrector::new(Transformation::Log, BiasCorrection::None);
        let d = corrector.correct(&corrector.initial(&series, &e));
        let trend = d.get(SeriesKind::Trend).unwrap();
        assert_abs_diff_eq!(trend.values()[1], 4.61_f64.exp(), epsilon = 1e-9);
        let sd = trend.stdev()[1];
        assert_abs_diff_eq!(sd, 4.61_f64.exp() * (0.01_f64.exp() - 1.0).sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn cycle_and_undefined_are_merged() {
        let (series, e) = estimates();
        let mut components = e.components().to_vec();
        components.push((ComponentType::Cycle, est(&[1.0; 5])));
        components.push((ComponentType::Undefined, est(&[2.0; 5])));
        let e = ComponentEstimates::new(
            e.horizons(),
            components,
            e.seasonally_adjusted().clone(),
            vec![],
        );
        let d = BiasCorrector::default().initial(&series, &e);
        let cycle = d.get(SeriesKind::Cycle).unwrap();
        assert_eq!(cycle.values(), &[3.0; 4]);
        assert_abs_diff_eq!(cycle.stdev()[0], 0.1 * 2.0_f64.sqrt(), epsilon = 1e-15);
    }

    #[test]
    fn log_rejects_non_positive() {
        let err = Transformation::Log.apply(&[1.0, 0.0]).unwrap_err();
        assert!(matches!(err, EstimateError::NonPositiveValue(v) if v == 0.0));
        assert_eq!(Transformation::Level.apply(&[-1.0]).unwrap(), vec![-1.0]);
    }
}
