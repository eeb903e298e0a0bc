//! The estimator capability and the pieces both strategies share.

use std::fmt;

use seats_arima::{ArimaModel, backcast, forecast, forecast_variances};
use seats_decompose::{ComponentType, UcarimaModel};

use crate::burman::BurmanEstimator;
use crate::components::{ComponentEstimates, Horizons, SeriesEstimate};
use crate::error::EstimateError;
use crate::kalman::KalmanEstimator;

/// Extracts the components of a series from a UCARIMA model.
///
/// The series must already be free of deterministic effects (see
/// [`MeanEffect`](crate::MeanEffect)). It is modelled by
/// [`UcarimaModel::aggregate()`], so in noisy mode the estimates add up to
/// the series exactly and the added noise is absorbed by the components.
///
/// Numeric failures for a single component do not fail the call: the
/// component is returned as zeros and listed in
/// [`ComponentEstimates::fallbacks()`].
pub trait ComponentsEstimator: Send + Sync {
    /// Estimates every component of `ucm` and the seasonally adjusted
    /// signal over `series` extended by `horizons`.
    ///
    /// # Errors
    ///
    /// Returns an error only for invalid inputs: an empty model, a series
    /// that is too short or contains non-finite values.
    fn estimate(
        &self,
        ucm: &UcarimaModel,
        series: &[f64],
        horizons: Horizons,
    ) -> Result<ComponentEstimates, EstimateError>;
}

/// Available estimation strategies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EstimationMethod {
    /// Burman's finite-sample Wiener-Kolmogorov filter.
    #[default]
    Burman,
    /// Square-root Kalman smoother on the composite state-space form.
    Kalman,
}

impl EstimationMethod {
    /// Returns an estimator implementing the method.
    pub fn estimator(self) -> Box<dyn ComponentsEstimator> {
        match self {
            Self::Burman => Box::new(BurmanEstimator),
            Self::Kalman => Box::new(KalmanEstimator),
        }
    }
}

impl fmt::Display for EstimationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Burman => f.write_str("burman"),
            Self::Kalman => f.write_str("kalman"),
        }
    }
}

/// Rejects inputs no estimator can handle.
pub(crate) fn check_input(ucm: &UcarimaModel, series: &[f64]) -> Result<(), EstimateError> {
    if ucm.components().is_empty() {
        return Err(EstimateError::NoComponents);
    }
    let min = ucm.aggregate().delta().degree() + 1;
    if series.len() < min {
        return Err(EstimateError::SeriesTooShort {
            n: series.len(),
            min,
        });
    }
    if series.iter().any(|x| !x.is_finite()) {
        return Err(EstimateError::NonFiniteSeries);
    }
    Ok(())
}

/// The observed series with its exact forecasts and backcasts and their
/// standard errors; in-sample standard errors are zero.
///
/// # Errors
///
/// Propagates forecasting errors of `model`.
pub fn series_estimate(
    model: &ArimaModel,
    series: &[f64],
    horizons: Horizons,
) -> Result<SeriesEstimate, EstimateError> {
    let fcasts = forecast(model, series, horizons.forecasts)?;
    let bcasts = backcast(model, series, horizons.backcasts)?;
    let values = [&bcasts[..], series, &fcasts].concat();

    let fvar = forecast_variances(model, horizons.forecasts);
    let bvar = forecast_variances(model, horizons.backcasts);
    let stdev: Vec<f64> = bvar
        .iter()
        .rev()
        .map(|v| v.sqrt())
        .chain(std::iter::repeat_n(0.0, series.len()))
        .chain(fvar.iter().map(|v| v.sqrt()))
        .collect();
    Ok(SeriesEstimate::from_extended(&values, &stdev, horizons))
}

/// Estimation error variances below `-NEGATIVE_VARIANCE * scale` are a
/// numeric breakdown rather than rounding.
const NEGATIVE_VARIANCE: f64 = 1e-8;

/// Standard errors from error variances.
///
/// Rounding residue below zero is clamped. `scale` is the variance scale of
/// the model; the tolerance grows with the largest variance of the series.
///
/// # Errors
///
/// [`EstimateError::NegativeVariance`] at the first materially negative
/// variance.
pub(crate) fn checked_stdev(variances: &[f64], scale: f64) -> Result<Vec<f64>, EstimateError> {
    let largest = variances.iter().fold(scale.abs(), |acc, v| acc.max(v.abs()));
    let tolerance = NEGATIVE_VARIANCE * largest;
    variances
        .iter()
        .enumerate()
        .map(|(index, &variance)| {
            if variance < -tolerance {
                Err(EstimateError::NegativeVariance { index, variance })
            } else {
                Ok(variance.max(0.0).sqrt())
            }
        })
        .collect()
}

/// Seasonally adjusted series as the sum of the non-seasonal estimates,
/// without standard errors.
pub(crate) fn sum_non_seasonal(
    components: &[(ComponentType, SeriesEstimate)],
    n: usize,
    horizons: Horizons,
) -> SeriesEstimate {
    let len = horizons.extended_len(n);
    let mut values = vec![0.0; len];
    for (_, e) in components.iter().filter(|(k, _)| *k != ComponentType::Seasonal) {
        for (acc, v) in values.iter_mut().zip(e.extended()) {
            *acc += v;
        }
    }
    SeriesEstimate::from_extended(&values, &vec![0.0; len], horizons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use seats_arima::Polynomial;

    fn random_walk() -> ArimaModel {
        ArimaModel::new(
            Polynomial::one(),
            Polynomial::difference(1),
            Polynomial::one(),
            1.0,
        )
    }

    #[test]
    fn series_estimate_of_random_walk() {
        let series = [1.0, 2.0, 4.0];
        let e = series_estimate(&random_walk(), &series, Horizons::new(2, 1)).unwrap();
        assert_eq!(e.values(), &series);
        assert_eq!(e.stdev(), &[0.0; 3]);
        assert_eq!(e.forecasts(), &[4.0, 4.0]);
        assert_eq!(e.backcasts(), &[1.0]);
        assert!((e.forecast_stdev()[1] - 2.0_f64.sqrt()).abs() < 1e-12);
        assert!((e.backcast_stdev()[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn rounding_residue_is_clamped() {
        let stdev = checked_stdev(&[4.0, -1e-12, 0.0], 1.0).unwrap();
        assert_eq!(stdev, vec![2.0, 0.0, 0.0]);
    }

    #[test]
    fn negative_variance_is_reported() {
        let err = checked_stdev(&[4.0, 1.0, -0.5], 1.0).unwrap_err();
        assert!(matches!(
            err,
            EstimateError::NegativeVariance { index: 2, variance } if variance == -0.5
        ));
    }

    #[test]
    fn tolerance_follows_largest_variance() {
        assert!(checked_stdev(&[1e6, -1e-4], 1.0).is_ok());
        assert!(checked_stdev(&[1.0, -1e-4], 1.0).is_err());
    }

    #[test]
    fn method_names() {
        assert_eq!(EstimationMethod::Burman.to_string(), "burman");
        assert_eq!(EstimationMethod::Kalman.to_string(), "kalman");
        assert_eq!(EstimationMethod::default(), EstimationMethod::Burman);
    }
}
