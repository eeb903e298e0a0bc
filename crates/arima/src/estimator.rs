//! Re-estimation of seasonal ARIMA models.

use crate::error::ArimaError;
use crate::optimizer;
use crate::sarima::SarimaModel;
use crate::spec::SarimaSpec;

/// Estimates the coefficients of a seasonal ARIMA model for given orders.
///
/// The decomposition engine calls this when an approximation step changes
/// the model orders and the coefficients have to be refitted to the series.
pub trait ModelEstimator: Send + Sync {
    /// Fits a model with orders `spec` to `series`.
    ///
    /// `start` is an optional model whose coefficients seed the search; it is
    /// ignored when its orders differ from `spec`.
    fn estimate(
        &self,
        spec: SarimaSpec,
        mean: bool,
        series: &[f64],
        start: Option<&SarimaModel>,
    ) -> Result<SarimaModel, ArimaError>;
}

/// Exact Gaussian maximum likelihood via Nelder-Mead.
///
/// # Example
///
/// ```ignore
/// let fit = MaximumLikelihood.estimate(SarimaSpec::airline(12), false, &series, None)?;
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct MaximumLikelihood;

impl ModelEstimator for MaximumLikelihood {
    #[tracing::instrument(skip(self, spec, series, start), fields(n = series.len(), spec = %spec))]
    fn estimate(
        &self,
        spec: SarimaSpec,
        mean: bool,
        series: &[f64],
        start: Option<&SarimaModel>,
    ) -> Result<SarimaModel, ArimaError> {
        let model = optimizer::fit_sarima(spec, mean, series, start)?;
        tracing::debug!(
            phi = ?model.phi(),
            bphi = ?model.bphi(),
            theta = ?model.theta(),
            btheta = ?model.btheta(),
            sigma2 = model.innovation_variance(),
            "model re-estimated"
        );
        Ok(model)
    }
}
