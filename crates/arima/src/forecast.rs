//! Exact finite-sample forecasts and backcasts of ARIMA models.

use crate::error::ArimaError;
use crate::kalman;
use crate::model::ArimaModel;
use crate::state_space::StateSpace;

/// Forecasts `horizon` values past the end of `data`.
///
/// The series is differenced with `δ`, the stationary part is forecast with
/// the exact Kalman filter and the forecasts are integrated back.
///
/// # Errors
///
/// | Variant | Trigger |
/// |---------|---------|
/// | [`ArimaError::InsufficientData`] | `data` is not longer than `deg δ` |
/// | [`ArimaError::NonFiniteData`] | `data` contains NaN or infinity |
/// | [`ArimaError::SingularMatrix`] | the stationary AR part has unit roots |
pub fn forecast(model: &ArimaModel, data: &[f64], horizon: usize) -> Result<Vec<f64>, ArimaError> {
    let delta = model.delta();
    let d = delta.degree();
    if data.len() <= d {
        return Err(ArimaError::InsufficientData {
            n: data.len(),
            min: d + 1,
        });
    }
    if data.iter().any(|x| !x.is_finite()) {
        return Err(ArimaError::NonFiniteData);
    }
    if horizon == 0 {
        return Ok(Vec::new());
    }

    let w = difference(data, delta.coefficients());
    let ss = StateSpace::arma(model.ar(), model.ma(), model.innovation_variance())?;
    let wf = kalman::forecast(&ss, &w, horizon)?;

    let mut extended = data.to_vec();
    for value in wf {
        let t = extended.len();
        let lagged: f64 = (1..=d).map(|k| delta.get(k) * extended[t - k]).sum();
        extended.push(value - lagged);
    }
    Ok(extended.split_off(data.len()))
}

/// Backcasts `horizon` values before the start of `data`, in time order.
///
/// ARIMA models are time reversible in their second moments, so backcasts
/// are the forecasts of the reversed series.
pub fn backcast(model: &ArimaModel, data: &[f64], horizon: usize) -> Result<Vec<f64>, ArimaError> {
    let reversed: Vec<f64> = data.iter().rev().copied().collect();
    let mut out = forecast(model, &reversed, horizon)?;
    out.reverse();
    Ok(out)
}

/// Forecast error variances `σ² Σ_{j<h} ψ_j²` for leads `h = 1..=horizon`.
pub fn forecast_variances(model: &ArimaModel, horizon: usize) -> Vec<f64> {
    let psi = model.psi_weights(horizon);
    psi.iter()
        .scan(0.0, |acc, w| {
            *acc += w * w;
            Some(*acc * model.innovation_variance())
        })
        .collect()
}

/// Applies `δ(B)` to `data`; the result has `len - deg δ` values.
pub(crate) fn difference(data: &[f64], delta: &[f64]) -> Vec<f64> {
    let d = delta.len().saturating_sub(1);
    (d..data.len())
        .map(|t| delta.iter().enumerate().map(|(k, c)| c * data[t - k]).sum())
        .collect()
}
