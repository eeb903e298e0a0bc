//! Kalman filter for stationary ARMA models.
//!
//! Runs the univariate filter on the state-space form from
//! [`crate::state_space`] with the exact stationary initialization. Used to
//! evaluate the concentrated Gaussian log-likelihood and to produce exact
//! finite-sample forecasts of differenced series.
//!
//! **Not part of the public API.**

use ndarray::{Array1, Array2};

use crate::error::ArimaError;
use crate::state_space::StateSpace;

/// Prediction-error variances below this are treated as exact observations.
const MIN_VARIANCE: f64 = 1e-12;

/// Filter output after the last observation.
#[derive(Clone, Debug)]
pub(crate) struct FilterOutput {
    /// Predicted state `a_{n|n-1}`.
    pub(crate) state: Array1<f64>,
    /// Sum of squared standardized prediction errors `Σ v²/F`.
    pub(crate) ssq: f64,
    /// Sum of `ln F`.
    pub(crate) log_det: f64,
    /// Number of observations contributing to `ssq`.
    pub(crate) n_obs: usize,
}

/// Runs the Kalman filter over `data`.
///
/// # Errors
///
/// [`ArimaError::NonStationary`] when the state space carries a diffuse part.
pub(crate) fn filter(ss: &StateSpace, data: &[f64]) -> Result<FilterOutput, ArimaError> {
    if ss.diffuse_dim() > 0 {
        return Err(ArimaError::NonStationary);
    }
    let r = ss.r();
    let t = ss.t();
    let mut a = Array1::<f64>::zeros(r);
    let mut p: Array2<f64> = ss.p_star().clone();
    let mut ssq = 0.0;
    let mut log_det = 0.0;
    let mut n_obs = 0;

    for &y in data {
        let f = p[[0, 0]];
        if f > MIN_VARIANCE {
            let v = y - a[0];
            let pz = p.column(0).to_owned();
            for i in 0..r {
                a[i] += pz[i] * v / f;
            }
            for i in 0..r {
                for j in 0..r {
                    p[[i, j]] -= pz[i] * pz[j] / f;
                }
            }
            ssq += v * v / f;
            log_det += f.ln();
            n_obs += 1;
        }
        a = t.dot(&a);
        p = t.dot(&p).dot(&t.t()) + ss.rrt();
    }

    Ok(FilterOutput {
        state: a,
        ssq,
        log_det,
        n_obs,
    })
}

/// Concentrated log-likelihood with the innovation variance profiled out.
///
/// Returns `(loglik, sigma2)`; the state space is expected to carry a unit
/// innovation variance.
pub(crate) fn concentrated_loglik(ss: &StateSpace, data: &[f64]) -> Result<(f64, f64), ArimaError> {
    let out = filter(ss, data)?;
    if out.n_obs == 0 || out.ssq <= 0.0 {
        return Err(ArimaError::ConstantData);
    }
    let n = out.n_obs as f64;
    let sigma2 = out.ssq / n;
    let loglik = -0.5 * n * ((2.0 * std::f64::consts::PI).ln() + 1.0 + sigma2.ln()) - 0.5 * out.log_det;
    Ok((loglik, sigma2))
}

/// Forecasts `horizon` values ahead of `data`.
pub(crate) fn forecast(ss: &StateSpace, data: &[f64], horizon: usize) -> Result<Vec<f64>, ArimaError> {
    let mut a = filter(ss, data)?.state;
    let mut out = Vec::with_capacity(horizon);
    for _ in 0..horizon {
        out.push(a[0]);
        a = ss.t().dot(&a);
    }
    Ok(out)
}
