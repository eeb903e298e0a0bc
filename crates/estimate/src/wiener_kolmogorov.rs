//! Wiener-Kolmogorov filters and their error variances.
//!
//! For a signal with pseudo-spectrum `N_s / D_s D̄_s` in a model
//! `Φ(B) x_t = θ(B) a_t`, the optimal two-sided filter is
//!
//! ```text
//! ν(B, F) = N_s Φ_n Φ̄_n / (σ² θ θ̄) = g(B)/θ(B) + g(F)/θ(F),   Φ_n = Φ / D_s
//! ```
//!
//! The finite-sample error of the estimate at `t` splits into the final
//! error (doubly infinite sample) and the revisions caused by the missing
//! observations before `0` and after `n - 1`.

use seats_arima::{ArimaModel, Polynomial, PseudoSpectrum, SymmetricFilter, expand_ratio};

use crate::error::EstimateError;
use crate::estimator::checked_stdev;

/// Bounds on the truncation lag of the filter weights.
const MIN_LAGS: usize = 200;
const MAX_LAGS: usize = 5000;

/// Relative size of the neglected filter weights.
const TRUNCATION: f64 = 1e-15;

/// Returns the polynomial `g` of the filter `g(B)/θ(B) + g(F)/θ(F)`.
///
/// # Errors
///
/// [`EstimateError::IncompatibleSignal`] when `D_s` does not divide the
/// model AR polynomial, or an ARIMA error when the split is singular.
pub(crate) fn gain(
    model: &ArimaModel,
    signal: &PseudoSpectrum,
) -> Result<Polynomial, EstimateError> {
    let others = model
        .full_ar()
        .exact_div(signal.denominator())
        .ok_or(EstimateError::IncompatibleSignal)?;
    let numerator = signal
        .numerator()
        .times(&SymmetricFilter::of(&others))
        .scaled(1.0 / model.innovation_variance());
    Ok(numerator.split(model.ma())?)
}

/// Variance of the final estimation error of `signal` when the series is
/// the sum of `signal` and the independent `complement`.
pub(crate) fn final_variance(
    model: &ArimaModel,
    signal: &PseudoSpectrum,
    complement: &PseudoSpectrum,
) -> Result<f64, EstimateError> {
    if signal.numerator().is_zero() || complement.numerator().is_zero() {
        return Ok(0.0);
    }
    let numerator = signal
        .numerator()
        .times(complement.numerator())
        .scaled(1.0 / model.innovation_variance());
    let g = numerator.split(model.ma())?;
    Ok(2.0 * g.get(0))
}

/// Number of filter lags kept, from the slowest-decaying MA root.
fn truncation_lags(ma: &Polynomial) -> usize {
    let slowest = ma
        .roots()
        .iter()
        .map(|z| 1.0 / z.norm())
        .fold(0.0_f64, f64::max);
    if slowest <= 0.0 {
        return MIN_LAGS;
    }
    if slowest >= 1.0 {
        return MAX_LAGS;
    }
    let lags = (TRUNCATION.ln() / slowest.ln()).ceil() as usize;
    lags.clamp(MIN_LAGS, MAX_LAGS)
}

/// Standard errors of the estimates of `signal` over
/// `-backcasts .. n + forecasts`.
///
/// The revisions from the missing past and the missing future are added as
/// if independent. Their covariance is ignored, so on short series (about
/// one or two years of monthly data) the result departs from the exact
/// finite-sample error; the Kalman smoother gives the exact value.
///
/// # Errors
///
/// Propagates splitting errors, and [`EstimateError::NegativeVariance`]
/// when the final error variance is materially negative.
pub(crate) fn standard_errors(
    model: &ArimaModel,
    signal: &PseudoSpectrum,
    complement: &PseudoSpectrum,
    g: &Polynomial,
    n: usize,
    backcasts: usize,
    forecasts: usize,
) -> Result<Vec<f64>, EstimateError> {
    let fin = final_variance(model, signal, complement)?;
    let lags = truncation_lags(model.ma());

    // ν_k, k ≥ 0
    let mut nu = expand_ratio(g, model.ma(), lags + 1);
    nu[0] *= 2.0;
    let before = backcasts.max(forecasts);
    let psi = model.psi_weights(lags + before + 1);

    // ξ_j = Σ_{k ≥ j} ν_|k| ψ_{k-j}, for j in -before..lags
    let xi: Vec<f64> = (0..before + lags)
        .map(|i| {
            let j = i as isize - before as isize;
            (j..=lags as isize)
                .map(|k| nu.get(k.unsigned_abs()).copied().unwrap_or(0.0) * psi[(k - j) as usize])
                .sum()
        })
        .collect();
    // tail[i] = Σ_{m ≥ i} ξ²
    let mut tail = vec![0.0; xi.len() + 1];
    for i in (0..xi.len()).rev() {
        tail[i] = tail[i + 1] + xi[i] * xi[i];
    }
    let tail_from = |j: isize| -> f64 {
        let i = j + before as isize;
        if i < 0 {
            tail[0]
        } else {
            tail.get(i as usize).copied().unwrap_or(0.0)
        }
    };

    let var = model.innovation_variance();
    let n = n as isize;
    let variances: Vec<f64> = (-(backcasts as isize)..n + forecasts as isize)
        .map(|t| fin + var * (tail_from(n - t) + tail_from(t + 1)))
        .collect();
    checked_stdev(&variances, fin.abs() + var * tail[0])
}
