//! Nelder-Mead optimizer for seasonal ARIMA maximum-likelihood estimation.
//!
//! Wraps the `argmin` crate to minimize the negative concentrated
//! log-likelihood of the differenced series over unconstrained PACF
//! parameters, one block per lag polynomial.
//!
//! **Not part of the public API.**

use argmin::core::{CostFunction, Executor};
use argmin::solver::neldermead::NelderMead;

use crate::error::ArimaError;
use crate::forecast::difference;
use crate::kalman;
use crate::params;
use crate::polynomial::Polynomial;
use crate::sarima::SarimaModel;
use crate::spec::SarimaSpec;
use crate::state_space::StateSpace;

/// Fits a seasonal ARIMA model to data via exact MLE.
///
/// 1. Validate data
/// 2. Difference, and demean when `mean` is set
/// 3. Optimize the concentrated log-likelihood via Nelder-Mead, starting
///    from `start` when its orders match
/// 4. Recover the innovation variance from a final filter pass
pub(crate) fn fit_sarima(
    spec: SarimaSpec,
    mean: bool,
    data: &[f64],
    start: Option<&SarimaModel>,
) -> Result<SarimaModel, ArimaError> {
    // 1. Validate
    if data.is_empty() {
        return Err(ArimaError::EmptyData);
    }
    if data.iter().any(|x| !x.is_finite()) {
        return Err(ArimaError::NonFiniteData);
    }
    let min_len = spec.differencing_degree() + spec.parameter_count() + 2;
    if data.len() < min_len {
        return Err(ArimaError::InsufficientData {
            n: data.len(),
            min: min_len,
        });
    }
    if spec.period() == 1 && spec.has_seasonal_part() {
        return Err(ArimaError::InvalidPeriod(spec.period()));
    }

    // 2. Stationary working series
    let zeros = SarimaModel::zeros(spec);
    let mut w = difference(data, zeros.differencing().coefficients());
    if mean {
        let mu = w.iter().sum::<f64>() / w.len() as f64;
        w.iter_mut().for_each(|x| *x -= mu);
    }
    let min_val = w.iter().copied().fold(f64::INFINITY, f64::min);
    let max_val = w.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if (max_val - min_val).abs() < f64::EPSILON {
        return Err(ArimaError::ConstantData);
    }

    // 3. White-noise fast path
    let dim = spec.parameter_count();
    if dim == 0 {
        let sigma2 = w.iter().map(|x| x * x).sum::<f64>() / w.len() as f64;
        return Ok(zeros.with_innovation_variance(sigma2).with_mean(mean));
    }

    // 4. Simplex around the starting point
    let origin = match start {
        Some(model) if model.spec() == spec => [
            model.phi(),
            model.bphi(),
            model.theta(),
            model.btheta(),
        ]
        .iter()
        .flat_map(|block| params::from_lag_coefficients(block))
        .collect(),
        _ => vec![0.0; dim],
    };
    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(dim + 1);
    simplex.push(origin.clone());
    for i in 0..dim {
        let mut vertex = origin.clone();
        vertex[i] += 0.5;
        simplex.push(vertex);
    }

    // 5. Run Nelder-Mead
    let cost = SarimaCost { data: &w, spec };
    let solver = NelderMead::new(simplex)
        .with_sd_tolerance(1e-8)
        .map_err(|_| ArimaError::OptimizationFailed)?;
    let result = Executor::new(cost, solver)
        .configure(|state| state.max_iters(2000))
        .run()
        .map_err(|_| ArimaError::OptimizationFailed)?;

    let best_params = result
        .state()
        .best_param
        .as_ref()
        .ok_or(ArimaError::OptimizationFailed)?;

    // 6. Final pass for the innovation variance
    let blocks = Blocks::unpack(spec, best_params);
    let (ar, ma) = blocks.polynomials(spec.period());
    let ss = StateSpace::arma(&ar, &ma, 1.0)?;
    let (_, sigma2) = kalman::concentrated_loglik(&ss, &w)?;

    let model = SarimaModel::from_parameters(
        spec,
        blocks.phi,
        blocks.theta,
        blocks.bphi,
        blocks.btheta,
        sigma2,
    )?;
    Ok(model.with_mean(mean))
}

/// Coefficient blocks decoded from an unconstrained parameter vector laid
/// out as `[p | bp | q | bq]`.
struct Blocks {
    phi: Vec<f64>,
    bphi: Vec<f64>,
    theta: Vec<f64>,
    btheta: Vec<f64>,
}

impl Blocks {
    fn unpack(spec: SarimaSpec, params: &[f64]) -> Self {
        let (phi, rest) = params.split_at(spec.p());
        let (bphi, rest) = rest.split_at(spec.bp());
        let (theta, btheta) = rest.split_at(spec.q());
        Self {
            phi: params::to_lag_coefficients(phi),
            bphi: params::to_lag_coefficients(bphi),
            theta: params::to_lag_coefficients(theta),
            btheta: params::to_lag_coefficients(btheta),
        }
    }

    fn polynomials(&self, period: usize) -> (Polynomial, Polynomial) {
        let ar = Polynomial::from_lags(&self.phi).times(&Polynomial::seasonal(&self.bphi, period));
        let ma = Polynomial::from_lags(&self.theta).times(&Polynomial::seasonal(&self.btheta, period));
        (ar, ma)
    }
}

/// Cost function for argmin: negative concentrated log-likelihood.
struct SarimaCost<'a> {
    data: &'a [f64],
    spec: SarimaSpec,
}

impl CostFunction for SarimaCost<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, params: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
        let (ar, ma) = Blocks::unpack(self.spec, params).polynomials(self.spec.period());
        let loglik = StateSpace::arma(&ar, &ma, 1.0)
            .and_then(|ss| kalman::concentrated_loglik(&ss, self.data));
        match loglik {
            Ok((loglik, _)) if loglik.is_finite() => Ok(-loglik),
            _ => Ok(f64::MAX),
        }
    }
}
