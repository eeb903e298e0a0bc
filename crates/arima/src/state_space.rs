//! Harvey state-space form of an ARIMA model.
//!
//! For `Φ(B) x_t = θ(B) a_t` with `Φ = φδ` of degree `P` and `θ` of degree
//! `q`, the state is `α_t = (x_t, x_{t+1|t}, …, x_{t+r-1|t})` with
//! `r = max(P, q+1)`:
//!
//! ```text
//! α[t+1] = T α[t] + R a[t+1]     T: shift, last row -Φ_r … -Φ_1
//! x[t]   = Z' α[t]                Z = e_0, R = (ψ_0, …, ψ_{r-1})
//! ```
//!
//! The initial state is `α_0 = A η + L u`, where `u` is the stationary ARMA
//! state with covariance `Σ`, `L` the lower-triangular Toeplitz matrix of the
//! ψ-weights of `1/δ` and `A` the homogeneous solutions of `δ` driven by the
//! `d` diffuse initial values `η`. Hence `P* = L Σ Lᵀ` and `P∞ = A Aᵀ`.

use ndarray::{Array1, Array2, Axis};

use crate::error::ArimaError;
use crate::model::{ArimaModel, autocovariances};
use crate::polynomial::{Polynomial, expand_ratio};

/// State-space representation of an ARIMA model.
#[derive(Clone, Debug)]
pub struct StateSpace {
    r: usize,
    t: Array2<f64>,
    r_vec: Array1<f64>,
    rrt: Array2<f64>,
    innovation_variance: f64,
    p_star: Array2<f64>,
    p_inf: Array2<f64>,
    diffuse: usize,
}

impl StateSpace {
    /// Builds the state-space form of `model`.
    ///
    /// # Errors
    ///
    /// [`ArimaError::SingularMatrix`] when the stationary AR polynomial has
    /// roots on the unit circle, so that no stationary covariance exists.
    pub fn from_arima(model: &ArimaModel) -> Result<Self, ArimaError> {
        let full_ar = model.full_ar();
        let p = full_ar.degree();
        let q = model.ma().degree();
        let r = p.max(q + 1);
        let var = model.innovation_variance();

        let mut t = Array2::zeros((r, r));
        for i in 0..r - 1 {
            t[[i, i + 1]] = 1.0;
        }
        for j in 0..r {
            let k = r - j;
            if k <= p {
                t[[r - 1, j]] = -full_ar.get(k);
            }
        }

        let r_vec = Array1::from(model.psi_weights(r));
        let r_col = r_vec.view().insert_axis(Axis(1));
        let rrt = r_col.dot(&r_col.t()) * var;

        let sigma = stationary_covariance(model.ar(), model.ma(), var, r)?;
        let ld = expand_ratio(&Polynomial::one(), model.delta(), r);
        let l = Array2::from_shape_fn((r, r), |(i, j)| if i >= j { ld[i - j] } else { 0.0 });
        let p_star = l.dot(&sigma).dot(&l.t());

        let a = homogeneous_solutions(model.delta(), r);
        let p_inf = a.dot(&a.t());

        Ok(Self {
            r,
            t,
            r_vec,
            rrt,
            innovation_variance: var,
            p_star,
            p_inf,
            diffuse: model.delta().degree(),
        })
    }

    /// Builds the state-space form of a stationary ARMA model.
    pub fn arma(ar: &Polynomial, ma: &Polynomial, innovation_variance: f64) -> Result<Self, ArimaError> {
        Self::from_arima(&ArimaModel::arma(ar.clone(), ma.clone(), innovation_variance))
    }

    /// State dimension `r = max(P, q+1)`.
    pub fn r(&self) -> usize {
        self.r
    }

    /// Transition matrix `T` (r×r).
    pub fn t(&self) -> &Array2<f64> {
        &self.t
    }

    /// Noise loading `R = (ψ_0, …, ψ_{r-1})`.
    pub fn r_vec(&self) -> &Array1<f64> {
        &self.r_vec
    }

    /// State noise covariance `σ² R Rᵀ`.
    pub fn rrt(&self) -> &Array2<f64> {
        &self.rrt
    }

    /// Innovation variance `σ²`.
    pub fn innovation_variance(&self) -> f64 {
        self.innovation_variance
    }

    /// Finite part of the initial state covariance.
    pub fn p_star(&self) -> &Array2<f64> {
        &self.p_star
    }

    /// Diffuse part of the initial state covariance.
    pub fn p_inf(&self) -> &Array2<f64> {
        &self.p_inf
    }

    /// Number of diffuse initial elements, `deg δ`.
    pub fn diffuse_dim(&self) -> usize {
        self.diffuse
    }
}

/// Covariance of the stationary state `(u_t, u_{t+1|t}, …)` of the ARMA part.
fn stationary_covariance(
    ar: &Polynomial,
    ma: &Polynomial,
    var: f64,
    r: usize,
) -> Result<Array2<f64>, ArimaError> {
    let gamma = autocovariances(ar, ma, var, r + 1)?;
    let psi = expand_ratio(ma, ar, r + 1);
    Ok(Array2::from_shape_fn((r, r), |(i, j)| {
        let correction: f64 = (1..=i.min(j)).map(|m| psi[i - m] * psi[j - m]).sum();
        gamma[i.abs_diff(j)] - var * correction
    }))
}

/// Columns are the solutions of `δ(B) x_t = 0` for `t = 0..r` started from a
/// unit impulse in one of the `d` pre-sample values.
fn homogeneous_solutions(delta: &Polynomial, r: usize) -> Array2<f64> {
    let d = delta.degree();
    let mut a = Array2::zeros((r, d));
    for e in 0..d {
        // history[k] holds x_{k-d}
        let mut history = vec![0.0; d + r];
        history[d - 1 - e] = 1.0;
        for j in 0..r {
            let value = -(1..=d).map(|k| delta.get(k) * history[d + j - k]).sum::<f64>();
            history[d + j] = value;
            a[[j, e]] = value;
        }
    }
    a
}
