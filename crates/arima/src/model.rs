//! ARIMA models as immutable polynomial triples.

use crate::error::ArimaError;
use crate::polynomial::{Polynomial, expand_ratio};
use crate::spectrum::PseudoSpectrum;
use crate::symmetric::SymmetricFilter;

/// An ARIMA model `φ(B) δ(B) x_t = θ(B) a_t`, `a_t ~ WN(0, σ²)`.
///
/// `φ` is the stationary autoregressive polynomial, `δ` the non-stationary
/// (differencing) polynomial whose roots lie on the unit circle, `θ` the
/// moving-average polynomial. All three are normalized with a unit constant
/// term. Values are never mutated; every transformation returns a new model.
#[derive(Clone, Debug, PartialEq)]
pub struct ArimaModel {
    ar: Polynomial,
    delta: Polynomial,
    ma: Polynomial,
    innovation_variance: f64,
}

impl ArimaModel {
    /// Creates a model from its polynomials and innovation variance.
    pub fn new(ar: Polynomial, delta: Polynomial, ma: Polynomial, innovation_variance: f64) -> Self {
        Self {
            ar,
            delta,
            ma,
            innovation_variance,
        }
    }

    /// A stationary ARMA model.
    pub fn arma(ar: Polynomial, ma: Polynomial, innovation_variance: f64) -> Self {
        Self::new(ar, Polynomial::one(), ma, innovation_variance)
    }

    /// White noise with variance `innovation_variance`.
    pub fn white_noise(innovation_variance: f64) -> Self {
        Self::arma(Polynomial::one(), Polynomial::one(), innovation_variance)
    }

    /// Returns the stationary AR polynomial `φ(B)`.
    pub fn ar(&self) -> &Polynomial {
        &self.ar
    }

    /// Returns the differencing polynomial `δ(B)`.
    pub fn delta(&self) -> &Polynomial {
        &self.delta
    }

    /// Returns the MA polynomial `θ(B)`.
    pub fn ma(&self) -> &Polynomial {
        &self.ma
    }

    /// Returns the innovation variance `σ²`.
    pub fn innovation_variance(&self) -> f64 {
        self.innovation_variance
    }

    /// Returns the full autoregressive polynomial `φ(B) δ(B)`.
    pub fn full_ar(&self) -> Polynomial {
        self.ar.times(&self.delta)
    }

    /// Returns `(deg φ, deg δ, deg θ)`.
    pub fn orders(&self) -> (usize, usize, usize) {
        (self.ar.degree(), self.delta.degree(), self.ma.degree())
    }

    /// Returns `true` when the model has no differencing.
    pub fn is_stationary(&self) -> bool {
        self.delta.is_constant()
    }

    /// Returns `true` for (possibly scaled) white noise.
    pub fn is_white_noise(&self) -> bool {
        self.ar.is_constant() && self.delta.is_constant() && self.ma.is_constant()
    }

    /// Returns `true` when the innovation variance is zero.
    pub fn is_null(&self) -> bool {
        self.innovation_variance == 0.0
    }

    /// Returns a copy with a different innovation variance.
    pub fn with_innovation_variance(&self, innovation_variance: f64) -> Self {
        Self {
            innovation_variance,
            ..self.clone()
        }
    }

    /// Returns the pseudo-spectrum `σ² θθ̄ / (φδ)(φδ)̄`.
    pub fn spectrum(&self) -> PseudoSpectrum {
        PseudoSpectrum::new(
            SymmetricFilter::of(&self.ma).scaled(self.innovation_variance),
            self.full_ar(),
        )
    }

    /// Returns the first `n` ψ-weights of `θ(B) / φ(B)δ(B)`.
    pub fn psi_weights(&self, n: usize) -> Vec<f64> {
        expand_ratio(&self.ma, &self.full_ar(), n)
    }

    /// Returns the autocovariances `γ(0..n)` of a stationary model.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`ArimaError::NonStationary`] | the model has differencing |
    /// | [`ArimaError::SingularMatrix`] | `φ` has roots on the unit circle |
    pub fn autocovariances(&self, n: usize) -> Result<Vec<f64>, ArimaError> {
        if !self.is_stationary() {
            return Err(ArimaError::NonStationary);
        }
        autocovariances(&self.ar, &self.ma, self.innovation_variance, n)
    }
}

/// Autocovariances `γ(0..n)` of the stationary ARMA `φ(B) x_t = θ(B) a_t`.
///
/// Splits `σ² θ(B)θ(F) = g(B)φ(F) + g(F)φ(B)`, so that
/// `γ(B, F) = g(B)/φ(B) + g(F)/φ(F)`.
pub fn autocovariances(
    ar: &Polynomial,
    ma: &Polynomial,
    innovation_variance: f64,
    n: usize,
) -> Result<Vec<f64>, ArimaError> {
    if n == 0 {
        return Ok(Vec::new());
    }
    let numerator = SymmetricFilter::of(ma).scaled(innovation_variance);
    let g = numerator.split(ar)?;
    let mut gamma = expand_ratio(&g, ar, n);
    gamma[0] *= 2.0;
    Ok(gamma)
}
