//! Pseudo-spectra of (sums of) ARIMA models.

use crate::error::ArimaError;
use crate::polynomial::Polynomial;
use crate::symmetric::{SymmetricFilter, factorize_chebyshev};

/// A pseudo-spectrum `N(B, F) / D(B) D(F)`.
///
/// The numerator carries the innovation variance. Sums of independent
/// models are pseudo-spectra over the product of their denominators, which
/// is how aggregates (the seasonally adjusted signal, a noisy model) are
/// represented before being factorized back into an ARIMA model.
#[derive(Clone, Debug, PartialEq)]
pub struct PseudoSpectrum {
    numerator: SymmetricFilter,
    denominator: Polynomial,
}

impl PseudoSpectrum {
    /// Creates a pseudo-spectrum from its numerator and denominator.
    pub fn new(numerator: SymmetricFilter, denominator: Polynomial) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// The zero spectrum.
    pub fn zero() -> Self {
        Self::new(SymmetricFilter::zero(), Polynomial::one())
    }

    /// Returns the numerator `N(B, F)`.
    pub fn numerator(&self) -> &SymmetricFilter {
        &self.numerator
    }

    /// Returns the denominator polynomial `D(B)`.
    pub fn denominator(&self) -> &Polynomial {
        &self.denominator
    }

    /// Returns the spectrum of the sum of two independent processes.
    pub fn plus(&self, other: &PseudoSpectrum) -> PseudoSpectrum {
        if self.numerator.is_zero() {
            return other.clone();
        }
        if other.numerator.is_zero() {
            return self.clone();
        }
        let numerator = self
            .numerator
            .times(&SymmetricFilter::of(&other.denominator))
            .plus(&other.numerator.times(&SymmetricFilter::of(&self.denominator)));
        PseudoSpectrum::new(numerator, self.denominator.times(&other.denominator))
    }

    /// Evaluates the spectrum at frequency `omega`.
    ///
    /// Returns infinity at the zeros of the denominator.
    pub fn eval(&self, omega: f64) -> f64 {
        let d = SymmetricFilter::of(&self.denominator).eval(omega);
        let n = self.numerator.eval(omega);
        if d.abs() < 1e-300 { f64::INFINITY } else { n / d }
    }

    /// Factorizes the numerator as `σ² θ(B)θ(F)`.
    ///
    /// # Errors
    ///
    /// [`ArimaError::NegativeSpectrum`] when the numerator is negative
    /// somewhere on the unit circle.
    pub fn factorize_numerator(&self) -> Result<(Polynomial, f64), ArimaError> {
        factorize_chebyshev(&self.numerator.to_chebyshev())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ArimaModel;
    use approx::assert_abs_diff_eq;

    #[test]
    fn sum_evaluates_pointwise() {
        let a = ArimaModel::arma(Polynomial::from_lags(&[-0.6]), Polynomial::one(), 1.0);
        let b = ArimaModel::arma(Polynomial::one(), Polynomial::from_lags(&[0.3]), 0.5);
        let sum = a.spectrum().plus(&b.spectrum());
        for omega in [0.2, 1.1, 2.7] {
            assert_abs_diff_eq!(
                sum.eval(omega),
                a.spectrum().eval(omega) + b.spectrum().eval(omega),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn zero_is_neutral() {
        let a = ArimaModel::white_noise(2.0).spectrum();
        assert_eq!(PseudoSpectrum::zero().plus(&a), a);
    }

    #[test]
    fn ar1_plus_noise_is_arma11() {
        // AR(1) + white noise has an ARMA(1,1) representation
        let ar1 = ArimaModel::arma(Polynomial::from_lags(&[-0.8]), Polynomial::one(), 1.0);
        let noise = ArimaModel::white_noise(1.0);
        let sum = ar1.spectrum().plus(&noise.spectrum());
        let (theta, variance) = sum.factorize_numerator().unwrap();
        let arma = ArimaModel::arma(sum.denominator().clone(), theta, variance);
        for omega in [0.0, 0.7, 2.0, 3.1] {
            assert_abs_diff_eq!(arma.spectrum().eval(omega), sum.eval(omega), epsilon = 1e-9);
        }
    }
}
