//! Estimated seasonal ARIMA models.

use crate::error::ArimaError;
use crate::model::ArimaModel;
use crate::polynomial::Polynomial;
use crate::spec::SarimaSpec;

/// A seasonal ARIMA model with its coefficients.
///
/// Coefficients follow the additive sign convention: the regular AR
/// polynomial is `1 + φ1 B + … + φp B^p`, the seasonal MA polynomial is
/// `1 + Θ1 B^s + …`, and so on. The airline model with `θ = -0.4`,
/// `Θ = -0.6` is `(1-B)(1-B^s) x_t = (1 - 0.4B)(1 - 0.6B^s) a_t`.
///
/// ```mermaid
/// graph LR
///     A["SarimaSpec"] -->|"SarimaModel::from_parameters(..)?"| B["SarimaModel"]
///     B -->|".to_arima()"| C["ArimaModel"]
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct SarimaModel {
    spec: SarimaSpec,
    phi: Vec<f64>,
    theta: Vec<f64>,
    bphi: Vec<f64>,
    btheta: Vec<f64>,
    innovation_variance: f64,
    mean: bool,
}

impl SarimaModel {
    /// Creates a model from its orders and coefficient blocks.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`ArimaError::CoefficientCount`] | a block length differs from its order |
    /// | [`ArimaError::InvalidPeriod`] | seasonal orders with period 1 |
    /// | [`ArimaError::InvalidVariance`] | variance negative or not finite |
    pub fn from_parameters(
        spec: SarimaSpec,
        phi: Vec<f64>,
        theta: Vec<f64>,
        bphi: Vec<f64>,
        btheta: Vec<f64>,
        innovation_variance: f64,
    ) -> Result<Self, ArimaError> {
        if spec.period() == 1 && spec.has_seasonal_part() {
            return Err(ArimaError::InvalidPeriod(spec.period()));
        }
        for (block, expected, got) in [
            ("regular AR", spec.p(), phi.len()),
            ("regular MA", spec.q(), theta.len()),
            ("seasonal AR", spec.bp(), bphi.len()),
            ("seasonal MA", spec.bq(), btheta.len()),
        ] {
            if expected != got {
                return Err(ArimaError::CoefficientCount {
                    block,
                    expected,
                    got,
                });
            }
        }
        if !innovation_variance.is_finite() || innovation_variance < 0.0 {
            return Err(ArimaError::InvalidVariance(innovation_variance));
        }
        Ok(Self {
            spec,
            phi,
            theta,
            bphi,
            btheta,
            innovation_variance,
            mean: false,
        })
    }

    /// A model with all coefficients zero and unit variance.
    pub fn zeros(spec: SarimaSpec) -> Self {
        Self {
            spec,
            phi: vec![0.0; spec.p()],
            theta: vec![0.0; spec.q()],
            bphi: vec![0.0; spec.bp()],
            btheta: vec![0.0; spec.bq()],
            innovation_variance: 1.0,
            mean: false,
        }
    }

    /// The airline model `(0,1,1)(0,1,1)_period` with the given MA
    /// coefficients and unit innovation variance.
    pub fn airline(period: usize, theta: f64, btheta: f64) -> Self {
        Self {
            spec: SarimaSpec::airline(period),
            phi: Vec::new(),
            theta: vec![theta],
            bphi: Vec::new(),
            btheta: vec![btheta],
            innovation_variance: 1.0,
            mean: false,
        }
    }

    /// Sets the mean-correction flag.
    pub fn with_mean(mut self, mean: bool) -> Self {
        self.mean = mean;
        self
    }

    /// Sets the innovation variance.
    pub fn with_innovation_variance(mut self, innovation_variance: f64) -> Self {
        self.innovation_variance = innovation_variance;
        self
    }

    /// Returns the orders.
    pub fn spec(&self) -> SarimaSpec {
        self.spec
    }

    /// Returns the seasonal period.
    pub fn period(&self) -> usize {
        self.spec.period()
    }

    /// Returns the regular AR coefficients.
    pub fn phi(&self) -> &[f64] {
        &self.phi
    }

    /// Returns the regular MA coefficients.
    pub fn theta(&self) -> &[f64] {
        &self.theta
    }

    /// Returns the seasonal AR coefficients.
    pub fn bphi(&self) -> &[f64] {
        &self.bphi
    }

    /// Returns the seasonal MA coefficients.
    pub fn btheta(&self) -> &[f64] {
        &self.btheta
    }

    /// Returns the innovation variance.
    pub fn innovation_variance(&self) -> f64 {
        self.innovation_variance
    }

    /// Returns `true` when the model carries a mean.
    pub fn mean(&self) -> bool {
        self.mean
    }

    /// Regular AR polynomial `1 + φ1 B + …`.
    pub fn regular_ar(&self) -> Polynomial {
        Polynomial::from_lags(&self.phi)
    }

    /// Seasonal AR polynomial `1 + Φ1 B^s + …`.
    pub fn seasonal_ar(&self) -> Polynomial {
        Polynomial::seasonal(&self.bphi, self.period())
    }

    /// Regular MA polynomial `1 + θ1 B + …`.
    pub fn regular_ma(&self) -> Polynomial {
        Polynomial::from_lags(&self.theta)
    }

    /// Seasonal MA polynomial `1 + Θ1 B^s + …`.
    pub fn seasonal_ma(&self) -> Polynomial {
        Polynomial::seasonal(&self.btheta, self.period())
    }

    /// Differencing polynomial `(1-B)^d (1-B^s)^bd`.
    pub fn differencing(&self) -> Polynomial {
        Polynomial::difference(self.spec.d())
            .times(&Polynomial::seasonal_difference(self.period(), self.spec.bd()))
    }

    /// Converts to the polynomial form `φ(B)Φ(B^s) δ(B) x = θ(B)Θ(B^s) a`.
    pub fn to_arima(&self) -> ArimaModel {
        ArimaModel::new(
            self.regular_ar().times(&self.seasonal_ar()),
            self.differencing(),
            self.regular_ma().times(&self.seasonal_ma()),
            self.innovation_variance,
        )
    }

    /// Returns a copy with replaced regular MA coefficients (same order).
    pub fn with_theta(&self, theta: Vec<f64>) -> Result<Self, ArimaError> {
        Self::from_parameters(
            self.spec,
            self.phi.clone(),
            theta,
            self.bphi.clone(),
            self.btheta.clone(),
            self.innovation_variance,
        )
        .map(|m| m.with_mean(self.mean))
    }

    /// Returns a copy with replaced seasonal MA coefficients (same order).
    pub fn with_btheta(&self, btheta: Vec<f64>) -> Result<Self, ArimaError> {
        Self::from_parameters(
            self.spec,
            self.phi.clone(),
            self.theta.clone(),
            self.bphi.clone(),
            btheta,
            self.innovation_variance,
        )
        .map(|m| m.with_mean(self.mean))
    }

    /// Returns a copy with replaced regular and seasonal AR coefficients.
    pub fn with_ar(&self, phi: Vec<f64>, bphi: Vec<f64>) -> Result<Self, ArimaError> {
        Self::from_parameters(
            self.spec,
            phi,
            self.theta.clone(),
            bphi,
            self.btheta.clone(),
            self.innovation_variance,
        )
        .map(|m| m.with_mean(self.mean))
    }
}
