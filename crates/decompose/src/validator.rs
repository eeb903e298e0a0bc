//! Model validation: simplification and MA-root stabilization.

use num_complex::Complex64;
use seats_arima::{Polynomial, SarimaModel, SarimaSpec};
use tracing::{debug, info};

use crate::error::DecomposeError;

/// Root moduli within this distance of a bound count as on the bound.
const ROOT_TOLERANCE: f64 = 1e-9;

/// Tolerances of the [`ModelValidator`].
///
/// Defaults: `xl = 0.99`, `eps = 1e-4`, `smallness = 1e-6`.
///
/// # Example
///
/// ```
/// use seats_decompose::ValidatorConfig;
///
/// let config = ValidatorConfig::new().with_xl(0.95);
/// assert_eq!(config.xl(), 0.95);
/// assert_eq!(config.eps(), 1e-4);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ValidatorConfig {
    xl: f64,
    eps: f64,
    smallness: f64,
}

impl ValidatorConfig {
    /// Creates a configuration with the default tolerances.
    pub fn new() -> Self {
        Self {
            xl: 0.99,
            eps: 1e-4,
            smallness: 1e-6,
        }
    }

    /// Sets the MA-root floor `xl` in `(0, 1]`.
    pub fn with_xl(mut self, xl: f64) -> Self {
        self.xl = xl;
        self
    }

    /// Sets the near-unit-root tolerance used when `xl == 1`.
    pub fn with_eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    /// Sets the threshold below which trailing coefficients are dropped.
    pub fn with_smallness(mut self, smallness: f64) -> Self {
        self.smallness = smallness;
        self
    }

    /// Returns the MA-root floor.
    pub fn xl(&self) -> f64 {
        self.xl
    }

    /// Returns the near-unit-root tolerance.
    pub fn eps(&self) -> f64 {
        self.eps
    }

    /// Returns the coefficient smallness threshold.
    pub fn smallness(&self) -> f64 {
        self.smallness
    }
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of [`ModelValidator::validate()`].
#[derive(Clone, Debug, PartialEq)]
pub struct Validation {
    valid: bool,
    model: SarimaModel,
}

impl Validation {
    /// Returns `true` when the model already satisfied every check.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Returns the validated model: the input when valid, else the
    /// corrected one.
    pub fn model(&self) -> &SarimaModel {
        &self.model
    }

    /// Consumes the validation and returns the model.
    pub fn into_model(self) -> SarimaModel {
        self.model
    }
}

/// Brings a SARIMA model into the form the decomposer expects.
///
/// Checks, in order:
/// 1. trailing AR/MA coefficients below `smallness` are dropped;
/// 2. with `xl < 1`, inverse MA roots of modulus above `xl` are pulled onto
///    the `xl`-circle;
/// 3. with `xl == 1`, inverse MA roots within `eps` of the unit circle are
///    snapped onto it.
///
/// Regular and seasonal MA polynomials are handled independently. A model
/// that passes every check is returned unchanged and flagged valid, so
/// validation is a fixed point.
#[derive(Clone, Copy, Debug)]
pub struct ModelValidator {
    config: ValidatorConfig,
}

impl ModelValidator {
    /// Creates a validator.
    ///
    /// # Errors
    ///
    /// [`DecomposeError::InvalidTolerance`] when `xl` is outside `(0, 1]` or
    /// `eps`/`smallness` are negative or not finite.
    pub fn new(config: ValidatorConfig) -> Result<Self, DecomposeError> {
        if !(config.xl > 0.0 && config.xl <= 1.0) {
            return Err(DecomposeError::InvalidTolerance {
                name: "xl",
                value: config.xl,
            });
        }
        for (name, value) in [("eps", config.eps), ("smallness", config.smallness)] {
            if !value.is_finite() || value < 0.0 {
                return Err(DecomposeError::InvalidTolerance { name, value });
            }
        }
        Ok(Self { config })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validates `model`, returning the corrected model when needed.
    #[tracing::instrument(skip(self, model), fields(spec = %model.spec()))]
    pub fn validate(&self, model: &SarimaModel) -> Result<Validation, DecomposeError> {
        let smallness = self.config.smallness;
        let phi = trim_trailing(model.phi(), smallness);
        let bphi = trim_trailing(model.bphi(), smallness);
        let mut theta = trim_trailing(model.theta(), smallness);
        let mut btheta = trim_trailing(model.btheta(), smallness);
        let mut changed = phi.len() != model.phi().len()
            || bphi.len() != model.bphi().len()
            || theta.len() != model.theta().len()
            || btheta.len() != model.btheta().len();
        if changed {
            debug!("trailing coefficients dropped");
        }

        for block in [&mut theta, &mut btheta] {
            if let Some(stable) = self.stabilize(block) {
                *block = stable;
                changed = true;
            }
        }

        if !changed {
            return Ok(Validation {
                valid: true,
                model: model.clone(),
            });
        }

        let old = model.spec();
        let spec = SarimaSpec::new(old.period())
            .with_regular(phi.len(), old.d(), theta.len())
            .with_seasonal(bphi.len(), old.bd(), btheta.len());
        let variance = model.innovation_variance();
        let corrected = SarimaModel::from_parameters(spec, phi, theta, bphi, btheta, variance)?
            .with_mean(model.mean());
        info!(
            theta = ?corrected.theta(),
            btheta = ?corrected.btheta(),
            spec = %spec,
            "model corrected by validation"
        );
        Ok(Validation {
            valid: false,
            model: corrected,
        })
    }

    /// Returns the stabilized lag coefficients of `1 + c1 z + …`, or `None`
    /// when no root needs to move.
    fn stabilize(&self, lags: &[f64]) -> Option<Vec<f64>> {
        let xl = self.config.xl;
        if lags.is_empty() {
            return None;
        }
        if lags.len() == 1 {
            // inverse root of 1 + c z is -c
            let c = lags[0];
            let modulus = c.abs();
            return self.target_modulus(modulus).map(|m| vec![m * c.signum()]);
        }

        let roots = Polynomial::from_lags(lags).roots();
        let mut moved = false;
        let adjusted: Vec<Complex64> = roots
            .iter()
            .map(|z| {
                let rho = z.inv();
                match self.target_modulus(rho.norm()) {
                    Some(m) => {
                        moved = true;
                        (rho * (m / rho.norm())).inv()
                    }
                    None => *z,
                }
            })
            .collect();
        if !moved {
            return None;
        }
        let rebuilt = Polynomial::from_roots(&adjusted);
        debug!(xl, from = ?lags, to = ?rebuilt.lags(), "MA roots rescaled");
        Some(rebuilt.lags().to_vec())
    }

    /// Modulus an inverse root should be moved to, if any.
    fn target_modulus(&self, modulus: f64) -> Option<f64> {
        let xl = self.config.xl;
        if xl < 1.0 {
            (modulus > xl + ROOT_TOLERANCE).then_some(xl)
        } else {
            let gap = (modulus - 1.0).abs();
            (gap > ROOT_TOLERANCE && gap < self.config.eps).then_some(1.0)
        }
    }
}

fn trim_trailing(lags: &[f64], smallness: f64) -> Vec<f64> {
    let keep = lags
        .iter()
        .rposition(|c| c.abs() >= smallness)
        .map_or(0, |i| i + 1);
    lags[..keep].to_vec()
}
