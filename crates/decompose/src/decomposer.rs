//! Canonical decomposition of an ARIMA model into unobserved components.
//!
//! The model spectrum `σ² θθ̄ / φδφ̄δ̄` is rewritten as a polynomial ratio in
//! `x = cos ω` and split into partial fractions, one per group of AR roots.
//! Each fraction is then made canonical by moving its spectral minimum into
//! the irregular component.

use std::f64::consts::PI;

use ndarray::{Array1, Array2};
use seats_arima::{
    ArimaModel, Polynomial, SarimaModel, SymmetricFilter, factorize_chebyshev, lu_solve,
};
use tracing::{debug, info, warn};

use crate::error::DecomposeError;
use crate::selector::{SeasonalSelector, TrendSelector, partition};
use crate::ucarima::{ComponentType, UcComponent, UcarimaModel};

/// Number of grid intervals on `[0, π]` used to bracket a spectral minimum.
const GRID: usize = 600;

/// Golden-section iterations refining a bracketed minimum.
const REFINEMENT: usize = 80;

/// A grid point is a pole when `|D(x)|` is below this fraction of its
/// largest value on the grid.
const POLE_TOLERANCE: f64 = 1e-9;

/// Negative spectral mass below this (relative to `σ²`) is rounding noise.
const NEGATIVE_TOLERANCE: f64 = 1e-9;

/// Components whose variance is below this fraction of `σ²` are dropped.
const NULL_VARIANCE: f64 = 1e-12;

/// Parameters of the [`ModelDecomposer`].
///
/// Defaults: `rmod = 0.5`, `epsphi = 2.0` degrees, `smod = 0.8`, exact mode.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecomposerConfig {
    rmod: f64,
    epsphi: f64,
    smod: f64,
    noisy: bool,
}

impl DecomposerConfig {
    /// Creates a configuration with the default parameters.
    pub fn new() -> Self {
        Self {
            rmod: 0.5,
            epsphi: 2.0,
            smod: 0.8,
            noisy: false,
        }
    }

    /// Sets the trend root-modulus boundary.
    pub fn with_rmod(mut self, rmod: f64) -> Self {
        self.rmod = rmod;
        self
    }

    /// Sets the seasonal phase tolerance in degrees.
    pub fn with_epsphi(mut self, epsphi: f64) -> Self {
        self.epsphi = epsphi;
        self
    }

    /// Sets the seasonal root-modulus boundary.
    pub fn with_smod(mut self, smod: f64) -> Self {
        self.smod = smod;
        self
    }

    /// Enables the noisy mode: a model whose canonical irregular would be
    /// negative is made decomposable by adding white noise.
    pub fn with_noisy(mut self, noisy: bool) -> Self {
        self.noisy = noisy;
        self
    }

    /// Returns the trend root-modulus boundary.
    pub fn rmod(&self) -> f64 {
        self.rmod
    }

    /// Returns the seasonal phase tolerance in degrees.
    pub fn epsphi(&self) -> f64 {
        self.epsphi
    }

    /// Returns the seasonal root-modulus boundary.
    pub fn smod(&self) -> f64 {
        self.smod
    }

    /// Returns `true` in noisy mode.
    pub fn noisy(&self) -> bool {
        self.noisy
    }
}

impl Default for DecomposerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// One fraction of the partial-fraction expansion.
struct Fraction {
    kind: ComponentType,
    ar: Polynomial,
    delta: Polynomial,
    /// Denominator `φδ φ̄δ̄` as a polynomial in `x`.
    den: Polynomial,
    /// Numerator as a polynomial in `x`, of lower degree than `den`.
    num: Polynomial,
}

/// Splits a SARIMA model into trend, seasonal, cycle and irregular models.
///
/// Returns `None` when the model admits no canonical decomposition; the
/// caller is expected to approximate the model and try again.
#[derive(Clone, Copy, Debug)]
pub struct ModelDecomposer {
    config: DecomposerConfig,
}

impl ModelDecomposer {
    /// Creates a decomposer.
    ///
    /// # Errors
    ///
    /// [`DecomposeError::InvalidTolerance`] when `rmod` or `smod` lie outside
    /// `[0, 1]` or `epsphi` outside `[0, 90]`.
    pub fn new(config: DecomposerConfig) -> Result<Self, DecomposeError> {
        for (name, value) in [("rmod", config.rmod), ("smod", config.smod)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(DecomposeError::InvalidTolerance { name, value });
            }
        }
        if !(0.0..=90.0).contains(&config.epsphi) {
            return Err(DecomposeError::InvalidTolerance {
                name: "epsphi",
                value: config.epsphi,
            });
        }
        Ok(Self { config })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &DecomposerConfig {
        &self.config
    }

    /// Decomposes a SARIMA model.
    #[tracing::instrument(skip(self, model), fields(spec = %model.spec()))]
    pub fn decompose(&self, model: &SarimaModel) -> Option<UcarimaModel> {
        self.decompose_arima(&model.to_arima(), model.period())
    }

    /// Decomposes an ARIMA model whose seasonal period is `period`.
    pub fn decompose_arima(&self, model: &ArimaModel, period: usize) -> Option<UcarimaModel> {
        let variance = model.innovation_variance();
        if !(variance > 0.0) {
            return None;
        }

        let mut fractions = self.denominators(model, period);
        let numerator = SymmetricFilter::of(model.ma())
            .scaled(variance)
            .to_chebyshev();
        let dens: Vec<Polynomial> = fractions.iter().map(|f| f.den.clone()).collect();
        let (nums, remainder) = match partial_fractions(&numerator, &dens) {
            Ok(solution) => solution,
            Err(err) => {
                warn!(%err, "partial fractions failed");
                return None;
            }
        };
        for (fraction, num) in fractions.iter_mut().zip(nums) {
            fraction.num = num;
        }

        let remainder = remainder.trimmed(1e-12 * variance);
        let mut base = remainder.get(0);
        if !remainder.is_constant() {
            base = 0.0;
            match fractions.iter_mut().find(|f| f.kind == ComponentType::Cycle) {
                Some(cycle) => cycle.num = cycle.num.plus(&remainder.times(&cycle.den)),
                None => fractions.push(Fraction {
                    kind: ComponentType::Cycle,
                    ar: Polynomial::one(),
                    delta: Polynomial::one(),
                    den: Polynomial::one(),
                    num: remainder,
                }),
            }
        }

        let mut minima = Vec::with_capacity(fractions.len());
        for fraction in &fractions {
            let Some(m) = spectral_minimum(&fraction.num, &fraction.den) else {
                debug!(kind = %fraction.kind, "negative spectrum at a pole");
                return None;
            };
            debug!(kind = %fraction.kind, minimum = m, "spectral minimum");
            minima.push(m);
        }

        let mut irregular = base + minima.iter().sum::<f64>();
        let mut noise = 0.0;
        if irregular < -NEGATIVE_TOLERANCE * variance {
            if !self.config.noisy {
                debug!(irregular, "canonical irregular is negative");
                return None;
            }
            noise = -irregular;
            irregular = 0.0;
        }
        let irregular = irregular.max(0.0);

        let aggregate = if noise > 0.0 {
            let full = SymmetricFilter::of(&model.full_ar()).scaled(noise);
            let noisy = SymmetricFilter::of(model.ma())
                .scaled(variance)
                .plus(&full)
                .factorize()
                .ok()?;
            warn!(added_variance = noise, "noise added to the model");
            ArimaModel::new(
                model.ar().clone(),
                model.delta().clone(),
                noisy.0,
                noisy.1,
            )
        } else {
            model.clone()
        };

        let mut components = Vec::with_capacity(fractions.len() + 1);
        for (fraction, m) in fractions.into_iter().zip(minima) {
            let canonical = fraction.num.minus(&fraction.den.scaled(m));
            let (ma, v) = match factorize_chebyshev(&canonical) {
                Ok(factors) => factors,
                Err(err) => {
                    debug!(kind = %fraction.kind, %err, "component factorization failed");
                    return None;
                }
            };
            if v <= NULL_VARIANCE * variance {
                debug!(kind = %fraction.kind, "null component dropped");
                continue;
            }
            let model = ArimaModel::new(fraction.ar, fraction.delta, ma, v);
            components.push(UcComponent::new(fraction.kind, model));
        }
        if irregular > NULL_VARIANCE * variance {
            components.push(UcComponent::new(
                ComponentType::Irregular,
                ArimaModel::white_noise(irregular),
            ));
        }
        components.sort_by_key(|c| canonical_rank(c.kind()));

        info!(
            components = components.len(),
            irregular,
            noise,
            "model decomposed"
        );
        Some(UcarimaModel::new(aggregate, components, noise))
    }

    /// Groups the AR roots and unit roots into component denominators.
    fn denominators(&self, model: &ArimaModel, period: usize) -> Vec<Fraction> {
        let parts = partition(
            model.ar(),
            &TrendSelector::new(self.config.rmod),
            &SeasonalSelector::new(period, self.config.epsphi, self.config.smod),
        );
        let (unit, seasonal_delta) = model.delta().split_unit_roots();
        let candidates = [
            (ComponentType::Trend, parts.trend, Polynomial::difference(unit)),
            (ComponentType::Seasonal, parts.seasonal, seasonal_delta),
            (ComponentType::Cycle, parts.cycle, Polynomial::one()),
        ];
        candidates
            .into_iter()
            .filter_map(|(kind, ar, delta)| {
                let full = ar.times(&delta);
                if full.is_constant() {
                    return None;
                }
                Some(Fraction {
                    kind,
                    den: SymmetricFilter::of(&full).to_chebyshev(),
                    num: Polynomial::constant(0.0),
                    ar,
                    delta,
                })
            })
            .collect()
    }
}

fn canonical_rank(kind: ComponentType) -> u8 {
    match kind {
        ComponentType::Trend => 0,
        ComponentType::Seasonal => 1,
        ComponentType::Cycle => 2,
        ComponentType::Undefined => 3,
        ComponentType::Irregular => 4,
    }
}

/// Solves `N = Σ Q_i ∏_{j≠i} D_j + R ∏ D_j` with `deg Q_i < deg D_i`.
///
/// Returns the numerators `Q_i` and the polynomial part `R`.
fn partial_fractions(
    n: &Polynomial,
    dens: &[Polynomial],
) -> Result<(Vec<Polynomial>, Polynomial), DecomposeError> {
    let total = dens.iter().fold(Polynomial::one(), |acc, d| acc.times(d));
    let (deg_n, deg_d) = (n.degree(), total.degree());
    let nr = if deg_n >= deg_d { deg_n - deg_d + 1 } else { 0 };
    let size = deg_n.max(deg_d.saturating_sub(1)) + 1;

    let mut columns: Vec<Polynomial> = Vec::with_capacity(size);
    for (i, d) in dens.iter().enumerate() {
        let others = dens
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .fold(Polynomial::one(), |acc, (_, e)| acc.times(e));
        columns.extend((0..d.degree()).map(|k| monomial(k).times(&others)));
    }
    columns.extend((0..nr).map(|k| monomial(k).times(&total)));

    let a = Array2::from_shape_fn((size, columns.len()), |(r, c)| columns[c].get(r));
    let b = Array1::from_iter((0..size).map(|r| n.get(r)));
    let x = lu_solve(&a, &b)?;

    let mut nums = Vec::with_capacity(dens.len());
    let mut pos = 0;
    for d in dens {
        let k = d.degree();
        nums.push(Polynomial::new(x.slice(ndarray::s![pos..pos + k]).to_vec()));
        pos += k;
    }
    let remainder = Polynomial::new(x.slice(ndarray::s![pos..]).to_vec());
    Ok((nums, remainder))
}

fn monomial(k: usize) -> Polynomial {
    let mut c = vec![0.0; k + 1];
    c[k] = 1.0;
    Polynomial::new(c)
}

/// Minimum over `ω ∈ [0, π]` of `q(cos ω) / d(cos ω)`.
///
/// Returns `None` when `q` is negative at a zero of `d`, where the ratio
/// tends to minus infinity.
fn spectral_minimum(q: &Polynomial, d: &Polynomial) -> Option<f64> {
    let step = PI / GRID as f64;
    let scale = (0..=GRID)
        .map(|i| d.eval((i as f64 * step).cos()).abs())
        .fold(0.0, f64::max);
    let tolerance = POLE_TOLERANCE * scale;
    let ratio = |w: f64| q.eval(w.cos()) / d.eval(w.cos());

    let mut best = f64::INFINITY;
    let mut at = 0.0;
    for i in 0..=GRID {
        let w = i as f64 * step;
        let x = w.cos();
        if d.eval(x) <= tolerance {
            if q.eval(x) < -NEGATIVE_TOLERANCE {
                return None;
            }
            continue;
        }
        let v = ratio(w);
        if v < best {
            best = v;
            at = w;
        }
    }
    if !best.is_finite() {
        return None;
    }

    let golden = (5.0_f64.sqrt() - 1.0) / 2.0;
    let (mut lo, mut hi) = ((at - step).max(0.0), (at + step).min(PI));
    for _ in 0..REFINEMENT {
        let c = hi - golden * (hi - lo);
        let e = lo + golden * (hi - lo);
        if ratio(c) < ratio(e) {
            hi = e;
        } else {
            lo = c;
        }
    }
    Some(best.min(ratio(0.5 * (lo + hi))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use seats_arima::SarimaSpec;

    fn decomposer() -> ModelDecomposer {
        ModelDecomposer::new(DecomposerConfig::default()).unwrap()
    }

    #[test]
    fn airline_has_three_components() {
        let model = SarimaModel::airline(12, -0.4, -0.6);
        let ucm = decomposer().decompose(&model).unwrap();
        assert_eq!(
            ucm.kinds(),
            vec![
                ComponentType::Trend,
                ComponentType::Seasonal,
                ComponentType::Irregular
            ]
        );
        let irregular = ucm.component(ComponentType::Irregular).unwrap();
        assert_abs_diff_eq!(irregular.model().innovation_variance(), 0.31364, epsilon = 1e-4);
        assert!(ucm.additivity_error() < 1e-6);
        assert!(!ucm.is_noisy());
    }

    #[test]
    fn trend_carries_the_regular_unit_roots() {
        let model = SarimaModel::airline(12, -0.4, -0.6);
        let ucm = decomposer().decompose(&model).unwrap();
        let trend = ucm.component(ComponentType::Trend).unwrap().model();
        assert_eq!(trend.delta().degree(), 2);
        let seasonal = ucm.component(ComponentType::Seasonal).unwrap().model();
        assert_eq!(seasonal.delta().degree(), 11);
    }

    #[test]
    fn random_walk_plus_noise() {
        // (1 - B) x = (1 - 0.5B) a splits into a random walk and white noise
        let spec = SarimaSpec::new(1).with_regular(0, 1, 1);
        let model =
            SarimaModel::from_parameters(spec, vec![], vec![-0.5], vec![], vec![], 1.0).unwrap();
        let ucm = decomposer().decompose(&model).unwrap();
        assert_eq!(
            ucm.kinds(),
            vec![ComponentType::Trend, ComponentType::Irregular]
        );
        // the canonical irregular takes the spectrum at π: 2.25 / 4
        let irregular = ucm.component(ComponentType::Irregular).unwrap().model();
        assert_abs_diff_eq!(irregular.innovation_variance(), 0.5625, epsilon = 1e-8);
        assert!(ucm.additivity_error() < 1e-8);
    }

    /// `(0,1,1)(1,1,1)_12` with a strong seasonal AR and a positive seasonal MA.
    fn seasonal_ar_model() -> SarimaModel {
        let spec = SarimaSpec::new(12).with_regular(0, 1, 1).with_seasonal(1, 1, 1);
        SarimaModel::from_parameters(spec, vec![], vec![-0.4], vec![-0.9], vec![0.5], 1.0)
            .unwrap()
    }

    #[test]
    fn seasonal_ar_model_is_not_decomposable() {
        assert!(decomposer().decompose(&seasonal_ar_model()).is_none());
    }

    #[test]
    fn noisy_mode_adds_white_noise() {
        let noisy = ModelDecomposer::new(DecomposerConfig::new().with_noisy(true)).unwrap();
        let ucm = noisy.decompose(&seasonal_ar_model()).unwrap();
        assert!(ucm.is_noisy());
        assert_abs_diff_eq!(ucm.noise(), 0.01426, epsilon = 1e-4);
        assert!(ucm.component(ComponentType::Irregular).is_none());
        assert!(ucm.additivity_error() < 1e-6);
    }

    #[test]
    fn stationary_ar_goes_to_trend() {
        let spec = SarimaSpec::new(1).with_regular(1, 0, 0);
        let model =
            SarimaModel::from_parameters(spec, vec![-0.8], vec![], vec![], vec![], 1.0).unwrap();
        let ucm = decomposer().decompose(&model).unwrap();
        assert_eq!(ucm.kinds()[0], ComponentType::Trend);
        assert!(ucm.additivity_error() < 1e-8);
    }

    #[test]
    fn spectral_minimum_of_constant_ratio() {
        let q = Polynomial::constant(2.0);
        let d = Polynomial::constant(4.0);
        assert_abs_diff_eq!(spectral_minimum(&q, &d).unwrap(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn negative_numerator_at_pole() {
        // d vanishes at x = 1 (ω = 0) where q < 0
        let q = Polynomial::constant(-1.0);
        let d = Polynomial::new(vec![1.0, -1.0]);
        assert!(spectral_minimum(&q, &d).is_none());
    }

    #[test]
    fn partial_fractions_reassemble() {
        let d1 = Polynomial::new(vec![1.0, -1.0]);
        let d2 = Polynomial::new(vec![2.0, 1.0]);
        let n = Polynomial::new(vec![3.0, 0.5, -0.25]);
        let (nums, r) = partial_fractions(&n, &[d1.clone(), d2.clone()]).unwrap();
        let rebuilt = nums[0]
            .times(&d2)
            .plus(&nums[1].times(&d1))
            .plus(&r.times(&d1.times(&d2)));
        for k in 0..=2 {
            assert_abs_diff_eq!(rebuilt.get(k), n.get(k), epsilon = 1e-12);
        }
    }

    #[test]
    fn invalid_rmod_rejected() {
        let result = ModelDecomposer::new(DecomposerConfig::new().with_rmod(1.5));
        assert!(matches!(
            result,
            Err(DecomposeError::InvalidTolerance { name: "rmod", .. })
        ));
    }
}
