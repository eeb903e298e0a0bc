//! The model approximation cascade.
//!
//! When a model does not decompose, the approximator proposes a nearby model
//! that is more likely to. Steps are pure functions tried in a fixed order;
//! the first one that applies wins. Steps that change the model orders are
//! followed by re-estimation on the series.

use std::fmt;
use std::sync::Arc;

use seats_arima::{ModelEstimator, Polynomial, SarimaModel, SarimaSpec};
use tracing::{info, warn};

use crate::patterns;

/// Seasonal AR coefficients below this are treated as a seasonal unit root.
const SEASONAL_UNIT_AR: f64 = -0.8;

/// A discarded real AR root at least this large becomes a unit root.
const LARGE_AR_ROOT: f64 = 0.9;

/// Highest regular differencing order the cascade introduces.
const MAX_D: usize = 2;

/// Highest regular MA order the cascade introduces.
const MAX_Q: usize = 3;

/// Approximation policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ApproximationMode {
    /// Non-decomposable models are rejected.
    None,
    /// The full cascade of approximation steps.
    #[default]
    Legacy,
}

/// Parameters of the [`ModelApproximator`].
///
/// Defaults: `mode = Legacy`, `max_rounds = 10`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ApproximatorConfig {
    mode: ApproximationMode,
    max_rounds: usize,
}

impl ApproximatorConfig {
    /// Creates a configuration with the defaults.
    pub fn new() -> Self {
        Self {
            mode: ApproximationMode::Legacy,
            max_rounds: 10,
        }
    }

    /// Sets the approximation policy.
    pub fn with_mode(mut self, mode: ApproximationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the bound on decomposition attempts.
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Returns the approximation policy.
    pub fn mode(&self) -> ApproximationMode {
        self.mode
    }

    /// Returns the bound on decomposition attempts.
    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }
}

impl Default for ApproximatorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Name of a cascade step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ApproximationStep {
    /// MA coefficients of a known shape capped at calibrated bounds.
    KnownPattern,
    /// Seasonal orders rewritten toward a seasonal MA(1).
    Seasonal,
    /// One regular AR order dropped.
    ReduceAr,
    /// One regular MA order dropped.
    ReduceMa,
    /// Seasonal MA removed.
    Last,
}

impl fmt::Display for ApproximationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::KnownPattern => "known_pattern",
            Self::Seasonal => "app_seas",
            Self::ReduceAr => "app_redp",
            Self::ReduceMa => "app_redq",
            Self::Last => "app_last",
        };
        f.write_str(name)
    }
}

/// A candidate model proposed by a step.
struct Proposal {
    model: SarimaModel,
    reestimate: bool,
}

impl Proposal {
    fn fixed(model: SarimaModel) -> Self {
        Self {
            model,
            reestimate: false,
        }
    }

    fn refit(model: SarimaModel) -> Self {
        Self {
            model,
            reestimate: true,
        }
    }
}

type Step = fn(&SarimaModel) -> Option<Proposal>;

const CASCADE: [(ApproximationStep, Step); 5] = [
    (ApproximationStep::KnownPattern, known_pattern),
    (ApproximationStep::Seasonal, app_seas),
    (ApproximationStep::ReduceAr, app_redp),
    (ApproximationStep::ReduceMa, app_redq),
    (ApproximationStep::Last, app_last),
];

/// An applied approximation.
#[derive(Clone, Debug, PartialEq)]
pub struct Approximation {
    step: ApproximationStep,
    model: SarimaModel,
}

impl Approximation {
    /// Returns the step that produced the model.
    pub fn step(&self) -> ApproximationStep {
        self.step
    }

    /// Returns the approximating model.
    pub fn model(&self) -> &SarimaModel {
        &self.model
    }

    /// Consumes the approximation and returns the model.
    pub fn into_model(self) -> SarimaModel {
        self.model
    }
}

/// Runs the cascade against a model, re-estimating through a
/// [`ModelEstimator`].
#[derive(Clone)]
pub struct ModelApproximator {
    config: ApproximatorConfig,
    estimator: Arc<dyn ModelEstimator>,
}

impl fmt::Debug for ModelApproximator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelApproximator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ModelApproximator {
    /// Creates an approximator.
    pub fn new(config: ApproximatorConfig, estimator: Arc<dyn ModelEstimator>) -> Self {
        Self { config, estimator }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ApproximatorConfig {
        &self.config
    }

    /// Applies the first step that changes `model` and, when needed,
    /// re-estimates the result on `series`.
    ///
    /// Returns `None` when no step applies, or when every applicable step
    /// failed to re-estimate.
    #[tracing::instrument(skip(self, model, series), fields(spec = %model.spec()))]
    pub fn approximate(&self, model: &SarimaModel, series: &[f64]) -> Option<Approximation> {
        if self.config.mode == ApproximationMode::None {
            return None;
        }
        for (step, apply) in CASCADE {
            let Some(proposal) = apply(model) else {
                continue;
            };
            let candidate = if proposal.reestimate {
                let spec = proposal.model.spec();
                match self.estimator.estimate(
                    spec,
                    proposal.model.mean(),
                    series,
                    Some(&proposal.model),
                ) {
                    Ok(fit) => fit,
                    Err(err) => {
                        warn!(%step, %spec, %err, "re-estimation failed");
                        continue;
                    }
                }
            } else {
                proposal.model
            };
            info!(%step, spec = %candidate.spec(), "model approximated");
            return Some(Approximation {
                step,
                model: candidate,
            });
        }
        None
    }
}

fn known_pattern(model: &SarimaModel) -> Option<Proposal> {
    patterns::capped(model).map(Proposal::fixed)
}

fn app_seas(model: &SarimaModel) -> Option<Proposal> {
    let spec = model.spec();
    let (p, d, q) = (spec.p(), spec.d(), spec.q());
    if spec.bd() == 0 && spec.bp() == 1 && model.bphi()[0] < SEASONAL_UNIT_AR {
        let target = SarimaSpec::new(spec.period())
            .with_regular(p, d, q)
            .with_seasonal(0, 1, 1);
        return reshape(model, target).map(|m| Proposal::refit(m.with_mean(false)));
    }
    let seasonal = if spec.bp() == 1 && spec.bd() == 1 {
        (0, 1, 1)
    } else if spec.bq() >= 2 {
        (spec.bp(), spec.bd(), 1)
    } else if spec.bp() >= 2 {
        (1, spec.bd(), spec.bq())
    } else {
        return None;
    };
    let target = SarimaSpec::new(spec.period())
        .with_regular(p, d, q)
        .with_seasonal(seasonal.0, seasonal.1, seasonal.2);
    reshape(model, target).map(Proposal::refit)
}

fn app_redp(model: &SarimaModel) -> Option<Proposal> {
    let spec = model.spec();
    if spec.p() == 0 {
        return None;
    }
    let mut roots = model.regular_ar().roots();
    // largest inverse root last
    roots.sort_by(|a, b| b.norm().total_cmp(&a.norm()));
    let dropped = roots.pop()?;
    let rho = dropped.inv();
    let real = rho.im.abs() < 1e-9;

    let (d, q, mean) = if real && rho.re >= LARGE_AR_ROOT && spec.d() < MAX_D {
        (spec.d() + 1, (spec.q() + 1).min(MAX_Q), false)
    } else {
        (spec.d(), spec.q(), model.mean())
    };
    let target = SarimaSpec::new(spec.period())
        .with_regular(spec.p() - 1, d, q)
        .with_seasonal(spec.bp(), spec.bd(), spec.bq());
    let start = reshape(model, target)?.with_mean(mean);
    if !real {
        return Some(Proposal::refit(start));
    }
    let phi = Polynomial::from_roots(&roots).lags().to_vec();
    let start = start.with_ar(phi, model.bphi().to_vec()).ok()?;
    Some(Proposal::refit(start))
}

fn app_redq(model: &SarimaModel) -> Option<Proposal> {
    let spec = model.spec();
    if spec.q() <= 1 {
        return None;
    }
    let target = SarimaSpec::new(spec.period())
        .with_regular(spec.p(), spec.d(), spec.q() - 1)
        .with_seasonal(spec.bp(), spec.bd(), spec.bq());
    reshape(model, target).map(Proposal::refit)
}

fn app_last(model: &SarimaModel) -> Option<Proposal> {
    let spec = model.spec();
    if spec.bq() == 0 {
        return None;
    }
    let target = SarimaSpec::new(spec.period())
        .with_regular(spec.p(), spec.d(), spec.q())
        .with_seasonal(spec.bp(), spec.bd(), 0);
    reshape(model, target).map(Proposal::refit)
}

/// Carries the coefficients of `model` over to the orders of `spec`,
/// truncating or zero-padding each block.
fn reshape(model: &SarimaModel, spec: SarimaSpec) -> Option<SarimaModel> {
    let fit = |c: &[f64], n: usize| {
        let mut v: Vec<f64> = c.iter().copied().take(n).collect();
        v.resize(n, 0.0);
        v
    };
    SarimaModel::from_parameters(
        spec,
        fit(model.phi(), spec.p()),
        fit(model.theta(), spec.q()),
        fit(model.bphi(), spec.bp()),
        fit(model.btheta(), spec.bq()),
        model.innovation_variance(),
    )
    .ok()
    .map(|m| m.with_mean(model.mean()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use seats_arima::ArimaError;
    use std::sync::Mutex;

    /// Returns its start model unchanged and records the orders it saw.
    #[derive(Default)]
    struct Echo {
        calls: Mutex<Vec<SarimaSpec>>,
    }

    impl ModelEstimator for Echo {
        fn estimate(
            &self,
            spec: SarimaSpec,
            _mean: bool,
            _series: &[f64],
            start: Option<&SarimaModel>,
        ) -> Result<SarimaModel, ArimaError> {
            self.calls.lock().unwrap().push(spec);
            Ok(start.cloned().unwrap_or_else(|| SarimaModel::zeros(spec)))
        }
    }

    struct Failing;

    impl ModelEstimator for Failing {
        fn estimate(
            &self,
            _spec: SarimaSpec,
            _mean: bool,
            _series: &[f64],
            _start: Option<&SarimaModel>,
        ) -> Result<SarimaModel, ArimaError> {
            Err(ArimaError::OptimizationFailed)
        }
    }

    fn model(
        spec: SarimaSpec,
        phi: &[f64],
        theta: &[f64],
        bphi: &[f64],
        btheta: &[f64],
    ) -> SarimaModel {
        SarimaModel::from_parameters(
            spec,
            phi.to_vec(),
            theta.to_vec(),
            bphi.to_vec(),
            btheta.to_vec(),
            1.0,
        )
        .unwrap()
    }

    #[test]
    fn step_names() {
        assert_eq!(ApproximationStep::Seasonal.to_string(), "app_seas");
        assert_eq!(ApproximationStep::ReduceAr.to_string(), "app_redp");
        assert_eq!(ApproximationStep::Last.to_string(), "app_last");
    }

    #[test]
    fn known_pattern_needs_no_estimation() {
        let echo = Arc::new(Echo::default());
        let approximator = ModelApproximator::new(ApproximatorConfig::default(), echo.clone());
        let result = approximator
            .approximate(&SarimaModel::airline(12, -0.4, 0.3), &[])
            .unwrap();
        assert_eq!(result.step(), ApproximationStep::KnownPattern);
        assert_eq!(result.model().btheta(), &[-0.05]);
        assert!(echo.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn seasonal_ar_with_differencing_becomes_seasonal_ma() {
        let spec = SarimaSpec::new(12).with_regular(0, 1, 1).with_seasonal(1, 1, 0);
        let m = model(spec, &[], &[-0.4], &[-0.5], &[]);
        let proposal = app_seas(&m).unwrap();
        assert!(proposal.reestimate);
        let s = proposal.model.spec();
        assert_eq!((s.bp(), s.bd(), s.bq()), (0, 1, 1));
        assert_eq!(proposal.model.theta(), &[-0.4]);
    }

    #[test]
    fn strong_seasonal_ar_becomes_seasonal_difference() {
        let spec = SarimaSpec::new(4).with_regular(0, 1, 1).with_seasonal(1, 0, 0);
        let m = model(spec, &[], &[-0.4], &[-0.9], &[]).with_mean(true);
        let proposal = app_seas(&m).unwrap();
        let s = proposal.model.spec();
        assert_eq!((s.bp(), s.bd(), s.bq()), (0, 1, 1));
        assert!(!proposal.model.mean());
    }

    #[test]
    fn seasonal_orders_reduced() {
        let spec = SarimaSpec::new(12).with_regular(0, 1, 1).with_seasonal(0, 1, 2);
        let m = model(spec, &[], &[-0.4], &[], &[-0.5, 0.1]);
        let s = app_seas(&m).unwrap().model.spec();
        assert_eq!(s.bq(), 1);

        let spec = SarimaSpec::new(12).with_regular(0, 1, 1).with_seasonal(2, 0, 0);
        let m = model(spec, &[], &[-0.4], &[-0.2, -0.1], &[]);
        let s = app_seas(&m).unwrap().model.spec();
        assert_eq!(s.bp(), 1);
    }

    #[test]
    fn airline_has_no_seasonal_step() {
        assert!(app_seas(&SarimaModel::airline(12, -0.4, -0.6)).is_none());
    }

    #[test]
    fn large_ar_root_becomes_unit_root() {
        // (1 - 0.95B) with d = 0
        let spec = SarimaSpec::new(12).with_regular(1, 0, 1).with_seasonal(0, 1, 1);
        let m = model(spec, &[-0.95], &[-0.3], &[], &[-0.6]).with_mean(true);
        let proposal = app_redp(&m).unwrap();
        let s = proposal.model.spec();
        assert_eq!((s.p(), s.d(), s.q()), (0, 1, 2));
        assert!(!proposal.model.mean());
    }

    #[test]
    fn small_ar_root_just_dropped() {
        // (1 - 0.5B)(1 - 0.2B) = 1 - 0.7B + 0.1B²
        let spec = SarimaSpec::new(12).with_regular(2, 1, 1).with_seasonal(0, 1, 1);
        let m = model(spec, &[-0.7, 0.1], &[-0.3], &[], &[-0.6]);
        let proposal = app_redp(&m).unwrap();
        let s = proposal.model.spec();
        assert_eq!((s.p(), s.d(), s.q()), (1, 1, 1));
        // the larger root 0.5 is discarded
        assert!((proposal.model.phi()[0] + 0.2).abs() < 1e-9);
    }

    #[test]
    fn ma_order_never_below_one() {
        assert!(app_redq(&SarimaModel::airline(12, -0.4, -0.6)).is_none());
        let spec = SarimaSpec::new(12).with_regular(0, 1, 2).with_seasonal(0, 1, 1);
        let m = model(spec, &[], &[-0.4, 0.1], &[], &[-0.6]);
        assert_eq!(app_redq(&m).unwrap().model.spec().q(), 1);
    }

    #[test]
    fn last_resort_drops_seasonal_ma() {
        let s = app_last(&SarimaModel::airline(12, -0.4, -0.6))
            .unwrap()
            .model
            .spec();
        assert_eq!(s.bq(), 0);
    }

    #[test]
    fn failed_estimation_falls_through() {
        // app_seas applies but cannot be refitted; app_last is tried next
        let spec = SarimaSpec::new(12).with_regular(0, 1, 1).with_seasonal(1, 1, 1);
        let m = model(spec, &[], &[-0.4], &[-0.5], &[-0.6]);
        let approximator = ModelApproximator::new(ApproximatorConfig::default(), Arc::new(Failing));
        assert!(approximator.approximate(&m, &[]).is_none());
    }

    #[test]
    fn disabled_mode_never_approximates() {
        let config = ApproximatorConfig::new().with_mode(ApproximationMode::None);
        let approximator = ModelApproximator::new(config, Arc::new(Echo::default()));
        assert!(
            approximator
                .approximate(&SarimaModel::airline(12, -0.4, 0.3), &[])
                .is_none()
        );
    }
}
