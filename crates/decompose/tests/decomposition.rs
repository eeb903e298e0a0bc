//! Integration tests for seats-decompose: validation, canonical
//! decomposition and the approximation cascade.

use std::f64::consts::PI;
use std::sync::Arc;

use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use seats_arima::{MaximumLikelihood, SarimaModel, SarimaSpec};
use seats_decompose::{
    ApproximationStep, ApproximatorConfig, ComponentType, DecomposerConfig, ModelApproximator,
    ModelDecomposer, ModelValidator, UcarimaModel, ValidatorConfig,
};

/// Simulates `(1-B)(1-B^s) x_t = (1 + θB)(1 + ΘB^s) a_t`.
fn simulate_airline(period: usize, theta: f64, btheta: f64, n: usize, seed: u64) -> Vec<f64> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0).unwrap();
    let burn = 100;
    let total = n + burn + period + 1;
    let e: Vec<f64> = (0..total).map(|_| normal.sample(&mut rng)).collect();
    let mut x = vec![0.0; total];
    for t in period + 1..total {
        let w =
            e[t] + theta * e[t - 1] + btheta * e[t - period] + theta * btheta * e[t - period - 1];
        x[t] = x[t - 1] + x[t - period] - x[t - period - 1] + w;
    }
    x.split_off(total - n).into_iter().map(|v| v + 100.0).collect()
}

fn decomposer() -> ModelDecomposer {
    ModelDecomposer::new(DecomposerConfig::default()).unwrap()
}

fn assert_spectra_non_negative(ucm: &UcarimaModel) {
    for c in ucm.components() {
        let spectrum = c.model().spectrum();
        for i in 0..=400 {
            let omega = PI * i as f64 / 400.0;
            let value = spectrum.numerator().eval(omega);
            assert!(value >= -1e-9, "{} spectrum {value} at {omega}", c.kind());
        }
    }
}

#[test]
fn airline_decomposes_on_first_attempt() {
    let model = SarimaModel::airline(12, -0.4, -0.6);
    let validation = ModelValidator::new(ValidatorConfig::default())
        .unwrap()
        .validate(&model)
        .unwrap();
    assert!(validation.is_valid());

    let ucm = decomposer().decompose(validation.model()).unwrap();
    assert_eq!(ucm.components().len(), 3);
    assert!(ucm.additivity_error() < 1e-6);
    assert_spectra_non_negative(&ucm);
}

#[test]
fn airline_grid_is_additive() {
    for period in [4, 12] {
        for theta in [-0.8, -0.4, 0.0, 0.3] {
            for btheta in [-0.9, -0.6, -0.3] {
                let model = SarimaModel::airline(period, theta, btheta);
                let ucm = decomposer()
                    .decompose(&model)
                    .unwrap_or_else(|| panic!("s={period} θ={theta} Θ={btheta}"));
                assert!(ucm.additivity_error() < 1e-6, "s={period} θ={theta} Θ={btheta}");
                assert_spectra_non_negative(&ucm);
            }
        }
    }
}

#[test]
fn ar_model_with_cycle_is_additive() {
    // complex AR roots at 60°, away from every seasonal frequency of s = 4
    let spec = SarimaSpec::new(4).with_regular(2, 1, 1).with_seasonal(0, 1, 1);
    let model = SarimaModel::from_parameters(
        spec,
        vec![-0.7, 0.49],
        vec![-0.3],
        vec![],
        vec![-0.6],
        1.0,
    )
    .unwrap();
    let ucm = decomposer().decompose(&model).unwrap();
    assert!(ucm.component(ComponentType::Cycle).is_some());
    assert!(ucm.additivity_error() < 1e-6);
    assert_spectra_non_negative(&ucm);
}

#[test]
fn corrected_models_are_fixed_points() {
    let validator = ModelValidator::new(ValidatorConfig::default()).unwrap();
    for (theta, btheta) in [(-1.3, -0.6), (0.4, -1.1), (-0.999, 1.2)] {
        let once = validator
            .validate(&SarimaModel::airline(12, theta, btheta))
            .unwrap();
        assert!(!once.is_valid());
        let twice = validator.validate(once.model()).unwrap();
        assert!(twice.is_valid());
        assert_eq!(twice.model(), once.model());
    }
}

#[test]
fn seasonal_ar_model_is_approximated() {
    let series = simulate_airline(12, -0.4, -0.6, 120, 17);
    let spec = SarimaSpec::new(12).with_regular(0, 1, 1).with_seasonal(1, 1, 1);
    let model =
        SarimaModel::from_parameters(spec, vec![], vec![-0.4], vec![-0.9], vec![0.5], 1.0)
            .unwrap();
    assert!(decomposer().decompose(&model).is_none());

    let approximator =
        ModelApproximator::new(ApproximatorConfig::default(), Arc::new(MaximumLikelihood));
    let approximation = approximator.approximate(&model, &series).unwrap();
    assert_eq!(approximation.step(), ApproximationStep::Seasonal);
    let s = approximation.model().spec();
    assert_eq!((s.bp(), s.bd(), s.bq()), (0, 1, 1));

    let ucm = decomposer().decompose(approximation.model()).unwrap();
    assert!(ucm.component(ComponentType::Seasonal).is_some());
    assert!(ucm.additivity_error() < 1e-6);
}
