//! Integration tests for seats-estimate: estimator agreement, recombination
//! and the bias-corrected decompositions.

use approx::assert_relative_eq;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use seats_arima::{SarimaModel, SarimaSpec};
use seats_decompose::{ComponentType, DecomposerConfig, ModelDecomposer, UcarimaModel};
use seats_estimate::{
    BiasCorrection, BiasCorrector, BurmanEstimator, ComponentEstimates, ComponentsEstimator,
    DecompositionMode, Horizons, KalmanEstimator, MeanEffect, SeriesKind, Transformation,
    series_estimate,
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
    x.split_off(total - n)
}

fn airline_ucm(variance: f64) -> UcarimaModel {
    let model = SarimaModel::airline(12, -0.4, -0.6).with_innovation_variance(variance);
    ModelDecomposer::new(DecomposerConfig::default())
        .unwrap()
        .decompose(&model)
        .unwrap()
}

#[test]
fn burman_and_kalman_agree() {
    let ucm = airline_ucm(1.0);
    let series: Vec<f64> = simulate_airline(12, -0.4, -0.6, 120, 3)
        .into_iter()
        .map(|x| x + 100.0)
        .collect();
    let h = Horizons::symmetric(12);
    let burman = BurmanEstimator.estimate(&ucm, &series, h).unwrap();
    let kalman = KalmanEstimator.estimate(&ucm, &series, h).unwrap();

    for kind in [ComponentType::Trend, ComponentType::Seasonal, ComponentType::Irregular] {
        let b = burman.component(kind).unwrap();
        let k = kalman.component(kind).unwrap();
        for (x, y) in b.values().iter().zip(k.values()) {
            assert_relative_eq!(*x, *y, epsilon = 1e-4, max_relative = 1e-4);
        }
        for (x, y) in b.forecasts().iter().zip(k.forecasts()) {
            assert_relative_eq!(*x, *y, epsilon = 1e-4, max_relative = 1e-4);
        }
        for (x, y) in b.stdev().iter().zip(k.stdev()) {
            assert_relative_eq!(*x, *y, epsilon = 1e-3, max_relative = 1e-3);
        }
    }
    let (b, k) = (burman.seasonally_adjusted(), kalman.seasonally_adjusted());
    for (x, y) in b.values().iter().zip(k.values()) {
        assert_relative_eq!(*x, *y, epsilon = 1e-4, max_relative = 1e-4);
    }
}

fn decompose(spec: SarimaSpec, phi: Vec<f64>, theta: Vec<f64>, btheta: Vec<f64>) -> UcarimaModel {
    let model = SarimaModel::from_parameters(spec, phi, theta, vec![], btheta, 1.0).unwrap();
    ModelDecomposer::new(DecomposerConfig::default())
        .unwrap()
        .decompose(&model)
        .unwrap()
}

/// Trend with curvature, a monthly cycle and a fast wiggle.
fn curved_series(n: usize) -> Vec<f64> {
    (0..n)
        .map(|t| {
            let t = t as f64;
            80.0 + 0.3 * t + 0.01 * t * t
                + 5.0 * (t * std::f64::consts::PI / 6.0).sin()
                + (t * 1.7).cos()
        })
        .collect()
}

/// Compares every component and the seasonally adjusted series, including
/// forecasts, backcasts and standard errors.
fn assert_estimates_agree(burman: &ComponentEstimates, kalman: &ComponentEstimates, label: &str) {
    assert!(kalman.fallbacks().is_empty(), "{label}");
    assert_eq!(burman.components().len(), kalman.components().len(), "{label}");
    let pairs = burman
        .components()
        .iter()
        .zip(kalman.components())
        .map(|((kb, b), (kk, k))| {
            assert_eq!(kb, kk, "{label}");
            (b, k)
        })
        .chain(std::iter::once((
            burman.seasonally_adjusted(),
            kalman.seasonally_adjusted(),
        )));
    for (b, k) in pairs {
        for (x, y) in b.extended().iter().zip(k.extended()) {
            assert_relative_eq!(*x, y, epsilon = 1e-4, max_relative = 1e-4);
        }
        for (x, y) in b.extended_stdev().iter().zip(k.extended_stdev()) {
            assert_relative_eq!(*x, y, epsilon = 1e-3, max_relative = 1e-2);
        }
    }
}

#[test]
fn second_differences_agree_for_any_backcast_horizon() {
    let spec = SarimaSpec::new(12).with_regular(0, 2, 1).with_seasonal(0, 1, 1);
    let ucm = decompose(spec, vec![], vec![-0.6], vec![-0.6]);
    let series = curved_series(120);
    for hb in [0, 3, 6, 7, 11, 13, 17, 24] {
        let h = Horizons::new(12, hb);
        let burman = BurmanEstimator.estimate(&ucm, &series, h).unwrap();
        let kalman = KalmanEstimator.estimate(&ucm, &series, h).unwrap();
        assert_estimates_agree(&burman, &kalman, &format!("backcasts = {hb}"));
    }
}

#[test]
fn cycle_component_agrees() {
    let spec = SarimaSpec::new(12).with_regular(1, 1, 1).with_seasonal(0, 1, 1);
    let ucm = decompose(spec, vec![0.6], vec![-0.4], vec![-0.6]);
    assert!(ucm.component(ComponentType::Cycle).is_some());
    let series = curved_series(120);
    let h = Horizons::symmetric(12);
    let burman = BurmanEstimator.estimate(&ucm, &series, h).unwrap();
    let kalman = KalmanEstimator.estimate(&ucm, &series, h).unwrap();
    assert_estimates_agree(&burman, &kalman, "cycle");
}

#[test]
fn level_decomposition_recombines() {
    let ucm = airline_ucm(1.0);
    let series: Vec<f64> = simulate_airline(12, -0.4, -0.6, 120, 11)
        .into_iter()
        .map(|x| x + 50.0)
        .collect();
    let h = Horizons::symmetric(12);
    let estimates = BurmanEstimator.estimate(&ucm, &series, h).unwrap();
    let observed = series_estimate(ucm.aggregate(), &series, h).unwrap();

    let corrector = BiasCorrector::default();
    let initial = corrector.initial(&observed, &estimates);
    assert!(initial.recombination_error() < 1e-6);
    let last = corrector.correct(&initial);
    assert_eq!(last.mode(), DecompositionMode::Additive);
    assert!(last.recombination_error() < 1e-8);
    for (kind, e) in last.iter() {
        assert_eq!(e.forecasts().len(), 12, "{kind}");
        assert_eq!(e.backcasts().len(), 12, "{kind}");
    }
}

#[test]
fn log_decomposition_with_mean_recombines() {
    let ucm = airline_ucm(0.0004);
    let raw: Vec<f64> = simulate_airline(12, -0.4, -0.6, 96, 5)
        .into_iter()
        .enumerate()
        .map(|(t, x)| (4.0 + 0.02 * x + 0.001 * (t * t) as f64 / 24.0).exp())
        .collect();
    let transformation = Transformation::Log;
    let logged = transformation.apply(&raw).unwrap();
    let mean = MeanEffect::estimate(ucm.aggregate().delta(), &logged).unwrap();
    let centered = mean.remove(&logged);

    let h = Horizons::symmetric(12);
    let effect = mean.extended(logged.len(), h);
    let estimates = KalmanEstimator
        .estimate(&ucm, &centered, h)
        .unwrap()
        .with_effect(ComponentType::Trend, &effect);
    let observed = series_estimate(ucm.aggregate(), &centered, h)
        .unwrap()
        .shifted(&effect);

    let corrector = BiasCorrector::new(transformation, BiasCorrection::Legacy);
    let last = corrector.correct(&corrector.initial(&observed, &estimates));
    assert_eq!(last.mode(), DecompositionMode::Multiplicative);
    let series = last.get(SeriesKind::Series).unwrap();
    for (x, y) in series.values().iter().zip(&raw) {
        assert_relative_eq!(*x, *y, max_relative = 1e-10);
    }
    assert!(last.recombination_error() < 1e-9);
    let seasonal = last.get(SeriesKind::Seasonal).unwrap();
    let mean_factor = seasonal.values().iter().sum::<f64>() / seasonal.values().len() as f64;
    assert_relative_eq!(mean_factor, 1.0, epsilon = 1e-12);
}
