//! Burman's finite-sample implementation of the Wiener-Kolmogorov filter.
//!
//! The filter `ν(B, F) = g(B)/θ(B) + g(F)/θ(F)` is applied to the series
//! extended with forecasts and backcasts. Each half is a one-sided
//! recursion `θ(F) u_t = g(F) z_t` that runs backwards from the end of the
//! extended series; the values it cannot reach are pinned by a small linear
//! system tying the recursion to the AR structure past the end of the
//! sample.

use ndarray::{Array1, Array2};
use seats_arima::{ArimaModel, Polynomial, PseudoSpectrum, backcast, forecast, lu_solve};
use seats_decompose::{ComponentType, UcarimaModel};
use tracing::{debug, warn};

use crate::components::{ComponentEstimates, Horizons, SeriesEstimate};
use crate::error::EstimateError;
use crate::estimator::{ComponentsEstimator, check_input, sum_non_seasonal};
use crate::wiener_kolmogorov::{gain, standard_errors};

/// Wiener-Kolmogorov estimator with Burman's boundary treatment.
#[derive(Clone, Copy, Debug, Default)]
pub struct BurmanEstimator;

/// One signal to extract: its spectrum and the spectrum of the rest.
struct Signal {
    spectrum: PseudoSpectrum,
    complement: PseudoSpectrum,
}

impl BurmanEstimator {
    /// Estimates one signal over `-hb .. n + hf`, with standard errors.
    fn signal(
        &self,
        model: &ArimaModel,
        signal: &Signal,
        series: &[f64],
        horizons: Horizons,
    ) -> Result<(Vec<f64>, Vec<f64>), EstimateError> {
        let g = gain(model, &signal.spectrum)?;
        let ar = model.full_ar();
        let (p, q, rr) = (ar.degree(), model.ma().degree(), g.degree());
        let nf = (2 * q)
            .max(rr + q)
            .max(horizons.forecasts + rr)
            .max(horizons.backcasts + rr)
            .max(p);
        debug!(nf, gain_degree = rr, "padding series");

        let z = [
            &backcast(model, series, nf)?[..],
            series,
            &forecast(model, series, nf)?[..],
        ]
        .concat();
        let forward = one_side(&z, &g, model.ma(), &ar)?;
        let reversed: Vec<f64> = z.iter().rev().copied().collect();
        let mut backward = one_side(&reversed, &g, model.ma(), &ar)?;
        backward.reverse();
        // `backward` covers the indices offset..z.len()
        let offset = z.len() as isize - backward.len() as isize;

        let n = series.len();
        let values: Vec<f64> = (nf - horizons.backcasts..nf + n + horizons.forecasts)
            .map(|t| forward[t] + backward[(t as isize - offset) as usize])
            .collect();
        let stdev = standard_errors(
            model,
            &signal.spectrum,
            &signal.complement,
            &g,
            n,
            horizons.backcasts,
            horizons.forecasts,
        )?;
        Ok((values, stdev))
    }
}

/// Solves `θ(F) u_t = g(F) z_t` for `t = 0 ..= L + q`, `L = len - 1 - deg g`.
///
/// The last `p + q` values come from the linear system; the others follow by
/// backward recursion.
fn one_side(
    z: &[f64],
    g: &Polynomial,
    theta: &Polynomial,
    ar: &Polynomial,
) -> Result<Vec<f64>, EstimateError> {
    let (p, q, rr) = (ar.degree(), theta.degree(), g.degree());
    let last = z.len() - 1 - rr;
    let v: Vec<f64> = (0..=last)
        .map(|t| (0..=rr).map(|j| g.get(j) * z[t + j]).sum())
        .collect();

    let base = last + 1 - p;
    let unknowns = p + q;
    let mut u = vec![0.0; last + q + 1];
    if unknowns > 0 {
        let mut a = Array2::<f64>::zeros((unknowns, unknowns));
        let mut b = Array1::<f64>::zeros(unknowns);
        for (row, t) in (base..=last).enumerate() {
            for k in 0..=q {
                a[[row, t + k - base]] += theta.get(k);
            }
            b[row] = v[t];
        }
        // past the end the signal follows the AR recursion
        for (i, t) in (last + 1..=last + q).enumerate() {
            for k in 0..=p {
                a[[p + i, t - k - base]] += ar.get(k);
            }
        }
        let solution = lu_solve(&a, &b)?;
        for (i, x) in solution.iter().enumerate() {
            u[base + i] = *x;
        }
    }
    let lead = theta.get(0);
    for t in (0..base).rev() {
        let tail: f64 = (1..=q).map(|k| theta.get(k) * u[t + k]).sum();
        u[t] = (v[t] - tail) / lead;
    }
    Ok(u)
}

impl ComponentsEstimator for BurmanEstimator {
    #[tracing::instrument(
        skip(self, ucm, series),
        fields(n = series.len(), components = ucm.components().len())
    )]
    fn estimate(
        &self,
        ucm: &UcarimaModel,
        series: &[f64],
        horizons: Horizons,
    ) -> Result<ComponentEstimates, EstimateError> {
        check_input(ucm, series)?;
        let model = ucm.aggregate();
        let n = series.len();

        let mut fallbacks = Vec::new();
        let mut components = Vec::with_capacity(ucm.components().len());
        for c in ucm.components() {
            let kind = c.kind();
            let signal = Signal {
                spectrum: c.model().spectrum(),
                complement: ucm.signal_spectrum(|k| k != kind),
            };
            let estimate = match self.signal(model, &signal, series, horizons) {
                Ok((values, stdev)) => SeriesEstimate::from_extended(&values, &stdev, horizons),
                Err(e) => {
                    warn!(component = %kind, error = %e, "component estimation failed, using zeros");
                    fallbacks.push(kind);
                    SeriesEstimate::zeros(n, horizons)
                }
            };
            components.push((kind, estimate));
        }

        let sa = Signal {
            spectrum: ucm.signal_spectrum(|k| k != ComponentType::Seasonal),
            complement: ucm.signal_spectrum(|k| k == ComponentType::Seasonal),
        };
        let sa = match self.signal(model, &sa, series, horizons) {
            Ok((values, stdev)) => SeriesEstimate::from_extended(&values, &stdev, horizons),
            Err(e) => {
                warn!(error = %e, "seasonally adjusted estimation failed, summing components");
                sum_non_seasonal(&components, n, horizons)
            }
        };
        Ok(ComponentEstimates::new(horizons, components, sa, fallbacks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use seats_arima::SarimaModel;
    use seats_decompose::{DecomposerConfig, ModelDecomposer};

    fn airline_ucm() -> UcarimaModel {
        ModelDecomposer::new(DecomposerConfig::default())
            .unwrap()
            .decompose(&SarimaModel::airline(12, -0.4, -0.6))
            .unwrap()
    }

    fn sample(n: usize) -> Vec<f64> {
        (0..n)
            .map(|t| {
                let t = t as f64;
                100.0 + 0.3 * t + 5.0 * (t * std::f64::consts::PI / 6.0).sin() + (t * 1.7).cos()
            })
            .collect()
    }

    #[test]
    fn components_add_up_to_extended_series() {
        let ucm = airline_ucm();
        let series = sample(72);
        let h = Horizons::symmetric(12);
        let est = BurmanEstimator.estimate(&ucm, &series, h).unwrap();
        assert!(est.fallbacks().is_empty());

        let fcasts = forecast(ucm.aggregate(), &series, 12).unwrap();
        let bcasts = backcast(ucm.aggregate(), &series, 12).unwrap();
        let expected = [&bcasts[..], &series, &fcasts].concat();
        for (t, x) in expected.iter().enumerate() {
            let total: f64 = est.components().iter().map(|(_, e)| e.extended()[t]).sum();
            assert_abs_diff_eq!(total, *x, epsilon = 1e-6);
        }
    }

    #[test]
    fn sa_is_series_minus_seasonal() {
        let ucm = airline_ucm();
        let series = sample(60);
        let est = BurmanEstimator
            .estimate(&ucm, &series, Horizons::symmetric(6))
            .unwrap();
        let seasonal = est.component(ComponentType::Seasonal).unwrap();
        for (t, x) in series.iter().enumerate() {
            let sa = est.seasonally_adjusted().values()[t];
            assert_abs_diff_eq!(sa, x - seasonal.values()[t], epsilon = 1e-6);
        }
    }

    #[test]
    fn horizons_are_respected() {
        let ucm = airline_ucm();
        let est = BurmanEstimator
            .estimate(&ucm, &sample(48), Horizons::new(12, 3))
            .unwrap();
        for (_, e) in est.components() {
            assert_eq!(e.forecasts().len(), 12);
            assert_eq!(e.backcasts().len(), 3);
            assert_eq!(e.values().len(), 48);
            assert!(e.stdev().iter().all(|s| s.is_finite() && *s >= 0.0));
        }
    }

    #[test]
    fn short_series_rejected() {
        let ucm = airline_ucm();
        let err = BurmanEstimator
            .estimate(&ucm, &sample(10), Horizons::default())
            .unwrap_err();
        assert!(matches!(err, EstimateError::SeriesTooShort { n: 10, min: 14 }));
    }

    #[test]
    fn one_side_without_ar_or_ma_is_the_convolution() {
        let z = [1.0, 2.0, 3.0, 4.0];
        let g = Polynomial::new(vec![0.5, 0.25]);
        let u = one_side(&z, &g, &Polynomial::one(), &Polynomial::one()).unwrap();
        assert_eq!(u, vec![1.0, 1.75, 2.5]);
    }
}
