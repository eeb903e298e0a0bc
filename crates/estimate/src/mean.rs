//! Deterministic effect of the constant of a model with mean.
//!
//! A model `δ(B) φ(B) y_t = μ + θ(B) a_t` implies a deterministic path
//! `m_t` with `δ(B) m_t = μ`. When `δ = (1-B)^d S(B)` with `S(1) ≠ 0`,
//!
//! ```text
//! m_t = μ t^d / (d! S(1))
//! ```
//!
//! which reduces to `μ / δ(1)` for `d = 0`. The effect is removed from the
//! series before estimation and credited to the trend afterwards.

use seats_arima::Polynomial;

use crate::components::Horizons;
use crate::error::EstimateError;

/// Mean effect of a model with a constant.
#[derive(Clone, Debug, PartialEq)]
pub struct MeanEffect {
    mu: f64,
    order: i32,
    scale: f64,
}

impl MeanEffect {
    /// Estimates `μ` as the sample mean of `δ(B) y`.
    ///
    /// # Errors
    ///
    /// [`EstimateError::SeriesTooShort`] when `series` is not longer than
    /// `deg δ`, [`EstimateError::NonFiniteSeries`] for NaN or infinite
    /// values.
    pub fn estimate(delta: &Polynomial, series: &[f64]) -> Result<Self, EstimateError> {
        let d = delta.degree();
        if series.len() <= d {
            return Err(EstimateError::SeriesTooShort {
                n: series.len(),
                min: d + 1,
            });
        }
        if series.iter().any(|x| !x.is_finite()) {
            return Err(EstimateError::NonFiniteSeries);
        }
        let differenced: Vec<f64> = (d..series.len())
            .map(|t| (0..=d).map(|k| delta.get(k) * series[t - k]).sum())
            .collect();
        let mu = differenced.iter().sum::<f64>() / differenced.len() as f64;

        let (order, cofactor) = delta.split_unit_roots();
        let factorial: f64 = (1..=order).map(|k| k as f64).product();
        Ok(Self {
            mu,
            order: order as i32,
            scale: factorial * cofactor.eval(1.0),
        })
    }

    /// Returns the estimated constant `μ` of the differenced series.
    pub fn mu(&self) -> f64 {
        self.mu
    }

    /// Value of the effect at time `t`, with `t = 0` the first observation.
    pub fn value(&self, t: isize) -> f64 {
        self.mu * (t as f64).powi(self.order) / self.scale
    }

    /// The effect over `-backcasts .. n + forecasts`.
    pub fn extended(&self, n: usize, horizons: Horizons) -> Vec<f64> {
        let start = -(horizons.backcasts as isize);
        let end = (n + horizons.forecasts) as isize;
        (start..end).map(|t| self.value(t)).collect()
    }

    /// Returns `series` without the effect.
    pub fn remove(&self, series: &[f64]) -> Vec<f64> {
        series
            .iter()
            .enumerate()
            .map(|(t, x)| x - self.value(t as isize))
            .collect()
    }
}
