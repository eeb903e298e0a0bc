//! Frequency-domain root selectors.
//!
//! A selector decides, for each inverse root `ρ = 1/z` of the stationary AR
//! polynomial, whether its spectral mass belongs to a component. Roots
//! picked by neither the trend nor the seasonal selector go to the cycle.

use std::f64::consts::PI;

use num_complex::Complex64;
use seats_arima::Polynomial;

/// Imaginary parts below this make an inverse root real.
const REAL_TOLERANCE: f64 = 1e-9;

/// Decides whether an inverse AR root belongs to a component.
pub trait RootSelector {
    /// Returns `true` when `inverse_root` is selected.
    fn selects(&self, inverse_root: Complex64) -> bool;
}

/// Selects real positive inverse roots with modulus at least `rmod`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrendSelector {
    rmod: f64,
}

impl TrendSelector {
    /// Creates a trend selector with root-modulus boundary `rmod`.
    pub fn new(rmod: f64) -> Self {
        Self { rmod }
    }

    /// Returns the root-modulus boundary.
    pub fn rmod(&self) -> f64 {
        self.rmod
    }
}

impl RootSelector for TrendSelector {
    fn selects(&self, inverse_root: Complex64) -> bool {
        inverse_root.im.abs() < REAL_TOLERANCE
            && inverse_root.re > 0.0
            && inverse_root.norm() >= self.rmod
    }
}

/// Selects inverse roots of modulus at least `smod` whose argument lies
/// within `epsphi` degrees of a seasonal frequency `2πk/s`, `k = 1..=s/2`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeasonalSelector {
    period: usize,
    epsphi: f64,
    smod: f64,
}

impl SeasonalSelector {
    /// Creates a seasonal selector for `period`.
    pub fn new(period: usize, epsphi: f64, smod: f64) -> Self {
        Self {
            period,
            epsphi,
            smod,
        }
    }
}

impl RootSelector for SeasonalSelector {
    fn selects(&self, inverse_root: Complex64) -> bool {
        if self.period < 2 || inverse_root.norm() < self.smod {
            return false;
        }
        let arg = inverse_root.arg().abs();
        let tolerance = self.epsphi.to_radians();
        let s = self.period as f64;
        (1..=self.period / 2).any(|k| (arg - 2.0 * PI * k as f64 / s).abs() <= tolerance)
    }
}

/// Stationary AR polynomial split into trend, seasonal and cycle factors.
#[derive(Clone, Debug, PartialEq)]
pub struct RootPartition {
    /// Factor with the trend roots.
    pub trend: Polynomial,
    /// Factor with the seasonal roots.
    pub seasonal: Polynomial,
    /// Factor with the remaining roots.
    pub cycle: Polynomial,
}

/// Partitions the roots of `ar` with the trend selector first, then the
/// seasonal selector.
pub fn partition(
    ar: &Polynomial,
    trend: &dyn RootSelector,
    seasonal: &dyn RootSelector,
) -> RootPartition {
    let mut groups: [Vec<Complex64>; 3] = Default::default();
    for z in ar.roots() {
        let rho = z.inv();
        let slot = if trend.selects(rho) {
            0
        } else if seasonal.selects(rho) {
            1
        } else {
            2
        };
        groups[slot].push(z);
    }
    let [t, s, c] = groups.map(|roots| Polynomial::from_roots(&roots));
    RootPartition {
        trend: t,
        seasonal: s,
        cycle: c,
    }
}
