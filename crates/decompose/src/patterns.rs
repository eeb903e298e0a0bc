//! Calibrated caps for common low-order seasonal models.
//!
//! The three shapes `(0,d,1)(0,1,1)` with `d ∈ {0, 1, 2}` fail to decompose
//! only near the edges of the invertibility region. Each entry gives the
//! largest regular and seasonal MA coefficients (sign convention
//! `θ(B) = 1 + θ1 B`) for which the canonical decomposition exists at every
//! point of a 0.01-spaced grid. Capping the coefficients replaces the
//! re-estimation step of the general cascade.
//!
//! The caps do not depend on the seasonal period: one triple holds for
//! every period in [`PERIODS`], so the table is keyed by `d` alone.

use seats_arima::{SarimaModel, SarimaSpec};

/// `(d, θ cap, Θ cap)` per regular differencing order.
const CAPS: [(usize, f64, f64); 3] = [(1, 0.95, -0.05), (2, -0.55, -0.05), (0, 0.95, -0.1)];

/// Seasonal periods the caps were calibrated on. Longer periods are too
/// ill-conditioned in the `cos ω` basis to certify a cap.
const PERIODS: [usize; 7] = [2, 3, 4, 5, 6, 7, 12];

/// Looks up the caps of a `(0,d,1)(0,1,1)_s` model.
pub(crate) fn caps(spec: &SarimaSpec) -> Option<(f64, f64)> {
    let shape = spec.p() == 0
        && spec.q() == 1
        && spec.bp() == 0
        && spec.bd() == 1
        && spec.bq() == 1;
    if !shape || !PERIODS.contains(&spec.period()) {
        return None;
    }
    CAPS.iter()
        .find(|(d, _, _)| *d == spec.d())
        .map(|(_, theta, btheta)| (*theta, *btheta))
}

/// Caps the MA coefficients of a known shape.
///
/// Returns `None` when the shape is unknown or already within its caps.
pub(crate) fn capped(model: &SarimaModel) -> Option<SarimaModel> {
    let (theta_cap, btheta_cap) = caps(&model.spec())?;
    let theta = model.theta()[0];
    let btheta = model.btheta()[0];
    if theta <= theta_cap && btheta <= btheta_cap {
        return None;
    }
    model
        .with_theta(vec![theta.min(theta_cap)])
        .and_then(|m| m.with_btheta(vec![btheta.min(btheta_cap)]))
        .ok()
}
