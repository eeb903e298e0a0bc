//! Unconstrained parametrization of stationary/invertible lag polynomials.
//!
//! **Not part of the public API.**

/// Partial autocorrelations are clamped to this bound when mapping back.
const PACF_BOUND: f64 = 0.999;

/// Maps unconstrained parameters to the lag coefficients of a polynomial
/// `1 + c1 B + … + cp B^p` with all roots outside the unit circle
/// (Jones 1980, Monahan 1984).
///
/// Step 1: `r_k = tanh(alpha_k)` maps each parameter to (-1, 1).
/// Step 2: Levinson-Durbin turns the partial autocorrelations into AR
///         coefficients `φ` of `x_t = Σ φ_j x_{t-j}`; the lag polynomial
///         carries `c_j = -φ_j`.
pub(crate) fn to_lag_coefficients(alpha: &[f64]) -> Vec<f64> {
    let p = alpha.len();
    if p == 0 {
        return Vec::new();
    }

    let r: Vec<f64> = alpha.iter().map(|a| a.tanh()).collect();
    let mut phi = vec![0.0; p];
    let mut prev = vec![0.0; p];
    phi[0] = r[0];

    for k in 1..p {
        prev[..k].copy_from_slice(&phi[..k]);
        phi[k] = r[k];
        for j in 0..k {
            phi[j] = prev[j] - r[k] * prev[k - 1 - j];
        }
    }

    phi.iter().map(|x| -x).collect()
}

/// Inverse of [`to_lag_coefficients`], used for starting values.
///
/// Runs the Levinson recursion backwards; polynomials that are not strictly
/// stationary have their partial autocorrelations clamped into
/// `(-0.999, 0.999)`.
pub(crate) fn from_lag_coefficients(coefficients: &[f64]) -> Vec<f64> {
    let p = coefficients.len();
    let mut phi: Vec<f64> = coefficients.iter().map(|c| -c).collect();
    let mut r = vec![0.0; p];

    for k in (0..p).rev() {
        let rk = phi[k].clamp(-PACF_BOUND, PACF_BOUND);
        r[k] = rk;
        if k == 0 {
            break;
        }
        let denom = 1.0 - rk * rk;
        let prev: Vec<f64> = (0..k)
            .map(|j| (phi[j] + rk * phi[k - 1 - j]) / denom)
            .collect();
        phi[..k].copy_from_slice(&prev);
    }

    r.iter().map(|x| x.atanh()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polynomial::Polynomial;
    use approx::assert_abs_diff_eq;

    #[test]
    fn empty_input() {
        assert!(to_lag_coefficients(&[]).is_empty());
        assert!(from_lag_coefficients(&[]).is_empty());
    }

    #[test]
    fn single_zero() {
        let result = to_lag_coefficients(&[0.0]);
        assert_abs_diff_eq!(result[0], 0.0, epsilon = 1e-15);
    }

    #[test]
    fn sign_convention() {
        // positive PACF gives x_t = r x_{t-1}, i.e. the polynomial 1 - r B
        let result = to_lag_coefficients(&[0.5]);
        assert_abs_diff_eq!(result[0], -(0.5_f64.tanh()), epsilon = 1e-15);
    }

    #[test]
    fn two_coefficients() {
        let result = to_lag_coefficients(&[0.5, 0.3]);
        let (r0, r1) = (0.5_f64.tanh(), 0.3_f64.tanh());
        assert_abs_diff_eq!(result[0], -(r0 - r1 * r0), epsilon = 1e-12);
        assert_abs_diff_eq!(result[1], -r1, epsilon = 1e-12);
    }

    #[test]
    fn roots_outside_unit_circle() {
        let cases: &[&[f64]] = &[&[1.0, -2.0, 3.0], &[3.0, 3.0], &[-3.0, 2.0, -1.0, 0.5]];
        for alpha in cases {
            let poly = Polynomial::from_lags(&to_lag_coefficients(alpha));
            for root in poly.roots() {
                assert!(root.norm() > 1.0, "root {root} inside unit circle for {alpha:?}");
            }
        }
    }

    #[test]
    fn inverse_recovers_parameters() {
        let alpha = [0.4, -0.7, 0.2];
        let back = from_lag_coefficients(&to_lag_coefficients(&alpha));
        for (a, b) in alpha.iter().zip(&back) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-10);
        }
    }

    #[test]
    fn inverse_clamps_unit_roots() {
        let back = from_lag_coefficients(&[-1.0]);
        assert!(back[0].is_finite());
        assert_abs_diff_eq!(back[0].tanh(), PACF_BOUND, epsilon = 1e-12);
    }
}
